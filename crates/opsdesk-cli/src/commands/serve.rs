//! HTTP server command

use opsdesk_cli::app::{build_router, shutdown_signal, AppState};
use opsdesk_cli::config::ServeArgs;

pub async fn execute(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = args.store.open()?;
    let state = AppState::new(db, args.admin.policy());
    let entities = state.dispatcher.registry().list_entities().join(",");
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(bind = %args.bind, entities = %entities, "command API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
