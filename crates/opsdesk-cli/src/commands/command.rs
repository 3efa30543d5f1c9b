//! One-shot local command dispatch

use clap::Args;
use opsdesk_cli::app::AppState;
use opsdesk_cli::config::{AdminArgs, StoreArgs};
use serde_json::{json, Value};

#[derive(Debug, Args)]
pub struct CommandArgs {
    /// Target entity, e.g. `users`
    pub entity: String,

    /// Operation name, e.g. `list`
    pub operation: String,

    /// Operation payload as a JSON object
    #[arg(long)]
    pub data: Option<String>,

    /// Present the configured admin secret as the request's admin key
    #[arg(long)]
    pub admin: bool,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub admin_secret: AdminArgs,
}

pub async fn execute(args: CommandArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut body = json!({
        "entity": args.entity,
        "operation": args.operation,
    });
    if let Some(raw) = &args.data {
        body["data"] = serde_json::from_str::<Value>(raw)?;
    }
    if args.admin {
        let key = args
            .admin_secret
            .admin_secret
            .clone()
            .ok_or("--admin requires ADMIN_SECRET_KEY or --admin-secret")?;
        body["adminKey"] = Value::String(key);
    }

    let db = args.store.open()?;
    let state = AppState::new(db, args.admin_secret.policy());
    let outcome = state.dispatcher.dispatch_value(body).await;

    println!("{}", serde_json::to_string_pretty(&outcome.response)?);
    if outcome.response.success {
        Ok(())
    } else {
        Err(format!("command failed with status {}", outcome.class.http_status()).into())
    }
}
