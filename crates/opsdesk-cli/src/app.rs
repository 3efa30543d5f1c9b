//! HTTP binding for the command dispatcher
//!
//! | route                                 | purpose                         |
//! |---------------------------------------|---------------------------------|
//! | `POST /api/v1/command`                | dispatch one command            |
//! | `GET /api/v1/command`                 | discovery document              |
//! | `GET /health`                         | store connectivity and schema   |
//! | `GET /api/admin/monitoring/metrics`   | dispatch and command-log figures |

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use opsdesk_core::model::timestamp::now_iso;
use opsdesk_core::policy::AdminKeyPolicy;
use opsdesk_engine::{CommandRegistry, Dispatcher};
use opsdesk_store::{Database, DatabaseStatus};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub const COMMAND_PATH: &str = "/api/v1/command";
pub const HEALTH_PATH: &str = "/health";
pub const METRICS_PATH: &str = "/api/admin/monitoring/metrics";

/// Handles shared by every request
#[derive(Debug, Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub db: Database,
}

impl AppState {
    /// State serving the standard entities from `db`
    pub fn new<P>(db: Database, policy: P) -> Self
    where
        P: AdminKeyPolicy + 'static,
    {
        let registry = CommandRegistry::with_default_handlers(db.clone());
        Self {
            dispatcher: Dispatcher::new(registry, policy, db.clone()),
            db,
        }
    }
}

/// Envelope for the non-command endpoints
#[derive(Debug, Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
    timestamp: String,
}

impl<T> Envelope<T> {
    fn new(success: bool, data: T) -> Self {
        Self {
            success,
            data,
            timestamp: now_iso(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(COMMAND_PATH, get(discovery).post(command))
        .route(METRICS_PATH, get(metrics))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn command(State(state): State<AppState>, body: Bytes) -> Response {
    let outcome = state.dispatcher.dispatch_bytes(&body).await;
    let status = StatusCode::from_u16(outcome.class.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(outcome.response)).into_response()
}

async fn discovery(State(state): State<AppState>) -> Response {
    Json(state.dispatcher.discovery()).into_response()
}

async fn health(State(state): State<AppState>) -> Response {
    let db = state.db.clone();
    let status = match tokio::task::spawn_blocking(move || db.status()).await {
        Ok(status) => status,
        Err(err) => {
            tracing::warn!(error = %err, "health check task failed");
            DatabaseStatus {
                connected: false,
                initialized: false,
                migrations_applied: 0,
                location: state.db.location().to_string(),
            }
        }
    };

    let healthy = status.connected && status.initialized;
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(Envelope::new(healthy, status))).into_response()
}

async fn metrics(State(state): State<AppState>) -> Response {
    let report = state.dispatcher.metrics_report().await;
    Json(Envelope::new(true, report)).into_response()
}

/// Resolve on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "unable to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
