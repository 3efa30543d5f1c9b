//! Command dispatcher with boundary logging.
//!
//! Turns one request body into one response and exactly one command-log row:
//!
//! 1. schema validation (`Invalid request format` with itemized details)
//! 2. registry lookup (`Unknown entity: <entity>`)
//! 3. admin-key policy (`Unauthorized: Invalid or missing admin key`)
//! 4. handler execution on the blocking pool
//!
//! ## Logging Ownership
//!
//! The dispatcher owns lifecycle logging for commands:
//! - `log_op_start!` at entry
//! - `log_op_end!` when a response is produced
//! - `log_op_error!` when a handler faults or panics
//!
//! Handlers and stores use only `tracing::debug!()` and `tracing::warn!()`.

use crate::discovery::{discovery_document, DiscoveryDocument};
use crate::metrics::{CommandLogMetrics, DispatchMetrics, MetricsReport};
use crate::registry::CommandRegistry;
use opsdesk_core::errors::{ExError, ExErrorKind, OpsError};
use opsdesk_core::model::timestamp::now_millis;
use opsdesk_core::model::{CommandLogEntry, CommandResponse, CommandStatus, ValidationIssue};
use opsdesk_core::policy::AdminKeyPolicy;
use opsdesk_core::request::{raw_identifiers, redact_body, CommandRequest};
use opsdesk_core::{log_op_end, log_op_error, log_op_start};
use opsdesk_core_types::RequestId;
use opsdesk_store::repo::CommandLogRepo;
use opsdesk_store::Database;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

const OP: &str = "dispatch";

/// Transport-neutral classification of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// Handler succeeded
    Ok,
    /// Malformed request or handler-level failure
    BadRequest,
    /// No handler for the entity
    NotFound,
    /// Admin key missing or wrong
    Unauthorized,
    /// Fault caught at the dispatch boundary
    Fault,
}

impl ResponseClass {
    pub fn http_status(&self) -> u16 {
        match self {
            ResponseClass::Ok => 200,
            ResponseClass::BadRequest => 400,
            ResponseClass::NotFound => 404,
            ResponseClass::Unauthorized => 401,
            ResponseClass::Fault => 500,
        }
    }
}

/// Everything a transport needs to answer one command
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub response: CommandResponse,
    pub class: ResponseClass,
    pub status: CommandStatus,
}

impl DispatchOutcome {
    pub fn request_id(&self) -> &str {
        &self.response.request_id
    }
}

/// Fields of the command-log row that vary by outcome
struct Disposition {
    entity: String,
    operation: String,
    request_data: Option<Value>,
    response: CommandResponse,
    class: ResponseClass,
    status: CommandStatus,
    error_message: Option<String>,
}

/// Validates, authorizes, executes and logs commands
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    policy: Arc<dyn AdminKeyPolicy>,
    db: Database,
    metrics: Arc<DispatchMetrics>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("entities", &self.registry.list_entities())
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher over an injected registry and policy
    ///
    /// `db` receives the command log.
    pub fn new<P>(registry: CommandRegistry, policy: P, db: Database) -> Self
    where
        P: AdminKeyPolicy + 'static,
    {
        Self {
            registry: Arc::new(registry),
            policy: Arc::new(policy),
            db,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &dyn AdminKeyPolicy {
        self.policy.as_ref()
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    /// Discovery document for the registered entities
    pub fn discovery(&self) -> DiscoveryDocument {
        discovery_document(&self.registry, self.policy.as_ref())
    }

    /// Dispatch counters plus command-log statistics
    ///
    /// An unreadable command log reports zeros rather than failing.
    pub async fn metrics_report(&self) -> MetricsReport {
        let db = self.db.clone();
        let now = now_millis();
        let summary =
            tokio::task::spawn_blocking(move || db.with_conn(|c| CommandLogRepo::summary(c, now)))
                .await;
        let database = match summary {
            Ok(Ok(summary)) => CommandLogMetrics::from(summary),
            Ok(Err(err)) => {
                tracing::warn!(err.code = err.code(), err.message = err.message(), "command log summary failed");
                CommandLogMetrics::unavailable()
            }
            Err(join) => {
                tracing::warn!(error = %join, "command log summary task failed");
                CommandLogMetrics::unavailable()
            }
        };
        MetricsReport {
            dispatch: self.metrics.snapshot(),
            database,
        }
    }

    /// Dispatch a raw request body
    ///
    /// A body that is not JSON is reported like any other schema violation.
    pub async fn dispatch_bytes(&self, body: &[u8]) -> DispatchOutcome {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.dispatch_value(value).await,
            Err(err) => {
                let start = Instant::now();
                let request_id = RequestId::new();
                log_op_start!(OP, request_id = request_id.as_str());
                let issues = CommandRequest::invalid_json(&err.to_string());
                let disposition = invalid_format(
                    &request_id,
                    (
                        opsdesk_core_types::schema::UNKNOWN.to_string(),
                        opsdesk_core_types::schema::UNKNOWN.to_string(),
                    ),
                    None,
                    issues,
                );
                self.finish(request_id, start, disposition).await
            }
        }
    }

    /// Dispatch a decoded JSON body
    pub async fn dispatch_value(&self, body: Value) -> DispatchOutcome {
        let start = Instant::now();
        let request_id = RequestId::new();
        log_op_start!(OP, request_id = request_id.as_str());

        match CommandRequest::parse(&body) {
            Ok(request) => self.execute(request, request_id, start).await,
            Err(issues) => {
                let disposition = invalid_format(
                    &request_id,
                    raw_identifiers(&body),
                    Some(redact_body(&body)),
                    issues,
                );
                self.finish(request_id, start, disposition).await
            }
        }
    }

    /// Dispatch an already-validated request
    pub async fn dispatch(&self, request: CommandRequest) -> DispatchOutcome {
        let start = Instant::now();
        let request_id = RequestId::new();
        log_op_start!(OP, request_id = request_id.as_str());
        self.execute(request, request_id, start).await
    }

    async fn execute(
        &self,
        request: CommandRequest,
        request_id: RequestId,
        start: Instant,
    ) -> DispatchOutcome {
        let CommandRequest {
            entity,
            operation,
            data,
            admin_key,
        } = request;
        let request_data = data.clone().map(Value::Object);

        let Some(handler) = self.registry.get_handler(&entity) else {
            let error = OpsError::UnknownEntity {
                entity: entity.clone(),
            }
            .to_string();
            let disposition = Disposition {
                response: CommandResponse::failure(error.clone(), &request_id),
                class: ResponseClass::NotFound,
                status: CommandStatus::Failed,
                error_message: Some(error),
                entity,
                operation,
                request_data,
            };
            return self.finish(request_id, start, disposition).await;
        };

        if !self
            .policy
            .authorize(&entity, &operation, admin_key.as_ref())
        {
            let disposition = Disposition {
                response: CommandResponse::failure(OpsError::Unauthorized.to_string(), &request_id),
                class: ResponseClass::Unauthorized,
                status: CommandStatus::Unauthorized,
                error_message: Some("Invalid or missing admin key".to_string()),
                entity,
                operation,
                request_data,
            };
            return self.finish(request_id, start, disposition).await;
        }

        let op = operation.clone();
        let joined =
            tokio::task::spawn_blocking(move || run_handler(&handler, &op, data)).await;

        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(join) => Err(ExError::new(ExErrorKind::Internal)
                .with_op(operation.clone())
                .with_entity(entity.clone())
                .with_message(if join.is_panic() {
                    "Handler panicked".to_string()
                } else {
                    join.to_string()
                })),
        };

        let disposition = match outcome {
            Ok(result) => {
                let (class, status) = if result.success {
                    (ResponseClass::Ok, CommandStatus::Success)
                } else {
                    (ResponseClass::BadRequest, CommandStatus::Failed)
                };
                let error_message = result.error.clone();
                Disposition {
                    response: CommandResponse::from_result(result, &request_id),
                    class,
                    status,
                    error_message,
                    entity,
                    operation,
                    request_data,
                }
            }
            Err(err) => {
                let err = err
                    .with_request_id(request_id.clone())
                    .with_entity(entity.clone());
                log_op_error!(
                    OP,
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = request_id.as_str(),
                    entity = entity.as_str(),
                    operation = operation.as_str()
                );
                let message = err.user_message().to_string();
                Disposition {
                    response: CommandResponse::failure(message.clone(), &request_id),
                    class: ResponseClass::Fault,
                    status: CommandStatus::Error,
                    error_message: Some(message),
                    entity,
                    operation,
                    request_data,
                }
            }
        };

        self.finish(request_id, start, disposition).await
    }

    /// Log the attempt, record metrics, and emit the end event
    async fn finish(
        &self,
        request_id: RequestId,
        start: Instant,
        d: Disposition,
    ) -> DispatchOutcome {
        let duration_ms = start.elapsed().as_millis() as u64;

        let entry = CommandLogEntry {
            command_id: request_id.to_string(),
            entity: d.entity.clone(),
            operation: d.operation.clone(),
            request_data: d.request_data,
            response_data: serde_json::to_value(&d.response).ok(),
            status: d.status,
            duration: i64::try_from(duration_ms).unwrap_or(i64::MAX),
            error_message: d.error_message,
            executed_at: now_millis(),
        };
        self.write_command_log(entry).await;

        self.metrics.record(duration_ms, d.response.success);

        log_op_end!(
            OP,
            duration_ms = duration_ms,
            request_id = request_id.as_str(),
            entity = d.entity.as_str(),
            operation = d.operation.as_str(),
            status = d.status.as_str()
        );

        DispatchOutcome {
            response: d.response,
            class: d.class,
            status: d.status,
        }
    }

    async fn write_command_log(&self, entry: CommandLogEntry) {
        let db = self.db.clone();
        let command_id = entry.command_id.clone();
        let written =
            tokio::task::spawn_blocking(move || db.with_conn(|c| CommandLogRepo::insert(c, &entry)))
                .await;
        match written {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(
                command_id = %command_id,
                err.code = err.code(),
                err.message = err.message(),
                "failed to write command log"
            ),
            Err(join) => tracing::warn!(
                command_id = %command_id,
                error = %join,
                "command log task failed"
            ),
        }
    }
}

fn run_handler(
    handler: &crate::handlers::EntityHandler,
    operation: &str,
    data: Option<Map<String, Value>>,
) -> Result<opsdesk_core::model::CommandResult, ExError> {
    handler.handle(operation, data.as_ref())
}

fn invalid_format(
    request_id: &RequestId,
    (entity, operation): (String, String),
    request_data: Option<Value>,
    issues: Vec<ValidationIssue>,
) -> Disposition {
    let error = OpsError::InvalidRequestFormat.to_string();
    Disposition {
        response: CommandResponse::failure(error.clone(), request_id).with_details(issues),
        class: ResponseClass::BadRequest,
        status: CommandStatus::Failed,
        error_message: Some(error),
        entity,
        operation,
        request_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ResponseClass::Ok.http_status(), 200);
        assert_eq!(ResponseClass::BadRequest.http_status(), 400);
        assert_eq!(ResponseClass::Unauthorized.http_status(), 401);
        assert_eq!(ResponseClass::NotFound.http_status(), 404);
        assert_eq!(ResponseClass::Fault.http_status(), 500);
    }
}
