//! Entity handlers
//!
//! The console serves a closed set of entities, so handlers are variants of
//! one enum rather than trait objects. Every handler follows the same
//! contract:
//!
//! - domain failures (bad parameters, missing rows, uniqueness clashes,
//!   unknown operations) come back as `Ok(CommandResult { success: false })`
//! - infrastructure faults come back as `Err(ExError)` for the dispatcher's
//!   catch-all
//!
//! Handlers are synchronous; the dispatcher runs them on the blocking pool.

mod audit_logs;
pub mod params;
mod system_config;
mod users;

pub use audit_logs::AuditLogsHandler;
pub use system_config::SystemConfigHandler;
pub use users::UsersHandler;

use opsdesk_core::errors::ExError;
use opsdesk_core::model::{CommandResult, NewAuditEntry};
use opsdesk_store::repo::AuditLogRepo;
use opsdesk_store::Database;
use params::Data;
use rusqlite::Connection;
use serde_json::Value;

pub const USERS: &str = "users";
pub const SYSTEM_CONFIG: &str = "system_config";
pub const AUDIT_LOGS: &str = "audit_logs";

/// A handler for one registered entity
#[derive(Debug, Clone)]
pub enum EntityHandler {
    Users(UsersHandler),
    SystemConfig(SystemConfigHandler),
    AuditLogs(AuditLogsHandler),
}

impl EntityHandler {
    pub fn users(db: Database) -> Self {
        EntityHandler::Users(UsersHandler::new(db))
    }

    pub fn system_config(db: Database) -> Self {
        EntityHandler::SystemConfig(SystemConfigHandler::new(db))
    }

    pub fn audit_logs(db: Database) -> Self {
        EntityHandler::AuditLogs(AuditLogsHandler::new(db))
    }

    /// Entity name this handler serves
    pub fn entity(&self) -> &'static str {
        match self {
            EntityHandler::Users(_) => USERS,
            EntityHandler::SystemConfig(_) => SYSTEM_CONFIG,
            EntityHandler::AuditLogs(_) => AUDIT_LOGS,
        }
    }

    /// Operations this handler implements, in published order
    pub fn supported_operations(&self) -> &'static [&'static str] {
        match self {
            EntityHandler::Users(_) => UsersHandler::OPERATIONS,
            EntityHandler::SystemConfig(_) => SystemConfigHandler::OPERATIONS,
            EntityHandler::AuditLogs(_) => AuditLogsHandler::OPERATIONS,
        }
    }

    /// Execute one operation
    ///
    /// # Errors
    ///
    /// Only infrastructure faults are returned as `Err`; domain failures are
    /// encoded in the returned `CommandResult`.
    pub fn handle(&self, operation: &str, data: Data<'_>) -> Result<CommandResult, ExError> {
        let outcome = match self {
            EntityHandler::Users(h) => h.handle(operation, data),
            EntityHandler::SystemConfig(h) => h.handle(operation, data),
            EntityHandler::AuditLogs(h) => h.handle(operation, data),
        };
        into_result(outcome)
    }
}

/// Fold domain errors into failure results, pass faults through
fn into_result(outcome: Result<Value, ExError>) -> Result<CommandResult, ExError> {
    match outcome {
        Ok(data) => Ok(CommandResult::success(data)),
        Err(err) if err.is_domain() => Ok(CommandResult::failure(err.user_message())),
        Err(err) => Err(err),
    }
}

/// Write an audit entry; failures are logged and dropped
fn record_audit(conn: &Connection, entry: NewAuditEntry) {
    if let Err(err) = AuditLogRepo::insert(conn, &entry) {
        tracing::warn!(
            action = %entry.action,
            entity = %entry.entity,
            err.code = err.code(),
            err.message = err.message(),
            "failed to write audit entry"
        );
    }
}
