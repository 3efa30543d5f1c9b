use super::params::{self, Data};
use opsdesk_core::errors::{ExError, OpsError};
use opsdesk_core::model::timestamp::now_millis;
use opsdesk_store::repo::AuditLogRepo;
use opsdesk_store::Database;
use serde_json::{json, Value};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Read and prune access to the audit trail
///
/// Reads are not themselves audited.
#[derive(Debug, Clone)]
pub struct AuditLogsHandler {
    db: Database,
}

impl AuditLogsHandler {
    pub const OPERATIONS: &'static [&'static str] = &["list", "get", "count", "cleanup"];

    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub(super) fn handle(&self, operation: &str, data: Data<'_>) -> Result<Value, ExError> {
        match operation {
            "list" => self.list(data),
            "get" => self.get(data),
            "count" => self.count(data),
            "cleanup" => self.cleanup(data),
            other => Err(OpsError::unsupported(other).into()),
        }
    }

    fn list(&self, data: Data<'_>) -> Result<Value, ExError> {
        let p = params::AuditListParams::parse(data)?;
        let page = self
            .db
            .with_conn(|conn| AuditLogRepo::list(conn, &p.filter, p.page))?;
        Ok(json!({
            "logs": page.items,
            "total": page.total,
            "limit": page.limit,
            "offset": page.offset,
        }))
    }

    fn get(&self, data: Data<'_>) -> Result<Value, ExError> {
        let id = params::require_id(data, OpsError::required("Audit log ID"))?;
        let log = self
            .db
            .with_conn(|conn| AuditLogRepo::get(conn, id))?
            .ok_or_else(|| OpsError::not_found("Audit log"))?;
        Ok(serde_json::to_value(log)?)
    }

    fn count(&self, data: Data<'_>) -> Result<Value, ExError> {
        let filter = params::audit_count_filter(data)?;
        let count = self
            .db
            .with_conn(|conn| AuditLogRepo::count(conn, &filter))?;
        Ok(json!({"count": count}))
    }

    fn cleanup(&self, data: Data<'_>) -> Result<Value, ExError> {
        let days = params::days_to_keep(data)?;
        let cutoff = now_millis() - i64::from(days) * DAY_MS;
        let deleted = self
            .db
            .with_conn(|conn| AuditLogRepo::delete_older_than(conn, cutoff))?;
        Ok(json!({
            "message": format!("Cleaned up {} old audit logs", deleted),
            "deletedCount": deleted,
        }))
    }
}
