//! Repository layer for persisting console rows to SQLite
//!
//! Each repository is a stateless unit struct whose functions take a
//! borrowed connection, so callers decide how the connection is shared.

mod audit_logs;
mod command_log;
mod system_config;
mod system_meta;
mod users;

pub use audit_logs::AuditLogRepo;
pub use command_log::CommandLogRepo;
pub use system_config::SystemConfigRepo;
pub use system_meta::SystemMetaRepo;
pub use users::UserRepo;

use rusqlite::types::Value as SqlValue;

/// Conjunction of `WHERE` clauses with positional parameters
#[derive(Debug, Default)]
pub(crate) struct Predicate {
    clauses: Vec<&'static str>,
    params: Vec<SqlValue>,
}

impl Predicate {
    pub(crate) fn push(&mut self, clause: &'static str, value: impl Into<SqlValue>) {
        self.clauses.push(clause);
        self.params.push(value.into());
    }

    pub(crate) fn push_opt<T: Into<SqlValue>>(&mut self, clause: &'static str, value: Option<T>) {
        if let Some(v) = value {
            self.push(clause, v);
        }
    }

    /// ` WHERE a AND b`, or an empty string when unfiltered
    pub(crate) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub(crate) fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Parameters followed by trailing LIMIT/OFFSET values
    pub(crate) fn params_with_page(&self, limit: u32, offset: u64) -> Vec<SqlValue> {
        let mut params = self.params.clone();
        params.push(SqlValue::Integer(i64::from(limit)));
        params.push(SqlValue::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));
        params
    }
}

pub(crate) fn bool_to_sql(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
