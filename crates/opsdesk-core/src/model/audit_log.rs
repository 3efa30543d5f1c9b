use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::timestamp::iso_millis;

/// One audit trail row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: i64,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<String>,
    pub user_id: Option<String>,
    pub details: Option<Value>,
    #[serde(with = "iso_millis")]
    pub timestamp: i64,
    pub ip_address: Option<String>,
}

/// Audit entry written by handlers after a successful operation
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub action: String,
    pub entity: String,
    pub entity_id: Option<String>,
    pub user_id: Option<String>,
    pub details: Option<Value>,
    pub timestamp: i64,
}

impl NewAuditEntry {
    pub fn new(action: impl Into<String>, entity: impl Into<String>, timestamp: i64) -> Self {
        Self {
            action: action.into(),
            entity: entity.into(),
            entity_id: None,
            user_id: None,
            details: None,
            timestamp,
        }
    }

    pub fn with_entity_id(mut self, entity_id: impl ToString) -> Self {
        self.entity_id = Some(entity_id.to_string());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Filters shared by audit `list`, `count`; date bounds are inclusive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditLogFilter {
    pub entity: Option<String>,
    pub action: Option<String>,
    pub user_id: Option<String>,
    pub start: Option<i64>,
    pub end: Option<i64>,
}
