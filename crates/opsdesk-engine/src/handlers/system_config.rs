use super::params::{self, Data};
use super::{record_audit, SYSTEM_CONFIG};
use opsdesk_core::errors::{ExError, ExErrorKind, OpsError};
use opsdesk_core::model::timestamp::now_millis;
use opsdesk_core::model::NewAuditEntry;
use opsdesk_store::repo::SystemConfigRepo;
use opsdesk_store::Database;
use serde_json::{json, Value};

/// CRUD over `system_config`, plus lookup by key
#[derive(Debug, Clone)]
pub struct SystemConfigHandler {
    db: Database,
}

impl SystemConfigHandler {
    pub const OPERATIONS: &'static [&'static str] =
        &["list", "get", "create", "update", "delete", "get_by_key"];

    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub(super) fn handle(&self, operation: &str, data: Data<'_>) -> Result<Value, ExError> {
        match operation {
            "list" => self.list(data),
            "get" => self.get(data),
            "create" => self.create(data),
            "update" => self.update(data),
            "delete" => self.delete(data),
            "get_by_key" => self.get_by_key(data),
            other => Err(OpsError::unsupported(other).into()),
        }
    }

    fn list(&self, data: Data<'_>) -> Result<Value, ExError> {
        let p = params::ConfigListParams::parse(data)?;
        self.db.with_conn(|conn| {
            let page = SystemConfigRepo::list(conn, &p.filter, p.page)?;
            record_audit(
                conn,
                NewAuditEntry::new("list", SYSTEM_CONFIG, now_millis())
                    .with_details(json!({"limit": page.limit, "offset": page.offset})),
            );
            Ok(json!({
                "configs": page.items,
                "total": page.total,
                "limit": page.limit,
                "offset": page.offset,
            }))
        })
    }

    fn get(&self, data: Data<'_>) -> Result<Value, ExError> {
        let id = params::require_id(data, OpsError::required("Config ID"))?;
        self.db.with_conn(|conn| {
            let config =
                SystemConfigRepo::get(conn, id)?.ok_or_else(|| OpsError::not_found("Config"))?;
            record_audit(
                conn,
                NewAuditEntry::new("get", SYSTEM_CONFIG, now_millis()).with_entity_id(id),
            );
            Ok(serde_json::to_value(config)?)
        })
    }

    fn get_by_key(&self, data: Data<'_>) -> Result<Value, ExError> {
        let key = params::require_str(data, "configKey", OpsError::required("Config key"))?;
        self.db.with_conn(|conn| {
            let config = SystemConfigRepo::get_by_key(conn, key)?
                .ok_or_else(|| OpsError::not_found("Config"))?;
            record_audit(
                conn,
                NewAuditEntry::new("get_by_key", SYSTEM_CONFIG, now_millis())
                    .with_details(json!({"configKey": key})),
            );
            Ok(serde_json::to_value(config)?)
        })
    }

    fn create(&self, data: Data<'_>) -> Result<Value, ExError> {
        let new_config = params::new_config(data)?;
        self.db.with_conn(|conn| {
            let config =
                SystemConfigRepo::insert(conn, &new_config, now_millis()).map_err(uniqueness)?;
            record_audit(
                conn,
                NewAuditEntry::new("create", SYSTEM_CONFIG, now_millis())
                    .with_entity_id(config.id)
                    .with_details(serde_json::to_value(&new_config)?),
            );
            Ok(serde_json::to_value(config)?)
        })
    }

    fn update(&self, data: Data<'_>) -> Result<Value, ExError> {
        let (id, patch) = params::config_patch(data)?;
        self.db.with_conn(|conn| {
            let config = SystemConfigRepo::update(conn, id, &patch, now_millis())?
                .ok_or_else(|| OpsError::not_found("Config"))?;
            record_audit(
                conn,
                NewAuditEntry::new("update", SYSTEM_CONFIG, now_millis())
                    .with_entity_id(id)
                    .with_details(serde_json::to_value(&patch)?),
            );
            Ok(serde_json::to_value(config)?)
        })
    }

    fn delete(&self, data: Data<'_>) -> Result<Value, ExError> {
        let id = params::require_id(data, OpsError::required_for_deletion("Config ID"))?;
        self.db.with_conn(|conn| {
            if !SystemConfigRepo::delete(conn, id)? {
                return Err(OpsError::not_found("Config").into());
            }
            record_audit(
                conn,
                NewAuditEntry::new("delete", SYSTEM_CONFIG, now_millis()).with_entity_id(id),
            );
            Ok(json!({"message": "Config deleted successfully"}))
        })
    }
}

fn uniqueness(err: ExError) -> ExError {
    if err.kind() == ExErrorKind::AlreadyExists {
        OpsError::already_exists("Config key").into()
    } else {
        err
    }
}
