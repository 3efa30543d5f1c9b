use super::params::{self, Data};
use super::{record_audit, USERS};
use opsdesk_core::errors::{ExError, ExErrorKind, OpsError};
use opsdesk_core::model::timestamp::now_millis;
use opsdesk_core::model::NewAuditEntry;
use opsdesk_store::repo::UserRepo;
use opsdesk_store::Database;
use serde_json::{json, Value};

/// CRUD over the `users` table
#[derive(Debug, Clone)]
pub struct UsersHandler {
    db: Database,
}

impl UsersHandler {
    pub const OPERATIONS: &'static [&'static str] =
        &["list", "get", "create", "update", "delete", "count"];

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
            "count" => self.count(data),
            other => Err(OpsError::unsupported(other).into()),
        }
    }

    fn list(&self, data: Data<'_>) -> Result<Value, ExError> {
        let p = params::UserListParams::parse(data)?;
        self.db.with_conn(|conn| {
            let page = UserRepo::list(conn, &p.filter, p.sort_by, p.sort_order, p.page)?;
            record_audit(
                conn,
                NewAuditEntry::new("list", USERS, now_millis())
                    .with_details(json!({"limit": page.limit, "offset": page.offset})),
            );
            Ok(json!({
                "users": page.items,
                "total": page.total,
                "limit": page.limit,
                "offset": page.offset,
            }))
        })
    }

    fn get(&self, data: Data<'_>) -> Result<Value, ExError> {
        let id = params::require_id(data, OpsError::required("User ID"))?;
        self.db.with_conn(|conn| {
            let user = UserRepo::get(conn, id)?.ok_or_else(|| OpsError::not_found("User"))?;
            record_audit(
                conn,
                NewAuditEntry::new("get", USERS, now_millis()).with_entity_id(id),
            );
            Ok(serde_json::to_value(user)?)
        })
    }

    fn create(&self, data: Data<'_>) -> Result<Value, ExError> {
        let new_user = params::new_user(data)?;
        self.db.with_conn(|conn| {
            let user = UserRepo::insert(conn, &new_user, now_millis()).map_err(uniqueness)?;
            record_audit(
                conn,
                NewAuditEntry::new("create", USERS, now_millis())
                    .with_entity_id(user.id)
                    .with_details(serde_json::to_value(&new_user)?),
            );
            Ok(serde_json::to_value(user)?)
        })
    }

    fn update(&self, data: Data<'_>) -> Result<Value, ExError> {
        let (id, patch) = params::user_patch(data)?;
        self.db.with_conn(|conn| {
            let user = UserRepo::update(conn, id, &patch, now_millis())
                .map_err(uniqueness)?
                .ok_or_else(|| OpsError::not_found("User"))?;
            record_audit(
                conn,
                NewAuditEntry::new("update", USERS, now_millis())
                    .with_entity_id(id)
                    .with_details(serde_json::to_value(&patch)?),
            );
            Ok(serde_json::to_value(user)?)
        })
    }

    fn delete(&self, data: Data<'_>) -> Result<Value, ExError> {
        let id = params::require_id(data, OpsError::required_for_deletion("User ID"))?;
        self.db.with_conn(|conn| {
            if !UserRepo::delete(conn, id)? {
                return Err(OpsError::not_found("User").into());
            }
            record_audit(
                conn,
                NewAuditEntry::new("delete", USERS, now_millis()).with_entity_id(id),
            );
            Ok(json!({"message": "User deleted successfully"}))
        })
    }

    fn count(&self, data: Data<'_>) -> Result<Value, ExError> {
        let filter = params::user_count_filter(data)?;
        self.db.with_conn(|conn| {
            let count = UserRepo::count(conn, &filter)?;
            record_audit(conn, NewAuditEntry::new("count", USERS, now_millis()));
            Ok(json!({"count": count}))
        })
    }
}

fn uniqueness(err: ExError) -> ExError {
    if err.kind() == ExErrorKind::AlreadyExists {
        OpsError::already_exists("Username or email").into()
    } else {
        err
    }
}
