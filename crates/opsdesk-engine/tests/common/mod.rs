#![allow(dead_code)]

use opsdesk_core::policy::StaticAdminKeyPolicy;
use opsdesk_core_types::Sensitive;
use opsdesk_engine::{CommandRegistry, DispatchOutcome, Dispatcher};
use opsdesk_store::Database;
use serde_json::{json, Value};

pub const ADMIN_KEY: &str = "test-admin-key";

/// Dispatcher over a fresh in-memory database with the standard handlers
pub fn setup() -> (Dispatcher, Database) {
    let db = Database::open_in_memory().unwrap();
    let registry = CommandRegistry::with_default_handlers(db.clone());
    let policy =
        StaticAdminKeyPolicy::with_default_rules(Some(Sensitive::new(ADMIN_KEY.to_string())));
    (Dispatcher::new(registry, policy, db.clone()), db)
}

pub async fn send(dispatcher: &Dispatcher, body: Value) -> DispatchOutcome {
    dispatcher.dispatch_value(body).await
}

pub async fn create_user(dispatcher: &Dispatcher, name: &str) -> Value {
    let outcome = send(
        dispatcher,
        json!({
            "entity": "users",
            "operation": "create",
            "data": {"username": name, "email": format!("{}@example.com", name)}
        }),
    )
    .await;
    assert!(outcome.response.success, "create failed: {:?}", outcome.response.error);
    outcome.response.data.unwrap()
}

pub fn command_log_rows(db: &Database) -> i64 {
    db.with_conn(|conn| {
        Ok(conn
            .query_row("SELECT COUNT(*) FROM api_commands", [], |row| row.get(0))
            .unwrap())
    })
    .unwrap()
}
