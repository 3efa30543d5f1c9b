// system_config and audit_logs through the dispatcher

mod common;

use common::{create_user, send, setup, ADMIN_KEY};
use opsdesk_engine::ResponseClass;
use serde_json::json;

#[tokio::test]
async fn test_config_list_requires_admin_key() {
    let (dispatcher, _db) = setup();

    let denied = send(
        &dispatcher,
        json!({"entity": "system_config", "operation": "list"}),
    )
    .await;
    assert_eq!(denied.class, ResponseClass::Unauthorized);
    assert_eq!(denied.class.http_status(), 401);

    let allowed = send(
        &dispatcher,
        json!({"entity": "system_config", "operation": "list", "adminKey": ADMIN_KEY}),
    )
    .await;
    assert_eq!(allowed.class, ResponseClass::Ok);
    assert_eq!(allowed.response.data.unwrap()["configs"], json!([]));
}

#[tokio::test]
async fn test_config_create_get_by_key_and_duplicate() {
    let (dispatcher, _db) = setup();
    let create = json!({
        "entity": "system_config",
        "operation": "create",
        "adminKey": ADMIN_KEY,
        "data": {
            "configKey": "alerts",
            "configValue": {"email": true, "threshold": 5},
            "description": "Alert routing"
        }
    });

    let created = send(&dispatcher, create.clone()).await;
    assert!(created.response.success);
    let created = created.response.data.unwrap();
    assert_eq!(created["configKey"], "alerts");
    assert_eq!(created["configValue"]["threshold"], 5);

    let by_key = send(
        &dispatcher,
        json!({
            "entity": "system_config",
            "operation": "get_by_key",
            "adminKey": ADMIN_KEY,
            "data": {"configKey": "alerts"}
        }),
    )
    .await;
    assert_eq!(by_key.response.data.unwrap(), created);

    let duplicate = send(&dispatcher, create).await;
    assert_eq!(
        duplicate.response.error.as_deref(),
        Some("Config key already exists")
    );
}

#[tokio::test]
async fn test_config_get_by_key_missing_key() {
    let (dispatcher, _db) = setup();
    let outcome = send(
        &dispatcher,
        json!({"entity": "system_config", "operation": "get_by_key", "adminKey": ADMIN_KEY}),
    )
    .await;
    assert_eq!(outcome.response.error.as_deref(), Some("Config key is required"));
}

#[tokio::test]
async fn test_config_update_and_delete() {
    let (dispatcher, _db) = setup();
    let created = send(
        &dispatcher,
        json!({
            "entity": "system_config",
            "operation": "create",
            "adminKey": ADMIN_KEY,
            "data": {"configKey": "motd", "configValue": "hello"}
        }),
    )
    .await
    .response
    .data
    .unwrap();

    let updated = send(
        &dispatcher,
        json!({
            "entity": "system_config",
            "operation": "update",
            "adminKey": ADMIN_KEY,
            "data": {"id": created["id"], "configValue": ["a", "b"], "isActive": false}
        }),
    )
    .await
    .response
    .data
    .unwrap();
    assert_eq!(updated["configValue"], json!(["a", "b"]));
    assert_eq!(updated["isActive"], false);

    let body = json!({
        "entity": "system_config",
        "operation": "delete",
        "adminKey": ADMIN_KEY,
        "data": {"id": created["id"]}
    });
    let deleted = send(&dispatcher, body.clone()).await;
    assert_eq!(
        deleted.response.data.unwrap()["message"],
        "Config deleted successfully"
    );
    let again = send(&dispatcher, body).await;
    assert_eq!(again.response.error.as_deref(), Some("Config not found"));
}

#[tokio::test]
async fn test_mutations_are_audited() {
    let (dispatcher, _db) = setup();
    let user = create_user(&dispatcher, "alice").await;

    let logs = send(
        &dispatcher,
        json!({"entity": "audit_logs", "operation": "list", "data": {"entity": "users"}}),
    )
    .await
    .response
    .data
    .unwrap();
    let entries = logs["logs"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "create");
    assert_eq!(entries[0]["entityId"], user["id"].to_string());
    assert_eq!(entries[0]["details"]["username"], "alice");

    // Reading the audit trail does not add to it.
    let count = send(&dispatcher, json!({"entity": "audit_logs", "operation": "count"})).await;
    assert_eq!(count.response.data.unwrap(), json!({"count": 1}));
}

#[tokio::test]
async fn test_cleanup_requires_admin_key() {
    let (dispatcher, _db) = setup();
    let outcome = send(
        &dispatcher,
        json!({"entity": "audit_logs", "operation": "cleanup", "data": {"daysToKeep": 0}}),
    )
    .await;
    assert_eq!(outcome.class, ResponseClass::Unauthorized);
}

#[tokio::test]
async fn test_cleanup_with_zero_days_removes_everything() {
    let (dispatcher, _db) = setup();
    create_user(&dispatcher, "alice").await;
    create_user(&dispatcher, "bob").await;

    let outcome = send(
        &dispatcher,
        json!({
            "entity": "audit_logs",
            "operation": "cleanup",
            "adminKey": ADMIN_KEY,
            "data": {"daysToKeep": 0}
        }),
    )
    .await;
    let data = outcome.response.data.unwrap();
    assert_eq!(data["deletedCount"], 2);
    assert_eq!(data["message"], "Cleaned up 2 old audit logs");

    let count = send(&dispatcher, json!({"entity": "audit_logs", "operation": "count"})).await;
    assert_eq!(count.response.data.unwrap(), json!({"count": 0}));
}

#[tokio::test]
async fn test_cleanup_default_keeps_recent_entries() {
    let (dispatcher, _db) = setup();
    create_user(&dispatcher, "alice").await;

    let outcome = send(
        &dispatcher,
        json!({"entity": "audit_logs", "operation": "cleanup", "adminKey": ADMIN_KEY}),
    )
    .await;
    assert_eq!(outcome.response.data.unwrap()["deletedCount"], 0);
}

#[tokio::test]
async fn test_cleanup_negative_days_is_invalid() {
    let (dispatcher, _db) = setup();
    let outcome = send(
        &dispatcher,
        json!({
            "entity": "audit_logs",
            "operation": "cleanup",
            "adminKey": ADMIN_KEY,
            "data": {"daysToKeep": -1}
        }),
    )
    .await;
    assert_eq!(
        outcome.response.error.as_deref(),
        Some("Invalid parameters for cleanup operation")
    );
}
