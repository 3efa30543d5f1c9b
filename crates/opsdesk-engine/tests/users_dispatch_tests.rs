// Users entity through the dispatcher: CRUD round trips, admin-gated delete,
// uniqueness and pagination bounds

mod common;

use common::{create_user, send, setup, ADMIN_KEY};
use opsdesk_core::model::{CommandStatus, NewUser};
use opsdesk_engine::ResponseClass;
use opsdesk_store::repo::UserRepo;
use serde_json::json;

#[tokio::test]
async fn test_create_then_get_returns_same_user() {
    let (dispatcher, _db) = setup();
    let created = create_user(&dispatcher, "alice").await;
    assert_eq!(created["username"], "alice");
    assert_eq!(created["role"], "user");
    assert_eq!(created["isActive"], true);

    let outcome = send(
        &dispatcher,
        json!({"entity": "users", "operation": "get", "data": {"id": created["id"]}}),
    )
    .await;
    assert_eq!(outcome.class, ResponseClass::Ok);
    assert_eq!(outcome.response.data.unwrap(), created);
}

#[tokio::test]
async fn test_update_changes_fields_and_updated_at() {
    let (dispatcher, _db) = setup();
    let created = create_user(&dispatcher, "bob").await;

    let outcome = send(
        &dispatcher,
        json!({
            "entity": "users",
            "operation": "update",
            "data": {"id": created["id"], "role": "admin", "isActive": false}
        }),
    )
    .await;
    assert!(outcome.response.success);

    let got = send(
        &dispatcher,
        json!({"entity": "users", "operation": "get", "data": {"id": created["id"]}}),
    )
    .await
    .response
    .data
    .unwrap();
    assert_eq!(got["role"], "admin");
    assert_eq!(got["isActive"], false);
    assert_eq!(got["username"], "bob");
    assert_eq!(got["createdAt"], created["createdAt"]);
    assert!(got["updatedAt"].as_str().unwrap() > created["updatedAt"].as_str().unwrap());
}

#[tokio::test]
async fn test_immediate_updates_always_advance_updated_at() {
    let (dispatcher, _db) = setup();
    for i in 0..20 {
        let created = create_user(&dispatcher, &format!("quick{}", i)).await;
        let updated = send(
            &dispatcher,
            json!({
                "entity": "users",
                "operation": "update",
                "data": {"id": created["id"], "role": "admin"}
            }),
        )
        .await
        .response
        .data
        .unwrap();
        assert!(
            updated["updatedAt"].as_str().unwrap() > created["updatedAt"].as_str().unwrap(),
            "updatedAt did not advance for quick{}",
            i
        );
    }
}

#[tokio::test]
async fn test_get_missing_user_is_not_found() {
    let (dispatcher, _db) = setup();
    let outcome = send(
        &dispatcher,
        json!({"entity": "users", "operation": "get", "data": {"id": 999}}),
    )
    .await;
    assert_eq!(outcome.class, ResponseClass::BadRequest);
    assert_eq!(outcome.status, CommandStatus::Failed);
    assert_eq!(outcome.response.error.as_deref(), Some("User not found"));
}

#[tokio::test]
async fn test_get_without_id_is_required() {
    let (dispatcher, _db) = setup();
    let outcome = send(&dispatcher, json!({"entity": "users", "operation": "get"})).await;
    assert_eq!(outcome.response.error.as_deref(), Some("User ID is required"));
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    let (dispatcher, _db) = setup();
    create_user(&dispatcher, "alice").await;

    let outcome = send(
        &dispatcher,
        json!({
            "entity": "users",
            "operation": "create",
            "data": {"username": "alice", "email": "other@example.com"}
        }),
    )
    .await;
    assert_eq!(outcome.class, ResponseClass::BadRequest);
    assert_eq!(
        outcome.response.error.as_deref(),
        Some("Username or email already exists")
    );
}

#[tokio::test]
async fn test_create_with_bad_email_is_invalid_user_data() {
    let (dispatcher, _db) = setup();
    let outcome = send(
        &dispatcher,
        json!({
            "entity": "users",
            "operation": "create",
            "data": {"username": "carol", "email": "not-an-email"}
        }),
    )
    .await;
    assert_eq!(outcome.response.error.as_deref(), Some("Invalid user data"));
}

#[tokio::test]
async fn test_delete_without_admin_key_leaves_user_in_place() {
    let (dispatcher, db) = setup();
    let created = create_user(&dispatcher, "dave").await;
    let id = created["id"].as_i64().unwrap();

    let outcome = send(
        &dispatcher,
        json!({"entity": "users", "operation": "delete", "data": {"id": id}}),
    )
    .await;
    assert_eq!(outcome.class, ResponseClass::Unauthorized);
    assert_eq!(outcome.status, CommandStatus::Unauthorized);
    assert_eq!(
        outcome.response.error.as_deref(),
        Some("Unauthorized: Invalid or missing admin key")
    );

    let wrong_key = send(
        &dispatcher,
        json!({"entity": "users", "operation": "delete", "data": {"id": id}, "adminKey": "nope"}),
    )
    .await;
    assert_eq!(wrong_key.class, ResponseClass::Unauthorized);

    let still_there = db.with_conn(|conn| UserRepo::get(conn, id)).unwrap();
    assert!(still_there.is_some());
}

#[tokio::test]
async fn test_delete_twice_reports_not_found() {
    let (dispatcher, _db) = setup();
    let created = create_user(&dispatcher, "erin").await;
    let body = json!({
        "entity": "users",
        "operation": "delete",
        "data": {"id": created["id"]},
        "adminKey": ADMIN_KEY
    });

    let first = send(&dispatcher, body.clone()).await;
    assert!(first.response.success);
    assert_eq!(
        first.response.data.unwrap()["message"],
        "User deleted successfully"
    );

    let second = send(&dispatcher, body).await;
    assert_eq!(second.class, ResponseClass::BadRequest);
    assert_eq!(second.response.error.as_deref(), Some("User not found"));
}

#[tokio::test]
async fn test_delete_without_id_is_required_for_deletion() {
    let (dispatcher, _db) = setup();
    let outcome = send(
        &dispatcher,
        json!({"entity": "users", "operation": "delete", "adminKey": ADMIN_KEY}),
    )
    .await;
    assert_eq!(
        outcome.response.error.as_deref(),
        Some("User ID is required for deletion")
    );
}

#[tokio::test]
async fn test_list_pagination_bounds() {
    let (dispatcher, db) = setup();
    db.with_conn(|conn| {
        for i in 0..150 {
            let user = NewUser {
                username: format!("user{:03}", i),
                email: format!("user{:03}@example.com", i),
                role: "user".to_string(),
            };
            UserRepo::insert(conn, &user, 1_000 + i)?;
        }
        Ok(())
    })
    .unwrap();

    let page = send(
        &dispatcher,
        json!({"entity": "users", "operation": "list", "data": {"limit": 100, "offset": 0}}),
    )
    .await;
    let data = page.response.data.unwrap();
    assert_eq!(data["users"].as_array().unwrap().len(), 100);
    assert_eq!(data["total"], 150);
    assert_eq!(data["limit"], 100);

    let tail = send(
        &dispatcher,
        json!({"entity": "users", "operation": "list", "data": {"limit": 100, "offset": 100}}),
    )
    .await;
    assert_eq!(
        tail.response.data.unwrap()["users"].as_array().unwrap().len(),
        50
    );

    for limit in [0, 101] {
        let outcome = send(
            &dispatcher,
            json!({"entity": "users", "operation": "list", "data": {"limit": limit}}),
        )
        .await;
        assert_eq!(
            outcome.response.error.as_deref(),
            Some("Invalid parameters for list operation"),
            "limit {}",
            limit
        );
    }
}

#[tokio::test]
async fn test_list_defaults_and_sorting() {
    let (dispatcher, _db) = setup();
    for name in ["charlie", "alice", "bob"] {
        create_user(&dispatcher, name).await;
    }

    let outcome = send(
        &dispatcher,
        json!({
            "entity": "users",
            "operation": "list",
            "data": {"sortBy": "username", "sortOrder": "asc"}
        }),
    )
    .await;
    let data = outcome.response.data.unwrap();
    assert_eq!(data["limit"], 10);
    assert_eq!(data["offset"], 0);
    let names: Vec<&str> = data["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alice", "bob", "charlie"]);
}

#[tokio::test]
async fn test_count_matches_rows() {
    let (dispatcher, _db) = setup();
    create_user(&dispatcher, "frank").await;
    create_user(&dispatcher, "grace").await;

    let outcome = send(&dispatcher, json!({"entity": "users", "operation": "count"})).await;
    assert_eq!(outcome.response.data.unwrap(), json!({"count": 2}));
}

#[tokio::test]
async fn test_unsupported_operation() {
    let (dispatcher, _db) = setup();
    let outcome = send(
        &dispatcher,
        json!({"entity": "users", "operation": "frobnicate"}),
    )
    .await;
    assert_eq!(outcome.class, ResponseClass::BadRequest);
    assert_eq!(
        outcome.response.error.as_deref(),
        Some("Unsupported operation: frobnicate")
    );
}
