use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use opsdesk_cli::{build_router, AppState};
use opsdesk_core::policy::StaticAdminKeyPolicy;
use opsdesk_core_types::Sensitive;
use opsdesk_store::Database;
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN_KEY: &str = "http-test-key";

fn app_with(db: Database) -> Router {
    let policy =
        StaticAdminKeyPolicy::with_default_rules(Some(Sensitive::new(ADMIN_KEY.to_string())));
    build_router(AppState::new(db, policy))
}

fn app() -> Router {
    app_with(Database::open_in_memory().expect("in-memory store"))
}

async fn request_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request must be served");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("collect body");
    let json = serde_json::from_slice::<Value>(&body).expect("json body");
    (status, json)
}

fn post_command(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/command")
        .header("content-type", "application/json")
        .body(body.into())
        .expect("valid request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

#[tokio::test]
async fn test_create_and_list_users_over_http() {
    let app = app();

    let (status, created) = request_json(
        &app,
        post_command(
            json!({
                "entity": "users",
                "operation": "create",
                "data": {"username": "alice", "email": "alice@example.com"}
            })
            .to_string(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["username"], "alice");
    assert!(created["requestId"].as_str().unwrap().starts_with("cmd_"));
    assert!(created["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(created.get("error").is_none());

    let (status, listed) = request_json(
        &app,
        post_command(json!({"entity": "users", "operation": "list"}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["data"]["total"], 1);
}

#[tokio::test]
async fn test_status_codes_per_failure_class() {
    let app = app();

    let cases = [
        (json!({"entity": "users"}), StatusCode::BAD_REQUEST),
        (json!({"entity": "widgets", "operation": "list"}), StatusCode::NOT_FOUND),
        (json!({"entity": "system_config", "operation": "list"}), StatusCode::UNAUTHORIZED),
        (
            json!({"entity": "users", "operation": "get", "data": {"id": 42}}),
            StatusCode::BAD_REQUEST,
        ),
    ];

    for (body, expected) in cases {
        let (status, response) = request_json(&app, post_command(body.to_string())).await;
        assert_eq!(status, expected, "body {}", body);
        assert_eq!(response["success"], false);
        assert!(response["error"].is_string());
        assert!(response["requestId"].is_string());
    }
}

#[tokio::test]
async fn test_malformed_body_lists_details() {
    let app = app();
    let (status, response) = request_json(&app, post_command("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "Invalid request format");
    assert_eq!(response["details"][0]["code"], "invalid_json");

    let (status, response) = request_json(
        &app,
        post_command(json!({"entity": "users", "operation": ""}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["details"][0]["path"], json!(["operation"]));
}

#[tokio::test]
async fn test_fault_is_internal_server_error() {
    let db = Database::open_in_memory().unwrap();
    db.with_conn(|conn| {
        conn.execute_batch("DROP TABLE system_config").unwrap();
        Ok(())
    })
    .unwrap();
    let app = app_with(db);

    let (status, response) = request_json(
        &app,
        post_command(
            json!({"entity": "system_config", "operation": "list", "adminKey": ADMIN_KEY})
                .to_string(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["success"], false);
}

#[tokio::test]
async fn test_discovery_document() {
    let app = app();
    let (status, doc) = request_json(&app, get("/api/v1/command")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["success"], true);
    assert_eq!(doc["data"]["version"], "1.0.0");
    assert_eq!(doc["data"]["endpoints"]["command"], "POST /api/v1/command");
    assert_eq!(doc["data"]["supportedEntities"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_health_reports_store_state() {
    let app = app();
    let (status, health) = request_json(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["success"], true);
    assert_eq!(health["data"]["connected"], true);
    assert_eq!(health["data"]["initialized"], true);
    assert_eq!(health["data"]["migrationsApplied"], 1);
}

#[tokio::test]
async fn test_health_on_unmigrated_store_is_unavailable() {
    let db = Database::connect("sqlite::memory:").unwrap();
    let app = app_with(db);
    let (status, health) = request_json(&app, get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["data"]["connected"], true);
    assert_eq!(health["data"]["initialized"], false);
}

#[tokio::test]
async fn test_metrics_endpoint_counts_commands() {
    let app = app();
    request_json(
        &app,
        post_command(json!({"entity": "users", "operation": "count"}).to_string()),
    )
    .await;
    request_json(
        &app,
        post_command(json!({"entity": "widgets", "operation": "count"}).to_string()),
    )
    .await;

    let (status, metrics) = request_json(&app, get("/api/admin/monitoring/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["data"]["requestCount"], 2);
    assert_eq!(metrics["data"]["errorCount"], 1);
    assert_eq!(metrics["data"]["database"]["totalCommands"], 2);
    assert_eq!(metrics["data"]["database"]["successRate"], 50.0);
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("console.db").display());

    {
        let db = Database::connect(&url).unwrap();
        db.migrate().unwrap();
        let app = app_with(db);
        let (status, _) = request_json(
            &app,
            post_command(
                json!({
                    "entity": "users",
                    "operation": "create",
                    "data": {"username": "persisted", "email": "persisted@example.com"}
                })
                .to_string(),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let db = Database::connect(&url).unwrap();
    assert_eq!(db.migrate().unwrap(), 0);
    let app = app_with(db);
    let (_, counted) = request_json(
        &app,
        post_command(json!({"entity": "users", "operation": "count"}).to_string()),
    )
    .await;
    assert_eq!(counted["data"]["count"], 1);
}
