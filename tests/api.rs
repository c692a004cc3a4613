//! Router-level tests that exercise validation and envelope behavior.
//! Nothing here talks to a MongoDB server; every request must be rejected
//! (or answered) before any store I/O would happen.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use mongoscope::app::routes::router;
use mongoscope::app::state::AppState;

async fn send(method: &str, path: &str, body: Option<Value>) -> (StatusCode, Option<String>, Value) {
    let app = router(AppState::new());
    let mut builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder.body(Body::from(value.to_string())).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let cache_control = response
        .headers()
        .get(header::CACHE_CONTROL)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    (status, cache_control, body)
}

async fn post(path: &str, body: Value) -> (StatusCode, Value) {
    let (status, _, body) = send("POST", path, Some(body)).await;
    (status, body)
}

fn error_of(body: &Value) -> String {
    assert_eq!(body["success"], json!(false));
    body["error"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn health_answers_and_disables_caching() {
    let (status, cache_control, body) = send("GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_control.as_deref(), Some("no-store"));
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["status"], json!("healthy"));
}

#[tokio::test]
async fn error_responses_also_disable_caching() {
    let (status, cache_control, body) =
        send("POST", "/api/databases/list", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(cache_control.as_deref(), Some("no-store"));
    assert!(!error_of(&body).is_empty());
}

#[tokio::test]
async fn missing_connection_string_is_rejected() {
    let (status, body) = post("/api/databases/list", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_of(&body).contains("connectionString"));
}

#[tokio::test]
async fn non_mongodb_scheme_is_rejected() {
    let (status, body) = post(
        "/api/databases/list",
        json!({"connectionString": "postgres://localhost:5432"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_of(&body).contains("mongodb://"));
}

#[tokio::test]
async fn empty_database_name_is_rejected_before_io() {
    let (status, body) = post(
        "/api/collections/list",
        json!({"connectionString": "mongodb://localhost:27017", "database": "  "}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_of(&body).contains("database"));
}

#[tokio::test]
async fn non_positive_limit_is_rejected() {
    let (status, body) = post(
        "/api/documents/list",
        json!({
            "connectionString": "mongodb://localhost:27017",
            "database": "app",
            "collection": "users",
            "limit": 0
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_of(&body).contains("limit"));
}

#[tokio::test]
async fn non_object_filter_is_rejected() {
    let (status, body) = post(
        "/api/documents/list",
        json!({
            "connectionString": "mongodb://localhost:27017",
            "database": "app",
            "collection": "users",
            "filter": "name = a"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_of(&body).contains("object"));
}

#[tokio::test]
async fn insert_requires_a_document() {
    let (status, body) = post(
        "/api/documents/insert",
        json!({
            "connectionString": "mongodb://localhost:27017",
            "database": "app",
            "collection": "users"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_of(&body).contains("document"));
}

#[tokio::test]
async fn update_requires_filter_and_update() {
    let (status, body) = post(
        "/api/documents/update",
        json!({
            "connectionString": "mongodb://localhost:27017",
            "database": "app",
            "collection": "users",
            "update": {"name": "b"}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_of(&body).contains("filter"));

    let (status, body) = post(
        "/api/documents/update",
        json!({
            "connectionString": "mongodb://localhost:27017",
            "database": "app",
            "collection": "users",
            "filter": {"name": "a"}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_of(&body).contains("update"));
}

#[tokio::test]
async fn delete_requires_a_filter() {
    let (status, body) = post(
        "/api/documents/delete",
        json!({
            "connectionString": "mongodb://localhost:27017",
            "database": "app",
            "collection": "users"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_of(&body).contains("filter"));
}

#[tokio::test]
async fn aggregation_requires_an_array_pipeline() {
    let (status, body) = post(
        "/api/aggregate",
        json!({
            "connectionString": "mongodb://localhost:27017",
            "database": "app",
            "collection": "users",
            "pipeline": {"$match": {}}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!error_of(&body).is_empty());

    let (status, body) = post(
        "/api/aggregate",
        json!({
            "connectionString": "mongodb://localhost:27017",
            "database": "app",
            "collection": "users"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_of(&body).contains("pipeline"));
}

#[tokio::test]
async fn unknown_export_format_is_rejected() {
    let (status, body) = post(
        "/api/documents/export",
        json!({
            "connectionString": "mongodb://localhost:27017",
            "database": "app",
            "collection": "users",
            "format": "xml"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_of(&body).contains("format"));
}

#[tokio::test]
async fn connection_list_starts_empty() {
    let (status, _, body) = send("GET", "/api/connections", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["connections"], json!([]));
}
