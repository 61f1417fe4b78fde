/// HTTP surface tests driven straight through the router
/// (axum + tower::ServiceExt, no TCP).
use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::RwLock;
use tower::ServiceExt;

use boardhost::api::ApiServer;
use boardhost::backend::local::LocalBackend;
use boardhost::config::{GlobalConfig, IntegrationMode};
use boardhost::registry::InstanceRegistry;

fn test_router(base: &TempDir) -> Router {
    let config = GlobalConfig {
        base_dir: Some(base.path().to_path_buf()),
        ..GlobalConfig::default()
    };
    let backend = Arc::new(LocalBackend::detect(IntegrationMode::Ingesting));
    let registry = Arc::new(RwLock::new(InstanceRegistry::new(&config, backend)));
    ApiServer::new(registry, "127.0.0.1:0").router()
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (u16, serde_json::Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let req = builder.body(body).unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status().as_u16();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 64).await.unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_board_api_roundtrip() {
    let base = TempDir::new().unwrap();
    std::fs::create_dir(base.path().join("run-a")).unwrap();
    std::fs::write(base.path().join("run-a/events.log"), b"data").unwrap();
    let app = test_router(&base);

    // POST /api/boards → first instance gets name "1"
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/boards",
        Some(json!({ "logdir": "run-a" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], "1");
    assert_eq!(body["reload_interval"], 30);
    assert_eq!(body["data_files"], 1);
    assert!(body["logdir"].as_str().unwrap().ends_with("run-a"));

    println!("  ✓ POST /api/boards → 200, name \"1\"");

    // same logdir → same instance, even with a different interval
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/boards",
        Some(json!({ "logdir": "run-a", "reload_interval": 5 })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], "1");
    assert_eq!(body["reload_interval"], 30);

    println!("  ✓ POST same logdir → reused instance, original interval kept");

    // second logdir → name "2"
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/boards",
        Some(json!({ "logdir": "run-b" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], "2");

    // GET /api/boards lists both, ordered by name
    let (status, body) = send_json(&app, "GET", "/api/boards", None).await;
    assert_eq!(status, 200);
    let boards = body["boards"].as_array().unwrap();
    assert_eq!(boards.len(), 2);
    assert_eq!(boards[0]["name"], "1");
    assert_eq!(boards[1]["name"], "2");

    println!("  ✓ GET /api/boards → 2 boards");

    // GET /api/board/:name
    let (status, body) = send_json(&app, "GET", "/api/board/1", None).await;
    assert_eq!(status, 200);
    assert!(body["logdir"].as_str().unwrap().ends_with("run-a"));

    // DELETE /api/board/:name
    let (status, body) = send_json(&app, "DELETE", "/api/board/1", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    let (status, _) = send_json(&app, "GET", "/api/board/1", None).await;
    assert_eq!(status, 404);

    println!("  ✓ DELETE /api/board/1 → gone");

    // freed name is reused by the next creation
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/boards",
        Some(json!({ "logdir": "run-c" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], "1");

    println!("  ✓ POST /api/boards → freed name \"1\" reused");
}

#[tokio::test]
async fn test_delete_unknown_board() {
    let base = TempDir::new().unwrap();
    let app = test_router(&base);

    let (status, body) = send_json(&app, "DELETE", "/api/board/7", None).await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "INSTANCE_NOT_FOUND");

    // registry is untouched
    let (status, body) = send_json(&app, "GET", "/api/boards", None).await;
    assert_eq!(status, 200);
    assert!(body["boards"].as_array().unwrap().is_empty());

    println!("  ✓ DELETE unknown board → 404 INSTANCE_NOT_FOUND");
}

#[tokio::test]
async fn test_delete_accepts_force_param() {
    let base = TempDir::new().unwrap();
    let app = test_router(&base);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/boards",
        Some(json!({ "logdir": "run-a" })),
    )
    .await;
    assert_eq!(status, 200);

    // force=false is accepted; termination behaves the same
    let (status, body) = send_json(&app, "DELETE", "/api/board/1?force=false", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    println!("  ✓ DELETE with force=false → accepted");
}

#[tokio::test]
async fn test_create_rejects_bad_logdir() {
    let base = TempDir::new().unwrap();
    std::fs::write(base.path().join("file"), b"not a dir").unwrap();
    let app = test_router(&base);

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/boards",
        Some(json!({ "logdir": "file" })),
    )
    .await;
    assert_eq!(status, 500);
    assert_eq!(body["error_code"], "BACKEND_ERROR");

    // nothing was inserted
    let (_, body) = send_json(&app, "GET", "/api/boards", None).await;
    assert!(body["boards"].as_array().unwrap().is_empty());

    println!("  ✓ POST with non-directory logdir → BACKEND_ERROR, registry unchanged");
}
