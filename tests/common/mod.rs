use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use vocasnap_backend::db::Database;
use vocasnap_backend::routes;
use vocasnap_backend::services::ai_provider::{AiConfig, AiProvider};
use vocasnap_backend::state::AppState;

/// A router wired to a fresh temporary database and an unconfigured AI
/// provider. The directory lives as long as the app.
pub struct TestApp {
    pub router: Router,
    _tmp: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let tmp = TempDir::new().expect("create temp dir");
    let db_path = tmp.path().join("test.db");
    let db = Database::open(&db_path).await.expect("open test database");

    let ai = Arc::new(AiProvider::new(AiConfig::default()));
    let state = AppState::new(db, ai);

    TestApp {
        router: routes::router(state),
        _tmp: tmp,
    }
}

pub async fn get(app: &TestApp, path: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("build request");
    send(app, request).await
}

pub async fn post_json(
    app: &TestApp,
    path: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");
    send(app, request).await
}

pub async fn post_raw(
    app: &TestApp,
    path: &str,
    body: &str,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");
    send(app, request).await
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("route request");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is JSON")
    };
    (status, value)
}
