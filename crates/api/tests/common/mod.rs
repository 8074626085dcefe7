#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use gigsync_db::MemoryStore;
use gigsync_events::EventBus;
use gigsync_platforms::{default_registry, MockRemote};
use gigsync_workflow::{WorkflowConfig, WorkflowEngine};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use gigsync_api::config::ServerConfig;
use gigsync_api::router::build_app_router;
use gigsync_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// The full application router over a fresh in-memory store and the
/// built-in stand-in platforms.
///
/// The router is cheap to clone and every clone shares the same state.
pub fn build_test_app() -> Router {
    let registry = default_registry(Arc::new(MockRemote::new())).unwrap();
    let engine = Arc::new(WorkflowEngine::new(
        Arc::new(MemoryStore::new()),
        Arc::new(registry),
        Arc::new(EventBus::default()),
        WorkflowConfig::default(),
    ));
    build_app_router(AppState::new(engine, test_config()))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
