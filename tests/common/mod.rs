#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use driver_safety::api::{router, AppState};
use driver_safety::capture::CaptureConfig;
use driver_safety::metrics::MetricsRegistry;
use driver_safety::{FileConfig, Session};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

pub struct TestApp {
    pub app: Router,
    pub session: Arc<Session>,
}

/// Small frames and millisecond pacing so tests run quickly.
pub fn fast_config() -> FileConfig {
    let mut config = FileConfig::default();
    config.capture = CaptureConfig::with_dimensions(64, 48);
    config.detection.cycle_interval_ms = 5;
    config.detection.no_source_interval_ms = 5;
    config.detection.error_backoff_ms = 5;
    config.detection.stop_timeout_ms = 2000;
    config.stream.frame_interval_ms = 5;
    config
}

pub fn test_app() -> TestApp {
    app_with(&fast_config())
}

pub fn app_with(config: &FileConfig) -> TestApp {
    let metrics = Arc::new(MetricsRegistry::new().expect("metrics registry"));
    let session = Arc::new(Session::new(config).with_metrics(Arc::clone(&metrics)));
    let app = router(AppState::new(Arc::clone(&session), Some(metrics)));
    TestApp { app, session }
}

pub async fn request(app: &Router, method: Method, path: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(path);

    let req = if let Some(payload) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("empty body")
    };

    app.clone().oneshot(req).await.expect("oneshot response")
}

pub async fn response_json(resp: Response) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body bytes");

    let json = if bytes.is_empty() {
        serde_json::json!({})
    } else {
        serde_json::from_slice::<Value>(&bytes).expect("parse json body")
    };

    (status, json)
}

pub async fn get_json(app: &Router, path: &str) -> (StatusCode, Value) {
    response_json(request(app, Method::GET, path, None).await).await
}

pub async fn post_json(app: &Router, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    response_json(request(app, Method::POST, path, body).await).await
}
