//! Route handlers.

use super::error::ApiError;
use super::AppState;
use crate::analysis::Alert;
use crate::capture::SourceDescriptor;
use crate::pipeline::stream::CONTENT_TYPE as MJPEG_CONTENT_TYPE;
use crate::pipeline::{SessionStatus, StartOutcome};
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StartRequest {
    pub camera_url: String,
    pub camera_type: String,
}

impl Default for StartRequest {
    fn default() -> Self {
        Self {
            camera_url: String::new(),
            camera_type: "phone".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ThresholdRequest {
    pub drowsiness_threshold: f64,
    pub speed_threshold: f64,
}

#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub has_alert: bool,
    pub alert: Option<Alert>,
}

fn message(text: &str) -> Json<serde_json::Value> {
    Json(json!({ "message": text }))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(value)| value).map_err(|e| ApiError {
        status: e.status(),
        detail: e.body_text(),
    })
}

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Driver Safety Detection API",
        "status": "running",
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "detection_active": state.session.is_active(),
    }))
}

pub async fn start_detection(
    State(state): State<AppState>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body(payload)?;
    let source = SourceDescriptor::from_request(&request.camera_type, &request.camera_url)
        .map_err(|e| ApiError::bad_request(format!("Failed to open camera: {e}")))?;

    match state.session.start(&source).await? {
        StartOutcome::AlreadyActive => Ok(message("Detection already active")),
        StartOutcome::Started => {
            tracing::info!(camera_type = %request.camera_type, %source, "Detection started");
            Ok(message("Detection started successfully"))
        }
    }
}

pub async fn stop_detection(State(state): State<AppState>) -> impl IntoResponse {
    state.session.stop().await;
    message("Detection stopped successfully")
}

pub async fn status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.session.status())
}

pub async fn alerts(State(state): State<AppState>) -> Json<AlertResponse> {
    let alert = state.session.take_alert();
    Json(AlertResponse {
        has_alert: alert.is_some(),
        alert,
    })
}

pub async fn update_thresholds(
    State(state): State<AppState>,
    payload: Result<Json<ThresholdRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body(payload)?;
    state
        .session
        .update_thresholds(request.drowsiness_threshold, request.speed_threshold)?;
    Ok(message("Thresholds updated successfully"))
}

pub async fn video_feed(State(state): State<AppState>) -> Result<Response, ApiError> {
    let stream = state.session.frame_stream().await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, MJPEG_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::internal(e.to_string()))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let Some(registry) = state.metrics.as_ref() else {
        return (StatusCode::NOT_FOUND, "metrics disabled").into_response();
    };

    match registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            output,
        )
            .into_response(),
        Err(e) => ApiError::internal(format!("Failed to encode metrics: {e}")).into_response(),
    }
}
