//! HTTP error responses.

use crate::capture::CameraError;
use crate::pipeline::SessionError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// An error returned to the client as `{"detail": ...}`.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.detail, "Internal API error");
        } else {
            tracing::warn!(status = %self.status, error = %self.detail, "API error");
        }

        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(value: SessionError) -> Self {
        match &value {
            SessionError::NotActive => ApiError::bad_request("Detection not active"),
            SessionError::Source(CameraError::Unsupported(_))
            | SessionError::Source(CameraError::DeviceNotFound(_))
            | SessionError::Source(CameraError::OpenFailed(_))
            | SessionError::Source(CameraError::ConfigFailed(_)) => {
                ApiError::bad_request(format!("Failed to open camera: {value}"))
            }
            SessionError::InvalidThresholds(_) => ApiError::bad_request(value.to_string()),
            SessionError::Source(_) => ApiError::internal(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::InvalidThresholds;
    use crate::capture::UnsupportedSource;

    #[test]
    fn test_session_errors_map_to_client_errors() {
        let err: ApiError = SessionError::NotActive.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.detail, "Detection not active");

        let err: ApiError =
            SessionError::Source(CameraError::from(UnsupportedSource("ip".into()))).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.detail.starts_with("Failed to open camera"));

        let err: ApiError =
            SessionError::InvalidThresholds(InvalidThresholds::Speed(-1.0)).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_release_failure_is_internal() {
        let err: ApiError =
            SessionError::Source(CameraError::ReleaseFailed("busy".into())).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
