//! HTTP control surface.
//!
//! | Route | Method | Effect |
//! |-------|--------|--------|
//! | `/` | GET | service banner |
//! | `/health` | GET | liveness plus whether detection runs |
//! | `/start_detection` | POST | open a source and start the loop |
//! | `/stop_detection` | POST | stop the loop (idempotent) |
//! | `/status` | GET | session status and thresholds |
//! | `/alerts` | GET | latest alert, read once |
//! | `/update_thresholds` | POST | change thresholds live |
//! | `/video_feed` | GET | MJPEG stream of the latest frame |
//! | `/metrics` | GET | Prometheus text |

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{AlertResponse, StartRequest, ThresholdRequest};

use crate::metrics::MetricsRegistry;
use crate::pipeline::Session;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

/// Errors that can occur while serving the API.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
    pub metrics: Option<Arc<MetricsRegistry>>,
}

impl AppState {
    pub fn new(session: Arc<Session>, metrics: Option<Arc<MetricsRegistry>>) -> Self {
        Self { session, metrics }
    }
}

/// Builds the router with permissive CORS.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/start_detection", post(routes::start_detection))
        .route("/stop_detection", post(routes::stop_detection))
        .route("/status", get(routes::status))
        .route("/alerts", get(routes::alerts))
        .route("/update_thresholds", post(routes::update_thresholds))
        .route("/video_feed", get(routes::video_feed))
        .route("/metrics", get(routes::metrics))
        .layer(cors)
        .with_state(state)
}

/// HTTP server for the control surface.
pub struct ApiServer {
    bind_addr: SocketAddr,
    state: AppState,
}

impl ApiServer {
    pub fn new(bind_addr: SocketAddr, state: AppState) -> Self {
        Self { bind_addr, state }
    }

    /// Serves until `shutdown` resolves, then drains open connections.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state);
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;

        tracing::info!(addr = %self.bind_addr, "API server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        Ok(())
    }
}
