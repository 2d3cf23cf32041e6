//! REST API
//!
//! `POST /upload` screens an uploaded spreadsheet and/or text document;
//! `GET /health` is a liveness probe.

mod error;
pub mod upload_routes;

pub use error::AppError;
pub use upload_routes::UploadResponse;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    response::Json,
    routing::{get, post},
    Router,
};
use screen_embedding::Embedder;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::ScreeningConfig;
use crate::extraction::EntityRecognizer;
use crate::pipeline::ScreeningPipeline;

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: ScreeningPipeline,
    pub config: Arc<ScreeningConfig>,
}

impl AppState {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        recognizer: Arc<dyn EntityRecognizer>,
        config: ScreeningConfig,
    ) -> Self {
        Self {
            pipeline: ScreeningPipeline::new(embedder, recognizer, &config),
            config: Arc::new(config),
        }
    }
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.server.max_upload_bytes;

    Router::new()
        .route("/upload", post(upload_routes::upload))
        .route("/health", get(health))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_upload_bytes)),
        )
}
