use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::ScreeningError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

/// Handler error, rendered as `{"detail": ...}`
#[derive(Debug)]
pub enum AppError {
    Screening(ScreeningError),
    BadRequest(String),
    Internal(String),
}

impl From<ScreeningError> for AppError {
    fn from(e: ScreeningError) -> Self {
        Self::Screening(e)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Screening(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Screening(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::Screening(e) => e.to_string(),
            Self::BadRequest(msg) | Self::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();
        if status.is_server_error() {
            error!("Upload failed: {}", detail);
        } else {
            warn!("Upload rejected: {}", detail);
        }
        (status, Json(ErrorResponse { detail })).into_response()
    }
}
