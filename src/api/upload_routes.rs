//! Upload endpoint
//!
//! Multipart form fields:
//! - `excelFile`: transaction spreadsheet (xlsx/xls/ods or CSV)
//! - `txtFile`: UTF-8 text document
//!
//! Either or both may be present. The reference lists are reloaded from
//! disk for every request; screening runs on the blocking pool.

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument, Span};
use uuid::Uuid;

use super::{AppError, AppState};
use crate::error::ScreeningError;
use crate::ingest::{decode_text, parse_spreadsheet};
use crate::pipeline::{RowResult, ScreeningInput, SUCCESS_MESSAGE};
use crate::reference::{load_reference_data, StaticWatchlistSource};

/// Multipart field carrying the spreadsheet
pub const SPREADSHEET_FIELD: &str = "excelFile";
/// Multipart field carrying the text document
pub const DOCUMENT_FIELD: &str = "txtFile";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub results: Vec<RowResult>,
}

#[derive(Debug, Default)]
struct UploadedFiles {
    spreadsheet: Option<Bytes>,
    document: Option<(Option<String>, Bytes)>,
}

impl UploadedFiles {
    fn is_empty(&self) -> bool {
        self.spreadsheet.is_none() && self.document.is_none()
    }
}

async fn read_files(mut multipart: Multipart) -> Result<UploadedFiles, AppError> {
    let mut files = UploadedFiles::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        // Browsers send an empty part when no file was chosen
        if data.is_empty() && file_name.as_deref().map_or(true, str::is_empty) {
            continue;
        }

        match name.as_deref() {
            Some(SPREADSHEET_FIELD) => files.spreadsheet = Some(data),
            Some(DOCUMENT_FIELD) => files.document = Some((file_name.filter(|n| !n.is_empty()), data)),
            other => info!("Ignoring unexpected form field {:?}", other),
        }
    }

    Ok(files)
}

fn screen_files(state: &AppState, files: UploadedFiles) -> Result<Vec<RowResult>, ScreeningError> {
    let mut inputs = Vec::new();
    if let Some(bytes) = files.spreadsheet {
        let rows = parse_spreadsheet(&bytes)?;
        info!(rows = rows.len(), "Spreadsheet decoded");
        inputs.push(ScreeningInput::Spreadsheet(rows));
    }
    if let Some((name, bytes)) = files.document {
        let text = decode_text(&bytes)?;
        info!(chars = text.len(), name = ?name, "Document decoded");
        inputs.push(ScreeningInput::Document { text, name });
    }

    let mut reference = load_reference_data(&state.config.reference.path);
    if state.config.reference.fill_empty_from_fallback {
        let filled = reference.fill_empty_from(&StaticWatchlistSource);
        if !filled.is_empty() {
            info!(categories = ?filled, "Filled empty reference categories from fallback lists");
        }
    }

    Ok(state.pipeline.screen(&inputs, &reference))
}

/// POST /upload
pub async fn upload(
    State(state): State<AppState>,
    multipart: Option<Multipart>,
) -> Result<Json<UploadResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("upload", %request_id);

    async move {
        let Some(multipart) = multipart else {
            return Err(AppError::from(ScreeningError::NoInput));
        };
        let files = read_files(multipart).await?;
        if files.is_empty() {
            return Err(AppError::from(ScreeningError::NoInput));
        }

        let span = Span::current();
        let results = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            screen_files(&state, files)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Screening task failed: {e}")))??;

        info!(results = results.len(), "Upload processed");
        Ok::<_, AppError>(Json(UploadResponse {
            message: SUCCESS_MESSAGE.to_string(),
            results,
        }))
    }
    .instrument(span)
    .await
}
