//! Error types for the screening pipeline
//!
//! Only conditions the caller must act on are errors. Reference-data
//! failures and per-cell problems degrade to empty data or skipped cells
//! and never surface here.

use screen_embedding::EmbeddingError;
use thiserror::Error;

/// Fixed detail returned when an upload carries neither file
pub const NO_FILE_MESSAGE: &str = "No file part";

pub type Result<T> = std::result::Result<T, ScreeningError>;

/// Main error type for screening
#[derive(Error, Debug)]
pub enum ScreeningError {
    #[error("{}", NO_FILE_MESSAGE)]
    NoInput,

    #[error("Unsupported spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Uploaded text file is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScreeningError {
    /// True for errors caused by the uploaded input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NoInput | Self::Spreadsheet(_) | Self::Workbook(_) | Self::Csv(_) | Self::Encoding(_)
        )
    }
}
