//! Screening configuration
//!
//! Loaded from YAML with serde defaults for every field, so a partial file
//! (or no file at all) yields a working configuration. A few environment
//! variables override the file for deployment:
//!
//! - `SCREENING_CONFIG`: path of the YAML file (default `config/screening.yaml`)
//! - `SCREENING_BIND_ADDR`: HTTP listen address
//! - `SCREENING_REFERENCE_PATH`: reference watchlist JSON

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, ScreeningError};
use crate::scoring::{Granularity, RiskAggregation, DEFAULT_SIMILARITY_THRESHOLD};

/// Default configuration path
pub const DEFAULT_CONFIG_PATH: &str = "config/screening.yaml";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    pub server: ServerConfig,
    pub reference: ReferenceConfig,
    pub scoring: ScoringConfig,
    pub spreadsheet: SpreadsheetConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Upper bound on the multipart request body
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Where the reference watchlists come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub path: PathBuf,
    /// Fill categories the file leaves empty from the static fallback lists
    pub fill_empty_from_fallback: bool,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/reference_data.json"),
            fill_empty_from_fallback: false,
        }
    }
}

/// Matching and aggregation behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub similarity_threshold: f32,
    pub granularity: Granularity,
    pub risk_aggregation: RiskAggregation,
    /// Ignore trailing legal forms (`LLC`, `Ltd`, `GmbH`) when matching exactly
    pub strip_legal_suffixes: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            granularity: Granularity::default(),
            risk_aggregation: RiskAggregation::default(),
            strip_legal_suffixes: false,
        }
    }
}

/// Column layout of uploaded transaction spreadsheets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadsheetConfig {
    pub transaction_id_column: String,
    /// Columns entities are extracted from, in output order
    pub entity_columns: Vec<String>,
    /// Evidence sources attached to every result
    pub supporting_evidence: Vec<String>,
}

impl Default for SpreadsheetConfig {
    fn default() -> Self {
        Self {
            transaction_id_column: "Transaction ID".to_string(),
            entity_columns: vec![
                "Payer Name".to_string(),
                "Receiver Name".to_string(),
                "Transaction Details".to_string(),
            ],
            supporting_evidence: vec!["OpenCorporates".to_string(), "Sanctions List".to_string()],
        }
    }
}

impl ScreeningConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: ScreeningConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration the way the binaries do: the file named by
    /// `SCREENING_CONFIG` (or the default path if it exists), then
    /// environment overrides.
    pub fn from_env() -> Result<Self> {
        let explicit = std::env::var("SCREENING_CONFIG").ok();
        let path = explicit
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if explicit.is_some() || Path::new(&path).exists() {
            info!(path = %path, "Loading configuration");
            Self::from_file(&path)?
        } else {
            info!("No configuration file found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `SCREENING_BIND_ADDR` / `SCREENING_REFERENCE_PATH`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("SCREENING_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Ok(path) = std::env::var("SCREENING_REFERENCE_PATH") {
            self.reference.path = PathBuf::from(path);
        }
    }

    /// Reject values the pipeline cannot honour
    pub fn validate(&self) -> Result<()> {
        let threshold = self.scoring.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ScreeningError::Config(format!(
                "similarity_threshold must be within [0, 1], got {threshold}"
            )));
        }
        if self.server.bind_addr.trim().is_empty() {
            return Err(ScreeningError::Config("server.bind_addr is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScreeningConfig::default();
        assert_eq!(config.scoring.similarity_threshold, 0.5);
        assert_eq!(config.scoring.granularity, Granularity::Row);
        assert_eq!(config.scoring.risk_aggregation, RiskAggregation::BestMatch);
        assert!(!config.scoring.strip_legal_suffixes);
        assert_eq!(config.spreadsheet.entity_columns.len(), 3);
        assert!(!config.reference.fill_empty_from_fallback);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ScreeningConfig::from_yaml(
            r#"
scoring:
  granularity: cell
  risk_aggregation: category_mean
  strip_legal_suffixes: true
reference:
  path: /tmp/watchlists.json
"#,
        )
        .unwrap();
        assert_eq!(config.scoring.granularity, Granularity::Cell);
        assert_eq!(config.scoring.risk_aggregation, RiskAggregation::CategoryMean);
        assert!(config.scoring.strip_legal_suffixes);
        assert_eq!(config.scoring.similarity_threshold, 0.5);
        assert_eq!(config.reference.path, PathBuf::from("/tmp/watchlists.json"));
        assert_eq!(config.server.bind_addr, "0.0.0.0:8000");
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let err = ScreeningConfig::from_yaml("scoring:\n  similarity_threshold: 1.5\n").unwrap_err();
        assert!(matches!(err, ScreeningError::Config(_)));
    }

    #[test]
    fn test_unparsable_yaml_rejected() {
        let err = ScreeningConfig::from_yaml("scoring: [not, a, map]").unwrap_err();
        assert!(matches!(err, ScreeningError::ConfigParse(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screening.yaml");
        std::fs::write(&path, "server:\n  bind_addr: 127.0.0.1:9000\n").unwrap();
        let config = ScreeningConfig::from_file(&path).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
    }
}
