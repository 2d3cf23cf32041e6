//! Similarity matching and risk scoring
//!
//! Matching and reduction are separate steps: the matcher collects, per
//! scored cell, the best reference hit in every category; the aggregator
//! reduces those candidates to a confidence, a risk and a remark.

mod aggregate;
mod matcher;

pub use aggregate::{reduce_cells, reduce_row, CellAssessment};
pub use matcher::{CategoryIndex, CellMatches, SimilarityMatcher};

use serde::{Deserialize, Serialize};

use crate::reference::ReferenceCategory;

/// Minimum similarity for a reference hit to count
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;

/// Remark used when nothing matched
pub const NO_MATCH_REMARK: &str = "No match found in reference lists";

/// How candidates are reduced for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One assessment per row
    #[default]
    Row,
    /// Row assessment plus one assessment per scored cell
    Cell,
}

/// How the risk score is derived from the matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskAggregation {
    /// Best similarity times the weight of its category
    #[default]
    BestMatch,
    /// Mean over all four categories of (average similarity × weight)
    CategoryMean,
}

/// Best reference hit for one text within one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub entity: String,
    pub reference: String,
    pub category: ReferenceCategory,
    /// In [0, 1]
    pub similarity: f32,
}

/// Reduced scores for a row, a document or a single cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub confidence: f32,
    pub risk: f32,
    pub remark: String,
    pub best: Option<MatchResult>,
}

impl Assessment {
    /// Zero scores with the default remark
    pub fn no_match() -> Self {
        Self {
            confidence: 0.0,
            risk: 0.0,
            remark: NO_MATCH_REMARK.to_string(),
            best: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.best.is_some()
    }
}
