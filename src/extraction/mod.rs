//! Entity extraction
//!
//! Pulls candidate entity spans and a coarse label out of free text or a
//! spreadsheet cell. The recognizer is a trait so the pattern-based
//! default can be swapped for a model-backed one without touching the
//! pipeline.

mod recognizer;

pub use recognizer::PatternRecognizer;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ingest::CellValue;

/// Coarse entity label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    Org,
    Person,
    /// Countries, cities, jurisdictions
    Gpe,
    Money,
    Date,
    Cardinal,
}

impl EntityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Org => "ORG",
            Self::Person => "PERSON",
            Self::Gpe => "GPE",
            Self::Money => "MONEY",
            Self::Date => "DATE",
            Self::Cardinal => "CARDINAL",
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognized span in the source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub text: String,
    pub label: EntityLabel,
    /// Byte offset of the span start
    pub start: usize,
    /// Byte offset of the span end (exclusive)
    pub end: usize,
}

/// Which labels survive extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Free-text documents: organisations and people only
    Document,
    /// Spreadsheet cells: every label
    Cell,
}

impl ExtractionMode {
    pub fn accepts(&self, label: EntityLabel) -> bool {
        match self {
            Self::Document => matches!(label, EntityLabel::Org | EntityLabel::Person),
            Self::Cell => true,
        }
    }
}

/// Named-entity recognizer
///
/// Implementations are constructed once and shared read-only across
/// requests. Spans are returned in source order.
pub trait EntityRecognizer: Send + Sync {
    /// Identifier for logs
    fn name(&self) -> &str;

    /// Recognize every span the backend knows a label for
    fn recognize(&self, text: &str) -> Vec<ExtractedEntity>;
}

/// Extract entities from text, keeping the labels `mode` allows.
///
/// Empty or whitespace-only input yields no entities.
pub fn extract_entities(
    recognizer: &dyn EntityRecognizer,
    text: &str,
    mode: ExtractionMode,
) -> Vec<ExtractedEntity> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    recognizer
        .recognize(text)
        .into_iter()
        .filter(|e| mode.accepts(e.label))
        .collect()
}

/// Extract entities from a spreadsheet cell, coercing non-text values to
/// their string form first.
pub fn extract_from_cell(recognizer: &dyn EntityRecognizer, value: &CellValue) -> Vec<ExtractedEntity> {
    extract_entities(recognizer, &value.to_string(), ExtractionMode::Cell)
}
