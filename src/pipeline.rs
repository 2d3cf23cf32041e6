//! Screening pipeline
//!
//! One pipeline drives both input modes:
//!
//! - spreadsheet rows: entities come from the designated columns (cell
//!   mode), scores come from every text cell of the row
//! - documents: entities come from the whole text (document mode), each
//!   entity becomes a pseudo-column `"<LABEL> <n>"` that is scored
//!
//! Reference embeddings are built once per call to [`ScreeningPipeline::screen`]
//! and shared by every row of that call.

use std::sync::Arc;

use screen_embedding::Embedder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ScoringConfig, ScreeningConfig, SpreadsheetConfig};
use crate::extraction::{extract_entities, extract_from_cell, EntityRecognizer, ExtractedEntity, ExtractionMode};
use crate::ingest::TransactionRow;
use crate::reference::ReferenceData;
use crate::scoring::{
    reduce_cells, reduce_row, Assessment, CategoryIndex, CellAssessment, Granularity, SimilarityMatcher,
};

/// Message accompanying a completed screening
pub const SUCCESS_MESSAGE: &str = "Files uploaded and processed successfully";

/// What to screen
#[derive(Debug, Clone, PartialEq)]
pub enum ScreeningInput {
    /// Decoded spreadsheet rows, scored one result per row
    Spreadsheet(Vec<TransactionRow>),
    /// Free text, scored as a single result
    Document { text: String, name: Option<String> },
}

/// Per-cell breakdown reported in cell granularity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellScore {
    #[serde(rename = "Column")]
    pub column: String,
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Confidence Score")]
    pub confidence_score: f32,
    #[serde(rename = "Risk Score")]
    pub risk_score: f32,
    #[serde(rename = "Remark")]
    pub remark: String,
}

impl From<CellAssessment> for CellScore {
    fn from(cell: CellAssessment) -> Self {
        Self {
            column: cell.column,
            text: cell.text,
            confidence_score: cell.assessment.confidence,
            risk_score: cell.assessment.risk,
            remark: cell.assessment.remark,
        }
    }
}

/// Screening result for one row or one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowResult {
    #[serde(rename = "Transaction ID")]
    pub transaction_id: Option<String>,
    /// Comma-joined entity text
    #[serde(rename = "Extracted Entity")]
    pub extracted_entity: String,
    /// Comma-joined labels, aligned with `extracted_entity`
    #[serde(rename = "Entity Type")]
    pub entity_type: String,
    #[serde(rename = "Supporting Evidence")]
    pub supporting_evidence: Vec<String>,
    #[serde(rename = "Confidence Score")]
    pub confidence_score: f32,
    #[serde(rename = "Risk Score")]
    pub risk_score: f32,
    #[serde(rename = "Remark")]
    pub remark: String,
    #[serde(rename = "Cell Scores", default, skip_serializing_if = "Vec::is_empty")]
    pub cell_scores: Vec<CellScore>,
}

/// Extraction, matching and aggregation over injected backends
#[derive(Clone)]
pub struct ScreeningPipeline {
    embedder: Arc<dyn Embedder>,
    recognizer: Arc<dyn EntityRecognizer>,
    scoring: ScoringConfig,
    spreadsheet: SpreadsheetConfig,
}

impl ScreeningPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        recognizer: Arc<dyn EntityRecognizer>,
        config: &ScreeningConfig,
    ) -> Self {
        Self {
            embedder,
            recognizer,
            scoring: config.scoring.clone(),
            spreadsheet: config.spreadsheet.clone(),
        }
    }

    /// Override the configured granularity
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.scoring.granularity = granularity;
        self
    }

    /// Embed a reference snapshot
    pub fn index(&self, reference: &ReferenceData) -> CategoryIndex {
        let index = CategoryIndex::build(self.embedder.as_ref(), reference, self.scoring.strip_legal_suffixes);
        debug!(
            "Indexed {} of {} reference strings with {}",
            index.len(),
            reference.len(),
            self.embedder.model_name()
        );
        index
    }

    /// Screen every input against one reference snapshot.
    ///
    /// Results keep input order: all rows of a spreadsheet in row order,
    /// one result per document.
    pub fn screen(&self, inputs: &[ScreeningInput], reference: &ReferenceData) -> Vec<RowResult> {
        let index = self.index(reference);
        let mut results = Vec::new();
        for input in inputs {
            match input {
                ScreeningInput::Spreadsheet(rows) => results.extend(self.screen_rows(rows, &index)),
                ScreeningInput::Document { text, name } => {
                    results.push(self.screen_document(text, name.as_deref(), &index))
                }
            }
        }
        info!(
            inputs = inputs.len(),
            results = results.len(),
            matched = results.iter().filter(|r| r.confidence_score > 0.0).count(),
            "Screening complete"
        );
        results
    }

    pub fn screen_rows(&self, rows: &[TransactionRow], index: &CategoryIndex) -> Vec<RowResult> {
        rows.iter().map(|row| self.screen_row(row, index)).collect()
    }

    /// Screen one spreadsheet row
    pub fn screen_row(&self, row: &TransactionRow, index: &CategoryIndex) -> RowResult {
        // 1. Entities from the designated columns; missing columns are empty
        let entities: Vec<ExtractedEntity> = self
            .spreadsheet
            .entity_columns
            .iter()
            .filter_map(|column| row.get(column))
            .flat_map(|value| extract_from_cell(self.recognizer.as_ref(), value))
            .collect();

        // 2. Identifier, then scores over every text cell
        let transaction_id = row
            .get(&self.spreadsheet.transaction_id_column)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string());

        self.assemble(transaction_id, &entities, row.text_cells(), index)
    }

    /// Screen a free-text document as a single result
    pub fn screen_document(&self, text: &str, name: Option<&str>, index: &CategoryIndex) -> RowResult {
        let mut entities = extract_entities(self.recognizer.as_ref(), text, ExtractionMode::Document);
        let mut seen = std::collections::HashSet::new();
        entities.retain(|e| seen.insert(e.text.clone()));

        let columns: Vec<(String, &str)> = entities
            .iter()
            .enumerate()
            .map(|(n, e)| (format!("{} {}", e.label, n + 1), e.text.as_str()))
            .collect();

        self.assemble(
            name.map(str::to_string),
            &entities,
            columns.iter().map(|(column, text)| (column.as_str(), *text)),
            index,
        )
    }

    fn assemble<'c>(
        &self,
        transaction_id: Option<String>,
        entities: &[ExtractedEntity],
        cells: impl IntoIterator<Item = (&'c str, &'c str)>,
        index: &CategoryIndex,
    ) -> RowResult {
        let matcher = SimilarityMatcher::new(self.embedder.as_ref(), index, self.scoring.similarity_threshold);
        let matches = matcher.match_cells(cells);

        let aggregation = self.scoring.risk_aggregation;
        let Assessment {
            confidence,
            risk,
            remark,
            ..
        } = reduce_row(&matches, aggregation);

        let cell_scores = match self.scoring.granularity {
            Granularity::Row => Vec::new(),
            Granularity::Cell => reduce_cells(&matches, aggregation)
                .into_iter()
                .map(CellScore::from)
                .collect(),
        };

        RowResult {
            transaction_id,
            extracted_entity: join(entities.iter().map(|e| e.text.as_str())),
            entity_type: join(entities.iter().map(|e| e.label.as_str())),
            supporting_evidence: self.spreadsheet.supporting_evidence.clone(),
            confidence_score: confidence,
            risk_score: risk,
            remark,
            cell_scores,
        }
    }
}

fn join<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::PatternRecognizer;
    use crate::ingest::CellValue;
    use crate::reference::{ReferenceCategory, StaticWatchlistSource};
    use crate::scoring::{RiskAggregation, NO_MATCH_REMARK};
    use screen_embedding::HashingEmbedder;

    fn pipeline(config: &ScreeningConfig) -> ScreeningPipeline {
        ScreeningPipeline::new(
            Arc::new(HashingEmbedder::default()),
            Arc::new(PatternRecognizer::new()),
            config,
        )
    }

    fn fallback_reference() -> ReferenceData {
        let mut data = ReferenceData::default();
        data.fill_empty_from(&StaticWatchlistSource);
        data
    }

    fn rows() -> Vec<TransactionRow> {
        vec![
            TransactionRow::new(vec![
                ("Transaction ID".into(), CellValue::Text("TXN001".into())),
                ("Payer Name".into(), CellValue::Text("John Smith".into())),
                ("Receiver Name".into(), CellValue::Text("Alas Chiricanas".into())),
                ("Transaction Details".into(), CellValue::Text("Wire transfer".into())),
                ("Amount".into(), CellValue::Number(5_000_000.0)),
            ]),
            TransactionRow::from_pairs([
                ("Transaction ID", "TXN002"),
                ("Payer Name", "Mary Jones"),
                ("Receiver Name", "Bob Brown"),
                ("Transaction Details", "Rent"),
            ]),
        ]
    }

    #[test]
    fn test_blacklisted_exact_match() {
        let p = pipeline(&ScreeningConfig::default());
        let results = p.screen(&[ScreeningInput::Spreadsheet(rows())], &fallback_reference());

        let first = &results[0];
        assert_eq!(first.transaction_id.as_deref(), Some("TXN001"));
        assert_eq!(first.confidence_score, 1.0);
        assert!((first.risk_score - 0.9).abs() < 1e-6);
        assert_eq!(
            first.remark,
            format!("Alas Chiricanas is {}", ReferenceCategory::BlacklistedEntities)
        );
        assert_eq!(first.extracted_entity, "John Smith, Alas Chiricanas");
        assert_eq!(first.entity_type, "PERSON, PERSON");
        assert_eq!(first.supporting_evidence, vec!["OpenCorporates", "Sanctions List"]);
    }

    #[test]
    fn test_blacklisted_hit_after_equal_ngo_hit() {
        let p = pipeline(&ScreeningConfig::default());
        let row = TransactionRow::from_pairs([
            ("Transaction ID", "TXN001"),
            ("Payer Name", "Global Health Foundation"),
            ("Receiver Name", "Alas Chiricanas"),
            ("Receiver Country", "Panama"),
        ]);
        let result = p.screen_row(&row, &p.index(&fallback_reference()));

        assert_eq!(result.confidence_score, 1.0);
        assert!((result.risk_score - 0.9).abs() < 1e-6);
        assert_eq!(result.remark, "Alas Chiricanas is blacklisted_entities");
    }

    #[test]
    fn test_strip_legal_suffixes_setting() {
        let row = TransactionRow::from_pairs([("Transaction ID", "TXN005"), ("Payer Name", "Quantum Holdings")]);

        let plain = pipeline(&ScreeningConfig::default());
        let result = plain.screen_row(&row, &plain.index(&fallback_reference()));
        assert!(result.confidence_score < 1.0);

        let mut config = ScreeningConfig::default();
        config.scoring.strip_legal_suffixes = true;
        let stripping = pipeline(&config);
        let result = stripping.screen_row(&row, &stripping.index(&fallback_reference()));
        assert_eq!(result.confidence_score, 1.0);
        assert_eq!(result.remark, "Quantum Holdings Ltd is shell_companies");
    }

    #[test]
    fn test_unmatched_row_scores_zero() {
        let p = pipeline(&ScreeningConfig::default());
        let results = p.screen(&[ScreeningInput::Spreadsheet(rows())], &fallback_reference());
        assert_eq!(results[1].risk_score, 0.0);
        assert_eq!(results[1].remark, NO_MATCH_REMARK);
    }

    #[test]
    fn test_empty_reference_scores_zero_for_every_row() {
        let p = pipeline(&ScreeningConfig::default());
        let results = p.screen(&[ScreeningInput::Spreadsheet(rows())], &ReferenceData::default());
        assert_eq!(results.len(), 2);
        for result in results {
            assert_eq!(result.confidence_score, 0.0);
            assert_eq!(result.risk_score, 0.0);
        }
    }

    #[test]
    fn test_idempotent() {
        let p = pipeline(&ScreeningConfig::default());
        let reference = fallback_reference();
        let input = [ScreeningInput::Spreadsheet(rows())];
        assert_eq!(p.screen(&input, &reference), p.screen(&input, &reference));
    }

    #[test]
    fn test_cell_granularity_keeps_row_headline() {
        let config = ScreeningConfig::default();
        let reference = fallback_reference();
        let input = [ScreeningInput::Spreadsheet(rows())];

        let by_row = pipeline(&config).screen(&input, &reference);
        let by_cell = pipeline(&config)
            .with_granularity(Granularity::Cell)
            .screen(&input, &reference);

        for (row, cell) in by_row.iter().zip(&by_cell) {
            assert_eq!(row.confidence_score, cell.confidence_score);
            assert_eq!(row.risk_score, cell.risk_score);
            assert_eq!(row.remark, cell.remark);
            assert!(row.cell_scores.is_empty());
        }
        // Four text cells; the numeric amount is not scored
        assert_eq!(by_cell[0].cell_scores.len(), 4);
        assert_eq!(by_cell[0].cell_scores[2].column, "Receiver Name");
        assert_eq!(by_cell[0].cell_scores[2].confidence_score, 1.0);
    }

    #[test]
    fn test_category_mean_aggregation() {
        let mut config = ScreeningConfig::default();
        config.scoring.risk_aggregation = RiskAggregation::CategoryMean;
        let results = pipeline(&config).screen(&[ScreeningInput::Spreadsheet(rows())], &fallback_reference());

        assert_eq!(results[0].confidence_score, 1.0);
        assert!(results[0].risk_score <= results[0].confidence_score);
        assert!(results[0].risk_score > 0.0);
    }

    #[test]
    fn test_missing_designated_columns() {
        let p = pipeline(&ScreeningConfig::default());
        let row = TransactionRow::from_pairs([("Notes", "Oceanic Holdings LLC")]);
        let result = p.screen_row(&row, &p.index(&fallback_reference()));

        assert_eq!(result.transaction_id, None);
        assert_eq!(result.extracted_entity, "");
        assert_eq!(result.confidence_score, 1.0);
        assert_eq!(result.remark, "Oceanic Holdings LLC is shell_companies");
    }

    #[test]
    fn test_document_mode() {
        let p = pipeline(&ScreeningConfig::default());
        let results = p.screen(
            &[ScreeningInput::Document {
                text: "Oceanic Holdings LLC made an offshore investment in Panama. \
                       Oceanic Holdings LLC also paid John Smith."
                    .to_string(),
                name: Some("memo.txt".to_string()),
            }],
            &fallback_reference(),
        );

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.transaction_id.as_deref(), Some("memo.txt"));
        assert_eq!(result.extracted_entity, "Oceanic Holdings LLC, John Smith");
        assert_eq!(result.entity_type, "ORG, PERSON");
        assert_eq!(result.confidence_score, 1.0);
        assert!((result.risk_score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_document_pseudo_columns() {
        let p = pipeline(&ScreeningConfig::default()).with_granularity(Granularity::Cell);
        let index = p.index(&fallback_reference());
        let result = p.screen_document("Payment from Save the Children to John Smith.", None, &index);

        let columns: Vec<_> = result.cell_scores.iter().map(|c| c.column.as_str()).collect();
        assert_eq!(columns, vec!["ORG 1", "PERSON 2"]);
        assert_eq!(result.transaction_id, None);
    }

    #[test]
    fn test_wire_keys() {
        let p = pipeline(&ScreeningConfig::default());
        let results = p.screen(&[ScreeningInput::Spreadsheet(rows())], &fallback_reference());
        let json = serde_json::to_value(&results[0]).unwrap();
        for key in [
            "Transaction ID",
            "Extracted Entity",
            "Entity Type",
            "Supporting Evidence",
            "Confidence Score",
            "Risk Score",
            "Remark",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json.get("Cell Scores").is_none());
    }
}
