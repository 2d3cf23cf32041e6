//! Similarity Matcher - embeds cells and finds the best reference per category

use screen_embedding::{cosine_similarity, is_zero, normalize_entity_text, strip_legal_suffixes, Embedder};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use super::MatchResult;
use crate::reference::{ReferenceCategory, ReferenceData};

/// A reference string with its precomputed forms
#[derive(Debug, Clone)]
struct IndexedReference {
    text: String,
    key: String,
    embedding: Vec<f32>,
}

/// Reference embeddings for all four categories
///
/// Built once per request from a reference snapshot. References whose
/// embedding is zero or fails are left out. With `strip_legal_suffixes`,
/// exact matching ignores trailing legal forms on both sides, so
/// `Oceanic Holdings` hits `Oceanic Holdings LLC` at 1.0.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    categories: Vec<(ReferenceCategory, Vec<IndexedReference>)>,
    strip_legal_suffixes: bool,
}

impl CategoryIndex {
    pub fn build(embedder: &dyn Embedder, data: &ReferenceData, strip_legal_suffixes: bool) -> Self {
        let categories = data
            .iter()
            .map(|(category, references)| {
                let indexed = references
                    .iter()
                    .filter_map(|text| match embedder.embed(text) {
                        Ok(embedding) if !is_zero(&embedding) => Some(IndexedReference {
                            text: text.clone(),
                            key: exact_key(text, strip_legal_suffixes),
                            embedding,
                        }),
                        Ok(_) => {
                            debug!("Skipping reference with empty embedding: {:?}", text);
                            None
                        }
                        Err(e) => {
                            debug!("Skipping reference {:?}: {}", text, e);
                            None
                        }
                    })
                    .collect();
                (category, indexed)
            })
            .collect();

        Self {
            categories,
            strip_legal_suffixes,
        }
    }

    /// Number of indexed references across categories
    pub fn len(&self) -> usize {
        self.categories.iter().map(|(_, refs)| refs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn exact_key(text: &str, strip_legal: bool) -> String {
    let key = normalize_entity_text(text);
    if strip_legal {
        strip_legal_suffixes(&key)
    } else {
        key
    }
}

/// Per-category best hits for one scored cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellMatches {
    pub column: String,
    pub text: String,
    /// At most one per category, in category order
    pub matches: SmallVec<[MatchResult; 4]>,
}

/// Matches cell text against a [`CategoryIndex`]
pub struct SimilarityMatcher<'a> {
    embedder: &'a dyn Embedder,
    index: &'a CategoryIndex,
    threshold: f32,
}

impl<'a> SimilarityMatcher<'a> {
    pub fn new(embedder: &'a dyn Embedder, index: &'a CategoryIndex, threshold: f32) -> Self {
        Self {
            embedder,
            index,
            threshold,
        }
    }

    /// Score one cell. Returns `None` when the cell cannot be scored
    /// (blank, zero embedding, embedding failure).
    pub fn match_cell(&self, column: &str, text: &str) -> Option<CellMatches> {
        if text.trim().is_empty() {
            return None;
        }

        let embedding = match self.embedder.embed(text) {
            Ok(embedding) if !is_zero(&embedding) => embedding,
            Ok(_) => {
                debug!("Skipping cell {} with empty embedding", column);
                return None;
            }
            Err(e) => {
                debug!("Skipping cell {}: {}", column, e);
                return None;
            }
        };
        let key = exact_key(text, self.index.strip_legal_suffixes);

        let mut matches = SmallVec::new();
        for (category, references) in &self.index.categories {
            let mut best: Option<(&IndexedReference, f32)> = None;
            for reference in references {
                // Exact key match short-circuits to 1.0
                let similarity = if reference.key == key {
                    1.0
                } else {
                    cosine_similarity(&embedding, &reference.embedding).clamp(0.0, 1.0)
                };
                if best.map_or(true, |(_, s)| similarity > s) {
                    best = Some((reference, similarity));
                }
            }

            if let Some((reference, similarity)) = best {
                if similarity >= self.threshold {
                    matches.push(MatchResult {
                        entity: text.to_string(),
                        reference: reference.text.clone(),
                        category: *category,
                        similarity,
                    });
                }
            }
        }

        Some(CellMatches {
            column: column.to_string(),
            text: text.to_string(),
            matches,
        })
    }

    /// Score every cell, in order, dropping the ones that cannot be scored
    pub fn match_cells<'c>(&self, cells: impl IntoIterator<Item = (&'c str, &'c str)>) -> Vec<CellMatches> {
        cells
            .into_iter()
            .filter_map(|(column, text)| self.match_cell(column, text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screen_embedding::{EmbeddingError, HashingEmbedder};

    fn reference() -> ReferenceData {
        ReferenceData {
            high_risk_jurisdictions: vec!["Panama".into(), "Cayman Islands".into()],
            shell_companies: vec!["Oceanic Holdings LLC".into()],
            ngos: vec!["Save the Children".into()],
            blacklisted_entities: vec!["Alas Chiricanas".into()],
        }
    }

    #[test]
    fn test_exact_match_is_one() {
        let embedder = HashingEmbedder::default();
        let index = CategoryIndex::build(&embedder, &reference(), false);
        let matcher = SimilarityMatcher::new(&embedder, &index, 0.5);

        let cell = matcher.match_cell("Receiver Name", "ALAS CHIRICANAS").unwrap();
        let hit = cell
            .matches
            .iter()
            .find(|m| m.category == ReferenceCategory::BlacklistedEntities)
            .unwrap();
        assert_eq!(hit.similarity, 1.0);
        assert_eq!(hit.reference, "Alas Chiricanas");
    }

    #[test]
    fn test_matches_follow_category_order_and_threshold() {
        let embedder = HashingEmbedder::default();
        let index = CategoryIndex::build(&embedder, &reference(), false);
        let matcher = SimilarityMatcher::new(&embedder, &index, 0.5);

        let cell = matcher.match_cell("Payer Name", "Oceanic Holdings LLC").unwrap();
        assert_eq!(cell.matches[0].category, ReferenceCategory::ShellCompanies);
        assert!(cell.matches.iter().all(|m| m.similarity >= 0.5));

        let unrelated = matcher.match_cell("Transaction ID", "TXN001").unwrap();
        assert!(unrelated.matches.is_empty());
    }

    #[test]
    fn test_threshold_one_keeps_only_exact() {
        let embedder = HashingEmbedder::default();
        let index = CategoryIndex::build(&embedder, &reference(), false);
        let matcher = SimilarityMatcher::new(&embedder, &index, 1.0);

        assert!(matcher.match_cell("a", "Alas Chiricana").unwrap().matches.is_empty());
        assert_eq!(matcher.match_cell("a", "Panama").unwrap().matches.len(), 1);
    }

    #[test]
    fn test_legal_suffix_stripping_widens_exact_match() {
        let embedder = HashingEmbedder::default();
        let cell_text = "Oceanic Holdings";

        let plain = CategoryIndex::build(&embedder, &reference(), false);
        let matcher = SimilarityMatcher::new(&embedder, &plain, 0.5);
        let cell = matcher.match_cell("Payer Name", cell_text).unwrap();
        let hit = cell
            .matches
            .iter()
            .find(|m| m.category == ReferenceCategory::ShellCompanies)
            .unwrap();
        assert_eq!(hit.reference, "Oceanic Holdings LLC");
        assert!(hit.similarity < 1.0);

        let stripped = CategoryIndex::build(&embedder, &reference(), true);
        let matcher = SimilarityMatcher::new(&embedder, &stripped, 1.0);
        let cell = matcher.match_cell("Payer Name", cell_text).unwrap();
        assert_eq!(cell.matches.len(), 1);
        assert_eq!(cell.matches[0].category, ReferenceCategory::ShellCompanies);
        assert_eq!(cell.matches[0].similarity, 1.0);
    }

    #[test]
    fn test_blank_and_symbol_cells_are_skipped() {
        let embedder = HashingEmbedder::default();
        let index = CategoryIndex::build(&embedder, &reference(), false);
        let matcher = SimilarityMatcher::new(&embedder, &index, 0.5);

        assert!(matcher.match_cell("a", "   ").is_none());
        assert!(matcher.match_cell("a", "!!! ---").is_none());
        let cells = matcher.match_cells([("a", "Panama"), ("b", ""), ("c", "Iran")]);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1].column, "c");
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Inference("offline".to_string()))
        }

        fn dimension(&self) -> usize {
            0
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_embedding_failures_are_skipped() {
        let index = CategoryIndex::build(&FailingEmbedder, &reference(), false);
        assert!(index.is_empty());

        let matcher = SimilarityMatcher::new(&FailingEmbedder, &index, 0.5);
        assert!(matcher.match_cell("a", "Panama").is_none());
    }

    #[test]
    fn test_empty_reference_yields_no_matches() {
        let embedder = HashingEmbedder::default();
        let index = CategoryIndex::build(&embedder, &ReferenceData::default(), false);
        let matcher = SimilarityMatcher::new(&embedder, &index, 0.5);
        assert!(matcher.match_cell("a", "Alas Chiricanas").unwrap().matches.is_empty());
    }
}
