//! Risk Aggregator - reduces collected cell matches to an assessment

use serde::{Deserialize, Serialize};

use super::{Assessment, CellMatches, MatchResult, RiskAggregation};
use crate::reference::ReferenceCategory;

/// Assessment of a single scored cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellAssessment {
    pub column: String,
    pub text: String,
    pub assessment: Assessment,
}

/// Reduce every cell of a row to one assessment.
///
/// The single highest similarity wins. Equal similarities go to the
/// heavier category, then to the first in cell order.
pub fn reduce_row(cells: &[CellMatches], aggregation: RiskAggregation) -> Assessment {
    let mut best: Option<&MatchResult> = None;
    for candidate in cells.iter().flat_map(|c| c.matches.iter()) {
        if best.map_or(true, |b| outranks(candidate, b)) {
            best = Some(candidate);
        }
    }

    let Some(best) = best else {
        return Assessment::no_match();
    };

    let confidence = best.similarity.clamp(0.0, 1.0);
    let risk = match aggregation {
        RiskAggregation::BestMatch => confidence * best.category.weight(),
        RiskAggregation::CategoryMean => category_mean(cells),
    };

    Assessment {
        confidence,
        risk: risk.clamp(0.0, confidence),
        remark: format!("{} is {}", best.reference, best.category),
        best: Some(best.clone()),
    }
}

fn outranks(candidate: &MatchResult, best: &MatchResult) -> bool {
    candidate.similarity > best.similarity
        || (candidate.similarity == best.similarity && candidate.category.weight() > best.category.weight())
}

/// Reduce each cell on its own, in cell order
pub fn reduce_cells(cells: &[CellMatches], aggregation: RiskAggregation) -> Vec<CellAssessment> {
    cells
        .iter()
        .map(|cell| CellAssessment {
            column: cell.column.clone(),
            text: cell.text.clone(),
            assessment: reduce_row(std::slice::from_ref(cell), aggregation),
        })
        .collect()
}

/// Mean over the four categories of (average similarity × weight).
/// Categories without matches contribute 0.
fn category_mean(cells: &[CellMatches]) -> f32 {
    let total: f32 = ReferenceCategory::ALL
        .iter()
        .map(|category| {
            let (sum, count) = cells
                .iter()
                .flat_map(|c| c.matches.iter())
                .filter(|m| m.category == *category)
                .fold((0.0f32, 0usize), |(sum, count), m| (sum + m.similarity, count + 1));
            if count == 0 {
                0.0
            } else {
                sum / count as f32 * category.weight()
            }
        })
        .sum();
    total / ReferenceCategory::ALL.len() as f32
}
