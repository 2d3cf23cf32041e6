//! Reference watchlists
//!
//! Four fixed categories, each an ordered list of plain strings with a
//! fixed risk weight. The lists are loaded fresh for every request and are
//! never mutated while matching runs.

mod loader;
mod source;

pub use loader::load_reference_data;
pub use source::{StaticWatchlistSource, WatchlistSource};

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four watchlist types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceCategory {
    HighRiskJurisdictions,
    ShellCompanies,
    Ngos,
    BlacklistedEntities,
}

impl ReferenceCategory {
    /// Every category, in matching order
    pub const ALL: [ReferenceCategory; 4] = [
        ReferenceCategory::HighRiskJurisdictions,
        ReferenceCategory::ShellCompanies,
        ReferenceCategory::Ngos,
        ReferenceCategory::BlacklistedEntities,
    ];

    /// Wire name, as used in the reference file and remarks
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighRiskJurisdictions => "high_risk_jurisdictions",
            Self::ShellCompanies => "shell_companies",
            Self::Ngos => "ngos",
            Self::BlacklistedEntities => "blacklisted_entities",
        }
    }

    /// Fixed risk weight
    pub fn weight(&self) -> f32 {
        match self {
            Self::BlacklistedEntities => 0.9,
            Self::ShellCompanies => 0.8,
            Self::HighRiskJurisdictions => 0.7,
            Self::Ngos => 0.6,
        }
    }
}

impl fmt::Display for ReferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four reference lists
///
/// Serialized as a JSON object keyed by category wire name. Missing keys
/// deserialize to empty lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
    pub high_risk_jurisdictions: Vec<String>,
    pub shell_companies: Vec<String>,
    pub ngos: Vec<String>,
    pub blacklisted_entities: Vec<String>,
}

impl ReferenceData {
    /// Reference strings for one category
    pub fn get(&self, category: ReferenceCategory) -> &[String] {
        match category {
            ReferenceCategory::HighRiskJurisdictions => &self.high_risk_jurisdictions,
            ReferenceCategory::ShellCompanies => &self.shell_companies,
            ReferenceCategory::Ngos => &self.ngos,
            ReferenceCategory::BlacklistedEntities => &self.blacklisted_entities,
        }
    }

    fn get_mut(&mut self, category: ReferenceCategory) -> &mut Vec<String> {
        match category {
            ReferenceCategory::HighRiskJurisdictions => &mut self.high_risk_jurisdictions,
            ReferenceCategory::ShellCompanies => &mut self.shell_companies,
            ReferenceCategory::Ngos => &mut self.ngos,
            ReferenceCategory::BlacklistedEntities => &mut self.blacklisted_entities,
        }
    }

    /// Iterate categories with their lists, in matching order
    pub fn iter(&self) -> impl Iterator<Item = (ReferenceCategory, &[String])> {
        ReferenceCategory::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Total number of reference strings
    pub fn len(&self) -> usize {
        self.iter().map(|(_, list)| list.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Populate only the categories that are empty, from `source`.
    ///
    /// Returns the categories that were filled.
    pub fn fill_empty_from(&mut self, source: &dyn WatchlistSource) -> Vec<ReferenceCategory> {
        let mut filled = Vec::new();
        for category in ReferenceCategory::ALL {
            if self.get(category).is_empty() {
                let entries = source.fetch(category);
                if !entries.is_empty() {
                    *self.get_mut(category) = entries;
                    filled.push(category);
                }
            }
        }
        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_are_fixed() {
        assert_eq!(ReferenceCategory::BlacklistedEntities.weight(), 0.9);
        assert_eq!(ReferenceCategory::ShellCompanies.weight(), 0.8);
        assert_eq!(ReferenceCategory::HighRiskJurisdictions.weight(), 0.7);
        assert_eq!(ReferenceCategory::Ngos.weight(), 0.6);
    }

    #[test]
    fn test_wire_names_roundtrip_through_serde() {
        for category in ReferenceCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let data: ReferenceData =
            serde_json::from_str(r#"{"shell_companies": ["Quantum Holdings Ltd"]}"#).unwrap();
        assert_eq!(data.shell_companies, vec!["Quantum Holdings Ltd"]);
        assert!(data.ngos.is_empty());
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_fill_only_empty_categories() {
        let mut data = ReferenceData {
            ngos: vec!["Custom NGO".to_string()],
            ..Default::default()
        };
        let filled = data.fill_empty_from(&StaticWatchlistSource);
        assert_eq!(data.ngos, vec!["Custom NGO"]);
        assert!(data.blacklisted_entities.contains(&"Alas Chiricanas".to_string()));
        assert!(!filled.contains(&ReferenceCategory::Ngos));
        assert_eq!(filled.len(), 3);
    }
}
