use super::ReferenceCategory;

/// Supplier of watchlist entries for a category.
///
/// A synchronous fetch-or-fallback contract: implementations return what
/// they can and fall back to a static list rather than erroring.
pub trait WatchlistSource: Send + Sync {
    fn fetch(&self, category: ReferenceCategory) -> Vec<String>;
}

/// Built-in fallback lists
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticWatchlistSource;

impl StaticWatchlistSource {
    pub fn entries(category: ReferenceCategory) -> &'static [&'static str] {
        match category {
            ReferenceCategory::HighRiskJurisdictions => &[
                "Panama",
                "Cayman Islands",
                "BVI",
                "Switzerland",
                "Iran",
                "North Korea",
            ],
            ReferenceCategory::ShellCompanies => &["Oceanic Holdings LLC", "Quantum Holdings Ltd"],
            ReferenceCategory::Ngos => &[
                "Save the Children",
                "Green Earth Org",
                "Global Health Foundation",
            ],
            ReferenceCategory::BlacklistedEntities => &["Alas Chiricanas"],
        }
    }
}

impl WatchlistSource for StaticWatchlistSource {
    fn fetch(&self, category: ReferenceCategory) -> Vec<String> {
        Self::entries(category).iter().map(|s| s.to_string()).collect()
    }
}
