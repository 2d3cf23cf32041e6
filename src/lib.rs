//! Watchlist screening for financial transaction records
//!
//! Ingests spreadsheets of transactions or free-text documents, extracts
//! candidate entities, and scores them against four reference watchlists
//! (high-risk jurisdictions, shell companies, NGOs, blacklisted entities).
//!
//! ```text
//! upload ──► ingest ──► extraction ──► scoring::matcher ──► scoring::aggregate ──► RowResult
//!                                           ▲
//!                         reference (JSON) ─┘  (reloaded + re-embedded per request)
//! ```

pub mod config;
pub mod error;
pub mod extraction;
pub mod ingest;
pub mod pipeline;
pub mod reference;
pub mod scoring;

#[cfg(feature = "server")]
pub mod api;

pub use config::ScreeningConfig;
pub use error::{Result, ScreeningError};
pub use extraction::{EntityLabel, EntityRecognizer, ExtractedEntity, ExtractionMode, PatternRecognizer};
pub use ingest::{CellValue, TransactionRow};
pub use pipeline::{RowResult, ScreeningInput, ScreeningPipeline};
pub use reference::{ReferenceCategory, ReferenceData, StaticWatchlistSource, WatchlistSource};
pub use scoring::{Assessment, CategoryIndex, Granularity, MatchResult, RiskAggregation};

pub use screen_embedding::{Embedder, HashingEmbedder};

use std::sync::Arc;

/// Embedder used by the binaries: BGE-small with the `bert` feature, the
/// hashing embedder otherwise.
pub fn default_embedder() -> Result<Arc<dyn Embedder>> {
    #[cfg(feature = "bert")]
    {
        Ok(Arc::new(screen_embedding::BertEmbedder::new()?))
    }
    #[cfg(not(feature = "bert"))]
    {
        Ok(Arc::new(HashingEmbedder::default()))
    }
}
