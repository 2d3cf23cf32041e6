//! Text embeddings for watchlist screening
//!
//! Turns entity strings into vectors and compares them with cosine
//! similarity. The screening pipeline only depends on the [`Embedder`]
//! trait, so the backend is chosen once at startup and injected.
//!
//! # Architecture
//!
//! ```text
//! Cell / entity text
//!       │
//!       ▼
//! ┌─────────────────────────────────────────┐
//! │  normalize_entity_text                  │
//! │  "Oceanic Holdings, LLC" → "oceanic     │
//! │   holdings llc"                         │
//! └─────────────────────────────────────────┘
//!       │
//!       ▼
//! ┌─────────────────────────────────────────┐
//! │  Embedder                               │
//! │  HashingEmbedder (default, 512 dims)    │
//! │  BertEmbedder    (feature "bert", 384)  │
//! └─────────────────────────────────────────┘
//!       │
//!       ▼
//! ┌─────────────────────────────────────────┐
//! │  vector::cosine_similarity → [0, 1]     │
//! └─────────────────────────────────────────┘
//! ```

#[cfg(feature = "bert")]
pub mod bert;
pub mod embedder;
pub mod hashing;
pub mod normalize;
pub mod vector;

#[cfg(feature = "bert")]
pub use bert::BertEmbedder;
pub use embedder::{Embedder, EmbeddingError};
pub use hashing::HashingEmbedder;
pub use normalize::{is_legal_suffix, normalize_entity_text, strip_legal_suffixes};
pub use vector::{cosine_similarity, is_zero, l2_norm, normalize};
