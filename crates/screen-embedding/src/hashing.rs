//! Feature-hashed bag-of-words + character trigram embedder
//!
//! Deterministic and model-free: each normalized word and each padded
//! character trigram is hashed into a fixed-size vector, which is then
//! L2-normalized. Identical normalized strings embed identically, small
//! spelling variations keep most of their trigrams, and unrelated names
//! share almost nothing. Weights are non-negative so cosine similarity
//! lands in [0, 1] without clamping.

use crate::embedder::{Embedder, EmbeddingError};
use crate::normalize::normalize_entity_text;
use crate::vector::normalize;

/// Default vector size
pub const DEFAULT_DIMENSION: usize = 512;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Hashing embedder (the default backend)
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl HashingEmbedder {
    /// Create an embedder with the given dimension (minimum 1)
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, kind: &str, feature: &str) -> usize {
        let mut hasher = blake3::Hasher::new();
        hasher.update(kind.as_bytes());
        hasher.update(&[0]);
        hasher.update(feature.as_bytes());
        let digest = hasher.finalize();
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest.as_bytes()[..8]);
        (u64::from_le_bytes(prefix) % self.dimension as u64) as usize
    }

    fn add_token(&self, acc: &mut [f32], token: &str) {
        acc[self.bucket("w", token)] += WORD_WEIGHT;

        let padded: Vec<char> = std::iter::once('#')
            .chain(token.chars())
            .chain(std::iter::once('#'))
            .collect();
        for window in padded.windows(3) {
            let trigram: String = window.iter().collect();
            acc[self.bucket("t", &trigram)] += TRIGRAM_WEIGHT;
        }
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let normalized = normalize_entity_text(text);
        let mut acc = vec![0.0f32; self.dimension];
        for token in normalized.split_whitespace() {
            self.add_token(&mut acc, token);
        }
        Ok(normalize(acc))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hashing-trigram"
    }
}
