//! The embedding backend seam

use thiserror::Error;

/// Errors produced while embedding text
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Converts text into a fixed-dimension vector.
///
/// Implementations must be deterministic for a given input and safe to
/// share across requests: they are constructed once and used read-only.
/// An input with no usable content embeds to the zero vector, which
/// callers skip rather than compare.
pub trait Embedder: Send + Sync {
    /// Embed a single string
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several strings, preserving order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Output dimension
    fn dimension(&self) -> usize;

    /// Identifier for logs
    fn model_name(&self) -> &str;
}
