//! Error types for embedding computations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The attention mask does not cover the hidden states one-to-one.
    #[error("attention mask has {mask} entries but hidden states have {tokens} rows")]
    MaskLength { mask: usize, tokens: usize },

    /// A graph produced a tensor of an unexpected rank or width.
    #[error("unexpected hidden state shape {shape:?}: {reason}")]
    HiddenShape { shape: Vec<usize>, reason: String },

    /// Two vectors that must be compared have different lengths.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
