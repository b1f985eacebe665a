//! Exported encoder graphs as seen by the verifier.

use std::fmt;

use anyhow::Result;
use ndarray::Array2;

use crate::model::TokenBatch;

/// Input signature used for one attempt at running an exported graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// `input_ids` and `attention_mask` only.
    Standard,
    /// The standard inputs plus a `decoder_input_ids` tensor of shape
    /// `(1, 1)` holding 0, for exports that kept the decoder signature.
    DecoderFallback,
}

impl Invocation {
    /// Attempts in the order the verifier makes them.
    pub const SEQUENCE: [Invocation; 2] = [Invocation::Standard, Invocation::DecoderFallback];

    pub fn includes_decoder_input(&self) -> bool {
        matches!(self, Self::DecoderFallback)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::DecoderFallback => write!(f, "decoder-fallback"),
        }
    }
}

/// An exported graph together with the tokenizer shipped next to it.
pub trait HiddenStateGraph {
    fn tokenize(&self, text: &str) -> Result<TokenBatch>;

    /// Per-token hidden states, shape `(seq_len, dim)`.
    fn invoke(&mut self, batch: &TokenBatch, invocation: Invocation) -> Result<Array2<f32>>;
}
