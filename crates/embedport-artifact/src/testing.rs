//! Deterministic in-memory providers and graphs for tests.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use embedport_embeddings::{
    EmbeddingProvider, ExportableProvider, HiddenStateGraph, Invocation, TokenBatch,
};
use ndarray::Array2;

/// Token id of a whitespace-delimited word, shifted by `offset`.
pub fn word_id(word: &str, offset: i64) -> i64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in word.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash % 30_000) as i64 + offset
}

fn tokenize_words(text: &str, max_length: usize, offset: i64) -> Result<TokenBatch> {
    let ids: Vec<i64> = text
        .split_whitespace()
        .take(max_length)
        .map(|w| word_id(w, offset))
        .collect();
    let mask = vec![1; ids.len()];
    TokenBatch::new(ids, mask)
}

/// Pseudo-random vector in [-1, 1) keyed by token id.
fn token_vector(id: i64, dim: usize) -> impl Iterator<Item = f32> {
    (0..dim).map(move |d| {
        let mut x = (id as u64).wrapping_mul(0x9E3779B97F4A7C15)
            ^ (d as u64).wrapping_mul(0xC2B2AE3D27D4EB4F);
        x ^= x >> 33;
        x = x.wrapping_mul(0xFF51AFD7ED558CCD);
        x ^= x >> 33;
        (x % 2000) as f32 / 1000.0 - 1.0
    })
}

fn hidden_states(batch: &TokenBatch, dim: usize) -> Result<Array2<f32>> {
    let values: Vec<f32> = batch
        .input_ids
        .iter()
        .flat_map(|&id| token_vector(id, dim))
        .collect();
    Ok(Array2::from_shape_vec((batch.len(), dim), values)?)
}

pub struct MockProvider {
    dim: usize,
    pub fail_graph_export: bool,
    pub exported_sample: Option<TokenBatch>,
    /// Sentences for which `embed` fails.
    pub fail_embed_on: Option<String>,
}

impl MockProvider {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            fail_graph_export: false,
            exported_sample: None,
            fail_embed_on: None,
        }
    }
}

impl EmbeddingProvider for MockProvider {
    fn name(&self) -> &str {
        "mock/provider"
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn tokenize(&self, text: &str, max_length: usize) -> Result<TokenBatch> {
        tokenize_words(text, max_length, 0)
    }

    fn raw_forward(&mut self, batch: &TokenBatch) -> Result<Array2<f32>> {
        hidden_states(batch, self.dim)
    }

    fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
        if self.fail_embed_on.as_deref() == Some(text) {
            bail!("reference model crashed");
        }
        let batch = self.tokenize(text, self.max_length())?;
        let hidden = self.raw_forward(&batch)?;
        Ok(embedport_embeddings::mean_pool(hidden.view(), &batch.attention_mask)?)
    }
}

impl ExportableProvider for MockProvider {
    fn export_graph(&mut self, sample: &TokenBatch, destination: &Path) -> Result<()> {
        if self.fail_graph_export {
            bail!("unsupported operator 'aten::scaled_dot_product_attention' at opset 14");
        }
        self.raw_forward(sample)?;
        self.exported_sample = Some(sample.clone());
        fs::write(destination, b"mock-graph")?;
        Ok(())
    }

    fn save_tokenizer(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let path = directory.join("tokenizer.json");
        fs::write(&path, "{\"model\": \"mock\"}")?;
        Ok(vec![path])
    }
}

/// Stand-in for an exported graph. With `token_offset` 0 it reproduces
/// [`MockProvider`] exactly; any other offset behaves like a mismatched
/// tokenizer.
pub struct MockGraph {
    dim: usize,
    pub token_offset: i64,
    /// Reject the standard signature, accept the decoder fallback.
    pub requires_decoder_input: bool,
    /// Reject every invocation of a batch containing this token id.
    pub poison_token: Option<i64>,
    pub invocations: Vec<Invocation>,
}

impl MockGraph {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            token_offset: 0,
            requires_decoder_input: false,
            poison_token: None,
            invocations: Vec::new(),
        }
    }
}

impl HiddenStateGraph for MockGraph {
    fn tokenize(&self, text: &str) -> Result<TokenBatch> {
        tokenize_words(text, 512, self.token_offset)
    }

    fn invoke(&mut self, batch: &TokenBatch, invocation: Invocation) -> Result<Array2<f32>> {
        self.invocations.push(invocation);

        if let Some(poison) = self.poison_token {
            if batch.input_ids.contains(&poison) {
                bail!("Got invalid dimensions for input: attention_mask ({})", invocation);
            }
        }
        if self.requires_decoder_input && !invocation.includes_decoder_input() {
            bail!("Missing Input: decoder_input_ids");
        }
        hidden_states(batch, self.dim)
    }
}
