use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tokenizers::{Tokenizer, TruncationParams};

use crate::pooling::mean_pool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model_path: String,
    pub tokenizer_path: String,
    pub max_length: usize,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_path: "gtr-t5-base-onnx/model.onnx".to_string(),
            tokenizer_path: "gtr-t5-base-onnx/tokenizer.json".to_string(),
            max_length: crate::MAX_TOKENS,
            dimension: crate::EMBEDDING_DIM,
        }
    }
}

impl EmbeddingConfig {
    /// Configuration pointing at the standard files of an artifact directory.
    pub fn for_artifact(dir: &Path) -> Self {
        Self {
            model_path: dir.join("model.onnx").to_string_lossy().into_owned(),
            tokenizer_path: dir.join("tokenizer.json").to_string_lossy().into_owned(),
            ..Default::default()
        }
    }
}

/// One tokenized sentence, as fed to an encoder graph with batch size 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBatch {
    pub input_ids: Vec<i64>,
    /// 1 for real tokens, 0 for padding.
    pub attention_mask: Vec<i64>,
}

impl TokenBatch {
    pub fn new(input_ids: Vec<i64>, attention_mask: Vec<i64>) -> Result<Self> {
        if input_ids.len() != attention_mask.len() {
            return Err(anyhow!(
                "input_ids ({}) and attention_mask ({}) differ in length",
                input_ids.len(),
                attention_mask.len()
            ));
        }
        Ok(Self {
            input_ids,
            attention_mask,
        })
    }

    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Number of positions flagged as real tokens.
    pub fn real_tokens(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m != 0).count()
    }

    /// Both sequences as `(1, len)` arrays, in `(input_ids, attention_mask)` order.
    pub fn to_arrays(&self) -> Result<(Array2<i64>, Array2<i64>)> {
        let len = self.len();
        let input_ids = Array2::from_shape_vec((1, len), self.input_ids.clone())?;
        let attention_mask = Array2::from_shape_vec((1, len), self.attention_mask.clone())?;
        Ok((input_ids, attention_mask))
    }
}

/// A model that turns sentences into embeddings.
///
/// Handles are passed explicitly into export and verification; nothing in
/// this crate keeps a process-wide model.
pub trait EmbeddingProvider {
    /// Model identifier, e.g. `sentence-transformers/gtr-t5-base`.
    fn name(&self) -> &str;

    fn dimension(&self) -> usize;

    /// Truncation length used by [`EmbeddingProvider::embed`].
    fn max_length(&self) -> usize {
        crate::MAX_TOKENS
    }

    fn tokenize(&self, text: &str, max_length: usize) -> Result<TokenBatch>;

    /// Per-token hidden states, shape `(seq_len, dimension)`.
    fn raw_forward(&mut self, batch: &TokenBatch) -> Result<Array2<f32>>;

    fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
        let batch = self.tokenize(text, self.max_length())?;
        let hidden = self.raw_forward(&batch)?;
        Ok(mean_pool(hidden.view(), &batch.attention_mask)?)
    }
}

/// The export facility of a provider: everything needed to write an artifact.
pub trait ExportableProvider: EmbeddingProvider {
    /// Materialize the static inference graph at `destination`, running
    /// `sample` through it.
    fn export_graph(&mut self, sample: &TokenBatch, destination: &Path) -> Result<()>;

    /// Persist tokenizer state into `directory`, returning the files written.
    fn save_tokenizer(&self, directory: &Path) -> Result<Vec<PathBuf>>;
}

/// Truncate at `max_length` inside the tokenizer so post-processing keeps
/// the closing special token.
pub fn configure_truncation(tokenizer: &mut Tokenizer, max_length: usize) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("Invalid truncation settings: {}", e))?;
    Ok(())
}

pub fn tokenize_with(tokenizer: &Tokenizer, text: &str, max_length: usize) -> Result<TokenBatch> {
    let encoding = tokenizer
        .encode(text, true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

    let mut input_ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
    let mut attention_mask: Vec<i64> = encoding
        .get_attention_mask()
        .iter()
        .map(|&x| x as i64)
        .collect();

    // Tokenizers loaded without truncation settings still honor max_length
    input_ids.truncate(max_length);
    attention_mask.truncate(max_length);

    TokenBatch::new(input_ids, attention_mask)
}
