use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use ndarray::Array2;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use tokenizers::Tokenizer;
use tracing::info;

use super::run_encoder;
use crate::graph::{HiddenStateGraph, Invocation};
use crate::model::{
    EmbeddingConfig, EmbeddingProvider, TokenBatch, configure_truncation, tokenize_with,
};

/// The graph and tokenizer of an exported artifact directory.
pub struct OnnxArtifactGraph {
    session: Session,
    tokenizer: Tokenizer,
    config: EmbeddingConfig,
}

impl OnnxArtifactGraph {
    /// Open `model.onnx` and `tokenizer.json` from an artifact directory.
    pub fn open(dir: &Path, max_length: usize) -> Result<Self> {
        Self::load(EmbeddingConfig {
            max_length,
            ..EmbeddingConfig::for_artifact(dir)
        })
    }

    pub fn load(config: EmbeddingConfig) -> Result<Self> {
        if !Path::new(&config.model_path).exists() {
            bail!("model file not found at {}", config.model_path);
        }
        if !Path::new(&config.tokenizer_path).exists() {
            bail!("tokenizer file not found at {}", config.tokenizer_path);
        }

        info!("Loading ONNX model from {}", config.model_path);

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3).map_err(ort::Error::<()>::from)?
            .with_intra_threads(4).map_err(ort::Error::<()>::from)?
            .commit_from_file(&config.model_path)
            .with_context(|| format!("failed to load ONNX model {}", config.model_path))?;

        let mut tokenizer = Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        configure_truncation(&mut tokenizer, config.max_length)?;

        Ok(Self {
            session,
            tokenizer,
            config,
        })
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

impl HiddenStateGraph for OnnxArtifactGraph {
    fn tokenize(&self, text: &str) -> Result<TokenBatch> {
        tokenize_with(&self.tokenizer, text, self.config.max_length)
    }

    fn invoke(&mut self, batch: &TokenBatch, invocation: Invocation) -> Result<Array2<f32>> {
        run_encoder(&mut self.session, batch, invocation)
    }
}

impl EmbeddingProvider for OnnxArtifactGraph {
    fn name(&self) -> &str {
        &self.config.model_path
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn max_length(&self) -> usize {
        self.config.max_length
    }

    fn tokenize(&self, text: &str, max_length: usize) -> Result<TokenBatch> {
        tokenize_with(&self.tokenizer, text, max_length)
    }

    fn raw_forward(&mut self, batch: &TokenBatch) -> Result<Array2<f32>> {
        run_encoder(&mut self.session, batch, Invocation::Standard)
    }
}
