use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use ndarray::Array2;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::run_encoder;
use crate::graph::Invocation;
use crate::hub::{HubConfig, ensure_model_downloaded};
use crate::model::{
    EmbeddingProvider, ExportableProvider, TokenBatch, configure_truncation, tokenize_with,
};

/// Tokenizer files carried into an artifact besides `tokenizer.json`.
const TOKENIZER_EXTRAS: &[&str] = &[
    "tokenizer_config.json",
    "special_tokens_map.json",
    "spiece.model",
];

#[derive(Debug, Clone)]
pub struct SourceModelConfig {
    /// Hub repository, e.g. `sentence-transformers/gtr-t5-base`.
    pub repo: String,
    /// Path of the encoder graph inside the repository.
    pub graph_file: String,
    pub max_length: usize,
    pub dimension: usize,
    pub hub: HubConfig,
}

impl Default for SourceModelConfig {
    fn default() -> Self {
        Self {
            repo: "sentence-transformers/gtr-t5-base".to_string(),
            graph_file: "onnx/model.onnx".to_string(),
            max_length: crate::MAX_TOKENS,
            dimension: crate::EMBEDDING_DIM,
            hub: HubConfig::default(),
        }
    }
}

/// A model's published ONNX encoder, the input of an export.
pub struct OnnxSourceModel {
    session: Session,
    tokenizer: Tokenizer,
    model_dir: PathBuf,
    graph_path: PathBuf,
    config: SourceModelConfig,
}

impl OnnxSourceModel {
    pub fn load(config: SourceModelConfig) -> Result<Self> {
        let external_data = format!("{}_data", config.graph_file);
        let mut optional: Vec<&str> = TOKENIZER_EXTRAS.to_vec();
        optional.push(&external_data);

        let model_dir = ensure_model_downloaded(
            &config.hub,
            &config.repo,
            &[config.graph_file.as_str(), "tokenizer.json"],
            &optional,
        )
        .with_context(|| format!("failed to resolve {}", config.repo))?;

        let graph_path = model_dir.join(&config.graph_file);
        info!("Loading source graph from {}", graph_path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3).map_err(ort::Error::<()>::from)?
            .commit_from_file(&graph_path)
            .with_context(|| format!("failed to load ONNX model {}", graph_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        configure_truncation(&mut tokenizer, config.max_length)?;

        Ok(Self {
            session,
            tokenizer,
            model_dir,
            graph_path,
            config,
        })
    }
}

impl EmbeddingProvider for OnnxSourceModel {
    fn name(&self) -> &str {
        &self.config.repo
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

impl ExportableProvider for OnnxSourceModel {
    /// Re-serializes the source graph with constant folding applied, then
    /// runs the sample through the written file.
    fn export_graph(&mut self, sample: &TokenBatch, destination: &Path) -> Result<()> {
        let destination_str = destination.to_string_lossy();

        let mut session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level1).map_err(ort::Error::<()>::from)?
            .with_optimized_model_path(&*destination_str).map_err(ort::Error::<()>::from)?
            .commit_from_file(&self.graph_path)
            .with_context(|| format!("failed to serialize graph to {}", destination.display()))?;

        if !destination.exists() {
            bail!("ONNX Runtime did not write {}", destination.display());
        }

        let hidden = run_encoder(&mut session, sample, Invocation::Standard)
            .context("exported graph rejected the sample input")?;
        let (tokens, width) = hidden.dim();
        if width != self.config.dimension {
            bail!(
                "exported graph produces {} hidden units, expected {}",
                width,
                self.config.dimension
            );
        }

        debug!(
            "Sample forward pass: {} tokens x {} hidden units",
            tokens, width
        );
        Ok(())
    }

    fn save_tokenizer(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for filename in std::iter::once("tokenizer.json").chain(TOKENIZER_EXTRAS.iter().copied()) {
            let src = self.model_dir.join(filename);
            if !src.exists() {
                continue;
            }
            let dest = directory.join(filename);
            fs::copy(&src, &dest)
                .with_context(|| format!("failed to copy {} to {}", filename, dest.display()))?;
            written.push(dest);
        }

        Ok(written)
    }
}
