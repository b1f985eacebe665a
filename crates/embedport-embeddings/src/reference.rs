//! The original, non-exported T5 encoder, run through candle.
//!
//! This is the reference side of verification: the same weights the
//! export started from, evaluated without ONNX Runtime in the loop.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::t5;
use ndarray::Array2;
use tokenizers::Tokenizer;
use tracing::info;

use crate::hub::{HubConfig, ensure_model_downloaded};
use crate::model::{EmbeddingProvider, TokenBatch, configure_truncation, tokenize_with};

const SAFETENSORS_FILE: &str = "model.safetensors";
const PYTORCH_FILE: &str = "pytorch_model.bin";

pub struct T5ReferenceModel {
    model: t5::T5EncoderModel,
    tokenizer: Tokenizer,
    device: Device,
    repo: String,
    dimension: usize,
    max_length: usize,
}

impl T5ReferenceModel {
    pub fn load(hub: &HubConfig, repo: &str, max_length: usize) -> Result<Self> {
        let model_dir = ensure_model_downloaded(
            hub,
            repo,
            &["config.json", "tokenizer.json"],
            &[SAFETENSORS_FILE, PYTORCH_FILE],
        )?;

        let config_text = fs::read_to_string(model_dir.join("config.json"))
            .context("failed to read config.json")?;
        let config: t5::Config =
            serde_json::from_str(&config_text).context("invalid T5 config.json")?;

        let device = Device::Cpu;
        let vb = load_weights(&model_dir, &device)?;
        let model = t5::T5EncoderModel::load(vb, &config)
            .map_err(|e| anyhow!("failed to build T5 encoder: {}", e))?;

        let mut tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        configure_truncation(&mut tokenizer, max_length)?;

        info!("Loaded reference encoder {} (d_model={})", repo, config.d_model);

        Ok(Self {
            model,
            tokenizer,
            device,
            repo: repo.to_string(),
            dimension: config.d_model,
            max_length,
        })
    }
}

fn load_weights(model_dir: &std::path::Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors: PathBuf = model_dir.join(SAFETENSORS_FILE);
    if safetensors.exists() {
        // SAFETY: the file is owned by our cache directory and not modified
        // while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device) }
            .map_err(|e| anyhow!("safetensors load failed: {}", e))?;
        return Ok(vb);
    }

    let pytorch = model_dir.join(PYTORCH_FILE);
    if pytorch.exists() {
        return VarBuilder::from_pth(&pytorch, DType::F32, device)
            .map_err(|e| anyhow!("PyTorch checkpoint load failed: {}", e));
    }

    bail!(
        "no weights ({} or {}) in {}",
        SAFETENSORS_FILE,
        PYTORCH_FILE,
        model_dir.display()
    )
}

impl EmbeddingProvider for T5ReferenceModel {
    fn name(&self) -> &str {
        &self.repo
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_length(&self) -> usize {
        self.max_length
    }

    fn tokenize(&self, text: &str, max_length: usize) -> Result<TokenBatch> {
        tokenize_with(&self.tokenizer, text, max_length)
    }

    /// The candle encoder takes no attention mask, so padded positions are
    /// encoded like any other token; pooling still drops them.
    fn raw_forward(&mut self, batch: &TokenBatch) -> Result<Array2<f32>> {
        let ids: Vec<u32> = batch.input_ids.iter().map(|&id| id as u32).collect();
        let input_ids = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;

        let hidden = self.model.forward(&input_ids)?.squeeze(0)?;
        let (tokens, width) = hidden.dims2()?;
        let values = hidden.flatten_all()?.to_vec1::<f32>()?;

        Ok(Array2::from_shape_vec((tokens, width), values)?)
    }
}
