//! Export and verification settings.

use embedport_embeddings::{EMBEDDING_DIM, MAX_TOKENS};
use tracing::warn;

use crate::metadata::ArtifactMetadata;

/// Artifact directory used when none is given on the command line.
pub const DEFAULT_ARTIFACT_DIR: &str = "./gtr-t5-base-onnx";

/// Default model exported and used as verification reference.
pub const DEFAULT_MODEL: &str = "sentence-transformers/gtr-t5-base";

/// A probe passes when its cosine similarity is strictly above this.
/// Empirical: it depends on the numeric precision of the export.
pub const DEFAULT_MIN_COSINE_SIMILARITY: f32 = 0.999;

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub model_name: String,
    /// Location of the encoder graph inside the model repository.
    pub graph_file: String,
    pub version: String,
    pub dimensions: usize,
    pub max_tokens: usize,
    pub format: String,
    pub description: String,
    pub vec2text_compatible: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            graph_file: "onnx/model.onnx".to_string(),
            version: "1.0.0".to_string(),
            dimensions: EMBEDDING_DIM,
            max_tokens: MAX_TOKENS,
            format: "onnx".to_string(),
            description: "GTR-T5-Base embedding model for vec2text compatibility".to_string(),
            vec2text_compatible: true,
        }
    }
}

impl ExportConfig {
    /// Settings for exporting `model_name`. Models other than the default
    /// get a generic description and are not marked vec2text compatible.
    pub fn for_model(model_name: impl Into<String>) -> Self {
        let model_name = model_name.into();
        let defaults = Self::default();
        if model_name == defaults.model_name {
            return defaults;
        }

        Self {
            description: format!("{} embedding model", model_name),
            vec2text_compatible: false,
            model_name,
            ..defaults
        }
    }

    /// Honors `EMBEDPORT_MODEL`, `EMBEDPORT_GRAPH_FILE` and `EMBEDPORT_MAX_TOKENS`.
    pub fn from_env() -> Self {
        let defaults = match env_string("EMBEDPORT_MODEL") {
            Some(model_name) => Self::for_model(model_name),
            None => Self::default(),
        };

        Self {
            graph_file: env_string("EMBEDPORT_GRAPH_FILE").unwrap_or(defaults.graph_file),
            max_tokens: env_parse("EMBEDPORT_MAX_TOKENS").unwrap_or(defaults.max_tokens),
            ..defaults
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerifyConfig {
    pub reference_model: String,
    pub min_cosine_similarity: f32,
    /// Truncation length for the artifact tokenizer when the artifact's
    /// metadata does not state one.
    pub max_tokens: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            reference_model: DEFAULT_MODEL.to_string(),
            min_cosine_similarity: DEFAULT_MIN_COSINE_SIMILARITY,
            max_tokens: MAX_TOKENS,
        }
    }
}

impl VerifyConfig {
    /// Honors `EMBEDPORT_MODEL`, `EMBEDPORT_MIN_COSINE` and `EMBEDPORT_MAX_TOKENS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            reference_model: env_string("EMBEDPORT_MODEL").unwrap_or(defaults.reference_model),
            min_cosine_similarity: env_parse("EMBEDPORT_MIN_COSINE")
                .filter(|v: &f32| v.is_finite())
                .unwrap_or(defaults.min_cosine_similarity),
            max_tokens: env_parse("EMBEDPORT_MAX_TOKENS").unwrap_or(defaults.max_tokens),
        }
    }

    /// Model to compare an artifact against: the one its metadata names,
    /// else the configured reference.
    pub fn reference_model_for<'a>(&'a self, metadata: Option<&'a ArtifactMetadata>) -> &'a str {
        metadata
            .map(|m| m.model_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.reference_model)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|raw| parse_setting(key, &raw))
}

fn parse_setting<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        warn!("Ignoring invalid {}={:?}, using the default", key, raw);
    }
    parsed
}
