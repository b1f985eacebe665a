//! Error types for export and verification.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The named model or tokenizer could not be resolved.
    #[error("failed to load provider '{model}': {reason}")]
    ProviderLoad { model: String, reason: String },

    /// Graph serialization or tokenizer persistence failed.
    #[error("export failed: {reason}")]
    Export { reason: String },

    #[error("artifact directory not found: {}. Run 'embedport export' first.", path.display())]
    ArtifactNotFound { path: PathBuf },

    /// The artifact graph failed with both the standard and the fallback
    /// input signature.
    #[error("inference failed: {primary}; fallback with decoder input also failed: {fallback}")]
    InferenceInvocation { primary: String, fallback: String },

    #[error("probe set is empty")]
    NoProbes,

    #[error("invalid metadata at {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArtifactError {
    pub fn provider_load(model: impl Into<String>, cause: &anyhow::Error) -> Self {
        Self::ProviderLoad {
            model: model.into(),
            reason: format!("{:#}", cause),
        }
    }

    pub fn export(cause: &anyhow::Error) -> Self {
        Self::Export {
            reason: format!("{:#}", cause),
        }
    }
}

pub type Result<T> = std::result::Result<T, ArtifactError>;
