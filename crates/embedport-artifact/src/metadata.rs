//! The `metadata.json` descriptor written next to an exported graph.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ExportConfig;
use crate::error::{ArtifactError, Result};

/// Field order here is the field order on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub model_name: String,
    pub version: String,
    pub dimensions: usize,
    pub max_tokens: usize,
    pub format: String,
    pub description: String,
    pub vec2text_compatible: bool,
}

impl From<&ExportConfig> for ArtifactMetadata {
    fn from(config: &ExportConfig) -> Self {
        Self {
            model_name: config.model_name.clone(),
            version: config.version.clone(),
            dimensions: config.dimensions,
            max_tokens: config.max_tokens,
            format: config.format.clone(),
            description: config.description.clone(),
            vec2text_compatible: config.vec2text_compatible,
        }
    }
}

impl ArtifactMetadata {
    /// Pretty JSON with two-space indentation. Contains nothing
    /// time-dependent, so equal metadata always serializes to equal bytes.
    pub fn to_json(&self) -> String {
        // A struct of strings, integers and a bool cannot fail to serialize
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json())?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| ArtifactError::Metadata {
            path: path.to_path_buf(),
            source,
        })
    }
}
