//! File layout of an artifact directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{ArtifactError, Result};
use crate::metadata::ArtifactMetadata;

pub const GRAPH_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn graph_path(&self) -> PathBuf {
        self.root.join(GRAPH_FILE)
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.root.join(TOKENIZER_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    /// Fails with [`ArtifactError::ArtifactNotFound`] unless the root is a directory.
    pub fn ensure_exists(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(ArtifactError::ArtifactNotFound {
                path: self.root.clone(),
            });
        }
        Ok(())
    }

    /// The artifact's metadata, or `None` when `metadata.json` is absent.
    pub fn read_metadata(&self) -> Result<Option<ArtifactMetadata>> {
        let path = self.metadata_path();
        if !path.exists() {
            warn!("No {} in {}", METADATA_FILE, self.root.display());
            return Ok(None);
        }
        ArtifactMetadata::read(&path).map(Some)
    }

    /// Names of the regular files in the artifact, sorted.
    pub fn files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportConfig;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let layout = ArtifactLayout::new("/artifacts/gtr");
        assert_eq!(layout.graph_path(), PathBuf::from("/artifacts/gtr/model.onnx"));
        assert_eq!(
            layout.tokenizer_path(),
            PathBuf::from("/artifacts/gtr/tokenizer.json")
        );
        assert_eq!(
            layout.metadata_path(),
            PathBuf::from("/artifacts/gtr/metadata.json")
        );
    }

    #[test]
    fn test_ensure_exists_missing() {
        let temp = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(temp.path().join("nope"));
        assert!(matches!(
            layout.ensure_exists(),
            Err(ArtifactError::ArtifactNotFound { .. })
        ));
    }

    #[test]
    fn test_ensure_exists_rejects_plain_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("model.onnx");
        fs::write(&file, b"").unwrap();
        assert!(ArtifactLayout::new(file).ensure_exists().is_err());
    }

    #[test]
    fn test_read_metadata_absent_and_present() {
        let temp = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(temp.path());
        assert!(layout.read_metadata().unwrap().is_none());

        let metadata = ArtifactMetadata::from(&ExportConfig::default());
        metadata.write(&layout.metadata_path()).unwrap();
        assert_eq!(layout.read_metadata().unwrap(), Some(metadata));
    }

    #[test]
    fn test_files_sorted_and_skip_directories() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("tokenizer.json"), "{}").unwrap();
        fs::write(temp.path().join("metadata.json"), "{}").unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();

        let files = ArtifactLayout::new(temp.path()).files().unwrap();
        assert_eq!(files, vec!["metadata.json", "tokenizer.json"]);
    }
}
