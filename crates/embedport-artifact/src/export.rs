//! Writing an artifact directory from an exportable provider.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use embedport_embeddings::ExportableProvider;
use tracing::{debug, info, warn};

use crate::config::ExportConfig;
use crate::error::{ArtifactError, Result};
use crate::layout::ArtifactLayout;
use crate::metadata::ArtifactMetadata;

/// Input used to trace the graph during export.
pub const DUMMY_SENTENCE: &str = "This is a test sentence for export.";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub artifact_dir: PathBuf,
    pub metadata: ArtifactMetadata,
    /// File names in the artifact after export, sorted.
    pub files: Vec<String>,
}

pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Load the provider with `load`, then export it into `output_dir`.
    ///
    /// A loader failure is reported as [`ArtifactError::ProviderLoad`].
    pub fn export_with<P, F>(&self, output_dir: &Path, load: F) -> Result<ExportSummary>
    where
        P: ExportableProvider,
        F: FnOnce(&ExportConfig) -> anyhow::Result<P>,
    {
        info!("Loading model {}", self.config.model_name);
        let mut provider = load(&self.config)
            .map_err(|e| ArtifactError::provider_load(&self.config.model_name, &e))?;
        self.export(&mut provider, output_dir)
    }

    /// Write graph, tokenizer files and `metadata.json` into `output_dir`,
    /// creating it (and its parents) if needed. Existing files of the same
    /// names are overwritten.
    pub fn export(
        &self,
        provider: &mut dyn ExportableProvider,
        output_dir: &Path,
    ) -> Result<ExportSummary> {
        let start = Instant::now();
        let layout = ArtifactLayout::new(output_dir);

        info!("Exporting {} to ONNX", provider.name());
        info!("Output directory: {:?}", output_dir);

        fs::create_dir_all(output_dir)?;

        debug!("Tokenizing dummy input");
        let sample = provider
            .tokenize(DUMMY_SENTENCE, self.config.max_tokens)
            .map_err(|e| ArtifactError::export(&e.context("failed to tokenize dummy input")))?;

        info!("Exporting encoder graph");
        provider
            .export_graph(&sample, &layout.graph_path())
            .map_err(|e| ArtifactError::export(&e))?;

        info!("Saving tokenizer");
        let tokenizer_files = provider
            .save_tokenizer(output_dir)
            .map_err(|e| ArtifactError::export(&e.context("failed to save tokenizer")))?;
        debug!("Tokenizer files: {:?}", tokenizer_files);

        if provider.dimension() != self.config.dimensions {
            warn!(
                "{} produces {}-dimensional embeddings, configured {}; recording {}",
                provider.name(),
                provider.dimension(),
                self.config.dimensions,
                provider.dimension()
            );
        }
        let metadata = ArtifactMetadata {
            dimensions: provider.dimension(),
            ..ArtifactMetadata::from(&self.config)
        };
        metadata.write(&layout.metadata_path())?;

        let files = layout.files()?;

        info!("Export complete!");
        info!("  Model saved to: {:?}", output_dir);
        for name in &files {
            info!("    - {}", name);
        }
        info!("  Time: {:.2}s", start.elapsed().as_secs_f64());

        Ok(ExportSummary {
            artifact_dir: output_dir.to_path_buf(),
            metadata,
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;
    use tempfile::TempDir;

    #[test]
    fn test_export_writes_full_layout() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("nested").join("gtr-t5-base-onnx");
        let mut provider = MockProvider::new(768);

        let summary = Exporter::new(ExportConfig::default())
            .export(&mut provider, &output)
            .unwrap();

        assert_eq!(
            summary.files,
            vec!["metadata.json", "model.onnx", "tokenizer.json"]
        );
        assert_eq!(summary.metadata.dimensions, 768);
        assert!(output.join("model.onnx").is_file());
    }

    #[test]
    fn test_metadata_records_provider_dimension() {
        let temp = TempDir::new().unwrap();
        let mut provider = MockProvider::new(1024);

        let summary = Exporter::new(ExportConfig::default())
            .export(&mut provider, temp.path())
            .unwrap();

        assert_eq!(summary.metadata.dimensions, 1024);
        let on_disk = ArtifactMetadata::read(&temp.path().join("metadata.json")).unwrap();
        assert_eq!(on_disk.dimensions, 1024);
    }

    #[test]
    fn test_metadata_describes_exported_model() {
        let temp = TempDir::new().unwrap();

        let summary = Exporter::new(ExportConfig::for_model("org/other-encoder"))
            .export(&mut MockProvider::new(768), temp.path())
            .unwrap();

        assert_eq!(summary.metadata.model_name, "org/other-encoder");
        assert!(!summary.metadata.description.contains("GTR-T5-Base"));
        assert!(!summary.metadata.vec2text_compatible);
    }

    #[test]
    fn test_export_traces_graph_with_dummy_sentence() {
        let temp = TempDir::new().unwrap();
        let mut provider = MockProvider::new(8);

        Exporter::new(ExportConfig::default())
            .export(&mut provider, temp.path())
            .unwrap();

        let sample = provider.exported_sample.as_ref().unwrap();
        assert_eq!(sample.len(), DUMMY_SENTENCE.split_whitespace().count());
        assert_eq!(sample.real_tokens(), sample.len());
    }

    #[test]
    fn test_metadata_identical_across_exports() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        let exporter = Exporter::new(ExportConfig::default());

        exporter.export(&mut MockProvider::new(768), &first).unwrap();
        exporter.export(&mut MockProvider::new(768), &second).unwrap();

        let a = fs::read(first.join("metadata.json")).unwrap();
        let b = fs::read(second.join("metadata.json")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_graph_failure_is_export_error() {
        let temp = TempDir::new().unwrap();
        let mut provider = MockProvider::new(768);
        provider.fail_graph_export = true;

        let err = Exporter::new(ExportConfig::default())
            .export(&mut provider, temp.path())
            .unwrap_err();

        match err {
            ArtifactError::Export { reason } => assert!(reason.contains("unsupported operator")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!temp.path().join("metadata.json").exists());
    }

    #[test]
    fn test_loader_failure_is_provider_load_error() {
        let temp = TempDir::new().unwrap();
        let config = ExportConfig {
            model_name: "org/does-not-exist".to_string(),
            ..Default::default()
        };

        let err = Exporter::new(config)
            .export_with(temp.path(), |_| -> anyhow::Result<MockProvider> {
                anyhow::bail!("repository not found")
            })
            .unwrap_err();

        match err {
            ArtifactError::ProviderLoad { model, reason } => {
                assert_eq!(model, "org/does-not-exist");
                assert!(reason.contains("repository not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_export_with_passes_config_to_loader() {
        let temp = TempDir::new().unwrap();
        let summary = Exporter::new(ExportConfig::default())
            .export_with(temp.path(), |config| Ok(MockProvider::new(config.dimensions)))
            .unwrap();
        assert_eq!(summary.artifact_dir, temp.path());
    }
}
