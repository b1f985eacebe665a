//! Export the model into an artifact directory

use anyhow::Result;
use embedport_artifact::{ExportConfig, Exporter};
use embedport_embeddings::onnx::{OnnxSourceModel, SourceModelConfig};
use embedport_embeddings::HubConfig;
use std::path::Path;

use super::common::resolve_artifact_dir;

pub fn export(output_dir: &Path) -> Result<()> {
    let output_dir = resolve_artifact_dir(output_dir)?;
    let exporter = Exporter::new(ExportConfig::from_env());
    let hub = HubConfig::from_env();

    let summary = exporter.export_with(&output_dir, |config| {
        OnnxSourceModel::load(SourceModelConfig {
            repo: config.model_name.clone(),
            graph_file: config.graph_file.clone(),
            max_length: config.max_tokens,
            dimension: config.dimensions,
            hub,
        })
    })?;

    println!();
    println!("✓ Export complete!");
    println!("  Model saved to: {:?}", summary.artifact_dir);
    println!("  Files created:");
    for name in &summary.files {
        println!("    - {}", name);
    }

    Ok(())
}
