//! Verify an artifact against the original model

use anyhow::Result;
use embedport_artifact::{
    ArtifactError, ArtifactLayout, ArtifactMetadata, Verifier, VerifyConfig, default_probes,
    format_report,
};
use embedport_embeddings::{HubConfig, OnnxArtifactGraph, T5ReferenceModel};
use std::path::Path;
use std::process::ExitCode;
use tracing::info;

use super::common::resolve_artifact_dir;

/// Exits 0 when every probe passed, 1 otherwise.
pub fn verify(artifact_dir: &Path) -> Result<ExitCode> {
    let artifact_dir = resolve_artifact_dir(artifact_dir)?;
    let config = VerifyConfig::from_env();

    // Fail before the reference weights are fetched
    let layout = ArtifactLayout::new(&artifact_dir);
    layout.ensure_exists()?;

    let metadata_path = layout.metadata_path();
    let metadata = if metadata_path.exists() {
        Some(ArtifactMetadata::read(&metadata_path)?)
    } else {
        None
    };
    let reference_model = config.reference_model_for(metadata.as_ref()).to_string();

    info!("Loading original model {}...", reference_model);
    let mut reference =
        T5ReferenceModel::load(&HubConfig::from_env(), &reference_model, config.max_tokens)
            .map_err(|e| ArtifactError::provider_load(&reference_model, &e))?;

    let verifier = Verifier::new(config);
    let report = verifier.verify(
        &artifact_dir,
        &mut reference,
        &default_probes(),
        |layout, max_tokens| OnnxArtifactGraph::open(layout.root(), max_tokens),
    )?;

    println!("{}", format_report(&report));

    if report.passed() {
        println!();
        println!(
            "You can now package and distribute {:?}.",
            report.artifact_dir
        );
    }

    Ok(ExitCode::from(report.exit_code()))
}
