//! Artifact export and verification.
//!
//! The [`Exporter`] writes an artifact directory (graph, tokenizer files,
//! `metadata.json`) from an [`ExportableProvider`]; the [`Verifier`] embeds
//! a probe set through a reference provider and through the artifact graph
//! and compares the two.
//!
//! [`ExportableProvider`]: embedport_embeddings::ExportableProvider

pub mod config;
pub mod error;
pub mod export;
pub mod layout;
pub mod metadata;
pub mod verify;

#[cfg(test)]
mod testing;

pub use config::{DEFAULT_ARTIFACT_DIR, DEFAULT_MIN_COSINE_SIMILARITY, ExportConfig, VerifyConfig};
pub use error::{ArtifactError, Result};
pub use export::{DUMMY_SENTENCE, ExportSummary, Exporter};
pub use layout::ArtifactLayout;
pub use metadata::ArtifactMetadata;
pub use verify::{
    PROBE_SENTENCES, ProbeOutcome, Verdict, VerificationReport, Verifier, default_probes,
    format_report,
};
