//! Verification of an exported artifact against its reference model.
//!
//! Every probe is embedded twice: once by the reference provider and once
//! by tokenizing with the artifact's tokenizer, running the artifact graph
//! and mean pooling the hidden states. Probes are independent; a failing
//! probe is recorded and the run moves on.

mod report;


pub use report::{ProbeOutcome, Verdict, VerificationReport, format_report};

use std::path::Path;

use anyhow::Context;
use embedport_embeddings::{
    EmbeddingProvider, HiddenStateGraph, Invocation, TokenBatch, cosine_similarity, l2_distance,
    mean_pool,
};
use ndarray::Array2;
use tracing::{debug, info, warn};

use crate::config::VerifyConfig;
use crate::error::{ArtifactError, Result};
use crate::layout::ArtifactLayout;

/// Sentences compared when no probe set is given.
pub const PROBE_SENTENCES: [&str; 4] = [
    "Hello, world!",
    "The quick brown fox jumps over the lazy dog.",
    "My mother was a sensitive but loving person.",
    "Artificial intelligence is transforming technology.",
];

pub fn default_probes() -> Vec<String> {
    PROBE_SENTENCES.iter().map(|s| s.to_string()).collect()
}

pub struct Verifier {
    config: VerifyConfig,
}

impl Verifier {
    pub fn new(config: VerifyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Verify the artifact in `artifact_dir`.
    ///
    /// `open` loads the artifact's graph; it receives the layout and the
    /// truncation length (from `metadata.json` when present).
    pub fn verify<G, F>(
        &self,
        artifact_dir: &Path,
        reference: &mut dyn EmbeddingProvider,
        probes: &[String],
        open: F,
    ) -> Result<VerificationReport>
    where
        G: HiddenStateGraph,
        F: FnOnce(&ArtifactLayout, usize) -> anyhow::Result<G>,
    {
        let layout = ArtifactLayout::new(artifact_dir);
        layout.ensure_exists()?;
        if probes.is_empty() {
            return Err(ArtifactError::NoProbes);
        }

        let metadata = layout.read_metadata()?;
        let max_tokens = match metadata {
            Some(ref m) => {
                info!("Artifact model: {} v{}", m.model_name, m.version);
                if m.dimensions != reference.dimension() {
                    warn!(
                        "Artifact declares {} dimensions, reference {} produces {}",
                        m.dimensions,
                        reference.name(),
                        reference.dimension()
                    );
                }
                m.max_tokens
            }
            None => self.config.max_tokens,
        };

        info!("Loading artifact graph from {:?}", layout.graph_path());
        let mut graph = open(&layout, max_tokens).map_err(|e| {
            ArtifactError::provider_load(layout.graph_path().display().to_string(), &e)
        })?;

        let mut report = self.compare(&mut graph, reference, probes);
        report.artifact_dir = artifact_dir.to_path_buf();
        report.metadata = metadata;
        Ok(report)
    }

    /// Compare `reference` with an already opened graph over `probes`.
    pub fn compare(
        &self,
        graph: &mut dyn HiddenStateGraph,
        reference: &mut dyn EmbeddingProvider,
        probes: &[String],
    ) -> VerificationReport {
        let total = probes.len();
        let mut outcomes = Vec::with_capacity(total);

        for (i, sentence) in probes.iter().enumerate() {
            info!("[{}/{}] Testing: '{}'", i + 1, total, sentence);
            let outcome = self.probe(graph, reference, sentence);

            match (&outcome.error, outcome.cosine_similarity) {
                (Some(error), _) => warn!("  {} - {}", outcome.verdict, error),
                (None, Some(cosine)) => info!("  {} - cosine {:.6}", outcome.verdict, cosine),
                (None, None) => info!("  {}", outcome.verdict),
            }
            outcomes.push(outcome);
        }

        VerificationReport {
            artifact_dir: Default::default(),
            metadata: None,
            min_cosine_similarity: self.config.min_cosine_similarity,
            outcomes,
        }
    }

    fn probe(
        &self,
        graph: &mut dyn HiddenStateGraph,
        reference: &mut dyn EmbeddingProvider,
        sentence: &str,
    ) -> ProbeOutcome {
        let reference_embedding = match reference.embed(sentence) {
            Ok(embedding) => embedding,
            Err(e) => {
                return ProbeOutcome::failed(
                    sentence,
                    None,
                    format!("{:#}", e.context("reference embedding failed")),
                );
            }
        };
        let dimensions = Some(reference_embedding.len());

        let (candidate, invocation) = match candidate_embedding(graph, sentence) {
            Ok(result) => result,
            Err(e) => return ProbeOutcome::failed(sentence, dimensions, format!("{:#}", e)),
        };

        let metrics = cosine_similarity(&reference_embedding, &candidate).and_then(|cosine| {
            l2_distance(&reference_embedding, &candidate).map(|l2| (cosine, l2))
        });
        let (cosine, l2) = match metrics {
            Ok(metrics) => metrics,
            Err(e) => return ProbeOutcome::failed(sentence, dimensions, e.to_string()),
        };

        debug!("  Dimensions: {}, L2 distance: {:.6}", reference_embedding.len(), l2);

        let verdict = if cosine > self.config.min_cosine_similarity {
            Verdict::Pass
        } else {
            Verdict::Fail
        };

        ProbeOutcome {
            sentence: sentence.to_string(),
            dimensions,
            cosine_similarity: Some(cosine),
            l2_distance: Some(l2),
            invocation: Some(invocation),
            verdict,
            error: None,
        }
    }
}

fn candidate_embedding(
    graph: &mut dyn HiddenStateGraph,
    sentence: &str,
) -> anyhow::Result<(Vec<f32>, Invocation)> {
    let batch = graph
        .tokenize(sentence)
        .context("artifact tokenizer failed")?;
    let (hidden, invocation) = invoke_with_fallback(graph, &batch)?;
    let pooled = mean_pool(hidden.view(), &batch.attention_mask)?;
    Ok((pooled, invocation))
}

/// Run the standard signature, then, only if that fails, the decoder
/// fallback once.
fn invoke_with_fallback(
    graph: &mut dyn HiddenStateGraph,
    batch: &TokenBatch,
) -> Result<(Array2<f32>, Invocation)> {
    let primary = match graph.invoke(batch, Invocation::Standard) {
        Ok(hidden) => return Ok((hidden, Invocation::Standard)),
        Err(e) => e,
    };

    warn!("  Error calling ONNX model: {:#}", primary);
    warn!("  Retrying with decoder input...");

    match graph.invoke(batch, Invocation::DecoderFallback) {
        Ok(hidden) => Ok((hidden, Invocation::DecoderFallback)),
        Err(fallback) => Err(ArtifactError::InferenceInvocation {
            primary: format!("{:#}", primary),
            fallback: format!("{:#}", fallback),
        }),
    }
}
