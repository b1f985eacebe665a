//! Verification results and their text rendering.

use std::fmt::{self, Write as _};
use std::path::PathBuf;

use embedport_embeddings::Invocation;

use crate::metadata::ArtifactMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// Comparison result for one probe sentence.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub sentence: String,
    /// Length of the reference embedding, when one was produced.
    pub dimensions: Option<usize>,
    pub cosine_similarity: Option<f32>,
    pub l2_distance: Option<f32>,
    /// Signature that produced the candidate hidden states.
    pub invocation: Option<Invocation>,
    pub verdict: Verdict,
    pub error: Option<String>,
}

impl ProbeOutcome {
    pub(crate) fn failed(sentence: &str, dimensions: Option<usize>, error: String) -> Self {
        Self {
            sentence: sentence.to_string(),
            dimensions,
            cosine_similarity: None,
            l2_distance: None,
            invocation: None,
            verdict: Verdict::Fail,
            error: Some(error),
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub artifact_dir: PathBuf,
    pub metadata: Option<ArtifactMetadata>,
    pub min_cosine_similarity: f32,
    pub outcomes: Vec<ProbeOutcome>,
}

impl VerificationReport {
    /// True when every probe passed. A report without probes never passes.
    pub fn passed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(ProbeOutcome::passed)
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed()).count()
    }

    /// Process exit status: 0 when every probe passed, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.passed() { 0 } else { 1 }
    }
}

pub fn format_report(report: &VerificationReport) -> String {
    let mut out = String::new();
    let total = report.outcomes.len();

    let _ = writeln!(out, "Artifact: {:?}", report.artifact_dir);
    if let Some(ref metadata) = report.metadata {
        let _ = writeln!(
            out,
            "Model: {} v{} ({} dims, {} tokens)",
            metadata.model_name, metadata.version, metadata.dimensions, metadata.max_tokens
        );
    }
    let _ = writeln!(out, "Threshold: cosine > {}", report.min_cosine_similarity);
    let _ = writeln!(out, "{}", "-".repeat(80));

    for (i, outcome) in report.outcomes.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "[{}/{}] Testing: '{}'", i + 1, total, outcome.sentence);

        if let Some(dims) = outcome.dimensions {
            let _ = writeln!(out, "  Dimensions: ({},)", dims);
        }
        if let Some(cosine) = outcome.cosine_similarity {
            let _ = writeln!(out, "  Cosine similarity: {:.6}", cosine);
        }
        if let Some(l2) = outcome.l2_distance {
            let _ = writeln!(out, "  L2 distance: {:.6}", l2);
        }
        if outcome.invocation == Some(Invocation::DecoderFallback) {
            let _ = writeln!(out, "  Invocation: {}", Invocation::DecoderFallback);
        }
        if let Some(ref error) = outcome.error {
            let _ = writeln!(out, "  Error: {}", error);
        }

        match outcome.verdict {
            Verdict::Pass => {
                let _ = writeln!(out, "  ✓ PASS - Embeddings match!");
            }
            Verdict::Fail => {
                let _ = writeln!(out, "  ✗ FAIL - Embeddings differ significantly!");
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "=".repeat(80));
    if report.passed() {
        let _ = writeln!(out, "✓ All tests passed! ONNX export is correct.");
    } else {
        let _ = writeln!(
            out,
            "✗ {} of {} tests failed. Check the ONNX export.",
            report.failed_count(),
            total
        );
    }

    out
}
