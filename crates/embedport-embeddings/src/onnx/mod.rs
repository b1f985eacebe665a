//! ONNX Runtime back ends: the exported artifact graph and the hub-hosted
//! source graph it is exported from.

mod artifact;
mod source;

pub use artifact::OnnxArtifactGraph;
pub use source::{OnnxSourceModel, SourceModelConfig};

use anyhow::{Context, Result};
use ndarray::{Array2, Axis, Ix2};
use ort::session::Session;
use ort::value::Tensor;

use crate::error::EmbeddingError;
use crate::graph::Invocation;
use crate::model::TokenBatch;

const HIDDEN_STATE_OUTPUT: &str = "last_hidden_state";

/// Run `session` on one token batch and return its `(seq_len, dim)` hidden states.
pub(crate) fn run_encoder(
    session: &mut Session,
    batch: &TokenBatch,
    invocation: Invocation,
) -> Result<Array2<f32>> {
    let (input_ids, attention_mask) = batch.to_arrays()?;

    let mut inputs = vec![
        (
            "input_ids".to_string(),
            Tensor::from_array(input_ids).context("failed to build input_ids tensor")?,
        ),
        (
            "attention_mask".to_string(),
            Tensor::from_array(attention_mask).context("failed to build attention_mask tensor")?,
        ),
    ];

    if invocation.includes_decoder_input() {
        let decoder_input_ids = Array2::<i64>::zeros((1, 1));
        inputs.push((
            "decoder_input_ids".to_string(),
            Tensor::from_array(decoder_input_ids)
                .context("failed to build decoder_input_ids tensor")?,
        ));
    }

    let outputs = session
        .run(inputs)
        .with_context(|| format!("ONNX inference failed ({} invocation)", invocation))?;

    let output = if outputs.contains_key(HIDDEN_STATE_OUTPUT) {
        &outputs[HIDDEN_STATE_OUTPUT]
    } else {
        &outputs[0]
    };

    let hidden = output
        .try_extract_array::<f32>()
        .context("failed to extract ONNX output tensor as f32 array")?;

    let shape = hidden.shape().to_vec();
    if shape.len() != 3 || shape[0] == 0 {
        return Err(EmbeddingError::HiddenShape {
            shape,
            reason: "expected (batch, sequence, hidden)".to_string(),
        }
        .into());
    }

    let first = hidden
        .index_axis(Axis(0), 0)
        .into_dimensionality::<Ix2>()
        .context("failed to view hidden states as a matrix")?;

    Ok(first.to_owned())
}
