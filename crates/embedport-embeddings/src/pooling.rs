//! Mean pooling of per-token hidden states into one sentence vector.

use ndarray::ArrayView2;

use crate::error::EmbeddingError;

/// Floor for the mask sum, so an all-padding sequence divides by this
/// instead of zero.
pub const MASK_EPSILON: f32 = 1e-9;

/// Average the rows of `hidden_states` (`seq_len x dim`) weighted by
/// `attention_mask`.
///
/// Each output component is `sum_t mask[t] * hidden[t][d] / max(sum(mask), 1e-9)`.
/// An all-zero mask therefore yields `0 / 1e-9`, a finite vector, rather
/// than a division fault.
pub fn mean_pool(
    hidden_states: ArrayView2<'_, f32>,
    attention_mask: &[i64],
) -> Result<Vec<f32>, EmbeddingError> {
    let (seq_len, hidden_size) = hidden_states.dim();
    if attention_mask.len() != seq_len {
        return Err(EmbeddingError::MaskLength {
            mask: attention_mask.len(),
            tokens: seq_len,
        });
    }

    let mut sum = vec![0.0f32; hidden_size];
    let mut count = 0.0f32;

    for (row, &mask) in hidden_states.rows().into_iter().zip(attention_mask) {
        if mask == 0 {
            continue;
        }
        let weight = mask as f32;
        for (acc, &value) in sum.iter_mut().zip(row.iter()) {
            *acc += value * weight;
        }
        count += weight;
    }

    let denominator = count.max(MASK_EPSILON);
    for v in &mut sum {
        *v /= denominator;
    }

    Ok(sum)
}
