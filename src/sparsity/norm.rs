//! Channel-wise p-norm mask.
//!
//! The ratio boundaries are the reverse of the magnitude policy:
//! `ratio >= 1` keeps everything and `ratio <= 0` prunes everything.

use ndarray::{ArrayD, IxDyn};

use super::threshold_index;
use crate::Tensor;

/// p-norm of a slice. `p = inf` is the max-abs norm.
pub(crate) fn p_norm(values: &[f32], p: f32) -> f32 {
    if p.is_infinite() {
        return values.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
    }
    if p == 2.0 {
        return values.iter().map(|v| v * v).sum::<f32>().sqrt();
    }
    values.iter().map(|v| v.abs().powf(p)).sum::<f32>().powf(1.0 / p)
}

/// Mask of shape `[C, 1, ..., 1]` keeping channels whose norm reaches the
/// `floor(C * ratio)`-th smallest channel norm.
pub(crate) fn generate_mask(x: &Tensor, ratio: f32, p: f32) -> Tensor {
    if ratio >= 1.0 {
        return Tensor::ones_like(x);
    } else if ratio <= 0.0 {
        return Tensor::zeros_like(x);
    }
    if x.is_empty() {
        return Tensor::ones_like(x);
    }

    let channels = x.shape().first().copied().unwrap_or(1);
    let values = x.to_vec();
    let per_channel = values.len() / channels;
    let norms: Vec<f32> = values.chunks(per_channel).map(|c| p_norm(c, p)).collect();

    let mut sorted = norms.clone();
    sorted.sort_by(f32::total_cmp);
    let threshold = sorted[threshold_index(sorted.len(), ratio)];

    let mut shape = vec![1; x.ndim()];
    if let Some(first) = shape.first_mut() {
        *first = channels;
    }
    // One element per channel, in channel order
    let mut mask = ArrayD::<f32>::zeros(IxDyn(&shape));
    for (slot, &norm) in mask.iter_mut().zip(&norms) {
        if norm >= threshold {
            *slot = 1.0;
        }
    }
    Tensor::new(mask, false)
}
