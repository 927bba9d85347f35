//! Element-wise magnitude mask.

use super::threshold_index;
use crate::Tensor;

/// Keep elements with `|x| >= threshold`, where the threshold is the
/// `floor(N * ratio)`-th smallest absolute value.
///
/// `ratio >= 1` prunes everything, `ratio <= 0` keeps everything.
pub(crate) fn generate_mask(x: &Tensor, ratio: f32) -> Tensor {
    if ratio >= 1.0 {
        return Tensor::zeros_like(x);
    } else if ratio <= 0.0 {
        return Tensor::ones_like(x);
    }
    if x.is_empty() {
        return Tensor::ones_like(x);
    }

    let mut sorted: Vec<f32> = x.data().iter().map(|v| v.abs()).collect();
    sorted.sort_by(f32::total_cmp);
    let threshold = sorted[threshold_index(sorted.len(), ratio)];

    let mask = x.data().mapv(|v| if v.abs() >= threshold { 1.0 } else { 0.0 });
    Tensor::new(mask, false)
}
