//! Fake sparsity: mask units that simulate weight pruning during training
//!
//! A [`FakeSparse`] unit multiplies its input by a cached 0/1 mask. Two
//! mask policies are available:
//!
//! - **Magnitude**: element-wise, keeps the largest `|x|`
//! - **Norm**: channel-wise, keeps leading-dimension slices with the largest p-norm
//!
//! Note the ratio boundaries differ between policies: magnitude prunes
//! everything at `ratio >= 1`, norm keeps everything at `ratio >= 1`.
//!
//! # Example
//!
//! ```
//! use podar::sparsity::SparsityConfig;
//! use podar::Tensor;
//!
//! let mut unit = SparsityConfig::magnitude().with_ratio(0.5).build();
//! let w = Tensor::from_vec(vec![0.1, -2.0, 0.3, 4.0], false);
//! let pruned = unit.forward(&w).unwrap();
//! assert_eq!(pruned.to_vec(), vec![0.0, -2.0, 0.0, 4.0]);
//! ```

mod config;
mod fake_sparse;
mod magnitude;
mod norm;
mod report;
mod state;


pub use config::{SparsityConfig, SparsityPolicy};
pub use fake_sparse::FakeSparse;
pub use report::{sparsity_report, LayerSparsity, SparsityReport};
pub use state::{disable_sparse, enable_sparse};

/// Index of the threshold in an ascending sort of `n > 0` scores:
/// `floor(n * ratio)`, bumped to 1 when it is 0, clamped to `n - 1`.
pub(crate) fn threshold_index(n: usize, ratio: f32) -> usize {
    let index = (n as f64 * f64::from(ratio)).floor() as usize;
    let index = if index == 0 { 1 } else { index };
    index.min(n.saturating_sub(1))
}
