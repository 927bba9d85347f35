//! Sparsity configuration: mask policy plus the knobs a fresh mask unit
//! is built with.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::fake_sparse::FakeSparse;
use super::{magnitude, norm};
use crate::Tensor;

/// Mask generation policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SparsityPolicy {
    /// Element-wise: keep weights whose absolute value reaches the threshold.
    Magnitude,
    /// Channel-wise: keep leading-dimension slices whose p-norm reaches the threshold.
    Norm {
        /// Norm order; `f32::INFINITY` selects the max-abs norm.
        p: f32,
    },
}

impl SparsityPolicy {
    /// Build a 0/1 mask for `x` at the given pruning ratio.
    ///
    /// The returned mask is detached from gradient computation.
    pub fn generate_mask(&self, x: &Tensor, ratio: f32) -> Tensor {
        match self {
            SparsityPolicy::Magnitude => magnitude::generate_mask(x, ratio),
            SparsityPolicy::Norm { p } => norm::generate_mask(x, ratio, *p),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SparsityPolicy::Magnitude => "magnitude",
            SparsityPolicy::Norm { .. } => "norm",
        }
    }
}

impl Default for SparsityPolicy {
    fn default() -> Self {
        SparsityPolicy::Norm { p: 2.0 }
    }
}

impl fmt::Display for SparsityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SparsityPolicy::Magnitude => write!(f, "magnitude"),
            SparsityPolicy::Norm { p } => write!(f, "norm(p={p})"),
        }
    }
}

/// Factory for mask units.
///
/// Every call to [`SparsityConfig::build`] returns a new, enabled
/// [`FakeSparse`] with an empty mask cache.
///
/// # Example
///
/// ```
/// use podar::sparsity::SparsityConfig;
///
/// let config = SparsityConfig::norm(2.0).with_ratio(0.2).with_fixed_mask(false);
/// let unit = config.build();
/// assert_eq!(unit.ratio(), 0.2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparsityConfig {
    /// Mask policy.
    #[serde(default)]
    pub policy: SparsityPolicy,
    /// Fraction of elements to prune.
    #[serde(default = "default_ratio")]
    pub ratio: f32,
    /// Keep the first computed mask until it is explicitly forgotten.
    #[serde(default)]
    pub fixed_mask: bool,
}

fn default_ratio() -> f32 {
    0.1
}

impl Default for SparsityConfig {
    fn default() -> Self {
        Self {
            policy: SparsityPolicy::default(),
            ratio: default_ratio(),
            fixed_mask: false,
        }
    }
}

impl SparsityConfig {
    /// Magnitude policy with default ratio.
    pub fn magnitude() -> Self {
        Self {
            policy: SparsityPolicy::Magnitude,
            ..Self::default()
        }
    }

    /// Norm policy of order `p` with default ratio.
    pub fn norm(p: f32) -> Self {
        Self {
            policy: SparsityPolicy::Norm { p },
            ..Self::default()
        }
    }

    pub fn with_ratio(mut self, ratio: f32) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn with_fixed_mask(mut self, fixed_mask: bool) -> Self {
        self.fixed_mask = fixed_mask;
        self
    }

    /// Change the norm order. No effect on the magnitude policy.
    pub fn with_norm(mut self, p: f32) -> Self {
        if let SparsityPolicy::Norm { p: order } = &mut self.policy {
            *order = p;
        }
        self
    }

    /// Build a fresh mask unit.
    pub fn build(&self) -> FakeSparse {
        FakeSparse::new(self.policy, self.ratio, self.fixed_mask)
    }
}
