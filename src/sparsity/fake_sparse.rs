//! Stateful mask unit applied to a weight tensor before every use.

use std::fmt;

use super::config::SparsityPolicy;
use crate::error::Result;
use crate::Tensor;

/// Sparsity simulator.
///
/// When enabled, `forward(x)` returns `x * mask`. The mask is cached:
/// with `fixed_mask` set, the first mask is reused until
/// [`FakeSparse::forget_mask`]; otherwise it is recomputed on every call.
#[derive(Clone, Debug)]
pub struct FakeSparse {
    policy: SparsityPolicy,
    ratio: f32,
    fixed_mask: bool,
    enabled: bool,
    mask: Option<Tensor>,
}

impl FakeSparse {
    pub fn new(policy: SparsityPolicy, ratio: f32, fixed_mask: bool) -> Self {
        Self {
            policy,
            ratio,
            fixed_mask,
            enabled: true,
            mask: None,
        }
    }

    pub fn magnitude(ratio: f32, fixed_mask: bool) -> Self {
        Self::new(SparsityPolicy::Magnitude, ratio, fixed_mask)
    }

    pub fn norm(ratio: f32, p: f32, fixed_mask: bool) -> Self {
        Self::new(SparsityPolicy::Norm { p }, ratio, fixed_mask)
    }

    /// Apply the mask. A disabled unit returns `x` unchanged.
    pub fn forward(&mut self, x: &Tensor) -> Result<Tensor> {
        if !self.enabled {
            return Ok(x.clone());
        }
        let mask = self.calculate_mask(x);
        x.mul(mask)
    }

    /// Return the cached mask, computing it first unless a fixed mask exists.
    pub fn calculate_mask(&mut self, x: &Tensor) -> &Tensor {
        let mask = match self.mask.take() {
            Some(mask) if self.fixed_mask => mask,
            _ => self.generate_mask(x),
        };
        self.mask.insert(mask)
    }

    /// Compute a mask for `x` without touching the cache.
    pub fn generate_mask(&self, x: &Tensor) -> Tensor {
        self.policy.generate_mask(&x.detach(), self.ratio)
    }

    pub fn enable_fake_sparse(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn disable_fake_sparse(&mut self) {
        self.enable_fake_sparse(false);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Overwrite the ratio. The cached mask is left as is.
    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio;
    }

    pub fn fixed_mask(&self) -> bool {
        self.fixed_mask
    }

    pub fn policy(&self) -> SparsityPolicy {
        self.policy
    }

    /// Cached mask, if any.
    pub fn mask(&self) -> Option<&Tensor> {
        self.mask.as_ref()
    }

    /// Drop the cached mask so the next forward recomputes it.
    pub fn forget_mask(&mut self) {
        self.mask = None;
    }
}

impl fmt::Display for FakeSparse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FakeSparse(policy={}, ratio={}, fixed_mask={}, enabled={})",
            self.policy, self.ratio, self.fixed_mask, self.enabled
        )
    }
}
