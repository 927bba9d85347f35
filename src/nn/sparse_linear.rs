//! Sparsity-aware linear layer.
//!
//! The weight passes through a [`FakeSparse`] unit before every forward,
//! so training sees the pruned weight while the dense values are kept.

use super::linear::{affine, Linear};
use super::module::Layer;
use crate::error::{Error, Result};
use crate::sparsity::{FakeSparse, SparsityConfig};
use crate::Tensor;

/// Linear layer whose weight is masked by an owned sparsity unit.
#[derive(Clone, Debug)]
pub struct SparseLinear {
    linear: Linear,
    weight_fake_sparse: FakeSparse,
}

impl SparseLinear {
    pub fn new(
        in_features: usize,
        out_features: usize,
        bias: bool,
        config: &SparsityConfig,
    ) -> Self {
        Self {
            linear: Linear::new(in_features, out_features, bias),
            weight_fake_sparse: config.build(),
        }
    }

    /// Convert a dense layer.
    ///
    /// Weight and bias are moved into the new layer; a fresh mask unit is
    /// built from `config`. Any layer other than [`Layer::Linear`] is a
    /// [`Error::TypeMismatch`].
    pub fn from_float(layer: Layer, config: &SparsityConfig) -> Result<Self> {
        match layer {
            Layer::Linear(linear) => {
                Ok(Self {
                    linear,
                    weight_fake_sparse: config.build(),
                })
            }
            other => Err(Error::TypeMismatch {
                converter: "SparseLinear",
                expected: "Linear",
                found: other.kind().to_string(),
            }),
        }
    }

    /// Bake the current mask into the weight and return a dense layer.
    pub fn into_float(mut self) -> Result<Linear> {
        let weight = self.effective_weight()?;
        let (_, bias) = self.linear.into_parts();
        Linear::from_parts(weight, bias)
    }

    /// `x @ mask(W)^T + b`
    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let weight = self.weight_fake_sparse.forward(self.linear.weight())?;
        affine(input, &weight, self.linear.bias())
    }

    /// Weight after masking (updates the mask cache like a forward would).
    pub fn effective_weight(&mut self) -> Result<Tensor> {
        self.weight_fake_sparse.forward(self.linear.weight())
    }

    pub fn weight(&self) -> &Tensor {
        self.linear.weight()
    }

    pub fn bias(&self) -> Option<&Tensor> {
        self.linear.bias()
    }

    pub fn in_features(&self) -> usize {
        self.linear.in_features()
    }

    pub fn out_features(&self) -> usize {
        self.linear.out_features()
    }

    pub fn weight_fake_sparse(&self) -> &FakeSparse {
        &self.weight_fake_sparse
    }

    pub fn weight_fake_sparse_mut(&mut self) -> &mut FakeSparse {
        &mut self.weight_fake_sparse
    }
}
