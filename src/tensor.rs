//! Dense n-dimensional `f32` tensor
//!
//! Thin wrapper over `ndarray::ArrayD` carrying a `requires_grad` flag.
//! Masks are built from detached copies so they never take part in
//! gradient computation.

use crate::error::{Error, Result};
use ndarray::{Array1, ArrayD, IxDyn};

/// N-dimensional tensor used for weights, activations and masks
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    data: ArrayD<f32>,
    requires_grad: bool,
}

impl Tensor {
    /// Wrap an existing array
    pub fn new(data: ArrayD<f32>, requires_grad: bool) -> Self {
        Self {
            data,
            requires_grad,
        }
    }

    /// Create a 1-D tensor from a vector
    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        Self {
            data: Array1::from(data).into_dyn(),
            requires_grad,
        }
    }

    /// Create a tensor with the given shape from row-major data
    pub fn from_shape_vec(shape: &[usize], data: Vec<f32>, requires_grad: bool) -> Result<Self> {
        let actual = vec![data.len()];
        let data = ArrayD::from_shape_vec(IxDyn(shape), data)
            .map_err(|_| Error::ShapeMismatch {
                expected: shape.to_vec(),
                actual,
            })?;
        Ok(Self {
            data,
            requires_grad,
        })
    }

    /// All-zero tensor
    pub fn zeros(shape: &[usize], requires_grad: bool) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(shape)),
            requires_grad,
        }
    }

    /// All-one tensor
    pub fn ones(shape: &[usize], requires_grad: bool) -> Self {
        Self {
            data: ArrayD::ones(IxDyn(shape)),
            requires_grad,
        }
    }

    /// Detached all-zero tensor with the shape of `other`
    pub fn zeros_like(other: &Tensor) -> Self {
        Self::zeros(other.shape(), false)
    }

    /// Detached all-one tensor with the shape of `other`
    pub fn ones_like(other: &Tensor) -> Self {
        Self::ones(other.shape(), false)
    }

    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ArrayD<f32> {
        &mut self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Copy that does not require grad
    pub fn detach(&self) -> Self {
        Self {
            data: self.data.clone(),
            requires_grad: false,
        }
    }

    /// Flatten into a row-major vector
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    /// Number of exact zeros
    pub fn count_zeros(&self) -> usize {
        self.data.iter().filter(|&&v| v == 0.0).count()
    }

    /// Element-wise product, broadcasting `other` to the shape of `self`
    pub fn mul(&self, other: &Tensor) -> Result<Tensor> {
        let rhs = other.data.broadcast(self.data.raw_dim()).ok_or_else(|| Error::ShapeMismatch {
            expected: self.shape().to_vec(),
            actual: other.shape().to_vec(),
        })?;
        Ok(Tensor::new(&self.data * &rhs, self.requires_grad || other.requires_grad))
    }

    /// Reshape into a new shape with the same element count
    pub fn reshape(&self, shape: &[usize]) -> Result<Tensor> {
        Tensor::from_shape_vec(shape, self.to_vec(), self.requires_grad)
    }
}
