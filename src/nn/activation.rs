//! Element-wise activations

use crate::Tensor;

pub fn relu(x: &Tensor) -> Tensor {
    Tensor::new(x.data().mapv(|v| v.max(0.0)), x.requires_grad())
}

pub fn relu6(x: &Tensor) -> Tensor {
    Tensor::new(x.data().mapv(|v| v.clamp(0.0, 6.0)), x.requires_grad())
}
