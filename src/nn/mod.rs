//! Module tree and layers
//!
//! - [`Module`]: named tree node with forward hooks
//! - [`Layer`] / [`LayerKind`]: closed set of layer variants and their tags
//! - [`Linear`]: dense affine layer
//! - [`SparseLinear`]: linear layer with a sparsity mask on its weight

mod activation;
mod hooks;
mod linear;
mod module;
mod sparse_linear;

#[cfg(test)]
mod tests;

pub use activation::{relu, relu6};
pub use hooks::{ForwardHook, ForwardPreHook};
pub use linear::Linear;
pub use module::{Layer, LayerKind, Module};
pub(crate) use module::qualify;
pub use sparse_linear::SparseLinear;
