//! Toggle every mask unit of a module tree at once.

use tracing::debug;

use crate::nn::{Layer, Module};

fn toggle(model: &mut Module, enabled: bool) -> usize {
    let mut toggled = 0;
    model.for_each_module_mut(&mut |_, module| {
        if let Layer::SparseLinear(sparse) = module.layer_mut() {
            sparse.weight_fake_sparse_mut().enable_fake_sparse(enabled);
            toggled += 1;
        }
    });
    debug!(enabled, toggled, "Toggled fake sparse units");
    toggled
}

/// Enable all mask units; returns how many were touched.
pub fn enable_sparse(model: &mut Module) -> usize {
    toggle(model, true)
}

/// Disable all mask units; returns how many were touched.
pub fn disable_sparse(model: &mut Module) -> usize {
    toggle(model, false)
}
