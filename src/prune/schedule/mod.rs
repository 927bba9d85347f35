//! Ratio schedulers
//!
//! A scheduler reads the weights of every sparsity-aware layer, derives a
//! pruning ratio per layer and writes it into the layer's mask unit:
//!
//! - [`PerLayerScheduler`]: each layer thresholded on its own scores
//! - [`PerNetworkScheduler`]: one threshold over the pooled scores of all layers
//!
//! Only [`SparseLinear`] layers are scheduled; dense layers left in place
//! by an exclusion list are ignored.

mod metric;
mod per_layer;
mod per_network;


use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::error::Result;
use crate::nn::{Layer, Module, SparseLinear};

pub use metric::SparsityMetric;
pub use per_layer::PerLayerScheduler;
pub use per_network::PerNetworkScheduler;

/// Qualified layer name to pruning ratio.
pub type RatioMap = BTreeMap<String, f32>;

/// Computes and applies per-layer pruning ratios.
pub trait SparsityScheduler {
    fn name(&self) -> &'static str;

    /// Ratio for every sparsity-aware layer of `model`.
    fn get_mask(&self, model: &Module) -> Result<RatioMap>;

    /// Write `ratios` into the matching mask units.
    fn update_sparse_config(&self, model: &mut Module, ratios: &RatioMap) -> Result<()>;

    /// Compute then apply; returns the applied ratios.
    fn apply(&self, model: &mut Module) -> Result<RatioMap> {
        let ratios = self.get_mask(model)?;
        self.update_sparse_config(model, &ratios)?;
        Ok(ratios)
    }
}

/// Sparsity-aware layers in module order.
pub(crate) fn sparse_layers(model: &Module) -> Vec<(String, &SparseLinear)> {
    model
        .named_modules()
        .into_iter()
        .filter_map(|(name, module)| match module.layer() {
            Layer::SparseLinear(layer) => Some((name, layer)),
            _ => None,
        })
        .collect()
}

pub(crate) fn apply_ratios(
    model: &mut Module,
    ratios: &RatioMap,
    metric: SparsityMetric,
    forget: bool,
) {
    for (name, &ratio) in ratios {
        let unit = match model.get_submodule_mut(name).map(Module::layer_mut) {
            Some(Layer::SparseLinear(layer)) => layer.weight_fake_sparse_mut(),
            _ => {
                warn!(module = %name, "No sparsity-aware layer with this name, ratio ignored");
                continue;
            }
        };
        unit.set_ratio(ratio);
        if forget {
            unit.forget_mask();
        }
        info!(module = %name, metric = %metric, ratio, "Set sparsity ratio");
    }
}
