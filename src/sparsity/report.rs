//! Sparsity report over the sparsity-aware layers of a model
//!
//! Counts zeros of the effective (masked) weights, per layer and overall.
//! The report serializes to JSON for logging and reporting collaborators.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::nn::{Layer, Module};

/// Per-layer sparsity statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSparsity {
    /// Qualified layer name
    pub name: String,
    /// Ratio configured on the layer's mask unit
    pub ratio: f32,
    /// Fraction of zero weights after masking
    pub sparsity: f32,
    /// Number of zero weights after masking
    pub zero_count: usize,
    /// Total weights
    pub total_count: usize,
}

/// Whole-model sparsity statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparsityReport {
    /// Fraction of zero weights across all sparsity-aware layers
    pub global_sparsity: f32,
    /// Total weights across all sparsity-aware layers
    pub total_parameters: usize,
    /// Zero weights across all sparsity-aware layers
    pub parameters_pruned: usize,
    /// Per-layer statistics in module order
    pub layers: Vec<LayerSparsity>,
}

impl SparsityReport {
    /// Write the report as pretty-printed JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Build a report by running every mask unit on its weight.
///
/// Mask caches are updated exactly as a forward pass would update them.
pub fn sparsity_report(model: &mut Module) -> Result<SparsityReport> {
    let mut layers = Vec::new();
    model.visit_modules_mut(&mut |name, module| {
        if let Layer::SparseLinear(sparse) = module.layer_mut() {
            let weight = sparse.effective_weight()?;
            let zero_count = weight.count_zeros();
            let total_count = weight.len();
            layers.push(LayerSparsity {
                name: name.to_string(),
                ratio: sparse.weight_fake_sparse().ratio(),
                sparsity: if total_count > 0 {
                    zero_count as f32 / total_count as f32
                } else {
                    0.0
                },
                zero_count,
                total_count,
            });
        }
        Ok(())
    })?;

    let total_parameters: usize = layers.iter().map(|l| l.total_count).sum();
    let parameters_pruned: usize = layers.iter().map(|l| l.zero_count).sum();
    let global_sparsity = if total_parameters > 0 {
        parameters_pruned as f32 / total_parameters as f32
    } else {
        0.0
    };

    Ok(SparsityReport {
        global_sparsity,
        total_parameters,
        parameters_pruned,
        layers,
    })
}
