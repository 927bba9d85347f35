//! Network-wide ratio scheduler.

use super::metric::SparsityMetric;
use super::{apply_ratios, sparse_layers, RatioMap, SparsityScheduler};
use crate::error::Result;
use crate::nn::Module;

/// Pools the scores of every sparsity-aware layer and derives one global
/// threshold, so layers with many low scores are pruned harder.
#[derive(Debug, Clone, PartialEq)]
pub struct PerNetworkScheduler {
    ratio: f32,
    metric: SparsityMetric,
}

impl PerNetworkScheduler {
    pub fn new(ratio: f32, metric: SparsityMetric) -> Self {
        Self { ratio, metric }
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn metric(&self) -> SparsityMetric {
        self.metric
    }

    /// Score below which a weight is pruned, given the pooled scores.
    ///
    /// Pruning nothing or everything uses an infinite bound.
    fn threshold(&self, pooled: &mut [f32]) -> f32 {
        pooled.sort_by(f32::total_cmp);
        let prune = (pooled.len() as f64 * f64::from(self.ratio)).floor() as usize;
        if prune == 0 {
            f32::NEG_INFINITY
        } else if prune >= pooled.len() {
            f32::INFINITY
        } else {
            pooled[prune]
        }
    }
}

impl SparsityScheduler for PerNetworkScheduler {
    fn name(&self) -> &'static str {
        "per_network"
    }

    fn get_mask(&self, model: &Module) -> Result<RatioMap> {
        let mut per_layer = Vec::new();
        for (name, layer) in sparse_layers(model) {
            per_layer.push((name, self.metric.scores(layer.weight())?));
        }

        let mut pooled: Vec<f32> = per_layer.iter().flat_map(|(_, s)| s.iter().copied()).collect();
        let threshold = self.threshold(&mut pooled);

        Ok(per_layer
            .into_iter()
            .map(|(name, scores)| {
                let rate = if scores.is_empty() {
                    0.0
                } else {
                    scores.iter().filter(|&&s| s < threshold).count() as f32 / scores.len() as f32
                };
                (name, rate)
            })
            .collect())
    }

    /// Set each layer's ratio and drop its cached mask.
    fn update_sparse_config(&self, model: &mut Module, ratios: &RatioMap) -> Result<()> {
        apply_ratios(model, ratios, self.metric, true);
        Ok(())
    }
}
