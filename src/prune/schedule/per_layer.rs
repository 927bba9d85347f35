//! Per-layer ratio scheduler.

use super::metric::SparsityMetric;
use super::{apply_ratios, sparse_layers, RatioMap, SparsityScheduler};
use crate::error::Result;
use crate::nn::Module;

/// Prunes the same target fraction of every layer, thresholding each
/// layer against its own scores.
#[derive(Debug, Clone, PartialEq)]
pub struct PerLayerScheduler {
    ratio: f32,
    metric: SparsityMetric,
}

impl PerLayerScheduler {
    pub fn new(ratio: f32, metric: SparsityMetric) -> Self {
        Self { ratio, metric }
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn metric(&self) -> SparsityMetric {
        self.metric
    }
}

impl SparsityScheduler for PerLayerScheduler {
    fn name(&self) -> &'static str {
        "per_layer"
    }

    /// `n = floor(ratio * numel)`; the rate is the fraction of scores
    /// strictly below the `n`-th smallest score, or 0 when `n == 0`.
    fn get_mask(&self, model: &Module) -> Result<RatioMap> {
        let mut ratios = RatioMap::new();
        for (name, layer) in sparse_layers(model) {
            let mut scores = self.metric.scores(layer.weight())?;
            let numel = scores.len();
            let prune = (numel as f64 * f64::from(self.ratio)).floor() as usize;
            let rate = if prune == 0 || numel == 0 {
                0.0
            } else {
                scores.sort_by(f32::total_cmp);
                let threshold = scores[prune.min(numel) - 1];
                scores.iter().filter(|&&s| s < threshold).count() as f32 / numel as f32
            };
            ratios.insert(name, rate);
        }
        Ok(ratios)
    }

    /// Set each layer's ratio; cached masks are kept.
    fn update_sparse_config(&self, model: &mut Module, ratios: &RatioMap) -> Result<()> {
        apply_ratios(model, ratios, self.metric, false);
        Ok(())
    }
}
