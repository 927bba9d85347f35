//! YAML schema of a preparation spec
//!
//! ```yaml
//! sparsity:
//!   policy: norm
//!   ratio: 0.2
//!   norm: 2.0
//!   fixed_mask: false
//!   exclude: [head]
//! schedule:
//!   scope: per_network
//!   ratio: 0.5
//!   metric: l2
//! quant:
//!   activation_bits: 8
//!   weight_bits: 8
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::prune::{
    ModelSparsifier, PerLayerScheduler, PerNetworkScheduler, SparsityMetric, SparsityScheduler,
};
use crate::quant::QConfig;
use crate::sparsity::{SparsityConfig, SparsityPolicy};

/// Complete preparation specification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrepareSpec {
    /// Mask units and module swapping
    #[serde(default)]
    pub sparsity: SparsitySpec,

    /// Optional ratio scheduler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleSpec>,

    /// Optional activation quantization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quant: Option<QuantSpec>,
}

/// Mask policy name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyName {
    Magnitude,
    #[default]
    Norm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparsitySpec {
    #[serde(default)]
    pub policy: PolicyName,

    /// Fraction of weights each mask unit prunes
    #[serde(default = "default_sparsity_ratio")]
    pub ratio: f32,

    /// Norm order, used by the norm policy only
    #[serde(default = "default_norm")]
    pub norm: f32,

    #[serde(default)]
    pub fixed_mask: bool,

    /// Qualified module names left dense
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for SparsitySpec {
    fn default() -> Self {
        Self {
            policy: PolicyName::default(),
            ratio: default_sparsity_ratio(),
            norm: default_norm(),
            fixed_mask: false,
            exclude: Vec::new(),
        }
    }
}

/// Scheduler scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleScope {
    PerLayer,
    #[default]
    PerNetwork,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    #[serde(default)]
    pub scope: ScheduleScope,

    /// Target pruning fraction
    pub ratio: f32,

    /// `l2`, `mag` or `grad`
    #[serde(default = "default_metric")]
    pub metric: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantSpec {
    #[serde(default = "default_bits")]
    pub activation_bits: usize,

    #[serde(default = "default_bits")]
    pub weight_bits: usize,
}

impl Default for QuantSpec {
    fn default() -> Self {
        Self {
            activation_bits: default_bits(),
            weight_bits: default_bits(),
        }
    }
}

fn default_sparsity_ratio() -> f32 {
    0.1
}

fn default_norm() -> f32 {
    2.0
}

fn default_metric() -> String {
    "l2".to_string()
}

fn default_bits() -> usize {
    8
}

impl PrepareSpec {
    /// Sparsifier with the default mapping and the configured exclusions.
    pub fn sparsifier(&self) -> ModelSparsifier {
        ModelSparsifier::new(self.sparsity.exclude.iter().cloned())
    }

    pub fn sparsity_config(&self) -> SparsityConfig {
        let policy = match self.sparsity.policy {
            PolicyName::Magnitude => SparsityPolicy::Magnitude,
            PolicyName::Norm => SparsityPolicy::Norm { p: self.sparsity.norm },
        };
        SparsityConfig {
            policy,
            ratio: self.sparsity.ratio,
            fixed_mask: self.sparsity.fixed_mask,
        }
    }

    /// Scheduler described by the `schedule` section, if any.
    ///
    /// An unknown metric name is `NotImplemented`.
    pub fn scheduler(&self) -> Result<Option<Box<dyn SparsityScheduler>>> {
        let Some(schedule) = &self.schedule else {
            return Ok(None);
        };
        let metric: SparsityMetric = schedule.metric.parse()?;
        let scheduler: Box<dyn SparsityScheduler> = match schedule.scope {
            ScheduleScope::PerLayer => Box::new(PerLayerScheduler::new(schedule.ratio, metric)),
            ScheduleScope::PerNetwork => Box::new(PerNetworkScheduler::new(schedule.ratio, metric)),
        };
        Ok(Some(scheduler))
    }

    /// Quantizer recipes described by the `quant` section, if any.
    pub fn qconfig(&self) -> Option<QConfig> {
        self.quant.as_ref().map(|q| QConfig::with_bits(q.activation_bits, q.weight_bits))
    }
}
