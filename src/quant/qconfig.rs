//! Quantization config: one fake-quantizer recipe per tensor role.

use serde::{Deserialize, Serialize};

use super::fake_quantize::{FakeQuantConfig, FakeQuantize};

/// Recipes for activation and weight fake quantizers.
///
/// Defaults to 8-bit asymmetric activations and 8-bit symmetric weights.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QConfig {
    pub activation: FakeQuantConfig,
    pub weight: FakeQuantConfig,
}

impl Default for QConfig {
    fn default() -> Self {
        Self {
            activation: FakeQuantConfig::q8_asymmetric(),
            weight: FakeQuantConfig::q8_symmetric(),
        }
    }
}

impl QConfig {
    pub fn new(activation: FakeQuantConfig, weight: FakeQuantConfig) -> Self {
        Self { activation, weight }
    }

    /// Asymmetric activations and symmetric weights at the given widths.
    pub fn with_bits(activation_bits: usize, weight_bits: usize) -> Self {
        Self::new(
            FakeQuantConfig::asymmetric(activation_bits),
            FakeQuantConfig::symmetric(weight_bits),
        )
    }

    /// Fresh, uncalibrated activation quantizer.
    pub fn activation(&self) -> FakeQuantize {
        FakeQuantize::new(self.activation.clone())
    }

    /// Fresh, uncalibrated weight quantizer.
    pub fn weight(&self) -> FakeQuantize {
        FakeQuantize::new(self.weight.clone())
    }
}
