//! Quantization-aware training preparation
//!
//! - Fake quantization with STE
//! - Per-role quantizer recipes ([`QConfig`])
//! - Activation quantizer pass over traced graphs

mod activation;
mod fake_quantize;
mod qconfig;


pub use activation::{ActQuantTargets, ActivationQuantizer, ACT_QUANT_SUFFIX, WEIGHT_QUANT_SUFFIX};
pub use fake_quantize::{FakeQuantConfig, FakeQuantize};
pub use qconfig::QConfig;
