//! Fake quantization for quantization-aware training
//!
//! - Forward: quantize then dequantize (simulates quantization noise)
//! - Backward: Straight-Through Estimator (STE) passes gradients unchanged

mod config;
mod quantize;


pub use config::FakeQuantConfig;
pub use quantize::FakeQuantize;
