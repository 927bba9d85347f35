//! Fake quantization operation with Straight-Through Estimator (STE).

use std::fmt;

use crate::Tensor;

use super::config::FakeQuantConfig;

/// Quantize-dequantize unit inserted after activations.
///
/// Holds the calibrated scale and zero point. The first forward through
/// [`FakeQuantize::forward_with_calibration`] runs min-max calibration.
#[derive(Clone, Debug)]
pub struct FakeQuantize {
    /// Quantization configuration
    pub config: FakeQuantConfig,
    /// Scale factor for quantization
    pub scale: f32,
    /// Zero point for asymmetric quantization
    pub zero_point: i32,
    /// Whether scale has been initialized
    pub initialized: bool,
}

impl FakeQuantize {
    pub fn new(config: FakeQuantConfig) -> Self {
        Self {
            config,
            scale: 1.0,
            zero_point: 0,
            initialized: false,
        }
    }

    /// Create with 8-bit symmetric quantization
    pub fn q8() -> Self {
        Self::new(FakeQuantConfig::q8_symmetric())
    }

    /// Initialize scale from data (min-max calibration)
    ///
    /// For symmetric: scale = max(|min|, |max|) / qmax
    /// For asymmetric: scale = (max - min) / (qmax - qmin)
    pub fn calibrate(&mut self, data: &[f32]) {
        if data.is_empty() {
            return;
        }

        let min_val = data.iter().copied().fold(f32::INFINITY, f32::min);
        let max_val = data.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        if self.config.symmetric {
            let max_abs = min_val.abs().max(max_val.abs());
            self.scale = max_abs / self.config.qmax as f32;
            self.zero_point = 0;
        } else {
            // The range must contain zero so that zero is exactly representable
            let (lo, hi) = (min_val.min(0.0), max_val.max(0.0));
            self.scale = (hi - lo) / (self.config.qmax - self.config.qmin) as f32;
            if self.scale >= 1e-10 {
                self.zero_point = (self.config.qmin as f32 - lo / self.scale).round() as i32;
            }
            self.zero_point = self.zero_point.clamp(self.config.qmin, self.config.qmax);
        }

        // Prevent division by zero
        if self.scale < 1e-10 {
            self.scale = 1e-10;
        }

        self.initialized = true;
    }

    /// Quantize then dequantize every element; shape is preserved.
    pub fn forward(&self, input: &Tensor) -> Tensor {
        Tensor::new(input.data().mapv(|x| self.fake_quantize_value(x)), input.requires_grad())
    }

    /// Forward pass, calibrating from `input` first if not yet initialized.
    pub fn forward_with_calibration(&mut self, input: &Tensor) -> Tensor {
        if !self.initialized {
            self.calibrate(&input.to_vec());
        }
        self.forward(input)
    }

    /// Straight-through estimator: `dL/dx = dL/dy`.
    pub fn backward(&self, grad_output: &Tensor) -> Tensor {
        grad_output.clone()
    }

    /// Clamped STE: zero gradient where the input falls outside the
    /// representable range.
    pub fn backward_clamped(&self, grad_output: &Tensor, input: &Tensor) -> Tensor {
        let lo = (self.config.qmin - self.zero_point) as f32 * self.scale;
        let hi = (self.config.qmax - self.zero_point) as f32 * self.scale;

        let mut grad = grad_output.data().clone();
        grad.zip_mut_with(input.data(), |g, &x| {
            if x < lo || x > hi {
                *g = 0.0;
            }
        });
        Tensor::new(grad, grad_output.requires_grad())
    }

    fn fake_quantize_value(&self, x: f32) -> f32 {
        let q = ((x / self.scale) + self.zero_point as f32)
            .round()
            .clamp(self.config.qmin as f32, self.config.qmax as f32) as i32;
        (q - self.zero_point) as f32 * self.scale
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn zero_point(&self) -> i32 {
        self.zero_point
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of quantization levels
    pub fn num_levels(&self) -> usize {
        (self.config.qmax - self.config.qmin + 1) as usize
    }
}

impl fmt::Display for FakeQuantize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FakeQuantize(bits={}, symmetric={}, qmin={}, qmax={})",
            self.config.bits, self.config.symmetric, self.config.qmin, self.config.qmax
        )
    }
}
