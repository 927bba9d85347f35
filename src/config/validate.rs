//! Range checks for preparation specs.

use super::schema::PrepareSpec;

/// Validation error type
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid {field}: {value} (must be in [0.0, 1.0])")]
    InvalidRatio { field: &'static str, value: f32 },

    #[error("Invalid norm order: {0} (must be > 0.0)")]
    InvalidNorm(f32),

    #[error("Invalid {field}: {bits} (must be in 2..=16)")]
    InvalidQuantBits { field: &'static str, bits: usize },
}

fn check_ratio(field: &'static str, value: f32) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidRatio { field, value })
    }
}

fn check_bits(field: &'static str, bits: usize) -> Result<(), ValidationError> {
    if (2..=16).contains(&bits) {
        Ok(())
    } else {
        Err(ValidationError::InvalidQuantBits { field, bits })
    }
}

/// Validate a preparation spec
///
/// Checks:
/// - Ratios are fractions
/// - Norm order is positive (`.inf` allowed)
/// - Quantization widths are representable
pub fn validate_spec(spec: &PrepareSpec) -> Result<(), ValidationError> {
    check_ratio("sparsity ratio", spec.sparsity.ratio)?;

    // NaN fails this comparison too
    if !(spec.sparsity.norm > 0.0) {
        return Err(ValidationError::InvalidNorm(spec.sparsity.norm));
    }

    if let Some(schedule) = &spec.schedule {
        check_ratio("schedule ratio", schedule.ratio)?;
    }

    if let Some(quant) = &spec.quant {
        check_bits("activation bits", quant.activation_bits)?;
        check_bits("weight bits", quant.weight_bits)?;
    }

    Ok(())
}
