//! Integer grid of a fake quantizer.

use serde::{Deserialize, Serialize};

/// Bit width and signedness of the integer grid values are snapped to.
///
/// `bits` is expected in `2..=16`; wider grids are accepted but gain
/// nothing over `f32` rounding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakeQuantConfig {
    pub bits: usize,
    /// Symmetric grids are centered at 0 and never use a zero point.
    pub symmetric: bool,
    pub qmin: i32,
    pub qmax: i32,
}

impl FakeQuantConfig {
    /// Signed, restricted range: 8 bits gives `[-127, 127]`.
    pub fn symmetric(bits: usize) -> Self {
        let qmax = grid_max(bits.saturating_sub(1));
        Self {
            bits,
            symmetric: true,
            qmin: -qmax,
            qmax,
        }
    }

    /// Unsigned range: 8 bits gives `[0, 255]`.
    pub fn asymmetric(bits: usize) -> Self {
        Self {
            bits,
            symmetric: false,
            qmin: 0,
            qmax: grid_max(bits),
        }
    }

    pub fn q8_symmetric() -> Self {
        Self::symmetric(8)
    }

    pub fn q8_asymmetric() -> Self {
        Self::asymmetric(8)
    }
}

impl Default for FakeQuantConfig {
    fn default() -> Self {
        Self::q8_symmetric()
    }
}

/// `2^bits - 1`, saturating at `i32::MAX`.
fn grid_max(bits: usize) -> i32 {
    1i64.checked_shl(bits as u32)
        .and_then(|v| v.checked_sub(1))
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or(i32::MAX)
}
