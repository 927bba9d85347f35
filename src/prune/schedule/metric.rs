//! Per-weight importance scores used by the ratio schedulers.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::Tensor;

/// How a weight is scored; low scores are pruned first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SparsityMetric {
    /// Squared value
    #[default]
    L2,
    /// Absolute value
    Magnitude,
    /// Gradient-based saliency; accepted but not computable
    Gradient,
}

impl SparsityMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            SparsityMetric::L2 => "l2",
            SparsityMetric::Magnitude => "mag",
            SparsityMetric::Gradient => "grad",
        }
    }

    /// One score per element of `weight`, row-major.
    pub fn scores(&self, weight: &Tensor) -> Result<Vec<f32>> {
        match self {
            SparsityMetric::L2 => Ok(weight.data().iter().map(|w| w * w).collect()),
            SparsityMetric::Magnitude => Ok(weight.data().iter().map(|w| w.abs()).collect()),
            SparsityMetric::Gradient => {
                Err(Error::NotImplemented(format!("sparsity metric '{self}'")))
            }
        }
    }
}

impl fmt::Display for SparsityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SparsityMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "l2" => Ok(SparsityMetric::L2),
            "mag" => Ok(SparsityMetric::Magnitude),
            "grad" => Ok(SparsityMetric::Gradient),
            other => Err(Error::NotImplemented(format!("sparsity metric '{other}'"))),
        }
    }
}
