//! Dense affine layer: `y = x @ W^T + b`

use ndarray::{Array1, Array2};

use crate::error::{Error, Result};
use crate::Tensor;

/// Dense linear layer with weight `[out_features, in_features]` and
/// optional bias `[out_features]`.
#[derive(Clone, Debug)]
pub struct Linear {
    weight: Tensor,
    bias: Option<Tensor>,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// Create a layer with small deterministic weights and zero bias.
    pub fn new(in_features: usize, out_features: usize, bias: bool) -> Self {
        let weight_data: Vec<f32> = (0..out_features * in_features)
            .map(|i| {
                // Deterministic "random" init for reproducibility
                let x = ((i + 1) as f32 * 0.37).sin();
                x * 0.1
            })
            .collect();
        let weight = Tensor::new(
            Array2::from_shape_vec((out_features, in_features), weight_data)
                .unwrap_or_else(|_| Array2::zeros((out_features, in_features)))
                .into_dyn(),
            true,
        );
        let bias = bias.then(|| Tensor::zeros(&[out_features], true));
        Self {
            weight,
            bias,
            in_features,
            out_features,
        }
    }

    /// Build from existing tensors, validating shapes.
    pub fn from_parts(weight: Tensor, bias: Option<Tensor>) -> Result<Self> {
        let &[out_features, in_features] = weight.shape() else {
            return Err(Error::ShapeMismatch {
                expected: vec![0, 0],
                actual: weight.shape().to_vec(),
            });
        };
        if let Some(b) = &bias {
            if b.shape() != [out_features] {
                return Err(Error::ShapeMismatch {
                    expected: vec![out_features],
                    actual: b.shape().to_vec(),
                });
            }
        }
        Ok(Self {
            weight,
            bias,
            in_features,
            out_features,
        })
    }

    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        affine(input, &self.weight, self.bias.as_ref())
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn weight_mut(&mut self) -> &mut Tensor {
        &mut self.weight
    }

    pub fn bias(&self) -> Option<&Tensor> {
        self.bias.as_ref()
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// Move out weight and bias.
    pub fn into_parts(self) -> (Tensor, Option<Tensor>) {
        (self.weight, self.bias)
    }
}

/// Affine transform over the last dimension of `input`.
///
/// Accepts `[in]` or `[..., in]` and returns `[out]` or `[..., out]`.
pub(crate) fn affine(input: &Tensor, weight: &Tensor, bias: Option<&Tensor>) -> Result<Tensor> {
    let &[out_features, in_features] = weight.shape() else {
        return Err(Error::ShapeMismatch {
            expected: vec![0, 0],
            actual: weight.shape().to_vec(),
        });
    };
    let Some((&last, leading)) = input.shape().split_last() else {
        return Err(Error::ShapeMismatch {
            expected: vec![in_features],
            actual: vec![],
        });
    };
    if last != in_features {
        let mut expected = leading.to_vec();
        expected.push(in_features);
        return Err(Error::ShapeMismatch {
            expected,
            actual: input.shape().to_vec(),
        });
    }

    let rows: usize = leading.iter().product();
    let shape_err = |actual: &[usize]| Error::ShapeMismatch {
        expected: vec![rows, in_features],
        actual: actual.to_vec(),
    };
    let x = Array2::from_shape_vec((rows, in_features), input.to_vec())
        .map_err(|_| shape_err(input.shape()))?;
    let w = Array2::from_shape_vec((out_features, in_features), weight.to_vec())
        .map_err(|_| shape_err(weight.shape()))?;

    let mut y = x.dot(&w.t());
    if let Some(b) = bias {
        let b = Array1::from(b.to_vec());
        if b.len() != out_features {
            return Err(Error::ShapeMismatch {
                expected: vec![out_features],
                actual: vec![b.len()],
            });
        }
        y += &b;
    }

    let mut out_shape = leading.to_vec();
    out_shape.push(out_features);
    let requires_grad = input.requires_grad() || weight.requires_grad();
    Tensor::from_shape_vec(&out_shape, y.iter().copied().collect(), requires_grad)
}
