//! Podar: model preparation for sparsity- and quantization-aware training
//!
//! Two independent preparation passes over a network:
//!
//! - **Weight sparsification**: [`prune::ModelSparsifier`] swaps dense layers of
//!   a module tree for [`nn::SparseLinear`] layers whose weight goes through a
//!   cached 0/1 mask ([`sparsity::FakeSparse`]); [`prune::PerLayerScheduler`]
//!   and [`prune::PerNetworkScheduler`] derive per-layer pruning ratios from
//!   weight scores.
//! - **Activation fake quantization**: [`quant::ActivationQuantizer`] scans a
//!   traced [`fx::GraphModule`] for activation outputs and inserts a
//!   [`quant::FakeQuantize`] call after each of them.
//!
//! # Example
//!
//! ```
//! use podar::nn::{Layer, Linear, Module};
//! use podar::prune::ModelSparsifier;
//! use podar::sparsity::{sparsity_report, SparsityConfig};
//!
//! let model = Module::sequential([
//!     Module::new(Layer::Linear(Linear::new(16, 16, true))),
//!     Module::new(Layer::Relu),
//! ]);
//!
//! let config = SparsityConfig::magnitude().with_ratio(0.5);
//! let mut sparse = ModelSparsifier::default().prepare(&model, &config).unwrap();
//! let report = sparsity_report(&mut sparse).unwrap();
//! assert_eq!(report.total_parameters, 256);
//! assert!(report.global_sparsity > 0.4);
//! ```

pub mod config;
pub mod error;
pub mod fx;
pub mod nn;
pub mod prune;
pub mod quant;
pub mod sparsity;
pub mod tensor;

pub use error::{Error, Result};
pub use tensor::Tensor;
