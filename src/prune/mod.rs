//! Sparsity-aware training preparation
//!
//! - **Sparsifier**: swaps dense layers of a module tree for sparsity-aware layers
//! - **Ratio schedulers**: per-layer or network-wide pruning ratios from weight scores
//!
//! # Example
//!
//! ```
//! use podar::nn::{Layer, Linear, Module};
//! use podar::prune::{ModelSparsifier, PerNetworkScheduler, SparsityMetric, SparsityScheduler};
//! use podar::sparsity::SparsityConfig;
//!
//! let model = Module::sequential([
//!     Module::new(Layer::Linear(Linear::new(8, 8, true))),
//!     Module::new(Layer::Relu),
//!     Module::new(Layer::Linear(Linear::new(8, 4, true))),
//! ]);
//!
//! let mut sparse = ModelSparsifier::new(Vec::<String>::new())
//!     .prepare(&model, &SparsityConfig::magnitude())
//!     .unwrap();
//! let ratios = PerNetworkScheduler::new(0.5, SparsityMetric::L2).apply(&mut sparse).unwrap();
//! assert_eq!(ratios.len(), 2);
//! ```

mod schedule;
mod sparsifier;


pub use schedule::{
    PerLayerScheduler, PerNetworkScheduler, RatioMap, SparsityMetric, SparsityScheduler,
};
pub use sparsifier::{Converter, ModelSparsifier};
