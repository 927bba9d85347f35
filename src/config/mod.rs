//! Declarative preparation config
//!
//! A YAML [`PrepareSpec`] describes the sparsity, scheduling and
//! quantization settings of one preparation run and builds the runtime
//! objects for them.

mod loader;
mod schema;
mod validate;


pub use loader::{load_config, save_config};
pub use schema::{PolicyName, PrepareSpec, QuantSpec, ScheduleScope, ScheduleSpec, SparsitySpec};
pub use validate::{validate_spec, ValidationError};
