//! Error types for model preparation passes.
//!
//! Every preparation step is a one-shot structural transformation: an error
//! aborts the pass and is handed back to the caller unchanged.

use thiserror::Error;

/// Result type alias for podar operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while sparsifying, scheduling or quantizing a model.
#[derive(Error, Debug)]
pub enum Error {
    /// A converter received a layer of the wrong kind (bad mapping entry).
    #[error("Type mismatch: {converter}::from_float only works for {expected}, got {found}")]
    TypeMismatch {
        converter: &'static str,
        expected: &'static str,
        found: String,
    },

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Requested metric or feature has no implementation.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Graph failed its well-formedness check.
    #[error("Graph lint failed: {0}")]
    GraphLint(String),

    /// Tensor shapes are incompatible.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A module path did not resolve inside the module tree.
    #[error("Unknown submodule: '{0}'")]
    UnknownModule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
