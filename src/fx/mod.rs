//! Traced computation graphs
//!
//! - [`Graph`]: arena of [`Node`]s plus execution order, with insertion,
//!   use rewriting and a well-formedness check
//! - [`GraphModule`]: a graph bound to the module tree its `call_module`
//!   nodes refer to

mod graph;
mod graph_module;
mod node;

#[cfg(test)]
mod tests;

pub use graph::Graph;
pub use graph_module::GraphModule;
pub use node::{Argument, Node, NodeId, OpKind};
