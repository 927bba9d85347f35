//! Graph nodes and their arguments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier of a node inside its [`Graph`](super::Graph)
pub type NodeId = usize;

/// What a node does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    /// Graph input
    Placeholder,
    /// Fetch a parameter or buffer of the root module
    GetAttr,
    /// Invoke a submodule of the root module by qualified name
    CallModule,
    /// Invoke a free function by name
    CallFunction,
    /// Invoke a method on the first argument
    CallMethod,
    /// Graph result
    Output,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Placeholder => "placeholder",
            OpKind::GetAttr => "get_attr",
            OpKind::CallModule => "call_module",
            OpKind::CallFunction => "call_function",
            OpKind::CallMethod => "call_method",
            OpKind::Output => "output",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positional or keyword argument of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    /// Reference to another node's output
    Node(NodeId),
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    None,
    List(Vec<Argument>),
}

impl Argument {
    /// The referenced node if this is a direct node reference
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Argument::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Append every node referenced by this argument, recursing into lists.
    pub fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        match self {
            Argument::Node(id) => out.push(*id),
            Argument::List(items) => items.iter().for_each(|a| a.collect_nodes(out)),
            _ => {}
        }
    }

    /// Retarget references to `old` at `new`; returns whether anything changed.
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) -> bool {
        match self {
            Argument::Node(id) if *id == old => {
                *id = new;
                true
            }
            Argument::List(items) => {
                let mut changed = false;
                for item in items {
                    changed |= item.replace_node(old, new);
                }
                changed
            }
            _ => false,
        }
    }
}

impl From<NodeId> for Argument {
    fn from(id: NodeId) -> Self {
        Argument::Node(id)
    }
}

/// One operation of a graph
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) op: OpKind,
    pub(crate) target: String,
    pub(crate) args: Vec<Argument>,
    pub(crate) kwargs: BTreeMap<String, Argument>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Unique name inside the graph
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn op(&self) -> OpKind {
        self.op
    }

    /// Module path, function name, method name or attribute path
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    pub fn kwargs(&self) -> &BTreeMap<String, Argument> {
        &self.kwargs
    }

    /// Every node this node reads, args first then kwargs, with repeats.
    pub fn input_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for arg in self.args.iter().chain(self.kwargs.values()) {
            arg.collect_nodes(&mut out);
        }
        out
    }

    pub(crate) fn replace_input(&mut self, old: NodeId, new: NodeId) -> bool {
        let mut changed = false;
        for arg in self.args.iter_mut().chain(self.kwargs.values_mut()) {
            changed |= arg.replace_node(old, new);
        }
        changed
    }
}
