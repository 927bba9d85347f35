//! Arena-backed computation graph
//!
//! Nodes live in an arena indexed by [`NodeId`]; a separate order vector
//! holds the execution order. Ids stay valid when nodes are inserted in
//! the middle, so rewrite passes can keep ids across insertions.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use super::node::{Argument, Node, NodeId, OpKind};
use crate::error::{Error, Result};

/// Traced computation graph
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    order: Vec<NodeId>,
    used_names: HashSet<String>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph input named `name`.
    pub fn placeholder(&mut self, name: &str) -> NodeId {
        self.append(OpKind::Placeholder, name, Vec::new(), BTreeMap::new())
    }

    pub fn get_attr(&mut self, target: &str) -> NodeId {
        self.append(OpKind::GetAttr, target, Vec::new(), BTreeMap::new())
    }

    pub fn call_module(&mut self, target: &str, args: Vec<Argument>) -> NodeId {
        self.append(OpKind::CallModule, target, args, BTreeMap::new())
    }

    pub fn call_function(&mut self, target: &str, args: Vec<Argument>) -> NodeId {
        self.append(OpKind::CallFunction, target, args, BTreeMap::new())
    }

    pub fn call_method(&mut self, target: &str, args: Vec<Argument>) -> NodeId {
        self.append(OpKind::CallMethod, target, args, BTreeMap::new())
    }

    /// Graph result.
    pub fn output(&mut self, value: Argument) -> NodeId {
        self.append(OpKind::Output, "output", vec![value], BTreeMap::new())
    }

    /// Append a node at the end of the execution order.
    ///
    /// The name is derived from `target` and made unique.
    pub fn create_node(
        &mut self,
        op: OpKind,
        target: &str,
        args: Vec<Argument>,
        kwargs: BTreeMap<String, Argument>,
    ) -> NodeId {
        self.append(op, target, args, kwargs)
    }

    /// Create a node placed right after `anchor` in execution order.
    pub fn insert_after(
        &mut self,
        anchor: NodeId,
        op: OpKind,
        target: &str,
        args: Vec<Argument>,
    ) -> Result<NodeId> {
        let pos = self
            .position(anchor)
            .ok_or_else(|| Error::GraphLint(format!("anchor node {anchor} is not in the graph")))?;
        let id = self.alloc(op, target, args, BTreeMap::new());
        self.order.insert(pos + 1, id);
        Ok(id)
    }

    fn append(
        &mut self,
        op: OpKind,
        target: &str,
        args: Vec<Argument>,
        kwargs: BTreeMap<String, Argument>,
    ) -> NodeId {
        let id = self.alloc(op, target, args, kwargs);
        self.order.push(id);
        id
    }

    fn alloc(
        &mut self,
        op: OpKind,
        target: &str,
        args: Vec<Argument>,
        kwargs: BTreeMap<String, Argument>,
    ) -> NodeId {
        let id = self.nodes.len();
        let name = self.unique_name(target);
        self.nodes.push(Node {
            id,
            name,
            op,
            target: target.to_string(),
            args,
            kwargs,
        });
        id
    }

    /// `layer1.conv` becomes `layer1_conv`, then `layer1_conv_1`, ... on clashes.
    fn unique_name(&mut self, target: &str) -> String {
        let mut base: String = target
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit()) {
            base.insert(0, '_');
        }
        let mut name = base.clone();
        let mut suffix = 1;
        while self.used_names.contains(&name) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.used_names.insert(name.clone());
        name
    }

    /// Nodes in execution order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|&id| self.nodes.get(id))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look a node up by its unique name.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.nodes().find(|n| n.name == name)
    }

    /// Index of `id` in execution order.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|&n| n == id)
    }

    /// Nodes that read `id`, in execution order.
    pub fn users(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes().filter(|n| n.input_nodes().contains(&id)).map(|n| n.id).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Retarget every reference to `old` at `new`, in args and kwargs,
    /// except inside nodes for which `skip` holds. Returns how many nodes
    /// were rewritten.
    pub fn replace_all_uses_with<F>(&mut self, old: NodeId, new: NodeId, skip: F) -> usize
    where
        F: Fn(&Node) -> bool,
    {
        let mut rewritten = 0;
        for &id in &self.order {
            let Some(node) = self.nodes.get_mut(id) else { continue };
            if skip(node) {
                continue;
            }
            if node.replace_input(old, new) {
                rewritten += 1;
            }
        }
        rewritten
    }

    /// Check structural well-formedness.
    pub fn lint(&self) -> Result<()> {
        let mut position: HashMap<NodeId, usize> = HashMap::with_capacity(self.order.len());
        for (pos, &id) in self.order.iter().enumerate() {
            if id >= self.nodes.len() {
                return Err(Error::GraphLint(format!("order references missing node {id}")));
            }
            if position.insert(id, pos).is_some() {
                return Err(Error::GraphLint(format!("node {id} appears twice in the order")));
            }
        }

        if self.nodes().filter(|n| n.op == OpKind::Output).count() > 1 {
            return Err(Error::GraphLint("graph has more than one output".to_string()));
        }

        let mut names = HashSet::with_capacity(self.order.len());
        for (pos, node) in self.nodes().enumerate() {
            if !names.insert(node.name.as_str()) {
                return Err(Error::GraphLint(format!("duplicate node name '{}'", node.name)));
            }
            for input in node.input_nodes() {
                if input == node.id {
                    return Err(Error::GraphLint(format!("node '{}' references itself", node.name)));
                }
                match position.get(&input) {
                    None => {
                        return Err(Error::GraphLint(format!(
                            "node '{}' references node {input} which is not in the graph",
                            node.name
                        )))
                    }
                    Some(&p) if p > pos => {
                        return Err(Error::GraphLint(format!(
                            "node '{}' is used by '{}' before it is defined",
                            self.nodes[input].name, node.name
                        )))
                    }
                    Some(_) => {}
                }
            }
            if node.op == OpKind::Output && pos + 1 != self.order.len() {
                return Err(Error::GraphLint("output node is not last".to_string()));
            }
        }
        Ok(())
    }

    fn render_arg(&self, arg: &Argument) -> String {
        match arg {
            Argument::Node(id) => match self.nodes.get(*id) {
                Some(node) => format!("%{}", node.name),
                None => format!("%<missing {id}>"),
            },
            Argument::Int(v) => v.to_string(),
            Argument::Float(v) => format!("{v:?}"),
            Argument::Bool(v) => v.to_string(),
            Argument::Str(s) => format!("{s:?}"),
            Argument::None => "None".to_string(),
            Argument::List(items) => {
                let inner: Vec<String> = items.iter().map(|a| self.render_arg(a)).collect();
                format!("[{}]", inner.join(", "))
            }
        }
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "graph():")?;
        for node in self.nodes() {
            let mut args: Vec<String> = node.args.iter().map(|a| self.render_arg(a)).collect();
            args.extend(node.kwargs.iter().map(|(k, v)| format!("{k}={}", self.render_arg(v))));
            match node.op {
                OpKind::Output => writeln!(f, "    return {}", args.join(", "))?,
                OpKind::Placeholder => writeln!(f, "    %{} : placeholder", node.name)?,
                op => {
                    let args = args.join(", ");
                    writeln!(f, "    %{} : {op}[{}]({args})", node.name, node.target)?
                }
            }
        }
        Ok(())
    }
}
