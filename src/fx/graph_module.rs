//! Graph paired with the module tree its `call_module` nodes resolve against.

use tracing::debug;

use super::graph::Graph;
use super::node::OpKind;
use crate::error::{Error, Result};
use crate::nn::Module;

/// A traced graph plus its root module.
#[derive(Debug, Clone)]
pub struct GraphModule {
    graph: Graph,
    root: Module,
    code: String,
}

impl GraphModule {
    /// Pair a graph with its root module. Call [`GraphModule::recompile`]
    /// to validate the pair.
    pub fn new(root: Module, graph: Graph) -> Self {
        let code = graph.to_string();
        Self { graph, root, code }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn root(&self) -> &Module {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Module {
        &mut self.root
    }

    /// Resolve a dotted submodule path.
    pub fn get_submodule(&self, target: &str) -> Result<&Module> {
        self.root.get_submodule(target).ok_or_else(|| Error::UnknownModule(target.to_string()))
    }

    /// Register `module` at dotted path `target`, creating empty
    /// containers for missing parents. An existing module at `target` is
    /// replaced.
    pub fn add_submodule(&mut self, target: &str, module: Module) -> Result<()> {
        let (parent_path, name) = match target.rsplit_once('.') {
            Some((parent, name)) => (Some(parent), name),
            None => (None, target),
        };
        if name.is_empty() {
            return Err(Error::UnknownModule(target.to_string()));
        }

        let mut parent = &mut self.root;
        if let Some(path) = parent_path {
            for part in path.split('.') {
                if parent.get_submodule(part).is_none() {
                    parent.add_module(part, Module::container());
                }
                parent = parent
                    .get_submodule_mut(part)
                    .ok_or_else(|| Error::UnknownModule(target.to_string()))?;
            }
        }
        parent.add_module(name, module);
        Ok(())
    }

    /// Validate the graph against the module tree and regenerate
    /// [`GraphModule::code`].
    pub fn recompile(&mut self) -> Result<()> {
        self.graph.lint()?;
        for node in self.graph.nodes() {
            if node.op() == OpKind::CallModule && self.root.get_submodule(node.target()).is_none() {
                return Err(Error::UnknownModule(node.target().to_string()));
            }
        }
        self.code = self.graph.to_string();
        debug!(nodes = self.graph.len(), "Recompiled graph module");
        Ok(())
    }

    /// Listing of the graph as of the last recompile.
    pub fn code(&self) -> &str {
        &self.code
    }
}
