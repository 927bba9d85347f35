//! Module tree
//!
//! A [`Module`] is a node of a named tree: it carries one [`Layer`] (a
//! closed set of layer variants), an ordered list of named children and
//! its forward hooks. Containers run their children in order.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::activation::{relu, relu6};
use super::hooks::{ForwardHook, ForwardPreHook};
use super::linear::Linear;
use super::sparse_linear::SparseLinear;
use crate::error::Result;
use crate::quant::FakeQuantize;
use crate::Tensor;

/// Type tag of a [`Layer`], used as key of swap mappings and
/// activation patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Container,
    Identity,
    Linear,
    SparseLinear,
    LinearRelu,
    Relu,
    Relu6,
    FakeQuantize,
}

impl LayerKind {
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Container => "Container",
            LayerKind::Identity => "Identity",
            LayerKind::Linear => "Linear",
            LayerKind::SparseLinear => "SparseLinear",
            LayerKind::LinearRelu => "LinearReLU",
            LayerKind::Relu => "ReLU",
            LayerKind::Relu6 => "ReLU6",
            LayerKind::FakeQuantize => "FakeQuantize",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Computation carried by a module.
#[derive(Clone, Debug)]
pub enum Layer {
    /// Pure container: forwards through its children in order.
    Container,
    Identity,
    Linear(Linear),
    SparseLinear(SparseLinear),
    /// Fused linear followed by ReLU.
    LinearRelu(Linear),
    Relu,
    Relu6,
    FakeQuantize(FakeQuantize),
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Container => LayerKind::Container,
            Layer::Identity => LayerKind::Identity,
            Layer::Linear(_) => LayerKind::Linear,
            Layer::SparseLinear(_) => LayerKind::SparseLinear,
            Layer::LinearRelu(_) => LayerKind::LinearRelu,
            Layer::Relu => LayerKind::Relu,
            Layer::Relu6 => LayerKind::Relu6,
            Layer::FakeQuantize(_) => LayerKind::FakeQuantize,
        }
    }

    fn forward(&mut self, x: &Tensor) -> Result<Tensor> {
        match self {
            Layer::Container | Layer::Identity => Ok(x.clone()),
            Layer::Linear(linear) => linear.forward(x),
            Layer::SparseLinear(sparse) => sparse.forward(x),
            Layer::LinearRelu(linear) => Ok(relu(&linear.forward(x)?)),
            Layer::Relu => Ok(relu(x)),
            Layer::Relu6 => Ok(relu6(x)),
            Layer::FakeQuantize(fq) => Ok(fq.forward_with_calibration(x)),
        }
    }
}

/// Node of a module tree.
#[derive(Clone, Debug)]
pub struct Module {
    layer: Layer,
    children: Vec<(String, Module)>,
    forward_pre_hooks: Vec<ForwardPreHook>,
    forward_hooks: Vec<ForwardHook>,
}

impl Module {
    pub fn new(layer: Layer) -> Self {
        Self {
            layer,
            children: Vec::new(),
            forward_pre_hooks: Vec::new(),
            forward_hooks: Vec::new(),
        }
    }

    /// Empty container.
    pub fn container() -> Self {
        Self::new(Layer::Container)
    }

    /// Container whose children are named `"0"`, `"1"`, ... in order.
    pub fn sequential(children: impl IntoIterator<Item = Module>) -> Self {
        let mut module = Self::container();
        for (i, child) in children.into_iter().enumerate() {
            module.add_module(i.to_string(), child);
        }
        module
    }

    /// Builder form of [`Module::add_module`].
    pub fn with_child(mut self, name: impl Into<String>, child: Module) -> Self {
        self.add_module(name, child);
        self
    }

    /// Attach a child, replacing any existing child with the same name.
    pub fn add_module(&mut self, name: impl Into<String>, child: Module) {
        let name = name.into();
        match self.children.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = child,
            None => self.children.push((name, child)),
        }
    }

    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut Layer {
        &mut self.layer
    }

    pub fn kind(&self) -> LayerKind {
        self.layer.kind()
    }

    /// Move the layer out, leaving [`Layer::Identity`] in its place.
    pub fn take_layer(&mut self) -> Layer {
        std::mem::replace(&mut self.layer, Layer::Identity)
    }

    pub fn set_layer(&mut self, layer: Layer) {
        self.layer = layer;
    }

    pub fn named_children(&self) -> impl Iterator<Item = (&str, &Module)> {
        self.children.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub(crate) fn named_children_mut(&mut self) -> impl Iterator<Item = (&str, &mut Module)> {
        self.children.iter_mut().map(|(n, m)| (n.as_str(), m))
    }

    /// All modules in pre-order with dotted qualified names; the root is `""`.
    pub fn named_modules(&self) -> Vec<(String, &Module)> {
        let mut out = Vec::new();
        self.collect_named(String::new(), &mut out);
        out
    }

    fn collect_named<'a>(&'a self, prefix: String, out: &mut Vec<(String, &'a Module)>) {
        out.push((prefix.clone(), self));
        for (name, child) in &self.children {
            child.collect_named(qualify(&prefix, name), out);
        }
    }

    /// Visit every module in pre-order with its qualified name.
    pub fn visit_modules_mut<F>(&mut self, f: &mut F) -> Result<()>
    where
        F: FnMut(&str, &mut Module) -> Result<()>,
    {
        self.visit_named_mut("", f)
    }

    /// Infallible form of [`Module::visit_modules_mut`].
    pub fn for_each_module_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&str, &mut Module),
    {
        self.for_each_named_mut("", f);
    }

    fn for_each_named_mut<F>(&mut self, prefix: &str, f: &mut F)
    where
        F: FnMut(&str, &mut Module),
    {
        f(prefix, self);
        for (name, child) in &mut self.children {
            child.for_each_named_mut(&qualify(prefix, name), f);
        }
    }

    fn visit_named_mut<F>(&mut self, prefix: &str, f: &mut F) -> Result<()>
    where
        F: FnMut(&str, &mut Module) -> Result<()>,
    {
        f(prefix, self)?;
        for (name, child) in &mut self.children {
            child.visit_named_mut(&qualify(prefix, name), f)?;
        }
        Ok(())
    }

    /// Resolve a dotted path; `""` is the module itself.
    pub fn get_submodule(&self, target: &str) -> Option<&Module> {
        if target.is_empty() {
            return Some(self);
        }
        target.split('.').try_fold(self, |module, part| {
            module.children.iter().find(|(n, _)| n == part).map(|(_, m)| m)
        })
    }

    pub fn get_submodule_mut(&mut self, target: &str) -> Option<&mut Module> {
        if target.is_empty() {
            return Some(self);
        }
        target.split('.').try_fold(self, |module, part| {
            module.children.iter_mut().find(|(n, _)| n == part).map(|(_, m)| m)
        })
    }

    pub fn register_forward_pre_hook(&mut self, hook: ForwardPreHook) {
        self.forward_pre_hooks.push(hook);
    }

    pub fn register_forward_hook(&mut self, hook: ForwardHook) {
        self.forward_hooks.push(hook);
    }

    pub fn forward_pre_hooks(&self) -> &[ForwardPreHook] {
        &self.forward_pre_hooks
    }

    pub fn forward_hooks(&self) -> &[ForwardHook] {
        &self.forward_hooks
    }

    /// Run pre-hooks, the layer (or the children in order for a
    /// container), then post-hooks.
    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let mut x = input.clone();
        for hook in &self.forward_pre_hooks {
            if let Some(replaced) = hook.call(&x) {
                x = replaced;
            }
        }

        let mut out = match self.layer {
            Layer::Container => {
                let mut h = x.clone();
                for (_, child) in &mut self.children {
                    h = child.forward(&h)?;
                }
                h
            }
            _ => self.layer.forward(&x)?,
        };

        for hook in &self.forward_hooks {
            if let Some(replaced) = hook.call(&x, &out) {
                out = replaced;
            }
        }
        Ok(out)
    }
}

pub(crate) fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}
