//! Activation quantizer pass over traced graphs
//!
//! Finds node outputs that need fake quantization and inserts a
//! `call_module` node running a [`FakeQuantize`](super::FakeQuantize)
//! right after each of them:
//!
//! - `call_module` nodes whose module kind is an activation (`LinearReLU`, `ReLU`)
//! - `call_function` / `call_method` nodes calling an activation (`relu`, `relu6`)
//! - the first positional input of every `grid_sample` function call,
//!   which is quantized with the weight recipe
//!
//! Every reader of a quantized node is rewired to read the quantizer
//! instead; the graph is recompiled once all quantizers are in place.

use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

use super::qconfig::QConfig;
use crate::error::{Error, Result};
use crate::fx::{GraphModule, NodeId, OpKind};
use crate::nn::{Layer, LayerKind, Module};

/// Suffix of activation quantizer modules.
pub const ACT_QUANT_SUFFIX: &str = "_post_act_fake_quantizer";
/// Suffix of quantizers placed on weight-like activations.
pub const WEIGHT_QUANT_SUFFIX: &str = "_weight_fake_quant";

/// Nodes selected for activation quantization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActQuantTargets {
    /// Targets in discovery order; may contain repeats.
    pub nodes: Vec<NodeId>,
    /// Targets that take the weight recipe.
    pub weight_like: BTreeSet<NodeId>,
}

impl ActQuantTargets {
    /// Targets with repeats removed, first occurrence kept.
    pub fn unique(&self) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        self.nodes.iter().copied().filter(|id| seen.insert(*id)).collect()
    }
}

/// Inserts fake quantizers after activations.
#[derive(Debug, Clone)]
pub struct ActivationQuantizer {
    module_kinds: BTreeSet<LayerKind>,
    functions: BTreeSet<String>,
    grid_functions: BTreeSet<String>,
    act_suffix: String,
}

impl Default for ActivationQuantizer {
    fn default() -> Self {
        Self {
            module_kinds: [LayerKind::LinearRelu, LayerKind::Relu].into_iter().collect(),
            functions: ["relu", "relu6"].into_iter().map(String::from).collect(),
            grid_functions: ["grid_sample"].into_iter().map(String::from).collect(),
            act_suffix: ACT_QUANT_SUFFIX.to_string(),
        }
    }
}

impl ActivationQuantizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also quantize the output of modules of `kind`.
    pub fn with_module_kind(mut self, kind: LayerKind) -> Self {
        self.module_kinds.insert(kind);
        self
    }

    /// Also quantize the output of function or method calls named `name`.
    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.functions.insert(name.into());
        self
    }

    /// Treat calls to `name` like `grid_sample`.
    pub fn with_grid_function(mut self, name: impl Into<String>) -> Self {
        self.grid_functions.insert(name.into());
        self
    }

    /// Override the activation quantizer suffix.
    pub fn with_act_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.act_suffix = suffix.into();
        self
    }

    /// Collect the nodes whose outputs need a fake quantizer, in graph order.
    pub fn find_act_quants(&self, gm: &GraphModule) -> Result<ActQuantTargets> {
        let mut targets = ActQuantTargets::default();
        for node in gm.graph().nodes() {
            // Only free functions: the first argument of a method call is its receiver
            if node.op() == OpKind::CallFunction && self.grid_functions.contains(node.target()) {
                match node.args().first().and_then(|a| a.as_node()) {
                    Some(input) => {
                        targets.nodes.push(input);
                        targets.weight_like.insert(input);
                    }
                    None => debug!(node = node.name(), "grid sample input is not a node, skipped"),
                }
            }

            let is_activation = match node.op() {
                OpKind::CallModule => {
                    let module = gm.get_submodule(node.target())?;
                    self.module_kinds.contains(&module.kind())
                }
                OpKind::CallFunction | OpKind::CallMethod => self.functions.contains(node.target()),
                _ => false,
            };
            if is_activation {
                targets.nodes.push(node.id());
            }
        }
        Ok(targets)
    }

    /// Insert one fake quantizer after every target and rewire its readers.
    ///
    /// Returns the inserted nodes in target order. The graph is recompiled
    /// at the end; a lint failure is returned as is.
    pub fn insert_fake_quantize_for_act_quant(
        &self,
        gm: &mut GraphModule,
        qconfig: &QConfig,
    ) -> Result<Vec<NodeId>> {
        let targets = self.find_act_quants(gm)?;
        let mut inserted = Vec::new();

        for target in targets.unique() {
            let node_name = gm
                .graph()
                .node(target)
                .map(|n| n.name().to_string())
                .ok_or_else(|| {
                    Error::GraphLint(format!("target node {target} is not in the graph"))
                })?;

            let (quantizer, suffix) = if targets.weight_like.contains(&target) {
                (qconfig.weight(), WEIGHT_QUANT_SUFFIX)
            } else {
                (qconfig.activation(), self.act_suffix.as_str())
            };
            let module_name = unique_module_name(gm, &format!("{node_name}{suffix}"));
            debug!(node = %node_name, quantizer = %module_name, "Insert fake quantizer");
            gm.add_submodule(&module_name, Module::new(Layer::FakeQuantize(quantizer)))?;

            let graph = gm.graph_mut();
            let quant_node =
                graph.insert_after(target, OpKind::CallModule, &module_name, vec![target.into()])?;
            graph.replace_all_uses_with(target, quant_node, |n| n.id() == quant_node);
            inserted.push(quant_node);
        }

        gm.recompile()?;
        info!(inserted = inserted.len(), "Inserted activation fake quantizers");
        Ok(inserted)
    }

    /// Prepare a traced model for quantization-aware training.
    pub fn prepare(&self, gm: &mut GraphModule, qconfig: &QConfig) -> Result<Vec<NodeId>> {
        self.insert_fake_quantize_for_act_quant(gm, qconfig)
    }
}

fn unique_module_name(gm: &GraphModule, base: &str) -> String {
    let mut name = base.to_string();
    let mut suffix = 1;
    while gm.root().get_submodule(&name).is_some() {
        name = format!("{base}_{suffix}");
        suffix += 1;
    }
    name
}
