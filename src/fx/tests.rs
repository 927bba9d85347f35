//! Tests for graph construction, rewriting and linting.

use super::*;
use crate::error::Error;
use crate::nn::{Layer, Linear, Module};
use std::collections::BTreeMap;

/// x -> fc -> relu -> output
fn linear_relu() -> GraphModule {
    let root =
        Module::container().with_child("fc", Module::new(Layer::Linear(Linear::new(4, 4, true))));
    let mut g = Graph::new();
    let x = g.placeholder("x");
    let fc = g.call_module("fc", vec![x.into()]);
    let relu = g.call_function("relu", vec![fc.into()]);
    g.output(relu.into());
    GraphModule::new(root, g)
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_names_are_unique_and_sanitized() {
    let mut g = Graph::new();
    let x = g.placeholder("x");
    let a = g.call_module("layer1.conv", vec![x.into()]);
    let b = g.call_function("relu", vec![a.into()]);
    let c = g.call_function("relu", vec![b.into()]);

    assert_eq!(g.node(a).map(Node::name), Some("layer1_conv"));
    assert_eq!(g.node(b).map(Node::name), Some("relu"));
    assert_eq!(g.node(c).map(Node::name), Some("relu_1"));
    assert_eq!(g.node(c).map(Node::target), Some("relu"));
}

#[test]
fn test_insert_after_keeps_ids_and_moves_order() {
    let mut gm = linear_relu();
    let g = gm.graph_mut();
    let fc = g.find("fc").map(Node::id).unwrap();
    let relu = g.find("relu").map(Node::id).unwrap();

    let inserted = g.insert_after(fc, OpKind::CallMethod, "contiguous", vec![fc.into()]).unwrap();
    assert_eq!(g.position(inserted), Some(g.position(fc).unwrap() + 1));
    assert_eq!(g.position(relu), Some(3));
    assert_eq!(g.len(), 5);
    assert_eq!(g.node(relu).map(|n| n.args().to_vec()), Some(vec![Argument::Node(fc)]));
}

#[test]
fn test_insert_after_unknown_anchor() {
    let mut g = Graph::new();
    assert!(matches!(
        g.insert_after(42, OpKind::CallFunction, "relu", vec![]),
        Err(Error::GraphLint(_))
    ));
}

#[test]
fn test_users() {
    let mut g = Graph::new();
    let x = g.placeholder("x");
    let a = g.call_function("relu", vec![x.into()]);
    let b = g.call_function("add", vec![x.into(), a.into()]);
    g.output(b.into());

    assert_eq!(g.users(x), vec![a, b]);
    assert_eq!(g.users(a), vec![b]);
    assert!(g.users(g.find("output").map(Node::id).unwrap()).is_empty());
}

// =============================================================================
// Rewriting
// =============================================================================

#[test]
fn test_replace_all_uses_with_recurses_and_skips() {
    let mut g = Graph::new();
    let x = g.placeholder("x");
    let y = g.placeholder("y");
    let mut kwargs = BTreeMap::new();
    kwargs.insert("other".to_string(), Argument::List(vec![Argument::Node(x), Argument::Int(1)]));
    let cat = g.create_node(OpKind::CallFunction, "cat", vec![x.into()], kwargs);
    let keep = g.call_function("neg", vec![x.into()]);

    let rewritten = g.replace_all_uses_with(x, y, |n| n.id() == keep);
    assert_eq!(rewritten, 1);

    let cat = g.node(cat).unwrap();
    assert_eq!(cat.args(), &[Argument::Node(y)]);
    assert_eq!(cat.kwargs()["other"], Argument::List(vec![Argument::Node(y), Argument::Int(1)]));
    assert_eq!(g.node(keep).unwrap().args(), &[Argument::Node(x)]);
}

// =============================================================================
// Lint
// =============================================================================

#[test]
fn test_lint_accepts_well_formed_graph() {
    let mut gm = linear_relu();
    assert!(gm.graph().lint().is_ok());
    assert!(gm.recompile().is_ok());
    assert!(gm.code().contains("%relu : call_function[relu](%fc)"));
    assert!(gm.code().contains("return %relu"));
}

#[test]
fn test_lint_rejects_forward_reference() {
    let mut gm = linear_relu();
    let g = gm.graph_mut();
    let x = g.find("x").map(Node::id).unwrap();
    let relu = g.find("relu").map(Node::id).unwrap();
    g.insert_after(x, OpKind::CallFunction, "neg", vec![relu.into()]).unwrap();

    assert!(matches!(g.lint(), Err(Error::GraphLint(msg)) if msg.contains("before it is defined")));
    assert!(matches!(gm.recompile(), Err(Error::GraphLint(_))));
}

#[test]
fn test_lint_rejects_self_reference() {
    let mut g = Graph::new();
    let x = g.placeholder("x");
    let relu = g.call_function("relu", vec![x.into()]);
    g.replace_all_uses_with(x, relu, |_| false);
    assert!(matches!(g.lint(), Err(Error::GraphLint(msg)) if msg.contains("itself")));
}

#[test]
fn test_lint_rejects_dangling_reference() {
    let mut g = Graph::new();
    g.call_function("relu", vec![Argument::Node(99)]);
    assert!(matches!(g.lint(), Err(Error::GraphLint(_))));
}

#[test]
fn test_lint_rejects_misplaced_or_repeated_output() {
    let mut g = Graph::new();
    let x = g.placeholder("x");
    g.output(x.into());
    g.call_function("relu", vec![x.into()]);
    assert!(matches!(g.lint(), Err(Error::GraphLint(msg)) if msg.contains("not last")));

    let mut g = Graph::new();
    let x = g.placeholder("x");
    g.output(x.into());
    g.output(x.into());
    assert!(matches!(g.lint(), Err(Error::GraphLint(msg)) if msg.contains("more than one")));
}

// =============================================================================
// GraphModule
// =============================================================================

#[test]
fn test_recompile_requires_resolvable_modules() {
    let mut g = Graph::new();
    let x = g.placeholder("x");
    let missing = g.call_module("blocks.0", vec![x.into()]);
    g.output(missing.into());
    let mut gm = GraphModule::new(Module::container(), g);

    assert!(matches!(gm.recompile(), Err(Error::UnknownModule(t)) if t == "blocks.0"));

    gm.add_submodule("blocks.0", Module::new(Layer::Relu)).unwrap();
    assert!(gm.recompile().is_ok());
    assert_eq!(
        gm.get_submodule("blocks").map(Module::kind).ok(),
        Some(crate::nn::LayerKind::Container)
    );
}

#[test]
fn test_add_submodule_replaces_existing() {
    let mut gm = linear_relu();
    gm.add_submodule("fc", Module::new(Layer::Identity)).unwrap();
    assert_eq!(gm.root().named_children().count(), 1);
    assert!(gm.add_submodule("", Module::new(Layer::Relu)).is_err());
    assert!(matches!(gm.get_submodule("nope"), Err(Error::UnknownModule(_))));
}
