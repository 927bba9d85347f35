//! Tests for the module tree and layers.

use super::*;
use crate::error::Error;
use crate::sparsity::SparsityConfig;
use crate::Tensor;
use approx::assert_abs_diff_eq;
use proptest::prelude::*;

fn fixed_linear() -> Linear {
    let weight =
        Tensor::from_shape_vec(&[2, 3], vec![1.0, 0.0, -1.0, 0.5, 2.0, 0.0], true).unwrap();
    let bias = Tensor::from_vec(vec![0.1, -0.2], true);
    Linear::from_parts(weight, Some(bias)).unwrap()
}

fn small_tree() -> Module {
    Module::container()
        .with_child("fc1", Module::new(Layer::Linear(Linear::new(3, 4, true))))
        .with_child("act", Module::new(Layer::Relu))
        .with_child(
            "block",
            Module::sequential([
                Module::new(Layer::Linear(Linear::new(4, 4, false))),
                Module::new(Layer::Relu6),
            ]),
        )
}

// =============================================================================
// Linear
// =============================================================================

#[test]
fn test_linear_forward_1d() {
    let linear = fixed_linear();
    let x = Tensor::from_vec(vec![1.0, 2.0, 3.0], false);
    let y = linear.forward(&x).unwrap();

    assert_eq!(y.shape(), &[2]);
    // [1 - 3 + 0.1, 0.5 + 4 - 0.2]
    assert_abs_diff_eq!(y.data()[[0]], -1.9, epsilon = 1e-6);
    assert_abs_diff_eq!(y.data()[[1]], 4.3, epsilon = 1e-6);
}

#[test]
fn test_linear_forward_batched() {
    let linear = fixed_linear();
    let x = Tensor::from_shape_vec(&[2, 3], vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0], false).unwrap();
    let y = linear.forward(&x).unwrap();

    assert_eq!(y.shape(), &[2, 2]);
    assert_abs_diff_eq!(y.data()[[1, 0]], 0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(y.data()[[1, 1]], -0.2, epsilon = 1e-6);
}

#[test]
fn test_linear_forward_rejects_wrong_width() {
    let linear = fixed_linear();
    let x = Tensor::from_vec(vec![1.0, 2.0], false);
    assert!(matches!(linear.forward(&x), Err(Error::ShapeMismatch { .. })));
}

#[test]
fn test_linear_from_parts_validates_bias() {
    let weight = Tensor::zeros(&[2, 3], true);
    let bias = Tensor::zeros(&[3], true);
    assert!(Linear::from_parts(weight, Some(bias)).is_err());

    let weight = Tensor::zeros(&[6], true);
    assert!(Linear::from_parts(weight, None).is_err());
}

// =============================================================================
// SparseLinear
// =============================================================================

#[test]
fn test_from_float_moves_weight_and_bias() {
    let linear = fixed_linear();
    let weight = linear.weight().clone();
    let bias = linear.bias().cloned();

    let sparse =
        SparseLinear::from_float(Layer::Linear(linear), &SparsityConfig::magnitude()).unwrap();

    assert_eq!(sparse.weight(), &weight);
    assert_eq!(sparse.bias(), bias.as_ref());
    assert_eq!(sparse.in_features(), 3);
    assert_eq!(sparse.out_features(), 2);
    assert!(sparse.weight_fake_sparse().is_enabled());
    assert!(sparse.weight_fake_sparse().mask().is_none());
}

#[test]
fn test_from_float_type_mismatch() {
    let err = SparseLinear::from_float(Layer::Relu, &SparsityConfig::default()).unwrap_err();
    match err {
        Error::TypeMismatch { expected, found, .. } => {
            assert_eq!(expected, "Linear");
            assert_eq!(found, "ReLU");
        }
        other => panic!("expected TypeMismatch, got {other:?}"),
    }

    // A fused linear-relu is not a plain Linear either
    let fused = Layer::LinearRelu(Linear::new(2, 2, true));
    assert!(SparseLinear::from_float(fused, &SparsityConfig::default()).is_err());
}

#[test]
fn test_sparse_forward_masks_weight() {
    let config = SparsityConfig::magnitude().with_ratio(0.5);
    let mut sparse = SparseLinear::from_float(Layer::Linear(fixed_linear()), &config).unwrap();

    let w = sparse.effective_weight().unwrap();
    // |w| sorted: 0, 0, 0.5, 1, 1, 2 -> threshold at index 3 = 1.0
    assert_eq!(w.to_vec(), vec![1.0, 0.0, -1.0, 0.0, 2.0, 0.0]);

    let x = Tensor::from_vec(vec![1.0, 1.0, 1.0], false);
    let y = sparse.forward(&x).unwrap();
    assert_abs_diff_eq!(y.data()[[0]], 0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(y.data()[[1]], 1.8, epsilon = 1e-6);
}

#[test]
fn test_into_float_bakes_mask() {
    let config = SparsityConfig::magnitude().with_ratio(0.5);
    let sparse = SparseLinear::from_float(Layer::Linear(fixed_linear()), &config).unwrap();
    let dense = sparse.into_float().unwrap();
    assert_eq!(dense.weight().count_zeros(), 3);
    assert!(dense.bias().is_some());
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(100))]

    /// Zero-ratio magnitude conversion reproduces the dense layer exactly
    #[test]
    fn prop_zero_ratio_conversion_matches_dense(
        weights in prop::collection::vec(-3.0f32..3.0, 12),
        input in prop::collection::vec(-2.0f32..2.0, 4),
    ) {
        let weight = Tensor::from_shape_vec(&[3, 4], weights, true).unwrap();
        let bias = Tensor::from_vec(vec![0.5, -0.5, 0.0], true);
        let dense = Linear::from_parts(weight, Some(bias)).unwrap();
        let x = Tensor::from_vec(input, false);
        let expected = dense.forward(&x).unwrap();

        let config = SparsityConfig::magnitude().with_ratio(0.0);
        let mut sparse = SparseLinear::from_float(Layer::Linear(dense), &config).unwrap();
        let actual = sparse.forward(&x).unwrap();

        prop_assert_eq!(expected.to_vec(), actual.to_vec());
    }

    /// A disabled mask unit leaves the layer output untouched for any policy
    #[test]
    fn prop_disabled_conversion_matches_dense(
        weights in prop::collection::vec(-3.0f32..3.0, 6),
        ratio in 0.0f32..1.0,
    ) {
        let weight = Tensor::from_shape_vec(&[2, 3], weights, true).unwrap();
        let dense = Linear::from_parts(weight, None).unwrap();
        let x = Tensor::from_vec(vec![1.0, -1.0, 0.5], false);
        let expected = dense.forward(&x).unwrap();

        let config = SparsityConfig::norm(2.0).with_ratio(ratio);
        let mut sparse = SparseLinear::from_float(Layer::Linear(dense), &config).unwrap();
        sparse.weight_fake_sparse_mut().disable_fake_sparse();
        let actual = sparse.forward(&x).unwrap();

        prop_assert_eq!(expected.to_vec(), actual.to_vec());
    }
}

// =============================================================================
// Module tree
// =============================================================================

#[test]
fn test_named_modules_preorder() {
    let tree = small_tree();
    let names: Vec<String> = tree.named_modules().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["", "fc1", "act", "block", "block.0", "block.1"]);
}

#[test]
fn test_get_submodule() {
    let tree = small_tree();
    assert_eq!(tree.get_submodule("block.1").map(Module::kind), Some(LayerKind::Relu6));
    assert_eq!(tree.get_submodule("").map(Module::kind), Some(LayerKind::Container));
    assert!(tree.get_submodule("block.7").is_none());
    assert!(tree.get_submodule("nope").is_none());
}

#[test]
fn test_add_module_replaces_same_name() {
    let mut tree = small_tree();
    tree.add_module("act", Module::new(Layer::Identity));
    assert_eq!(tree.named_children().count(), 3);
    assert_eq!(tree.get_submodule("act").map(Module::kind), Some(LayerKind::Identity));
}

#[test]
fn test_sequential_forward_and_hooks() {
    let mut tree = Module::sequential([
        Module::new(Layer::Linear(fixed_linear())),
        Module::new(Layer::Relu),
    ]);
    let x = Tensor::from_vec(vec![1.0, 2.0, 3.0], false);
    let y = tree.forward(&x).unwrap();
    assert_eq!(y.data()[[0]], 0.0);
    assert_abs_diff_eq!(y.data()[[1]], 4.3, epsilon = 1e-6);

    // Pre-hook doubles the input, post-hook negates the output
    tree.register_forward_pre_hook(ForwardPreHook::new("double", |t: &Tensor| {
        Some(Tensor::new(t.data() * 2.0, t.requires_grad()))
    }));
    tree.register_forward_hook(ForwardHook::new("negate", |_: &Tensor, out: &Tensor| {
        Some(Tensor::new(out.data().mapv(|v| -v), out.requires_grad()))
    }));
    let y = tree.forward(&x).unwrap();
    // W @ [2, 4, 6] + b = [-3.9, 8.8]; relu -> [0, 8.8]; negate
    assert_abs_diff_eq!(y.data()[[1]], -8.8, epsilon = 1e-5);
    assert_eq!(tree.forward_pre_hooks()[0].name(), "double");
}

#[test]
fn test_visit_modules_mut_sees_qualified_names() {
    let mut tree = small_tree();
    let mut seen = Vec::new();
    tree.visit_modules_mut(&mut |name, module| {
        if module.kind() == LayerKind::Linear {
            seen.push(name.to_string());
        }
        Ok(())
    })
    .unwrap();
    assert_eq!(seen, vec!["fc1", "block.0"]);
}

#[test]
fn test_for_each_module_mut_visits_every_module() {
    let mut tree = small_tree();
    let mut seen = Vec::new();
    tree.for_each_module_mut(&mut |name, module| {
        seen.push(name.to_string());
        if module.kind() == LayerKind::Relu6 {
            module.set_layer(Layer::Identity);
        }
    });
    assert_eq!(seen, vec!["", "fc1", "act", "block", "block.0", "block.1"]);
    assert_eq!(tree.get_submodule("block.1").map(Module::kind), Some(LayerKind::Identity));
}

#[test]
fn test_take_layer_leaves_identity() {
    let mut m = Module::new(Layer::Relu);
    let layer = m.take_layer();
    assert_eq!(layer.kind(), LayerKind::Relu);
    assert_eq!(m.kind(), LayerKind::Identity);
}
