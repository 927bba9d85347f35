//! Swap dense layers of a module tree for sparsity-aware ones.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::nn::{qualify, Layer, LayerKind, Module, SparseLinear};
use crate::sparsity::SparsityConfig;

/// Builds the sparsity-aware replacement of a layer, consuming it.
pub type Converter = fn(Layer, &SparsityConfig) -> Result<Layer>;

fn sparse_linear(layer: Layer, config: &SparsityConfig) -> Result<Layer> {
    SparseLinear::from_float(layer, config).map(Layer::SparseLinear)
}

/// Module tree rewriter.
///
/// Walks the children of a module tree and replaces every child whose
/// kind has a registered [`Converter`]. Children whose qualified name is
/// excluded are left untouched together with their whole subtree.
///
/// # Example
///
/// ```
/// use podar::nn::{Layer, LayerKind, Linear, Module};
/// use podar::prune::ModelSparsifier;
/// use podar::sparsity::SparsityConfig;
///
/// let model = Module::container()
///     .with_child("fc", Module::new(Layer::Linear(Linear::new(4, 4, true))))
///     .with_child("head", Module::new(Layer::Linear(Linear::new(4, 2, true))));
///
/// let sparsifier = ModelSparsifier::new(["head"]);
/// let sparse = sparsifier.prepare(&model, &SparsityConfig::default()).unwrap();
/// assert_eq!(sparse.get_submodule("fc").unwrap().kind(), LayerKind::SparseLinear);
/// assert_eq!(sparse.get_submodule("head").unwrap().kind(), LayerKind::Linear);
/// ```
#[derive(Debug, Clone)]
pub struct ModelSparsifier {
    exclude: BTreeSet<String>,
    mapping: BTreeMap<LayerKind, Converter>,
}

impl Default for ModelSparsifier {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl ModelSparsifier {
    /// Sparsifier with the default `Linear -> SparseLinear` mapping.
    pub fn new<I, S>(exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut mapping: BTreeMap<LayerKind, Converter> = BTreeMap::new();
        mapping.insert(LayerKind::Linear, sparse_linear);
        Self {
            exclude: exclude.into_iter().map(Into::into).collect(),
            mapping,
        }
    }

    /// Register or replace the converter for `kind`.
    pub fn with_mapping(mut self, kind: LayerKind, converter: Converter) -> Self {
        self.mapping.insert(kind, converter);
        self
    }

    /// Drop every registered converter.
    pub fn without_mappings(mut self) -> Self {
        self.mapping.clear();
        self
    }

    pub fn exclude(&self) -> &BTreeSet<String> {
        &self.exclude
    }

    /// Kinds that have a converter.
    pub fn mapped_kinds(&self) -> impl Iterator<Item = LayerKind> + '_ {
        self.mapping.keys().copied()
    }

    /// Convert a copy of `model`; the input is left untouched.
    pub fn prepare(&self, model: &Module, config: &SparsityConfig) -> Result<Module> {
        let mut converted = model.clone();
        self.prepare_in_place(&mut converted, config)?;
        Ok(converted)
    }

    /// Convert `model` in place and return the number of swapped modules.
    ///
    /// On error the tree may be partially converted.
    pub fn prepare_in_place(&self, model: &mut Module, config: &SparsityConfig) -> Result<usize> {
        if self.mapping.is_empty() {
            return Err(Error::ConfigError(
                "no module mapping registered for sparsification".to_string(),
            ));
        }
        info!(
            policy = %config.policy,
            ratio = config.ratio,
            "Replace modules with sparsity-aware modules"
        );
        let mut swapped = 0;
        self.convert(model, "", config, &mut swapped)?;
        Ok(swapped)
    }

    fn convert(
        &self,
        module: &mut Module,
        scope: &str,
        config: &SparsityConfig,
        swapped: &mut usize,
    ) -> Result<()> {
        for (name, child) in module.named_children_mut() {
            let qualified = qualify(scope, name);
            if self.exclude.contains(&qualified) {
                info!(module = %qualified, "Skip excluded module");
                continue;
            }
            match self.mapping.get(&child.kind()) {
                Some(converter) => {
                    swap_module(child, *converter, config)?;
                    debug!(module = %qualified, kind = %child.kind(), "Swapped module");
                    *swapped += 1;
                }
                None => self.convert(child, &qualified, config, swapped)?,
            }
        }
        Ok(())
    }
}

/// Replace `module` with a fresh module around the converted layer.
///
/// Forward pre-hooks carry over; forward hooks and children do not.
fn swap_module(module: &mut Module, converter: Converter, config: &SparsityConfig) -> Result<()> {
    let layer = converter(module.take_layer(), config)?;
    let mut replacement = Module::new(layer);
    for hook in module.forward_pre_hooks() {
        replacement.register_forward_pre_hook(hook.clone());
    }
    *module = replacement;
    Ok(())
}
