//! Forward hooks attached to modules.
//!
//! Hook closures are shared (`Arc`) so a hook can be re-registered on a
//! replacement module without re-creating it.

use std::fmt;
use std::sync::Arc;

use crate::Tensor;

type PreHookFn = dyn Fn(&Tensor) -> Option<Tensor> + Send + Sync;
type PostHookFn = dyn Fn(&Tensor, &Tensor) -> Option<Tensor> + Send + Sync;

/// Runs before a module's forward. Returning `Some` replaces the input.
#[derive(Clone)]
pub struct ForwardPreHook {
    name: String,
    hook: Arc<PreHookFn>,
}

impl ForwardPreHook {
    pub fn new<F>(name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Tensor) -> Option<Tensor> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            hook: Arc::new(hook),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, input: &Tensor) -> Option<Tensor> {
        (self.hook)(input)
    }
}

impl fmt::Debug for ForwardPreHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardPreHook").field("name", &self.name).finish()
    }
}

/// Runs after a module's forward with `(input, output)`. Returning `Some`
/// replaces the output.
#[derive(Clone)]
pub struct ForwardHook {
    name: String,
    hook: Arc<PostHookFn>,
}

impl ForwardHook {
    pub fn new<F>(name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Tensor, &Tensor) -> Option<Tensor> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            hook: Arc::new(hook),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, input: &Tensor, output: &Tensor) -> Option<Tensor> {
        (self.hook)(input, output)
    }
}

impl fmt::Debug for ForwardHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardHook").field("name", &self.name).finish()
    }
}
