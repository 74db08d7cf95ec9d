//! Gradients of scalar losses with respect to differentiable structures.
//!
//! The engine flattens an instance through its own [`TreeRegistry`], turns
//! every leaf into a graph leaf, hands the loss a tangent of those leaves and
//! reassembles the leaf gradients into a tangent of the instance's type.

use crate::array::{Array, Element};
use crate::autograd::Var;
use crate::differentiable::Differentiable;
use crate::error::TangentError;
use crate::registry::TreeRegistry;
use crate::tangent::Tangent;
use log::{debug, warn};
use std::marker::PhantomData;

#[derive(Debug, Clone)]
pub struct GradEngine<T: Element = f64> {
    registry: TreeRegistry,
    _element: PhantomData<T>,
}

impl<T: Element> Default for GradEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> GradEngine<T> {
    /// An engine with an empty registry.
    pub fn new() -> Self {
        Self::with_registry(TreeRegistry::new())
    }

    pub fn with_registry(registry: TreeRegistry) -> Self {
        GradEngine {
            registry,
            _element: PhantomData,
        }
    }

    pub fn registry(&self) -> &TreeRegistry {
        &self.registry
    }

    /// Registers `M` with the engine's registry.
    pub fn register_type<M: Differentiable<T>>(&mut self) -> Result<(), TangentError> {
        self.registry.register_type::<M, T>()
    }

    /// Gradient of `loss` at `instance`, shaped like `instance.point()`.
    pub fn grad<D, F>(&self, loss: F, instance: &D) -> Result<Tangent<Array<T>>, TangentError>
    where
        D: Differentiable<T> + ?Sized,
        F: Fn(&Tangent<Var<T>>) -> Result<Var<T>, TangentError>,
    {
        self.value_and_grad(loss, instance).map(|(_, grad)| grad)
    }

    /// Value of `loss` at `instance` together with its gradient.
    ///
    /// # Errors
    /// `UnregisteredType` if any type in the instance's tree is unknown to the
    /// registry, `BackwardNonScalar` if the loss is not a single element, and
    /// whatever the loss itself returns.
    pub fn value_and_grad<D, F>(&self, loss: F, instance: &D) -> Result<(T, Tangent<Array<T>>), TangentError>
    where
        D: Differentiable<T> + ?Sized,
        F: Fn(&Tangent<Var<T>>) -> Result<Var<T>, TangentError>,
    {
        let (leaves, def) = self.registry.flatten(instance)?;
        let vars: Vec<Var<T>> = leaves.into_iter().map(Var::leaf).collect();
        let inputs = self.registry.unflatten(&def, vars.clone())?;

        let output = loss(&inputs)?;
        let value = output.item().map_err(|_| TangentError::BackwardNonScalar {
            shape: output.shape(),
        })?;
        output.backward()?;

        let grads = vars
            .iter()
            .enumerate()
            .map(|(i, var)| match var.grad() {
                Some(grad) => grad,
                None => {
                    warn!(
                        "Leaf {} of {} does not affect the loss; its gradient is zero",
                        i,
                        def.schema().type_name()
                    );
                    Array::zeros_like(&var.value())
                }
            })
            .collect();
        debug!(
            "Computed gradient of {} over {} leaves",
            def.schema().type_name(),
            def.num_leaves()
        );
        Ok((value, self.registry.unflatten(&def, grads)?))
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;
