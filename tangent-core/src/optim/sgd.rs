use crate::array::{Array, Element};
use crate::differentiable::Differentiable;
use crate::error::TangentError;
use crate::tangent::Tangent;
use log::debug;

/// Plain gradient descent over a differentiable structure.
///
/// A step moves the instance along `-lr * grad` and writes the resulting
/// point back. Opaque fields are never touched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd<T: Element = f64> {
    lr: T,
}

impl<T: Element> Sgd<T> {
    /// Creates a new `Sgd` step with learning rate `lr`.
    ///
    /// # Errors
    /// `TangentError::Configuration` if `lr` is not finite or not positive.
    pub fn new(lr: T) -> Result<Self, TangentError> {
        if !lr.is_finite() || lr <= T::zero() {
            return Err(TangentError::configuration(
                "Sgd",
                format!("learning rate must be finite and positive, got {}", lr),
            ));
        }
        Ok(Sgd { lr })
    }

    pub fn lr(&self) -> T {
        self.lr
    }

    /// The tangent `-lr * grad`.
    pub fn direction(&self, grad: &Tangent<Array<T>>) -> Result<Tangent<Array<T>>, TangentError> {
        let factor = -self.lr;
        grad.map_leaves(|g| Ok(g.scale(factor)))
    }

    /// Moves `instance` one step against `grad`, updates it in place and returns the new point.
    ///
    /// On error `instance` is left unchanged.
    pub fn step<D>(&self, instance: &mut D, grad: &Tangent<Array<T>>) -> Result<Tangent<Array<T>>, TangentError>
    where
        D: Differentiable<T> + ?Sized,
    {
        let next = instance.move_along(&self.direction(grad)?)?;
        instance.update_in_place(&next)?;
        debug!("SGD step on {} with lr {}", next.type_name(), self.lr);
        Ok(next)
    }

    /// Returns a stepped copy of `instance`; `instance` itself is unchanged.
    pub fn step_pure<D>(&self, instance: &D, grad: &Tangent<Array<T>>) -> Result<D, TangentError>
    where
        D: Differentiable<T> + Clone,
    {
        let next = instance.move_along(&self.direction(grad)?)?;
        instance.updated(&next)
    }
}

#[cfg(test)]
#[path = "sgd_test.rs"]
mod sgd_test;
