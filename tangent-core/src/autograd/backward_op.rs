use crate::array::{Array, Element};
use crate::autograd::var::Var;
use crate::error::TangentError;
use std::fmt::Debug;

/// Defines the interface for the backward pass of a differentiable operation.
///
/// Every op that produces a node from inputs requiring gradients stores an
/// implementation in the output's `grad_fn`. During `backward()` it receives
/// dL/dOutput and returns dL/dInput for each input.
pub trait BackwardOp<T: Element>: Debug {
    /// Computes the gradient of the loss with respect to each input.
    ///
    /// The returned vector must follow the order of [`BackwardOp::inputs`], and
    /// each gradient must have the shape of its input (broadcast dimensions
    /// already reduced).
    fn backward(&self, grad_output: &Array<T>) -> Result<Vec<Array<T>>, TangentError>;

    /// The input nodes of the forward operation.
    fn inputs(&self) -> Vec<Var<T>>;
}
