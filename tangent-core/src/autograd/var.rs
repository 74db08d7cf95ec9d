use crate::array::{Array, Element};
use crate::autograd::graph::{topological_sort, NodeId};
use crate::autograd::BackwardOp;
use crate::error::TangentError;
use log::trace;
use std::cell::{Ref, RefCell};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Internal storage of a graph node.
pub struct VarData<T: Element> {
    pub(crate) value: Array<T>,
    /// Leaves with `requires_grad` receive a gradient in `grad` after `backward()`.
    pub(crate) requires_grad: bool,
    pub(crate) grad: Option<Array<T>>,
    /// The operation that produced this node; `None` for leaves and constants.
    pub(crate) grad_fn: Option<Rc<dyn BackwardOp<T>>>,
}

/// A value in a dynamically recorded computation graph.
///
/// Cloning a `Var` is cheap and shares the node. Graphs are single-threaded:
/// `Var` is neither `Send` nor `Sync`.
pub struct Var<T: Element = f64> {
    pub(crate) data: Rc<RefCell<VarData<T>>>,
}

impl<T: Element> Clone for Var<T> {
    fn clone(&self) -> Self {
        Var {
            data: Rc::clone(&self.data),
        }
    }
}

impl<T: Element> Var<T> {
    fn with(value: Array<T>, requires_grad: bool, grad_fn: Option<Rc<dyn BackwardOp<T>>>) -> Self {
        Var {
            data: Rc::new(RefCell::new(VarData {
                value,
                requires_grad,
                grad: None,
                grad_fn,
            })),
        }
    }

    /// A leaf that requires a gradient.
    pub fn leaf(value: Array<T>) -> Self {
        Self::with(value, true, None)
    }

    /// A leaf that is never differentiated.
    pub fn constant(value: Array<T>) -> Self {
        Self::with(value, false, None)
    }

    /// Wraps the output of an op, recording `grad_fn` only when an input requires grad.
    pub(crate) fn from_op(value: Array<T>, requires_grad: bool, grad_fn: Rc<dyn BackwardOp<T>>) -> Self {
        if requires_grad {
            Self::with(value, true, Some(grad_fn))
        } else {
            Self::with(value, false, None)
        }
    }

    pub(crate) fn node_id(&self) -> NodeId<T> {
        Rc::as_ptr(&self.data)
    }

    pub fn value(&self) -> Ref<'_, Array<T>> {
        Ref::map(self.data.borrow(), |d| &d.value)
    }

    pub fn shape(&self) -> Vec<usize> {
        self.data.borrow().value.shape().to_vec()
    }

    pub fn numel(&self) -> usize {
        self.data.borrow().value.numel()
    }

    /// Value of a single-element var.
    pub fn item(&self) -> Result<T, TangentError> {
        self.data.borrow().value.item()
    }

    pub fn requires_grad(&self) -> bool {
        self.data.borrow().requires_grad
    }

    pub fn is_leaf(&self) -> bool {
        self.data.borrow().grad_fn.is_none()
    }

    /// Gradient accumulated by the last `backward()` call, if any.
    pub fn grad(&self) -> Option<Array<T>> {
        self.data.borrow().grad.clone()
    }

    pub fn zero_grad(&self) {
        self.data.borrow_mut().grad = None;
    }

    pub(crate) fn grad_fn(&self) -> Option<Rc<dyn BackwardOp<T>>> {
        self.data.borrow().grad_fn.clone()
    }

    fn accumulate_grad(&self, grad: Array<T>) -> Result<(), TangentError> {
        let mut data = self.data.borrow_mut();
        if grad.shape() != data.value.shape() {
            return Err(TangentError::InternalError(format!(
                "gradient of shape {:?} for a leaf of shape {:?}",
                grad.shape(),
                data.value.shape()
            )));
        }
        let next = match data.grad.take() {
            Some(existing) => existing.add(&grad)?,
            None => grad,
        };
        data.grad = Some(next);
        Ok(())
    }

    /// Back-propagates from this single-element node to every leaf that requires grad.
    ///
    /// # Errors
    /// `TangentError::BackwardNonScalar` if this node holds more than one element.
    pub fn backward(&self) -> Result<(), TangentError> {
        if self.numel() != 1 {
            return Err(TangentError::BackwardNonScalar { shape: self.shape() });
        }
        if !self.requires_grad() {
            return Ok(());
        }

        let mut grads: HashMap<NodeId<T>, Array<T>> = HashMap::new();
        grads.insert(self.node_id(), Array::ones(&self.shape()));

        let sorted = topological_sort(self);
        for node in sorted.iter().rev() {
            let grad = match grads.remove(&node.node_id()) {
                Some(grad) => grad,
                None => continue,
            };

            let op = match node.grad_fn() {
                Some(op) => op,
                None => {
                    node.accumulate_grad(grad)?;
                    continue;
                }
            };

            trace!("backward through {:?}", op);
            let input_grads = op.backward(&grad)?;
            let inputs = op.inputs();
            if input_grads.len() != inputs.len() {
                return Err(TangentError::InternalError(format!(
                    "{:?} returned {} gradients for {} inputs",
                    op,
                    input_grads.len(),
                    inputs.len()
                )));
            }

            for (input, input_grad) in inputs.iter().zip(input_grads) {
                if !input.requires_grad() {
                    continue;
                }
                match grads.entry(input.node_id()) {
                    Entry::Occupied(mut entry) => {
                        let sum = entry.get().add(&input_grad)?;
                        entry.insert(sum);
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(input_grad);
                    }
                }
            }
        }
        Ok(())
    }
}

impl<T: Element> fmt::Debug for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data.try_borrow() {
            Ok(data) => write!(
                f,
                "Var(value={}, requires_grad={}, has_grad={}, has_grad_fn={})",
                data.value,
                data.requires_grad,
                data.grad.is_some(),
                data.grad_fn.is_some()
            ),
            Err(_) => write!(f, "Var(<borrowed>)"),
        }
    }
}

impl<T: Element> fmt::Display for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data.try_borrow() {
            Ok(data) => write!(f, "{}", data.value),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
