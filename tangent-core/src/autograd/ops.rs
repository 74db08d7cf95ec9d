// tangent-core/src/autograd/ops.rs

use crate::array::{Array, Element};
use crate::autograd::{BackwardOp, Var};
use crate::error::TangentError;
use std::rc::Rc;

// --- Forward Operations ---

/// Element-wise addition with broadcasting.
pub fn add_op<T: Element>(a: &Var<T>, b: &Var<T>) -> Result<Var<T>, TangentError> {
    let value = a.value().add(&b.value())?;
    let grad_fn = AddBackward {
        a: a.clone(),
        b: b.clone(),
    };
    Ok(Var::from_op(value, a.requires_grad() || b.requires_grad(), Rc::new(grad_fn)))
}

/// Element-wise subtraction with broadcasting.
pub fn sub_op<T: Element>(a: &Var<T>, b: &Var<T>) -> Result<Var<T>, TangentError> {
    let value = a.value().sub(&b.value())?;
    let grad_fn = SubBackward {
        a: a.clone(),
        b: b.clone(),
    };
    Ok(Var::from_op(value, a.requires_grad() || b.requires_grad(), Rc::new(grad_fn)))
}

/// Element-wise multiplication with broadcasting.
pub fn mul_op<T: Element>(a: &Var<T>, b: &Var<T>) -> Result<Var<T>, TangentError> {
    let value = a.value().mul(&b.value())?;
    let grad_fn = MulBackward {
        a: a.clone(),
        b: b.clone(),
    };
    Ok(Var::from_op(value, a.requires_grad() || b.requires_grad(), Rc::new(grad_fn)))
}

pub fn neg_op<T: Element>(a: &Var<T>) -> Result<Var<T>, TangentError> {
    let value = a.value().neg();
    Ok(Var::from_op(value, a.requires_grad(), Rc::new(NegBackward { a: a.clone() })))
}

/// Multiplies every element by a constant.
pub fn mul_scalar_op<T: Element>(a: &Var<T>, factor: T) -> Result<Var<T>, TangentError> {
    let value = a.value().scale(factor);
    let grad_fn = MulScalarBackward {
        a: a.clone(),
        factor,
    };
    Ok(Var::from_op(value, a.requires_grad(), Rc::new(grad_fn)))
}

pub fn add_scalar_op<T: Element>(a: &Var<T>, value: T) -> Result<Var<T>, TangentError> {
    let out = a.value().add_scalar(value);
    Ok(Var::from_op(out, a.requires_grad(), Rc::new(AddScalarBackward { a: a.clone() })))
}

/// Sum of all elements, as a 0-D var.
pub fn sum_op<T: Element>(a: &Var<T>) -> Result<Var<T>, TangentError> {
    let value = a.value().sum_all();
    Ok(Var::from_op(value, a.requires_grad(), Rc::new(SumBackward { a: a.clone() })))
}

/// Mean of all elements, as a 0-D var.
pub fn mean_op<T: Element>(a: &Var<T>) -> Result<Var<T>, TangentError> {
    let value = Array::scalar(a.value().mean());
    Ok(Var::from_op(value, a.requires_grad(), Rc::new(MeanBackward { a: a.clone() })))
}

impl<T: Element> Var<T> {
    pub fn add(&self, other: &Var<T>) -> Result<Var<T>, TangentError> {
        add_op(self, other)
    }

    pub fn sub(&self, other: &Var<T>) -> Result<Var<T>, TangentError> {
        sub_op(self, other)
    }

    pub fn mul(&self, other: &Var<T>) -> Result<Var<T>, TangentError> {
        mul_op(self, other)
    }

    pub fn neg(&self) -> Result<Var<T>, TangentError> {
        neg_op(self)
    }

    pub fn mul_scalar(&self, factor: T) -> Result<Var<T>, TangentError> {
        mul_scalar_op(self, factor)
    }

    pub fn add_scalar(&self, value: T) -> Result<Var<T>, TangentError> {
        add_scalar_op(self, value)
    }

    pub fn sum(&self) -> Result<Var<T>, TangentError> {
        sum_op(self)
    }

    pub fn mean(&self) -> Result<Var<T>, TangentError> {
        mean_op(self)
    }
}

// --- Backward Operations ---

#[derive(Debug)]
struct AddBackward<T: Element> {
    a: Var<T>,
    b: Var<T>,
}

impl<T: Element> BackwardOp<T> for AddBackward<T> {
    fn backward(&self, grad_output: &Array<T>) -> Result<Vec<Array<T>>, TangentError> {
        Ok(vec![
            grad_output.reduce_to_shape(&self.a.shape())?,
            grad_output.reduce_to_shape(&self.b.shape())?,
        ])
    }

    fn inputs(&self) -> Vec<Var<T>> {
        vec![self.a.clone(), self.b.clone()]
    }
}

#[derive(Debug)]
struct SubBackward<T: Element> {
    a: Var<T>,
    b: Var<T>,
}

impl<T: Element> BackwardOp<T> for SubBackward<T> {
    fn backward(&self, grad_output: &Array<T>) -> Result<Vec<Array<T>>, TangentError> {
        Ok(vec![
            grad_output.reduce_to_shape(&self.a.shape())?,
            grad_output.neg().reduce_to_shape(&self.b.shape())?,
        ])
    }

    fn inputs(&self) -> Vec<Var<T>> {
        vec![self.a.clone(), self.b.clone()]
    }
}

#[derive(Debug)]
struct MulBackward<T: Element> {
    a: Var<T>,
    b: Var<T>,
}

impl<T: Element> BackwardOp<T> for MulBackward<T> {
    fn backward(&self, grad_output: &Array<T>) -> Result<Vec<Array<T>>, TangentError> {
        // d(a*b)/da = b, d(a*b)/db = a
        let grad_a = grad_output.mul(&self.b.value())?;
        let grad_b = grad_output.mul(&self.a.value())?;
        Ok(vec![
            grad_a.reduce_to_shape(&self.a.shape())?,
            grad_b.reduce_to_shape(&self.b.shape())?,
        ])
    }

    fn inputs(&self) -> Vec<Var<T>> {
        vec![self.a.clone(), self.b.clone()]
    }
}

#[derive(Debug)]
struct NegBackward<T: Element> {
    a: Var<T>,
}

impl<T: Element> BackwardOp<T> for NegBackward<T> {
    fn backward(&self, grad_output: &Array<T>) -> Result<Vec<Array<T>>, TangentError> {
        Ok(vec![grad_output.neg()])
    }

    fn inputs(&self) -> Vec<Var<T>> {
        vec![self.a.clone()]
    }
}

#[derive(Debug)]
struct MulScalarBackward<T: Element> {
    a: Var<T>,
    factor: T,
}

impl<T: Element> BackwardOp<T> for MulScalarBackward<T> {
    fn backward(&self, grad_output: &Array<T>) -> Result<Vec<Array<T>>, TangentError> {
        Ok(vec![grad_output.scale(self.factor)])
    }

    fn inputs(&self) -> Vec<Var<T>> {
        vec![self.a.clone()]
    }
}

#[derive(Debug)]
struct AddScalarBackward<T: Element> {
    a: Var<T>,
}

impl<T: Element> BackwardOp<T> for AddScalarBackward<T> {
    fn backward(&self, grad_output: &Array<T>) -> Result<Vec<Array<T>>, TangentError> {
        Ok(vec![grad_output.clone()])
    }

    fn inputs(&self) -> Vec<Var<T>> {
        vec![self.a.clone()]
    }
}

#[derive(Debug)]
struct SumBackward<T: Element> {
    a: Var<T>,
}

impl<T: Element> BackwardOp<T> for SumBackward<T> {
    fn backward(&self, grad_output: &Array<T>) -> Result<Vec<Array<T>>, TangentError> {
        Ok(vec![Array::full(&self.a.shape(), grad_output.item()?)])
    }

    fn inputs(&self) -> Vec<Var<T>> {
        vec![self.a.clone()]
    }
}

#[derive(Debug)]
struct MeanBackward<T: Element> {
    a: Var<T>,
}

impl<T: Element> BackwardOp<T> for MeanBackward<T> {
    fn backward(&self, grad_output: &Array<T>) -> Result<Vec<Array<T>>, TangentError> {
        let n = <T as num_traits::NumCast>::from(self.a.numel()).ok_or_else(|| {
            TangentError::InternalError("element count does not fit the element type".to_string())
        })?;
        Ok(vec![Array::full(&self.a.shape(), grad_output.item()? / n)])
    }

    fn inputs(&self) -> Vec<Var<T>> {
        vec![self.a.clone()]
    }
}
