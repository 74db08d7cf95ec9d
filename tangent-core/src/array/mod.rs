//! Dense numeric arrays used as the leaves of differentiable structures.
//!
//! An [`Array`] is a contiguous, row-major buffer plus a shape. Element-wise
//! binary ops follow numpy broadcasting rules, which is what `move` relies on
//! when it adds a delta to the current value of a leaf.

pub mod broadcast;
pub mod create;

use crate::error::TangentError;
use approx::{AbsDiffEq, RelativeEq};
use num_traits::Float;
use std::fmt::{self, Debug, Display};

pub use broadcast::broadcast_shapes;

/// Element types an [`Array`] can hold (`f32`, `f64`).
pub trait Element: Float + Debug + Display + 'static {}

impl<T: Float + Debug + Display + 'static> Element for T {}

/// A dense, row-major n-dimensional array.
#[derive(Debug, Clone, PartialEq)]
pub struct Array<T = f64> {
    data: Vec<T>,
    shape: Vec<usize>,
}

impl<T: Element> Array<T> {
    /// Creates an array from flat row-major data and a shape.
    ///
    /// # Errors
    /// Returns `TangentError::ArrayCreation` if `data.len()` is not the product of `shape`.
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> Result<Self, TangentError> {
        let numel: usize = shape.iter().product();
        if data.len() != numel {
            return Err(TangentError::ArrayCreation {
                data_len: data.len(),
                shape,
            });
        }
        Ok(Array { data, shape })
    }

    /// Creates a 1-D array.
    pub fn from_vec(data: Vec<T>) -> Self {
        let shape = vec![data.len()];
        Array { data, shape }
    }

    /// Creates a 0-D array holding a single value.
    pub fn scalar(value: T) -> Self {
        Array {
            data: vec![value],
            shape: vec![],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Returns the value of a single-element array.
    pub fn item(&self) -> Result<T, TangentError> {
        if self.data.len() != 1 {
            return Err(TangentError::NotAScalar {
                shape: self.shape.clone(),
            });
        }
        Ok(self.data[0])
    }

    /// Element-wise addition with broadcasting.
    pub fn add(&self, other: &Array<T>) -> Result<Array<T>, TangentError> {
        broadcast::broadcast_binary(self, other, |a, b| a + b)
    }

    /// Element-wise subtraction with broadcasting.
    pub fn sub(&self, other: &Array<T>) -> Result<Array<T>, TangentError> {
        broadcast::broadcast_binary(self, other, |a, b| a - b)
    }

    /// Element-wise multiplication with broadcasting.
    pub fn mul(&self, other: &Array<T>) -> Result<Array<T>, TangentError> {
        broadcast::broadcast_binary(self, other, |a, b| a * b)
    }

    pub fn neg(&self) -> Array<T> {
        self.map(|x| -x)
    }

    /// Multiplies every element by `factor`.
    pub fn scale(&self, factor: T) -> Array<T> {
        self.map(|x| x * factor)
    }

    pub fn add_scalar(&self, value: T) -> Array<T> {
        self.map(|x| x + value)
    }

    pub fn map<F: Fn(T) -> T>(&self, f: F) -> Array<T> {
        Array {
            data: self.data.iter().map(|&x| f(x)).collect(),
            shape: self.shape.clone(),
        }
    }

    /// Sum of all elements.
    pub fn sum(&self) -> T {
        self.data.iter().fold(T::zero(), |acc, &x| acc + x)
    }

    /// Sum of all elements as a 0-D array.
    pub fn sum_all(&self) -> Array<T> {
        Array::scalar(self.sum())
    }

    /// Mean of all elements (NaN for an empty array).
    pub fn mean(&self) -> T {
        let n = <T as num_traits::NumCast>::from(self.data.len()).unwrap_or_else(T::nan);
        self.sum() / n
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }
}

impl<T: Element> Display for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shape.is_empty() {
            return write!(f, "{:?}", self.data[0]);
        }
        let body = self
            .data
            .iter()
            .map(|x| format!("{:?}", x))
            .collect::<Vec<_>>()
            .join(", ");
        if self.shape.len() == 1 {
            write!(f, "[{}]", body)
        } else {
            write!(f, "Array(shape={:?}, data=[{}])", self.shape, body)
        }
    }
}

impl<T> AbsDiffEq for Array<T>
where
    T: Element + AbsDiffEq<Epsilon = T>,
{
    type Epsilon = T;

    fn default_epsilon() -> T {
        T::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: T) -> bool {
        self.shape == other.shape
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl<T> RelativeEq for Array<T>
where
    T: Element + RelativeEq<Epsilon = T>,
{
    fn default_max_relative() -> T {
        T::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: T, max_relative: T) -> bool {
        self.shape == other.shape
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}

#[cfg(test)]
mod array_test;
