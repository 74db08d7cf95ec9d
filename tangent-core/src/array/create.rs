use crate::array::{Array, Element};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

impl<T: Element> Array<T> {
    /// Creates an array of the given shape filled with `value`.
    pub fn full(shape: &[usize], value: T) -> Self {
        let numel = shape.iter().product();
        // Length always matches the shape here.
        Array {
            data: vec![value; numel],
            shape: shape.to_vec(),
        }
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, T::zero())
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, T::one())
    }

    pub fn zeros_like(other: &Array<T>) -> Self {
        Self::zeros(other.shape())
    }

    /// Creates an array with elements drawn from the standard normal distribution.
    pub fn randn<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> Self
    where
        StandardNormal: Distribution<T>,
    {
        let numel = shape.iter().product();
        let data: Vec<T> = (0..numel).map(|_| StandardNormal.sample(rng)).collect();
        Array {
            data,
            shape: shape.to_vec(),
        }
    }
}
