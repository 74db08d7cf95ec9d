use crate::array::{Array, Element};
use crate::error::TangentError;

/// Computes contiguous row-major strides for `shape`.
pub(crate) fn calculate_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![0; shape.len()];
    let mut current_stride = 1;
    for i in (0..shape.len()).rev() {
        strides[i] = current_stride;
        current_stride *= shape[i];
    }
    strides
}

/// Converts a linear index into coordinates, given contiguous strides.
pub(crate) fn index_to_coord(index: usize, strides: &[usize], shape: &[usize]) -> Vec<usize> {
    let mut coord = vec![0; shape.len()];
    let mut remainder = index;
    for dim in 0..shape.len() {
        if strides[dim] == 0 {
            continue;
        }
        coord[dim] = remainder / strides[dim];
        remainder %= strides[dim];
    }
    coord
}

/// Computes the broadcast shape of two shapes (numpy rules).
///
/// Shapes are aligned on their trailing dimensions; two dimensions are
/// compatible when they are equal or one of them is 1.
pub fn broadcast_shapes(shape1: &[usize], shape2: &[usize]) -> Result<Vec<usize>, TangentError> {
    let rank = shape1.len().max(shape2.len());
    let mut result = vec![0; rank];
    for i in 0..rank {
        let d1 = if i < rank - shape1.len() { 1 } else { shape1[i - (rank - shape1.len())] };
        let d2 = if i < rank - shape2.len() { 1 } else { shape2[i - (rank - shape2.len())] };
        result[i] = if d1 == d2 {
            d1
        } else if d1 == 1 {
            d2
        } else if d2 == 1 {
            d1
        } else {
            return Err(TangentError::BroadcastError {
                shape1: shape1.to_vec(),
                shape2: shape2.to_vec(),
            });
        };
    }
    Ok(result)
}

/// Maps an output coordinate onto the flat offset of an input of `input_shape`
/// that was broadcast to the output.
fn broadcast_offset(output_coord: &[usize], input_shape: &[usize], input_strides: &[usize]) -> usize {
    let rank_diff = output_coord.len() - input_shape.len();
    input_shape
        .iter()
        .enumerate()
        .map(|(dim, &size)| {
            let c = if size == 1 { 0 } else { output_coord[rank_diff + dim] };
            c * input_strides[dim]
        })
        .sum()
}

/// Applies `op` element-wise over two broadcast arrays.
pub(crate) fn broadcast_binary<T, F>(a: &Array<T>, b: &Array<T>, op: F) -> Result<Array<T>, TangentError>
where
    T: Element,
    F: Fn(T, T) -> T,
{
    if a.shape() == b.shape() {
        let data = a.data().iter().zip(b.data()).map(|(&x, &y)| op(x, y)).collect();
        return Array::new(data, a.shape().to_vec());
    }

    let result_shape = broadcast_shapes(a.shape(), b.shape())?;
    let result_strides = calculate_strides(&result_shape);
    let a_strides = calculate_strides(a.shape());
    let b_strides = calculate_strides(b.shape());
    let numel: usize = result_shape.iter().product();

    let mut data = Vec::with_capacity(numel);
    for i in 0..numel {
        let coord = index_to_coord(i, &result_strides, &result_shape);
        let x = a.data()[broadcast_offset(&coord, a.shape(), &a_strides)];
        let y = b.data()[broadcast_offset(&coord, b.shape(), &b_strides)];
        data.push(op(x, y));
    }
    Array::new(data, result_shape)
}

impl<T: Element> Array<T> {
    /// Reduces the array (a gradient) to `target_shape` by summing along broadcast dimensions.
    ///
    /// This is the inverse of broadcasting and is what the backward pass of a
    /// broadcasting op needs to hand each input a gradient of its own shape.
    pub fn reduce_to_shape(&self, target_shape: &[usize]) -> Result<Array<T>, TangentError> {
        if self.shape() == target_shape {
            return Ok(self.clone());
        }
        // The target must broadcast to our shape, otherwise this is not a broadcast gradient.
        let check = broadcast_shapes(self.shape(), target_shape)?;
        if check != self.shape() {
            return Err(TangentError::BroadcastError {
                shape1: self.shape().to_vec(),
                shape2: target_shape.to_vec(),
            });
        }

        let numel_target: usize = target_shape.iter().product();
        let target_strides = calculate_strides(target_shape);
        let strides = calculate_strides(self.shape());
        let mut reduced = vec![T::zero(); numel_target];
        for (i, &value) in self.data().iter().enumerate() {
            let coord = index_to_coord(i, &strides, self.shape());
            let offset = broadcast_offset(&coord, target_shape, &target_strides);
            reduced[offset] = reduced[offset] + value;
        }
        Array::new(reduced, target_shape.to_vec())
    }
}
