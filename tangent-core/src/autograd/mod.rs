//! A small reverse-mode differentiation engine over [`Array`](crate::Array) leaves.
//!
//! Only the element-wise ops and reductions needed to write losses over
//! differentiable structures are provided.

pub mod backward_op;
pub mod grad_check;
pub(crate) mod graph;
pub mod ops;
pub mod var;

pub use backward_op::BackwardOp;
pub use var::Var;
