// tangent-core/src/optim/mod.rs

//! Steps that move differentiable structures along their gradients.

pub mod sgd;

pub use sgd::Sgd;
