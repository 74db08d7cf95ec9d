//! Differentiable record types.
//!
//! A record declares which of its fields are leaves (arrays), composites
//! (nested differentiable records) and opaque data. From that declaration the
//! crate derives a tangent layout, flattens values for a gradient engine,
//! moves values along tangents and writes new points back.

// Déclare les modules principaux de la crate
pub mod array;
pub mod autograd;
pub mod differentiable;
pub mod engine;
pub mod error;
mod macros;
pub mod optim;
pub mod registry;
pub mod schema;
pub mod tangent;

#[cfg(test)]
pub(crate) mod test_utils;

pub use array::{Array, Element};
pub use autograd::Var;
pub use differentiable::{Differentiable, FieldMut, FieldRef};
pub use engine::GradEngine;
pub use error::TangentError;
pub use registry::TreeRegistry;
pub use schema::{FieldRole, Schema};
pub use tangent::{ChildDef, Tangent, TreeDef, TreeValue};

// Re-export crates required by public items and the `differentiable!` macro
pub use num_traits;
pub use once_cell;
