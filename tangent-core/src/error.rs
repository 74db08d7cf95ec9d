use thiserror::Error;

/// Custom error type for the tangent-core crate.
#[derive(Error, Debug, PartialEq, Clone)] // PartialEq for easier testing
pub enum TangentError {
    #[error("Invalid declaration for type '{type_name}': {reason}")]
    Configuration { type_name: String, reason: String },

    #[error("Type '{type_name}' is already registered")]
    AlreadyRegistered { type_name: String },

    #[error("Type '{type_name}' is not registered")]
    UnregisteredType { type_name: String },

    #[error("Shape mismatch for '{type_name}': expected {expected} values, got {actual}")]
    ShapeMismatch {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Type mismatch: expected a tangent of '{expected}', got one of '{actual}'")]
    TypeMismatch { expected: String, actual: String },

    #[error("Field '{field}' is missing on '{type_name}'")]
    MissingField { type_name: String, field: String },

    #[error("Field '{field}' of '{type_name}': expected a {expected}, got a {actual}")]
    KindMismatch {
        type_name: String,
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Cannot broadcast shapes: {shape1:?} and {shape2:?}")]
    BroadcastError {
        shape1: Vec<usize>,
        shape2: Vec<usize>,
    },

    #[error("Array creation error: data length {data_len} does not match shape {shape:?}")]
    ArrayCreation { data_len: usize, shape: Vec<usize> },

    #[error("Expected a single-element array, got shape {shape:?}")]
    NotAScalar { shape: Vec<usize> },

    #[error("Backward called on non-scalar output of shape {shape:?}")]
    BackwardNonScalar { shape: Vec<usize> },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl TangentError {
    pub(crate) fn missing_field(type_name: &str, field: &str) -> Self {
        TangentError::MissingField {
            type_name: type_name.to_string(),
            field: field.to_string(),
        }
    }

    pub(crate) fn configuration(type_name: &str, reason: impl Into<String>) -> Self {
        TangentError::Configuration {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }
}
