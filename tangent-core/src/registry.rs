//! Explicit registry of differentiable types.
//!
//! Types are registered by an explicit call; the registry is owned by whoever
//! differentiates (usually a [`GradEngine`](crate::engine::GradEngine)) rather
//! than being process-wide state.

use crate::array::{Array, Element};
use crate::differentiable::Differentiable;
use crate::error::TangentError;
use crate::schema::Schema;
use crate::tangent::{Tangent, TreeDef};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct TreeRegistry {
    schemas: HashMap<String, Arc<Schema>>,
}

impl TreeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its type name.
    ///
    /// # Errors
    /// `TangentError::AlreadyRegistered` if a type of that name is already known.
    pub fn register(&mut self, schema: Arc<Schema>) -> Result<(), TangentError> {
        let type_name = schema.type_name().to_string();
        if self.schemas.contains_key(&type_name) {
            return Err(TangentError::AlreadyRegistered { type_name });
        }
        debug!(
            "Registered differentiable type '{}' with fields {:?}",
            type_name,
            schema.field_names()
        );
        self.schemas.insert(type_name, schema);
        Ok(())
    }

    /// Registers the declared schema of `M`.
    pub fn register_type<M, T>(&mut self) -> Result<(), TangentError>
    where
        M: Differentiable<T>,
        T: Element,
    {
        self.register(M::declared_schema()?)
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    pub fn schema(&self, type_name: &str) -> Result<&Arc<Schema>, TangentError> {
        self.schemas
            .get(type_name)
            .ok_or_else(|| TangentError::UnregisteredType {
                type_name: type_name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Flattens a registered value into its leaves and tree structure.
    ///
    /// Every node type in the tree (the value's own type and the types of its
    /// composite fields) must be registered.
    pub fn flatten<T, D>(&self, value: &D) -> Result<(Vec<Array<T>>, TreeDef), TangentError>
    where
        T: Element,
        D: Differentiable<T> + ?Sized,
    {
        let (leaves, def) = value.flatten()?;
        self.check_tree(&def)?;
        Ok((leaves, def))
    }

    /// Rebuilds a tangent from leaves produced by [`TreeRegistry::flatten`].
    pub fn unflatten<L>(&self, def: &TreeDef, leaves: Vec<L>) -> Result<Tangent<L>, TangentError> {
        self.check_tree(def)?;
        def.unflatten(leaves)
    }

    fn check_tree(&self, def: &TreeDef) -> Result<(), TangentError> {
        for schema in def.schemas() {
            let registered = self.schema(schema.type_name())?;
            if **registered != **schema {
                return Err(TangentError::configuration(
                    schema.type_name(),
                    "declaration differs from the registered schema",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;
