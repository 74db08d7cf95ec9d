//! Explicit field declarations for differentiable types.
//!
//! A [`Schema`] lists a type's fields in declaration order, each with a
//! [`FieldRole`]. The differentiable subset (leaves and composites) is
//! computed once when the schema is built and fixes the shape of every
//! tangent of that type.

use crate::error::TangentError;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// How a declared field takes part in differentiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    /// A raw numeric array, differentiated element-wise.
    Leaf,
    /// A value whose own type is differentiable; moved recursively.
    Composite,
    /// Anything else (counters, labels, ...). Never part of a tangent.
    Opaque,
}

impl FieldRole {
    pub fn is_differentiable(self) -> bool {
        !matches!(self, FieldRole::Opaque)
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldRole::Leaf => "leaf",
            FieldRole::Composite => "composite",
            FieldRole::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    name: String,
    role: FieldRole,
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> FieldRole {
        self.role
    }
}

/// The declared fields of one type plus its derived tangent layout.
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    type_name: String,
    tangent_name: String,
    fields: Vec<FieldSpec>,
    /// Indices into `fields` of the differentiable fields, in declaration order.
    differentiable: Vec<usize>,
}

impl Schema {
    /// Starts declaring the fields of `type_name`.
    pub fn builder(type_name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Name of the tangent type, e.g. `ModelTangent` for `Model`.
    pub fn tangent_name(&self) -> &str {
        &self.tangent_name
    }

    /// All declared fields, including opaque ones.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// The differentiable fields, in tangent order.
    pub fn differentiable_fields(&self) -> impl Iterator<Item = &FieldSpec> + '_ {
        self.differentiable.iter().map(move |&i| &self.fields[i])
    }

    /// Names of the differentiable fields, in tangent order.
    pub fn field_names(&self) -> Vec<&str> {
        self.differentiable_fields().map(FieldSpec::name).collect()
    }

    /// Number of components in this type's tangent.
    pub fn len(&self) -> usize {
        self.differentiable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.differentiable.is_empty()
    }

    /// Position of a differentiable field inside the tangent.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.differentiable
            .iter()
            .position(|&i| self.fields[i].name == name)
    }

    /// The declared spec of a differentiable field.
    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.position(name).map(|pos| &self.fields[self.differentiable[pos]])
    }
}

/// Builder for [`Schema`]. Fields are recorded in call order.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    type_name: String,
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    pub fn field(mut self, name: impl Into<String>, role: FieldRole) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            role,
        });
        self
    }

    pub fn leaf(self, name: impl Into<String>) -> Self {
        self.field(name, FieldRole::Leaf)
    }

    pub fn composite(self, name: impl Into<String>) -> Self {
        self.field(name, FieldRole::Composite)
    }

    pub fn opaque(self, name: impl Into<String>) -> Self {
        self.field(name, FieldRole::Opaque)
    }

    /// Validates the declaration and computes the differentiable field set.
    ///
    /// # Errors
    /// `TangentError::Configuration` if the type name is empty, no field was
    /// declared, or a field name is empty or repeated.
    pub fn build(self) -> Result<Arc<Schema>, TangentError> {
        if self.type_name.is_empty() {
            return Err(TangentError::configuration("", "type name must not be empty"));
        }
        if self.fields.is_empty() {
            return Err(TangentError::configuration(
                &self.type_name,
                "type has no introspectable field declarations",
            ));
        }

        {
            let mut seen = HashSet::new();
            for spec in &self.fields {
                if spec.name.is_empty() {
                    return Err(TangentError::configuration(
                        &self.type_name,
                        "field names must not be empty",
                    ));
                }
                if !seen.insert(spec.name.as_str()) {
                    return Err(TangentError::configuration(
                        &self.type_name,
                        format!("field '{}' is declared more than once", spec.name),
                    ));
                }
            }
        }

        let differentiable = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, spec)| spec.role.is_differentiable())
            .map(|(i, _)| i)
            .collect();

        log::trace!("Built schema for '{}' ({} fields)", self.type_name, self.fields.len());
        Ok(Arc::new(Schema {
            tangent_name: format!("{}Tangent", self.type_name),
            type_name: self.type_name,
            fields: self.fields,
            differentiable,
        }))
    }
}
