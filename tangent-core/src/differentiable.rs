//! The `Differentiable` trait: points, moves and updates of record types.

use crate::array::{Array, Element};
use crate::error::TangentError;
use crate::schema::{FieldRole, FieldSpec, Schema};
use crate::tangent::{Tangent, TreeDef, TreeValue};
use log::{debug, trace};
use std::sync::Arc;

/// Borrowed view of a differentiable field.
pub enum FieldRef<'a, T: Element> {
    Leaf(&'a Array<T>),
    Composite(&'a dyn Differentiable<T>),
}

/// Mutable view of a differentiable field.
pub enum FieldMut<'a, T: Element> {
    Leaf(&'a mut Array<T>),
    Composite(&'a mut dyn Differentiable<T>),
}

impl<T: Element> FieldRef<'_, T> {
    fn kind(&self) -> &'static str {
        match self {
            FieldRef::Leaf(_) => "leaf",
            FieldRef::Composite(_) => "composite",
        }
    }
}

/// A record type whose leaf and composite fields live in a tangent space.
///
/// Implementors declare their fields once through [`Differentiable::declared_schema`]
/// and expose each differentiable field by name. Everything else (points,
/// flattening, moves, updates) is provided. The [`differentiable!`](crate::differentiable)
/// macro writes the implementation for plain structs.
pub trait Differentiable<T: Element = f64> {
    /// The schema of the implementing type.
    fn declared_schema() -> Result<Arc<Schema>, TangentError>
    where
        Self: Sized;

    /// The schema of this value's type. Object-safe counterpart of `declared_schema`.
    fn schema(&self) -> Result<Arc<Schema>, TangentError>;

    /// Borrows a differentiable field. Returns `None` for unknown and opaque fields.
    fn field(&self, name: &str) -> Option<FieldRef<'_, T>>;

    /// Mutably borrows a differentiable field. Returns `None` for unknown and opaque fields.
    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_, T>>;

    /// Current values of the differentiable fields, shaped like a tangent.
    ///
    /// Composite fields contribute their own nested points.
    fn point(&self) -> Result<Tangent<Array<T>>, TangentError> {
        let schema = self.schema()?;
        let mut values = Vec::with_capacity(schema.len());
        for spec in schema.differentiable_fields() {
            let value = match checked_field(self, &schema, spec)? {
                FieldRef::Leaf(array) => TreeValue::Leaf(array.clone()),
                FieldRef::Composite(nested) => TreeValue::Node(nested.point()?),
            };
            values.push(value);
        }
        Tangent::new(schema, values)
    }

    /// Leaves of [`Differentiable::point`] in order, with the structure needed to rebuild them.
    fn flatten(&self) -> Result<(Vec<Array<T>>, TreeDef), TangentError> {
        let point = self.point()?;
        let def = point.tree_def();
        Ok((point.into_leaves(), def))
    }

    /// Checks that `tangent` has this value's structure: same type, one component
    /// per differentiable field, leaves where leaves are and nodes where
    /// composites are, recursively.
    fn conforms_to(&self, tangent: &Tangent<Array<T>>) -> Result<(), TangentError> {
        let schema = self.schema()?;
        tangent.expect_schema(&schema)?;
        for spec in schema.differentiable_fields() {
            let delta = tangent.get(spec.name())?;
            match (checked_field(self, &schema, spec)?, delta) {
                (FieldRef::Leaf(_), TreeValue::Leaf(_)) => {}
                (FieldRef::Composite(nested), TreeValue::Node(inner)) => nested.conforms_to(inner)?,
                (FieldRef::Leaf(_), other) => {
                    return Err(kind_mismatch(tangent, spec, "leaf", other.kind()))
                }
                (FieldRef::Composite(_), other) => {
                    return Err(kind_mismatch(tangent, spec, "node", other.kind()))
                }
            }
        }
        Ok(())
    }

    /// Moves this value along `tangent` and returns the resulting point.
    ///
    /// Leaves are added element-wise (with broadcasting); composite fields move
    /// recursively. Fields are paired by name, and a tangent of another type or
    /// with a different number of components is rejected.
    fn move_along(&self, tangent: &Tangent<Array<T>>) -> Result<Tangent<Array<T>>, TangentError> {
        let schema = self.schema()?;
        tangent.expect_schema(&schema)?;

        let mut next = Vec::with_capacity(schema.len());
        for spec in schema.differentiable_fields() {
            let delta = tangent.get(spec.name())?;
            let value = match (checked_field(self, &schema, spec)?, delta) {
                (FieldRef::Leaf(current), TreeValue::Leaf(step)) => TreeValue::Leaf(current.add(step)?),
                (FieldRef::Composite(nested), TreeValue::Node(inner)) => {
                    TreeValue::Node(nested.move_along(inner)?)
                }
                (FieldRef::Leaf(_), other) => {
                    return Err(kind_mismatch(tangent, spec, "leaf", other.kind()))
                }
                (FieldRef::Composite(_), other) => {
                    return Err(kind_mismatch(tangent, spec, "node", other.kind()))
                }
            };
            trace!("Moved {}.{}", schema.type_name(), spec.name());
            next.push(value);
        }
        Tangent::new(schema, next)
    }

    /// Writes `next_point` into this value's differentiable fields.
    ///
    /// The whole point is validated first: on error nothing has been written.
    /// Composite fields are updated in place, so their opaque fields survive.
    fn update_in_place(&mut self, next_point: &Tangent<Array<T>>) -> Result<(), TangentError> {
        self.conforms_to(next_point)?;
        let schema = self.schema()?;
        debug!("Updating {} in place", schema.type_name());
        for spec in schema.differentiable_fields() {
            let value = next_point.get(spec.name())?;
            match (self.field_mut(spec.name()), value) {
                (Some(FieldMut::Leaf(slot)), TreeValue::Leaf(leaf)) => *slot = leaf.clone(),
                (Some(FieldMut::Composite(nested)), TreeValue::Node(inner)) => {
                    nested.update_in_place(inner)?
                }
                (Some(_), other) => {
                    return Err(TangentError::InternalError(format!(
                        "field '{}' changed kind after validation (got a {})",
                        spec.name(),
                        other.kind()
                    )))
                }
                (None, _) => return Err(TangentError::missing_field(schema.type_name(), spec.name())),
            }
        }
        Ok(())
    }

    /// Returns a copy of this value with `next_point` applied; `self` is unchanged.
    fn updated(&self, next_point: &Tangent<Array<T>>) -> Result<Self, TangentError>
    where
        Self: Clone + Sized,
    {
        let mut next = self.clone();
        next.update_in_place(next_point)?;
        Ok(next)
    }
}

/// Fetches a declared field and checks its runtime kind against the declared role.
fn checked_field<'a, T, D>(
    value: &'a D,
    schema: &Schema,
    spec: &FieldSpec,
) -> Result<FieldRef<'a, T>, TangentError>
where
    T: Element,
    D: Differentiable<T> + ?Sized,
{
    let field = value
        .field(spec.name())
        .ok_or_else(|| TangentError::missing_field(schema.type_name(), spec.name()))?;
    let matches_role = matches!(
        (&field, spec.role()),
        (FieldRef::Leaf(_), FieldRole::Leaf) | (FieldRef::Composite(_), FieldRole::Composite)
    );
    if !matches_role {
        return Err(TangentError::KindMismatch {
            type_name: schema.type_name().to_string(),
            field: spec.name().to_string(),
            expected: if spec.role() == FieldRole::Leaf { "leaf" } else { "composite" },
            actual: field.kind(),
        });
    }
    Ok(field)
}

fn kind_mismatch<T: Element>(
    tangent: &Tangent<Array<T>>,
    spec: &FieldSpec,
    expected: &'static str,
    actual: &'static str,
) -> TangentError {
    TangentError::KindMismatch {
        type_name: tangent.tangent_name().to_string(),
        field: spec.name().to_string(),
        expected,
        actual,
    }
}

#[cfg(test)]
#[path = "differentiable_test.rs"]
mod differentiable_test;
