//! Tangent values and the tree structure used to flatten and rebuild them.
//!
//! A [`Tangent`] is a named, ordered tuple with one component per
//! differentiable field of a type. Composite fields hold nested tangents, so a
//! tangent is a tree whose leaves are of type `L`: arrays for points and
//! gradients, graph variables while a loss is being traced.

use crate::error::TangentError;
use crate::schema::Schema;
use std::fmt;
use std::sync::Arc;

/// One component of a [`Tangent`].
#[derive(Debug, Clone, PartialEq)]
pub enum TreeValue<L> {
    Leaf(L),
    Node(Tangent<L>),
}

impl<L> TreeValue<L> {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            TreeValue::Leaf(_) => "leaf",
            TreeValue::Node(_) => "node",
        }
    }
}

/// A tangent (or point) of a differentiable type.
///
/// Equality is structural: same schema, same values in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tangent<L> {
    schema: Arc<Schema>,
    values: Vec<TreeValue<L>>,
}

impl<L> Tangent<L> {
    /// Builds a tangent from values given in the schema's field order.
    ///
    /// # Errors
    /// `TangentError::ShapeMismatch` when the number of values differs from the
    /// number of differentiable fields.
    pub fn new(schema: Arc<Schema>, values: Vec<TreeValue<L>>) -> Result<Self, TangentError> {
        if values.len() != schema.len() {
            return Err(TangentError::ShapeMismatch {
                type_name: schema.type_name().to_string(),
                expected: schema.len(),
                actual: values.len(),
            });
        }
        Ok(Tangent { schema, values })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    pub fn tangent_name(&self) -> &str {
        self.schema.tangent_name()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates `(field name, value)` pairs in tangent order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TreeValue<L>)> + '_ {
        self.schema
            .differentiable_fields()
            .map(|spec| spec.name())
            .zip(self.values.iter())
    }

    /// Looks a component up by field name.
    pub fn get(&self, name: &str) -> Result<&TreeValue<L>, TangentError> {
        self.schema
            .position(name)
            .map(|pos| &self.values[pos])
            .ok_or_else(|| TangentError::missing_field(self.tangent_name(), name))
    }

    /// Looks up a leaf component by field name.
    pub fn leaf(&self, name: &str) -> Result<&L, TangentError> {
        match self.get(name)? {
            TreeValue::Leaf(leaf) => Ok(leaf),
            other => Err(self.kind_mismatch(name, "leaf", other.kind())),
        }
    }

    /// Looks up a nested tangent by field name.
    pub fn node(&self, name: &str) -> Result<&Tangent<L>, TangentError> {
        match self.get(name)? {
            TreeValue::Node(node) => Ok(node),
            other => Err(self.kind_mismatch(name, "node", other.kind())),
        }
    }

    /// Checks that this tangent belongs to `schema`'s type and has its shape.
    pub fn expect_schema(&self, schema: &Schema) -> Result<(), TangentError> {
        if self.schema.type_name() != schema.type_name() {
            return Err(TangentError::TypeMismatch {
                expected: schema.type_name().to_string(),
                actual: self.schema.type_name().to_string(),
            });
        }
        if self.values.len() != schema.len() {
            return Err(TangentError::ShapeMismatch {
                type_name: schema.type_name().to_string(),
                expected: schema.len(),
                actual: self.values.len(),
            });
        }
        Ok(())
    }

    /// All leaves, depth-first in tangent order.
    pub fn leaves(&self) -> Vec<&L> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a L>) {
        for value in &self.values {
            match value {
                TreeValue::Leaf(leaf) => out.push(leaf),
                TreeValue::Node(node) => node.collect_leaves(out),
            }
        }
    }

    /// Consumes the tangent and returns its leaves, depth-first in tangent order.
    pub fn into_leaves(self) -> Vec<L> {
        let mut out = Vec::new();
        self.push_leaves(&mut out);
        out
    }

    fn push_leaves(self, out: &mut Vec<L>) {
        for value in self.values {
            match value {
                TreeValue::Leaf(leaf) => out.push(leaf),
                TreeValue::Node(node) => node.push_leaves(out),
            }
        }
    }

    /// Builds a tangent of the same structure with every leaf mapped through `f`.
    pub fn map_leaves<M, F>(&self, mut f: F) -> Result<Tangent<M>, TangentError>
    where
        F: FnMut(&L) -> Result<M, TangentError>,
    {
        self.map_leaves_inner(&mut f)
    }

    fn map_leaves_inner<M, F>(&self, f: &mut F) -> Result<Tangent<M>, TangentError>
    where
        F: FnMut(&L) -> Result<M, TangentError>,
    {
        let values = self
            .values
            .iter()
            .map(|value| match value {
                TreeValue::Leaf(leaf) => f(leaf).map(TreeValue::Leaf),
                TreeValue::Node(node) => node.map_leaves_inner(f).map(TreeValue::Node),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Tangent {
            schema: Arc::clone(&self.schema),
            values,
        })
    }

    /// The structure of this tangent, without its leaves.
    pub fn tree_def(&self) -> TreeDef {
        TreeDef {
            schema: Arc::clone(&self.schema),
            children: self
                .values
                .iter()
                .map(|value| match value {
                    TreeValue::Leaf(_) => ChildDef::Leaf,
                    TreeValue::Node(node) => ChildDef::Node(node.tree_def()),
                })
                .collect(),
        }
    }

    fn kind_mismatch(&self, field: &str, expected: &'static str, actual: &'static str) -> TangentError {
        TangentError::KindMismatch {
            type_name: self.tangent_name().to_string(),
            field: field.to_string(),
            expected,
            actual,
        }
    }
}

impl<L: fmt::Display> fmt::Display for Tangent<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.tangent_name())?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                TreeValue::Leaf(leaf) => write!(f, "{}={}", name, leaf)?,
                TreeValue::Node(node) => write!(f, "{}={}", name, node)?,
            }
        }
        write!(f, ")")
    }
}

/// A child slot of a [`TreeDef`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChildDef {
    Leaf,
    Node(TreeDef),
}

/// Structure of a flattened differentiable value.
///
/// Holds the schema of every node and whether each child is a leaf or a
/// nested node. No per-node auxiliary data is kept: opaque fields are not
/// part of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeDef {
    schema: Arc<Schema>,
    children: Vec<ChildDef>,
}

impl TreeDef {
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Number of leaves expected by [`TreeDef::unflatten`].
    pub fn num_leaves(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                ChildDef::Leaf => 1,
                ChildDef::Node(def) => def.num_leaves(),
            })
            .sum()
    }

    /// Schemas of this node and every nested node, outermost first.
    pub fn schemas(&self) -> Vec<&Arc<Schema>> {
        let mut out = vec![&self.schema];
        for child in &self.children {
            if let ChildDef::Node(def) = child {
                out.extend(def.schemas());
            }
        }
        out
    }

    /// Rebuilds a tangent from leaves given in flatten order.
    ///
    /// # Errors
    /// `TangentError::ShapeMismatch` if `leaves` does not hold exactly
    /// [`TreeDef::num_leaves`] values.
    pub fn unflatten<L>(&self, leaves: Vec<L>) -> Result<Tangent<L>, TangentError> {
        let expected = self.num_leaves();
        if leaves.len() != expected {
            return Err(TangentError::ShapeMismatch {
                type_name: self.schema.type_name().to_string(),
                expected,
                actual: leaves.len(),
            });
        }
        let mut iter = leaves.into_iter();
        self.build(&mut iter)
    }

    fn build<L, I>(&self, leaves: &mut I) -> Result<Tangent<L>, TangentError>
    where
        I: Iterator<Item = L>,
    {
        let mut values = Vec::with_capacity(self.children.len());
        for child in &self.children {
            let value = match child {
                ChildDef::Leaf => TreeValue::Leaf(leaves.next().ok_or_else(|| {
                    TangentError::InternalError("leaf iterator exhausted during unflatten".to_string())
                })?),
                ChildDef::Node(def) => TreeValue::Node(def.build(leaves)?),
            };
            values.push(value);
        }
        Tangent::new(Arc::clone(&self.schema), values)
    }
}

#[cfg(test)]
#[path = "tangent_test.rs"]
mod tangent_test;
