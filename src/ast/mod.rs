//! MQL abstract syntax tree.
//!
//! The parser produces a [`Query`] in the [`Raw`] stage: property names and
//! literals as written. The resolver turns it into a [`ResolvedQuery`] where
//! every property is bound to its [`PropertyDefinition`] and every literal is
//! a typed [`ResolvedValue`].

pub mod conditions;
pub mod operators;
pub mod query;
pub mod values;

pub use conditions::*;
pub use operators::*;
pub use query::*;
pub use values::*;

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::schema::PropertyDefinition;

/// Marks a tree as raw or resolved and picks the node payload types.
pub trait Stage: fmt::Debug + Clone + PartialEq {
    type Property: fmt::Debug + fmt::Display + Clone + PartialEq + Serialize;
    type Value: fmt::Debug + fmt::Display + Clone + PartialEq + Serialize;

    /// The property as the user spelled it.
    fn written(property: &Self::Property) -> &PropertyRef;

    fn is_null(value: &Self::Value) -> bool;
}

/// Straight out of the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Raw;

/// Bound to a schema snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved;

impl Stage for Raw {
    type Property = PropertyRef;
    type Value = Literal;

    fn written(property: &PropertyRef) -> &PropertyRef {
        property
    }

    fn is_null(value: &Literal) -> bool {
        matches!(value, Literal::Null)
    }
}

impl Stage for Resolved {
    type Property = BoundProperty;
    type Value = ResolvedValue;

    fn written(property: &BoundProperty) -> &PropertyRef {
        &property.written
    }

    fn is_null(value: &ResolvedValue) -> bool {
        matches!(value, ResolvedValue::Null)
    }
}

/// A property reference bound to its schema definition.
///
/// Equality looks at the definition only, so `status` and `'Status'` bind
/// identically.
#[derive(Debug, Clone, Serialize)]
pub struct BoundProperty {
    pub definition: Arc<PropertyDefinition>,
    pub written: PropertyRef,
}

impl BoundProperty {
    pub fn new(definition: Arc<PropertyDefinition>, written: PropertyRef) -> Self {
        Self {
            definition,
            written,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn column(&self) -> &str {
        &self.definition.column
    }
}

impl PartialEq for BoundProperty {
    fn eq(&self, other: &Self) -> bool {
        self.definition == other.definition
    }
}
