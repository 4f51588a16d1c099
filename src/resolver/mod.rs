//! Schema resolution.
//!
//! Binds every property reference in a raw [`Query`] to its
//! [`PropertyDefinition`] and turns every literal into a typed
//! [`ResolvedValue`]. `TODAY` and `CURRENT USER` stay symbolic; the compiler
//! binds them per request.

mod values;

pub use values::{parse_date, resolve_stored_value};

use strsim::levenshtein;

use crate::ast::{
    BoundProperty, Condition, Literal, Operator, OrderBy, PropertyRef, Query, Resolved,
    ResolvedQuery, ResolvedValue, SelectColumn,
};
use crate::error::ResolveError;
use crate::schema::{PropertyDefinition, PropertyKind, SchemaLookup};

/// Resolve a parsed query against a schema snapshot.
pub fn resolve(query: Query, schema: &dyn SchemaLookup) -> Result<ResolvedQuery, ResolveError> {
    Resolver::new(schema).query(query)
}

/// Single-pass binder over one schema snapshot.
pub struct Resolver<'s> {
    schema: &'s dyn SchemaLookup,
}

impl<'s> Resolver<'s> {
    pub fn new(schema: &'s dyn SchemaLookup) -> Self {
        Self { schema }
    }

    pub fn query(&self, query: Query) -> Result<ResolvedQuery, ResolveError> {
        let select = query
            .select
            .into_iter()
            .map(|column| self.select_column(column))
            .collect::<Result<Vec<_>, _>>()?;

        let filter = match query.filter {
            Some(cond) => Some(self.condition(cond)?),
            None => None,
        };

        let group_by = query
            .group_by
            .into_iter()
            .map(|p| self.property(p))
            .collect::<Result<Vec<_>, _>>()?;

        let order_by = query
            .order_by
            .into_iter()
            .map(|o| {
                Ok(OrderBy {
                    property: self.property(o.property)?,
                    order: o.order,
                })
            })
            .collect::<Result<Vec<_>, ResolveError>>()?;

        let resolved = ResolvedQuery {
            select,
            tree_scope: query.tree_scope,
            filter,
            group_by,
            order_by,
            limit: query.limit,
            page: query.page,
        };
        tracing::debug!(query = %resolved, "resolved query");
        Ok(resolved)
    }

    /// Bind a property name, case-insensitively.
    pub fn property(&self, written: PropertyRef) -> Result<BoundProperty, ResolveError> {
        match self.schema.find_property(&written.name) {
            Some(definition) => Ok(BoundProperty::new(definition, written)),
            None => Err(ResolveError::UnknownProperty {
                suggestion: self.did_you_mean(&written.name),
                name: written.name,
            }),
        }
    }

    fn select_column(&self, column: SelectColumn) -> Result<SelectColumn<Resolved>, ResolveError> {
        match column {
            SelectColumn::Property(p) => Ok(SelectColumn::Property(self.property(p)?)),
            SelectColumn::Aggregate { func, target } => {
                let target = match target {
                    Some(p) => {
                        let bound = self.property(p)?;
                        if func.needs_numeric() && !bound.definition.kind.is_numeric() {
                            return Err(ResolveError::NonNumericAggregate {
                                function: func.to_string(),
                                property: bound.name().to_string(),
                            });
                        }
                        Some(bound)
                    }
                    None => None,
                };
                Ok(SelectColumn::Aggregate { func, target })
            }
        }
    }

    pub fn condition(&self, cond: Condition) -> Result<Condition<Resolved>, ResolveError> {
        match cond {
            Condition::Comparison {
                property,
                op,
                value,
            } => {
                let property = self.property(property)?;
                let value = self.value(&property.definition, op, value)?;
                Ok(Condition::Comparison {
                    property,
                    op,
                    value,
                })
            }
            Condition::In { property, values } => {
                let property = self.property(property)?;
                let values = values
                    .into_iter()
                    .map(|v| self.value(&property.definition, Operator::Eq, v))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Condition::In { property, values })
            }
            Condition::Composite { op, children } => {
                let children = children
                    .into_iter()
                    .map(|c| self.condition(c))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Condition::Composite { op, children })
            }
            Condition::Not(child) => Ok(Condition::Not(Box::new(self.condition(*child)?))),
        }
    }

    /// Resolve one literal compared against `property` with `op`.
    pub fn value(
        &self,
        property: &PropertyDefinition,
        op: Operator,
        literal: Literal,
    ) -> Result<ResolvedValue, ResolveError> {
        if matches!(literal, Literal::Null) && !op.is_equality() {
            return Err(ResolveError::UnsupportedOperator {
                operator: op.to_string(),
                target: "NULL".to_string(),
            });
        }
        if matches!(property.kind, PropertyKind::CardRelationship { .. }) && !op.is_equality() {
            return Err(ResolveError::UnsupportedOperator {
                operator: op.to_string(),
                target: format!("card relationship property '{}'", property.name),
            });
        }
        values::resolve_literal(self.schema, property, literal)
    }

    fn did_you_mean(&self, input: &str) -> Option<String> {
        let input = input.to_lowercase();
        let mut best_match = None;
        let mut min_dist = usize::MAX;

        for candidate in self.schema.property_names() {
            let dist = levenshtein(&input, &candidate.to_lowercase());
            let threshold = match input.chars().count() {
                0..=2 => 0,
                3..=5 => 2,
                _ => 3,
            };
            if dist <= threshold && dist < min_dist {
                min_dist = dist;
                best_match = Some(candidate);
            }
        }

        best_match
    }
}
