use serde::Serialize;

use super::{LogicalOp, Operator, Raw, Stage};

/// A node of the condition tree.
///
/// The stage parameter fixes whether every node in the tree is raw or
/// resolved; the two can never be mixed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "")]
pub enum Condition<S: Stage = Raw> {
    Comparison {
        property: S::Property,
        op: Operator,
        value: S::Value,
    },
    /// `property IN (v1, v2, ...)`, duplicates and order as written.
    In {
        property: S::Property,
        values: Vec<S::Value>,
    },
    /// Always at least two children.
    Composite {
        op: LogicalOp,
        children: Vec<Condition<S>>,
    },
    Not(Box<Condition<S>>),
}

impl<S: Stage> Condition<S> {
    pub fn comparison(property: S::Property, op: Operator, value: S::Value) -> Self {
        Condition::Comparison {
            property,
            op,
            value,
        }
    }

    /// Join conditions with `op`, flattening children that use the same operator.
    /// A single condition is returned unchanged.
    pub fn combine(op: LogicalOp, conditions: Vec<Condition<S>>) -> Self {
        let mut children = Vec::with_capacity(conditions.len());
        for cond in conditions {
            match cond {
                Condition::Composite {
                    op: inner,
                    children: nested,
                } if inner == op => children.extend(nested),
                other => children.push(other),
            }
        }
        if children.len() == 1 {
            return children.remove(0);
        }
        Condition::Composite { op, children }
    }

    pub fn and(conditions: Vec<Condition<S>>) -> Self {
        Self::combine(LogicalOp::And, conditions)
    }

    pub fn or(conditions: Vec<Condition<S>>) -> Self {
        Self::combine(LogicalOp::Or, conditions)
    }

    pub fn negate(self) -> Self {
        Condition::Not(Box::new(self))
    }

    pub fn is_or(&self) -> bool {
        matches!(
            self,
            Condition::Composite {
                op: LogicalOp::Or,
                ..
            }
        )
    }

    /// Visit every compared value in source order.
    ///
    /// `op` is `None` for members of an `IN` list.
    pub fn for_each_value<F>(&self, f: &mut F)
    where
        F: FnMut(&S::Property, Option<Operator>, &S::Value),
    {
        match self {
            Condition::Comparison {
                property,
                op,
                value,
            } => f(property, Some(*op), value),
            Condition::In { property, values } => {
                for value in values {
                    f(property, None, value);
                }
            }
            Condition::Composite { children, .. } => {
                for child in children {
                    child.for_each_value(f);
                }
            }
            Condition::Not(child) => child.for_each_value(f),
        }
    }

    /// Mutable counterpart of [`Condition::for_each_value`].
    pub fn for_each_value_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&S::Property, &mut S::Value),
    {
        match self {
            Condition::Comparison {
                property, value, ..
            } => f(property, value),
            Condition::In { property, values } => {
                for value in values.iter_mut() {
                    f(property, value);
                }
            }
            Condition::Composite { children, .. } => {
                for child in children.iter_mut() {
                    child.for_each_value_mut(f);
                }
            }
            Condition::Not(child) => child.for_each_value_mut(f),
        }
    }
}
