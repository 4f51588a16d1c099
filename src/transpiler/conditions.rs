use crate::ast::{
    BoundProperty, Condition, LogicalOp, NumberValue, Operator, Resolved, ResolvedValue,
    SpecialToken,
};
use crate::schema::{PropertyDefinition, PropertyKind};

use super::BoundValue;
use super::context::EvalContext;
use super::traits::SqlGenerator;

/// Context for parameterized query building.
#[derive(Debug, Default)]
pub struct ParamContext {
    /// Current parameter index (1-based for Postgres $1, $2, etc.)
    pub index: usize,
    /// Collected parameter values in order
    pub params: Vec<BoundValue>,
}

impl ParamContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value and return the placeholder for it.
    pub fn add_param(&mut self, value: BoundValue, generator: &dyn SqlGenerator) -> String {
        self.index += 1;
        self.params.push(value);
        generator.placeholder(self.index)
    }
}

/// Writes WHERE fragments for one card table.
pub struct ConditionWriter<'a> {
    pub generator: &'a dyn SqlGenerator,
    pub ctx: &'a dyn EvalContext,
    pub table: &'a str,
}

impl<'a> ConditionWriter<'a> {
    pub fn column(&self, property: &PropertyDefinition) -> String {
        self.generator.qualified(self.table, &property.column)
    }

    /// Concrete parameter for a resolved value; specials are bound here.
    pub fn bind(&self, value: &ResolvedValue) -> BoundValue {
        match value {
            ResolvedValue::Null => BoundValue::Null,
            ResolvedValue::Number(n) => BoundValue::Number(n.value),
            ResolvedValue::Text(s) => BoundValue::Text(s.clone()),
            ResolvedValue::Date(d) => BoundValue::Date(*d),
            ResolvedValue::User { id, .. } => BoundValue::Int(id.0),
            ResolvedValue::Card { id, .. } => BoundValue::Int(id.0),
            ResolvedValue::Special(SpecialToken::Today) => BoundValue::Date(self.ctx.today()),
            ResolvedValue::Special(SpecialToken::CurrentUser) => {
                BoundValue::Int(self.ctx.current_user().0)
            }
            ResolvedValue::PlvIndirection { value, .. } => self.bind(value),
        }
    }

    pub fn condition(&self, cond: &Condition<Resolved>, params: &mut ParamContext) -> String {
        match cond {
            Condition::Comparison {
                property,
                op,
                value,
            } => self.comparison(property, *op, value, params),
            Condition::In { property, values } => self.in_list(property, values, params),
            Condition::Composite {
                op: LogicalOp::And,
                children,
            } => children
                .iter()
                .map(|c| self.condition(c, params))
                .collect::<Vec<_>>()
                .join(" AND "),
            Condition::Composite {
                op: LogicalOp::Or,
                children,
            } => {
                let parts: Vec<String> = children
                    .iter()
                    .map(|c| format!("({})", self.condition(c, params)))
                    .collect();
                format!("({})", parts.join(" OR "))
            }
            Condition::Not(child) if child.is_or() => {
                format!("NOT {}", self.condition(child, params))
            }
            Condition::Not(child) => format!("NOT ({})", self.condition(child, params)),
        }
    }

    fn is_text(property: &PropertyDefinition) -> bool {
        matches!(
            property.kind,
            PropertyKind::Text | PropertyKind::Enumerated { numeric: false }
        )
    }

    fn comparison(
        &self,
        property: &BoundProperty,
        op: Operator,
        value: &ResolvedValue,
        params: &mut ParamContext,
    ) -> String {
        let definition = &property.definition;
        let col = self.column(definition);

        if value.is_null() {
            return match op {
                Operator::Ne => format!("{} IS NOT NULL", col),
                _ => format!("{} IS NULL", col),
            };
        }

        if matches!(definition.kind, PropertyKind::Enumerated { .. }) && !op.is_equality() {
            return self.enumerated_range(definition, &col, op, value, params);
        }

        let placeholder = params.add_param(self.bind(value), self.generator);
        let (lhs, rhs) = if Self::is_text(definition) {
            (self.generator.lower(&col), self.generator.lower(&placeholder))
        } else {
            (col.clone(), placeholder)
        };

        match op {
            // `!=` also matches cards without a value.
            Operator::Ne => format!("({} IS NULL OR {} <> {})", col, lhs, rhs),
            _ => format!("{} {} {}", lhs, op.symbol(), rhs),
        }
    }

    /// `status < closed` becomes membership in the values listed before `closed`.
    fn enumerated_range(
        &self,
        definition: &PropertyDefinition,
        col: &str,
        op: Operator,
        value: &ResolvedValue,
        params: &mut ParamContext,
    ) -> String {
        let Some(pos) = value_position(definition, value.terminal()) else {
            return "1 = 0".to_string();
        };
        let range = match op {
            Operator::Lt => 0..pos,
            Operator::Lte => 0..pos + 1,
            Operator::Gt => pos + 1..definition.values.len(),
            Operator::Gte => pos..definition.values.len(),
            Operator::Eq | Operator::Ne => pos..pos + 1,
        };
        let members = &definition.values[range];
        if members.is_empty() {
            return "1 = 0".to_string();
        }

        let placeholders: Vec<String> = members
            .iter()
            .map(|v| params.add_param(enumerated_param(definition, &v.value), self.generator))
            .collect();
        format!("{} IN ({})", col, placeholders.join(", "))
    }

    fn in_list(
        &self,
        property: &BoundProperty,
        values: &[ResolvedValue],
        params: &mut ParamContext,
    ) -> String {
        let definition = &property.definition;
        let col = self.column(definition);
        let text = Self::is_text(definition);

        let has_null = values.iter().any(ResolvedValue::is_null);
        let placeholders: Vec<String> = values
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| {
                let placeholder = params.add_param(self.bind(v), self.generator);
                if text {
                    self.generator.lower(&placeholder)
                } else {
                    placeholder
                }
            })
            .collect();

        if placeholders.is_empty() {
            return format!("{} IS NULL", col);
        }
        let lhs = if text {
            self.generator.lower(&col)
        } else {
            col.clone()
        };
        let membership = format!("{} IN ({})", lhs, placeholders.join(", "));
        if has_null {
            format!("({} IS NULL OR {})", col, membership)
        } else {
            membership
        }
    }
}

/// Index of `value` in a managed value list.
pub(crate) fn value_position(
    definition: &PropertyDefinition,
    value: &ResolvedValue,
) -> Option<usize> {
    match value {
        ResolvedValue::Text(s) => definition.position_of(s),
        ResolvedValue::Number(n) => definition
            .values
            .iter()
            .position(|v| NumberValue::parse(&v.value).as_ref() == Some(n)),
        _ => None,
    }
}

/// A managed value as a parameter of the column's type.
pub(crate) fn enumerated_param(definition: &PropertyDefinition, value: &str) -> BoundValue {
    match definition.kind {
        PropertyKind::Enumerated { numeric: true } => match NumberValue::parse(value) {
            Some(n) => BoundValue::Number(n.value),
            None => BoundValue::Text(value.to_string()),
        },
        _ => BoundValue::Text(value.to_string()),
    }
}
