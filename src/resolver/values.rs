//! Type-directed literal resolution.

use chrono::NaiveDate;

use crate::ast::{Literal, NumberValue, ResolvedValue, SpecialToken};
use crate::error::ResolveError;
use crate::schema::{CardReference, PropertyDefinition, PropertyKind, SchemaLookup, UserId};

/// Accepted date spellings, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d %b %Y", "%d %B %Y", "%Y/%m/%d"];

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Convert a value stored as text (a card's property value, say) into a
/// resolved value of `property`'s kind. Empty text is `Null`.
pub fn resolve_stored_value(
    schema: &dyn SchemaLookup,
    property: &PropertyDefinition,
    text: &str,
) -> Result<ResolvedValue, ResolveError> {
    if text.trim().is_empty() {
        return Ok(ResolvedValue::Null);
    }
    terminal(schema, property, Literal::text(text))
}

pub(super) fn resolve_literal(
    schema: &dyn SchemaLookup,
    property: &PropertyDefinition,
    literal: Literal,
) -> Result<ResolvedValue, ResolveError> {
    match literal {
        Literal::Null => Ok(ResolvedValue::Null),
        Literal::Variable { name, target } => variable(schema, property, name, target),
        other => terminal(schema, property, other),
    }
}

fn invalid(
    property: &PropertyDefinition,
    value: impl Into<String>,
    reason: impl Into<String>,
) -> ResolveError {
    ResolveError::InvalidValue {
        property: property.name.clone(),
        value: value.into(),
        reason: reason.into(),
    }
}

fn unknown(property: &PropertyDefinition, value: &str) -> ResolveError {
    ResolveError::UnknownValue {
        property: property.name.clone(),
        value: value.to_string(),
    }
}

fn terminal(
    schema: &dyn SchemaLookup,
    property: &PropertyDefinition,
    literal: Literal,
) -> Result<ResolvedValue, ResolveError> {
    match (&property.kind, literal) {
        (PropertyKind::Date, Literal::Today) => Ok(ResolvedValue::Special(SpecialToken::Today)),
        (_, Literal::Today) => Err(invalid(property, "TODAY", "only date properties accept TODAY")),

        (PropertyKind::User, Literal::CurrentUser) => {
            Ok(ResolvedValue::Special(SpecialToken::CurrentUser))
        }
        (_, Literal::CurrentUser) => Err(invalid(
            property,
            "CURRENT USER",
            "only user properties accept CURRENT USER",
        )),

        (PropertyKind::CardRelationship { .. }, Literal::CardNumber(n)) => {
            card(schema, property, CardReference::Number(n))
        }
        (_, Literal::CardNumber(n)) => Err(invalid(
            property,
            format!("NUMBER {}", n),
            "only card relationship properties accept NUMBER",
        )),

        (kind, literal) => {
            let text = match literal.as_text() {
                Some(t) => t.to_string(),
                None => return Err(invalid(property, literal.to_string(), "unexpected literal")),
            };
            text_value(schema, property, kind, &text)
        }
    }
}

fn text_value(
    schema: &dyn SchemaLookup,
    property: &PropertyDefinition,
    kind: &PropertyKind,
    text: &str,
) -> Result<ResolvedValue, ResolveError> {
    match kind {
        PropertyKind::Enumerated { numeric: false } => {
            if let Some(pos) = property.position_of(text) {
                return Ok(ResolvedValue::Text(property.values[pos].value.clone()));
            }
            // `1` against a managed text value stored as `1.0`.
            let number = NumberValue::parse(text).ok_or_else(|| unknown(property, text))?;
            property
                .values
                .iter()
                .find(|v| NumberValue::parse(&v.value).as_ref() == Some(&number))
                .map(|v| ResolvedValue::Text(v.value.clone()))
                .ok_or_else(|| unknown(property, text))
        }
        PropertyKind::Enumerated { numeric: true } => {
            let number = NumberValue::parse(text).ok_or_else(|| unknown(property, text))?;
            let known = property
                .values
                .iter()
                .any(|v| NumberValue::parse(&v.value).as_ref() == Some(&number));
            if known {
                Ok(ResolvedValue::Number(number))
            } else {
                Err(unknown(property, text))
            }
        }
        PropertyKind::Text => Ok(ResolvedValue::Text(text.to_string())),
        PropertyKind::Numeric | PropertyKind::Formula | PropertyKind::Aggregate { .. } => {
            NumberValue::parse(text)
                .map(ResolvedValue::Number)
                .ok_or_else(|| invalid(property, text, "expected a number"))
        }
        PropertyKind::Date => parse_date(text)
            .map(ResolvedValue::Date)
            .ok_or_else(|| invalid(property, text, "expected a date such as 2024-03-01")),
        PropertyKind::User => property
            .values
            .iter()
            .find(|v| v.answers_to(text))
            .map(|v| ResolvedValue::User {
                id: UserId(v.id),
                login: v.value.clone(),
            })
            .ok_or_else(|| unknown(property, text)),
        PropertyKind::CardRelationship { .. } => {
            let reference = match text.trim().parse::<i64>() {
                Ok(n) => CardReference::Number(n),
                Err(_) => CardReference::Display(text.to_string()),
            };
            card(schema, property, reference)
        }
    }
}

fn card(
    schema: &dyn SchemaLookup,
    property: &PropertyDefinition,
    reference: CardReference,
) -> Result<ResolvedValue, ResolveError> {
    match schema.resolve_card_reference(&reference) {
        Some(id) => Ok(ResolvedValue::Card { id, reference }),
        None => Err(ResolveError::UnknownCardReference {
            property: property.name.clone(),
            reference: reference.to_string(),
        }),
    }
}

fn variable(
    schema: &dyn SchemaLookup,
    property: &PropertyDefinition,
    name: String,
    target: Option<String>,
) -> Result<ResolvedValue, ResolveError> {
    let stored = schema
        .resolve_project_variable(&name)
        .ok_or_else(|| ResolveError::UnknownVariable { name: name.clone() })?;

    let value = match &target {
        None => stored,
        Some(target_name) => {
            let card = match stored.terminal() {
                ResolvedValue::Card { id, .. } => *id,
                _ => {
                    return Err(invalid(
                        property,
                        format!("({} - {})", name, target_name),
                        format!("project variable '{}' does not hold a card", name),
                    ));
                }
            };
            let target_property = schema.find_property(target_name).ok_or_else(|| {
                ResolveError::UnknownVariable {
                    name: format!("{} - {}", name, target_name),
                }
            })?;
            schema
                .card_property_value(card, &target_property)
                .unwrap_or(ResolvedValue::Null)
        }
    };

    if !fits(&property.kind, value.terminal()) {
        return Err(invalid(
            property,
            format!("({})", name),
            format!("project variable does not hold a {} value", property.kind.describe()),
        ));
    }
    in_value_list(schema, property, value.terminal())?;

    Ok(ResolvedValue::PlvIndirection {
        name,
        target,
        value: Box::new(value),
    })
}

/// A variable standing in for a managed or user value must hold one of the
/// property's known values.
fn in_value_list(
    schema: &dyn SchemaLookup,
    property: &PropertyDefinition,
    value: &ResolvedValue,
) -> Result<(), ResolveError> {
    match (&property.kind, value) {
        (PropertyKind::Enumerated { .. }, ResolvedValue::Text(text)) => {
            text_value(schema, property, &property.kind, text).map(|_| ())
        }
        (PropertyKind::Enumerated { .. }, ResolvedValue::Number(number)) => {
            text_value(schema, property, &property.kind, &number.display).map(|_| ())
        }
        (PropertyKind::User, ResolvedValue::User { id, login }) => {
            let known = property
                .values
                .iter()
                .any(|v| v.id == id.0 || v.answers_to(login));
            if known {
                Ok(())
            } else {
                Err(unknown(property, login))
            }
        }
        _ => Ok(()),
    }
}

/// Whether a variable's value can stand in for a literal of `kind`.
fn fits(kind: &PropertyKind, value: &ResolvedValue) -> bool {
    match value {
        ResolvedValue::Null => true,
        ResolvedValue::Number(_) => {
            kind.is_numeric()
                || matches!(kind, PropertyKind::Text | PropertyKind::Enumerated { .. })
        }
        ResolvedValue::Text(_) => matches!(
            kind,
            PropertyKind::Text | PropertyKind::Enumerated { numeric: false }
        ),
        ResolvedValue::Date(_) | ResolvedValue::Special(SpecialToken::Today) => {
            matches!(kind, PropertyKind::Date)
        }
        ResolvedValue::User { .. } | ResolvedValue::Special(SpecialToken::CurrentUser) => {
            matches!(kind, PropertyKind::User)
        }
        ResolvedValue::Card { .. } => matches!(kind, PropertyKind::CardRelationship { .. }),
        ResolvedValue::PlvIndirection { value, .. } => fits(kind, value),
    }
}
