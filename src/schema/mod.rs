//! Property schema seen by the query core.
//!
//! The schema store itself lives outside this crate. The core only needs the
//! read-only view described by [`SchemaLookup`]; [`SchemaSnapshot`] is a
//! ready-made in-memory implementation for the CLI and tests.

mod snapshot;

pub use snapshot::{CardRecord, SchemaSnapshot};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::ast::ResolvedValue;

/// Stable identifier of a card (record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub i64);

/// Stable identifier of a project member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a condition names another card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardReference {
    /// `NUMBER 42` or a bare number.
    Number(i64),
    /// Display format, e.g. `#42 Login page`.
    Display(String),
}

impl fmt::Display for CardReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardReference::Number(n) => write!(f, "#{}", n),
            CardReference::Display(s) => write!(f, "{}", s),
        }
    }
}

impl CardReference {
    /// Leading `#<number>` of a display string, if any.
    pub fn number(&self) -> Option<i64> {
        match self {
            CardReference::Number(n) => Some(*n),
            CardReference::Display(s) => {
                let rest = s.trim().strip_prefix('#')?;
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().ok()
            }
        }
    }
}

/// The kind of a property, which drives literal resolution and SQL shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyKind {
    /// Managed list of values. `numeric` lists compare numerically.
    Enumerated {
        #[serde(default)]
        numeric: bool,
    },
    /// Free text.
    Text,
    /// Free number.
    Numeric,
    Date,
    User,
    /// Points at another card, optionally as a level of a named tree.
    CardRelationship {
        #[serde(default)]
        tree: Option<String>,
    },
    /// Computed numeric value, read-only.
    Formula,
    /// Numeric roll-up over a tree's descendants.
    Aggregate {
        #[serde(default)]
        tree: Option<String>,
    },
}

impl PropertyKind {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PropertyKind::Enumerated { numeric: true }
                | PropertyKind::Numeric
                | PropertyKind::Formula
                | PropertyKind::Aggregate { .. }
        )
    }

    pub fn describe(&self) -> &'static str {
        match self {
            PropertyKind::Enumerated { numeric: false } => "managed text",
            PropertyKind::Enumerated { numeric: true } => "managed number",
            PropertyKind::Text => "free text",
            PropertyKind::Numeric => "free number",
            PropertyKind::Date => "date",
            PropertyKind::User => "user",
            PropertyKind::CardRelationship { .. } => "card relationship",
            PropertyKind::Formula => "formula",
            PropertyKind::Aggregate { .. } => "aggregate",
        }
    }
}

/// One legal value of an enumerated or user property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub id: i64,
    /// Stored value; the login for user properties.
    pub value: String,
    /// Alternative name a user property also answers to.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl PropertyValue {
    pub fn new(id: i64, value: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Case-insensitive match on value or display name.
    pub fn answers_to(&self, text: &str) -> bool {
        self.value.eq_ignore_ascii_case(text)
            || self
                .display_name
                .as_deref()
                .map(|d| d.eq_ignore_ascii_case(text))
                .unwrap_or(false)
    }
}

/// Schema-level descriptor of one filterable attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub column: String,
    #[serde(flatten)]
    pub kind: PropertyKind,
    /// Ordered legal values; order matters for enumerated comparisons.
    #[serde(default)]
    pub values: Vec<PropertyValue>,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, column: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            kind,
            values: Vec::new(),
        }
    }

    pub fn with_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let start = self.values.len() as i64;
        self.values.extend(
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| PropertyValue::new(start + i as i64 + 1, v)),
        );
        self
    }

    pub fn with_value(mut self, value: PropertyValue) -> Self {
        self.values.push(value);
        self
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Position of a value in the managed list, case-insensitive.
    pub fn position_of(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v.value.eq_ignore_ascii_case(value))
    }
}

/// Read-only view of one project's schema.
///
/// Implementations must be safe to share across threads; every lookup is
/// made during a single resolve pass and never cached by the core.
pub trait SchemaLookup {
    /// Find a property by name, case-insensitively.
    fn find_property(&self, name: &str) -> Option<Arc<PropertyDefinition>>;

    /// Turn `NUMBER n` or a display string into a card id.
    fn resolve_card_reference(&self, reference: &CardReference) -> Option<CardId>;

    /// Current value of a project variable.
    fn resolve_project_variable(&self, name: &str) -> Option<ResolvedValue>;

    /// All property names, used for "did you mean" suggestions.
    fn property_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Value of `property` on `card`. `None` means the card has no value.
    fn card_property_value(
        &self,
        _card: CardId,
        _property: &PropertyDefinition,
    ) -> Option<ResolvedValue> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_reference_number() {
        assert_eq!(CardReference::Number(7).number(), Some(7));
        assert_eq!(
            CardReference::Display("#42 Login page".to_string()).number(),
            Some(42)
        );
        assert_eq!(CardReference::Display("Login page".to_string()).number(), None);
    }

    #[test]
    fn test_value_positions_are_case_insensitive() {
        let status = PropertyDefinition::new(
            "Status",
            "cp_status",
            PropertyKind::Enumerated { numeric: false },
        )
        .with_values(["New", "Open", "Closed"]);
        assert_eq!(status.position_of("open"), Some(1));
        assert_eq!(status.values[2].id, 3);
        assert!(status.is_named("STATUS"));
    }
}
