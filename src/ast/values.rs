use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::schema::{CardId, CardReference, UserId};

/// A property name as written in the query text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRef {
    pub name: String,
    /// Quote character used in the source, if any.
    pub quote: Option<char>,
}

impl PropertyRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quote: None,
        }
    }

    pub fn quoted(name: impl Into<String>, quote: char) -> Self {
        Self {
            name: name.into(),
            quote: Some(quote),
        }
    }
}

/// An unresolved literal, exactly as the parser saw it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Literal {
    /// Bare word or quoted string.
    Text { value: String, quote: Option<char> },
    /// Numeric literal, original spelling kept.
    Number(String),
    Null,
    Today,
    CurrentUser,
    /// `NUMBER 42`
    CardNumber(i64),
    /// `(name)` or `(name - target property)`
    Variable { name: String, target: Option<String> },
}

impl Literal {
    pub fn text(value: impl Into<String>) -> Self {
        Literal::Text {
            value: value.into(),
            quote: None,
        }
    }

    pub fn number(value: impl Into<String>) -> Self {
        Literal::Number(value.into())
    }

    /// Plain textual content of a text or number literal.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Literal::Text { value, .. } => Some(value),
            Literal::Number(n) => Some(n),
            _ => None,
        }
    }
}

/// Request-scoped values, bound only at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialToken {
    Today,
    CurrentUser,
}

/// A number that compares by value but remembers how it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberValue {
    pub value: Decimal,
    pub display: String,
}

impl NumberValue {
    pub fn parse(text: &str) -> Option<Self> {
        let value = Decimal::from_str(text.trim()).ok()?;
        Some(Self {
            value,
            display: text.trim().to_string(),
        })
    }
}

impl PartialEq for NumberValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for NumberValue {}

/// A literal after schema resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedValue {
    Null,
    Number(NumberValue),
    /// Canonical spelling from the schema for managed values.
    Text(String),
    Date(NaiveDate),
    User { id: UserId, login: String },
    Card { id: CardId, reference: CardReference },
    Special(SpecialToken),
    /// Project variable; `value` is the terminal value it stood for at resolve time.
    PlvIndirection {
        name: String,
        target: Option<String>,
        value: Box<ResolvedValue>,
    },
}

impl ResolvedValue {
    pub fn number(text: &str) -> Option<Self> {
        NumberValue::parse(text).map(ResolvedValue::Number)
    }

    /// Follow project-variable indirection down to the concrete value.
    pub fn terminal(&self) -> &ResolvedValue {
        match self {
            ResolvedValue::PlvIndirection { value, .. } => value.terminal(),
            other => other,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.terminal(), ResolvedValue::Null)
    }

    /// Text content used when matching enumerated values by name.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResolvedValue::Text(s) => Some(s),
            ResolvedValue::Number(n) => Some(&n.display),
            ResolvedValue::User { login, .. } => Some(login),
            _ => None,
        }
    }
}
