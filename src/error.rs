//! Error types for MQL.
//!
//! Each stage of the pipeline has its own error enum so callers can tell a
//! grammar problem from a schema problem. [`MqlError`] folds them together
//! for code that drives the whole pipeline.

use thiserror::Error;

/// Malformed token in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A quote was opened but never closed.
    #[error("Unterminated string starting at position {offset}")]
    UnterminatedString { offset: usize },

    /// A character that cannot start any token.
    #[error("Unexpected character '{ch}' at position {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },
}

impl LexError {
    pub fn offset(&self) -> usize {
        match self {
            LexError::UnterminatedString { offset } => *offset,
            LexError::UnexpectedCharacter { offset, .. } => *offset,
        }
    }
}

/// Grammar violation. The parser never recovers; the first problem wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Failed to parse the query at the given token.
    #[error("Parse error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    /// `SELECT foo(x)` where `foo` is not an aggregate function.
    #[error("Unknown aggregate function '{name}' at position {position}")]
    UnknownAggregate { name: String, position: usize },
}

impl ParseError {
    /// Create a syntax error at the given position.
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    pub fn position(&self) -> usize {
        match self {
            ParseError::Lex(e) => e.offset(),
            ParseError::Syntax { position, .. } => *position,
            ParseError::UnknownAggregate { position, .. } => *position,
        }
    }
}

/// Failure to bind a name or literal against the property schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{}", unknown_property_message(.name, .suggestion))]
    UnknownProperty {
        name: String,
        suggestion: Option<String>,
    },

    /// The literal is not one of the property's legal values.
    #[error("'{value}' is not a valid value for property '{property}'")]
    UnknownValue { property: String, value: String },

    #[error("Invalid value '{value}' for property '{property}': {reason}")]
    InvalidValue {
        property: String,
        value: String,
        reason: String,
    },

    #[error("Card '{reference}' referenced by property '{property}' does not exist")]
    UnknownCardReference { property: String, reference: String },

    #[error("Project variable '{name}' does not exist")]
    UnknownVariable { name: String },

    #[error("Operator '{operator}' cannot be used with {target}")]
    UnsupportedOperator { operator: String, target: String },

    #[error("{function} requires a numeric property, but '{property}' is not numeric")]
    NonNumericAggregate { function: String, property: String },
}

fn unknown_property_message(name: &str, suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!("Property '{}' does not exist. Did you mean '{}'?", name, s),
        None => format!("Property '{}' does not exist.", name),
    }
}

/// Configuration problems found while emitting SQL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A plain selected or sorted column in a grouped or aggregated query
    /// is not grouped. `*` stands for the implicit `cards.*` column list.
    #[error("Column '{column}' must appear in GROUP BY when the query is grouped or aggregated")]
    MissingGroupBy { column: String },

    #[error("{dialect} does not support {feature}")]
    Unsupported { dialect: String, feature: String },
}

/// Errors raised by rename, detect and live-filter extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The query is valid MQL but outside the live-filter subset.
    #[error("Unsupported construct for live filter at position {position}: {construct}")]
    UnsupportedConstruct { construct: String, position: usize },
}

impl TransformError {
    pub fn unsupported(position: usize, construct: impl Into<String>) -> Self {
        Self::UnsupportedConstruct {
            construct: construct.into(),
            position,
        }
    }
}

/// The main error type for code driving the whole pipeline.
#[derive(Debug, Error)]
pub enum MqlError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Configuration or schema snapshot problem.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LexError> for MqlError {
    fn from(e: LexError) -> Self {
        MqlError::Parse(ParseError::Lex(e))
    }
}

/// Result type alias for MQL operations.
pub type MqlResult<T> = Result<T, MqlError>;
