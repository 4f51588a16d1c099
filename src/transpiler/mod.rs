//! SQL compiler for resolved MQL queries.
//!
//! Every literal becomes a bound parameter; only schema-supplied identifiers
//! reach the SQL text, and those go through the dialect's quoting.

pub mod conditions;
pub mod context;
pub mod dialect;
pub mod select;
pub mod sql;
pub mod traits;

#[cfg(test)]
mod tests;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ast::ResolvedQuery;
use crate::error::CompileError;

pub use conditions::ParamContext;
pub use context::{ClockContext, EvalContext, FixedContext};
pub use dialect::Dialect;
pub use traits::{SqlGenerator, escape_identifier};

/// A parameter value in binding order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BoundValue {
    Null,
    Int(i64),
    Number(Decimal),
    Text(String),
    Date(NaiveDate),
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Null => write!(f, "NULL"),
            BoundValue::Int(n) => write!(f, "{}", n),
            BoundValue::Number(n) => write!(f, "{}", n),
            BoundValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            BoundValue::Date(d) => write!(f, "'{}'", d.format("%Y-%m-%d")),
        }
    }
}

/// SQL text plus its parameters, ready for an executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledSql {
    pub text: String,
    pub params: Vec<BoundValue>,
}

/// Physical tables the compiler targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTables {
    /// One row per card, one column per property.
    pub cards: String,
    /// Tree membership: `card_id`, `tree_name`.
    pub hierarchy: String,
}

impl Default for CardTables {
    fn default() -> Self {
        Self {
            cards: "cards".to_string(),
            hierarchy: "tree_belongings".to_string(),
        }
    }
}

/// Compile against the default `cards` / `tree_belongings` tables.
pub fn compile(
    query: &ResolvedQuery,
    ctx: &dyn EvalContext,
    dialect: Dialect,
) -> Result<CompiledSql, CompileError> {
    Compiler::new(dialect).compile(query, ctx)
}

/// Reusable compiler configuration.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    pub dialect: Dialect,
    pub tables: CardTables,
}

impl Compiler {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            tables: CardTables::default(),
        }
    }

    pub fn with_tables(mut self, tables: CardTables) -> Self {
        self.tables = tables;
        self
    }

    pub fn compile(
        &self,
        query: &ResolvedQuery,
        ctx: &dyn EvalContext,
    ) -> Result<CompiledSql, CompileError> {
        let generator = self.dialect.generator();
        let compiled = select::build_select(query, generator.as_ref(), ctx, &self.tables)?;
        tracing::debug!(
            dialect = %self.dialect,
            sql_len = compiled.text.len(),
            params = compiled.params.len(),
            "compiled query"
        );
        Ok(compiled)
    }
}
