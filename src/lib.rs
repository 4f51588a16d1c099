//! # MQL: card query language
//!
//! A small SQL-like language for filtering and reporting over project cards.
//! Queries are parsed, bound to a project's property schema, then compiled to
//! parameterized SQL for the card table.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use mql::prelude::*;
//!
//! let schema = SchemaSnapshot::load("schema.toml".as_ref())?;
//! let query = resolve(mql::parse("status = open AND owner = current user")?, &schema)?;
//!
//! let ctx = FixedContext::new(today, UserId(7));
//! let sql = compile(&query, &ctx, Dialect::Postgres)?;
//! // sql.text   => SELECT cards.* FROM cards WHERE LOWER(cards.cp_status) = LOWER($1)
//! //               AND cards.cp_owner_user_id = $2
//! // sql.params => ['Open', 7]
//! ```
//!
//! ## Pipeline
//!
//! | Stage       | Module          | Output                |
//! |-------------|-----------------|-----------------------|
//! | Lex + parse | [`parser`]      | `Query<Raw>`          |
//! | Resolve     | [`resolver`]    | `Query<Resolved>`     |
//! | Compile     | [`transpiler`]  | [`CompiledSql`]       |
//! | Execute     | [`engine`]      | rows as JSON maps     |
//!
//! [`transform`] holds the rewrites that work on resolved queries: value
//! rename, property value detection and live filter extraction.
//!
//! [`CompiledSql`]: transpiler::CompiledSql

pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod fmt;
pub mod parser;
pub mod resolver;
pub mod schema;
pub mod transform;
pub mod transpiler;

pub use parser::parse;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::MqlConfig;
    pub use crate::engine::{Executor, RowMap, prepare};
    pub use crate::error::*;
    pub use crate::parser::parse;
    pub use crate::resolver::resolve;
    pub use crate::schema::{
        CardId, CardRecord, PropertyDefinition, PropertyKind, PropertyValue, SchemaLookup,
        SchemaSnapshot, UserId,
    };
    pub use crate::transform::{DetectedValues, LiveFilter, detect, extract, rename_value};
    pub use crate::transpiler::{
        BoundValue, CardTables, ClockContext, CompiledSql, Compiler, Dialect, EvalContext,
        FixedContext, compile,
    };
}
