use serde::{Serialize, Serializer};

use crate::ast::{Condition, LogicalOp, Operator, Resolved, ResolvedValue, SpecialToken};
use crate::error::{ParseError, TransformError};
use crate::parser::lexer::{Keyword, Token, TokenKind, tokenize};
use crate::parser::parse_tokens;
use crate::resolver::resolve;
use crate::schema::SchemaLookup;
use crate::transpiler::EvalContext;

/// One `(operator, property, value)` tuple for a live filter widget.
///
/// `property` is always the schema's spelling of the name, not the text the
/// filter was written with: `owner = member` comes back as `("=", "Owner", ...)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveFilter {
    #[serde(serialize_with = "operator_symbol")]
    pub operator: Operator,
    /// Schema spelling of the property, whatever the casing or quoting used.
    pub property: String,
    /// Fully resolved value; `None` for NULL.
    pub value: Option<String>,
}

fn operator_symbol<S: Serializer>(op: &Operator, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(op.symbol())
}

/// Break a simple filter into live filter tuples.
///
/// Accepts an optional leading `WHERE` and AND-joined comparisons. `OR`,
/// `IN`, `NOT`, grouping parentheses and every clause besides the filter
/// are rejected, even though the general parser accepts them.
pub fn extract(
    text: &str,
    schema: &dyn SchemaLookup,
    ctx: &dyn EvalContext,
) -> Result<Vec<LiveFilter>, TransformError> {
    let tokens = tokenize(text).map_err(ParseError::from)?;
    check_tokens(&tokens)?;

    let query = resolve(parse_tokens(&tokens, text.len())?, schema)?;
    if !query.is_filter_only() || query.tree_scope.is_some() {
        return Err(TransformError::unsupported(0, "clauses other than WHERE"));
    }

    let mut filters = Vec::new();
    if let Some(filter) = &query.filter {
        collect(filter, ctx, &mut filters)?;
    }
    tracing::debug!(filters = filters.len(), "extracted live filters");
    Ok(filters)
}

/// Reject constructs outside the live filter subset, by position.
fn check_tokens(tokens: &[Token]) -> Result<(), TransformError> {
    for (i, token) in tokens.iter().enumerate() {
        let prev = i.checked_sub(1).and_then(|p| tokens.get(p));
        let construct = match token.kind {
            TokenKind::Keyword(Keyword::Or) => Some("OR"),
            TokenKind::Keyword(Keyword::In) => Some("IN"),
            // `IS NOT NULL` is fine.
            TokenKind::Keyword(Keyword::Not)
                if !prev.map(|p| p.is_keyword(Keyword::Is)).unwrap_or(false) =>
            {
                Some("NOT")
            }
            TokenKind::Keyword(Keyword::Where) if i > 0 => Some("WHERE after the start"),
            TokenKind::Keyword(
                Keyword::Select | Keyword::From | Keyword::Tree | Keyword::Order | Keyword::Group,
            ) => Some("clauses other than WHERE"),
            // A paren straight after an operator opens a project variable.
            TokenKind::Punctuation if token.is_punct('(') => {
                let after_operator = prev.map(|p| p.kind == TokenKind::Operator).unwrap_or(false);
                if after_operator { None } else { Some("nested parentheses") }
            }
            _ => None,
        };
        if let Some(construct) = construct {
            return Err(TransformError::unsupported(token.offset, construct));
        }
    }
    Ok(())
}

fn collect(
    cond: &Condition<Resolved>,
    ctx: &dyn EvalContext,
    out: &mut Vec<LiveFilter>,
) -> Result<(), TransformError> {
    match cond {
        Condition::Comparison {
            property,
            op,
            value,
        } => {
            out.push(LiveFilter {
                operator: *op,
                property: property.name().to_string(),
                value: live_value(value, ctx),
            });
            Ok(())
        }
        Condition::Composite {
            op: LogicalOp::And,
            children,
        } => {
            for child in children {
                collect(child, ctx, out)?;
            }
            Ok(())
        }
        Condition::Composite {
            op: LogicalOp::Or, ..
        } => Err(TransformError::unsupported(0, "OR")),
        Condition::In { .. } => Err(TransformError::unsupported(0, "IN")),
        Condition::Not(_) => Err(TransformError::unsupported(0, "NOT")),
    }
}

fn live_value(value: &ResolvedValue, ctx: &dyn EvalContext) -> Option<String> {
    match value {
        ResolvedValue::Null => None,
        ResolvedValue::Number(n) => Some(n.display.clone()),
        ResolvedValue::Text(s) => Some(s.clone()),
        ResolvedValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        ResolvedValue::User { id, .. } => Some(id.to_string()),
        ResolvedValue::Card { id, .. } => Some(id.to_string()),
        ResolvedValue::Special(SpecialToken::Today) => {
            Some(ctx.today().format("%Y-%m-%d").to_string())
        }
        ResolvedValue::Special(SpecialToken::CurrentUser) => Some(ctx.current_user().to_string()),
        ResolvedValue::PlvIndirection { value, .. } => live_value(value, ctx),
    }
}
