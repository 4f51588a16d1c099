//! Rendering of AST nodes back to MQL text.
//!
//! Raw nodes render as written. Resolved nodes render in canonical form:
//! schema spelling for properties and values, single quotes only where a
//! bare word would not lex back to the same thing.
//!
//! OR composites are fully parenthesized, `((a) OR (b))`; AND composites are
//! joined bare. Generated SQL follows the same layout.

use std::fmt::{self, Display, Write};

use crate::ast::{
    BoundProperty, Condition, Literal, LogicalOp, Operator, PropertyRef, Query, ResolvedValue,
    SelectColumn, SortOrder, SpecialToken, Stage,
};
use crate::parser::lexer::Keyword;
use crate::schema::CardReference;

#[cfg(test)]
mod tests;

/// True when `text` must be quoted to survive a round trip through the lexer.
pub fn needs_quoting(text: &str) -> bool {
    let mut chars = text.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return true,
    };
    if first.is_ascii_digit() || !(first.is_alphanumeric() || first == '_') {
        return true;
    }
    if !chars.all(|c| c.is_alphanumeric() || c == '_') {
        return true;
    }
    Keyword::from_word(text).is_some()
}

/// Wrap in `quote`, doubling embedded quote characters and escaping `\`.
pub fn quote_with(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        if c == quote {
            out.push(quote);
        } else if c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(quote);
    out
}

/// Single-quote `text` only when a bare word would not do.
pub fn quote_if_needed(text: &str) -> String {
    if needs_quoting(text) {
        quote_with(text, '\'')
    } else {
        text.to_string()
    }
}

impl Display for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quote {
            Some(q) => f.write_str(&quote_with(&self.name, q)),
            None => f.write_str(&self.name),
        }
    }
}

impl Display for BoundProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote_if_needed(self.name()))
    }
}

fn write_variable(f: &mut fmt::Formatter<'_>, name: &str, target: Option<&str>) -> fmt::Result {
    match target {
        Some(t) => write!(f, "({} - {})", name, t),
        None => write!(f, "({})", name),
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text {
                value,
                quote: Some(q),
            } => f.write_str(&quote_with(value, *q)),
            Literal::Text { value, quote: None } => f.write_str(value),
            Literal::Number(n) => f.write_str(n),
            Literal::Null => f.write_str("NULL"),
            Literal::Today => f.write_str("TODAY"),
            Literal::CurrentUser => f.write_str("CURRENT USER"),
            Literal::CardNumber(n) => write!(f, "NUMBER {}", n),
            Literal::Variable { name, target } => write_variable(f, name, target.as_deref()),
        }
    }
}

impl Display for SpecialToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecialToken::Today => f.write_str("TODAY"),
            SpecialToken::CurrentUser => f.write_str("CURRENT USER"),
        }
    }
}

impl Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedValue::Null => f.write_str("NULL"),
            ResolvedValue::Number(n) => f.write_str(&n.display),
            ResolvedValue::Text(s) => f.write_str(&quote_if_needed(s)),
            ResolvedValue::Date(d) => {
                f.write_str(&quote_with(&d.format("%Y-%m-%d").to_string(), '\''))
            }
            ResolvedValue::User { login, .. } => f.write_str(&quote_if_needed(login)),
            ResolvedValue::Card {
                reference: CardReference::Number(n),
                ..
            } => write!(f, "NUMBER {}", n),
            ResolvedValue::Card {
                reference: CardReference::Display(s),
                ..
            } => f.write_str(&quote_if_needed(s)),
            ResolvedValue::Special(token) => write!(f, "{}", token),
            ResolvedValue::PlvIndirection { name, target, .. } => {
                write_variable(f, name, target.as_deref())
            }
        }
    }
}

impl<S: Stage> Display for Condition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Comparison {
                property,
                op,
                value,
            } => {
                if S::is_null(value) {
                    match op {
                        Operator::Eq => return write!(f, "{} IS NULL", property),
                        Operator::Ne => return write!(f, "{} IS NOT NULL", property),
                        _ => {}
                    }
                }
                write!(f, "{} {} {}", property, op, value)
            }
            Condition::In { property, values } => {
                write!(f, "{} IN (", property)?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_char(')')
            }
            Condition::Composite {
                op: LogicalOp::And,
                children,
            } => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    write!(f, "{}", child)?;
                }
                Ok(())
            }
            Condition::Composite {
                op: LogicalOp::Or,
                children,
            } => {
                f.write_char('(')?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" OR ")?;
                    }
                    write!(f, "({})", child)?;
                }
                f.write_char(')')
            }
            Condition::Not(child) if child.is_or() => write!(f, "NOT {}", child),
            Condition::Not(child) => write!(f, "NOT ({})", child),
        }
    }
}

impl<S: Stage> Display for SelectColumn<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectColumn::Property(p) => write!(f, "{}", S::written(p)),
            SelectColumn::Aggregate { func, target: None } => write!(f, "{}(*)", func),
            SelectColumn::Aggregate {
                func,
                target: Some(p),
            } => write!(f, "{}({})", func, S::written(p)),
        }
    }
}

impl<S: Stage> Display for Query<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();

        if !self.select.is_empty() {
            let cols: Vec<String> = self.select.iter().map(|c| c.to_string()).collect();
            parts.push(format!("SELECT {}", cols.join(", ")));
        }

        if let Some(tree) = &self.tree_scope {
            parts.push(format!("FROM TREE {}", quote_if_needed(tree)));
        }

        if let Some(filter) = &self.filter {
            if parts.is_empty() {
                parts.push(filter.to_string());
            } else {
                parts.push(format!("WHERE {}", filter));
            }
        }

        if !self.group_by.is_empty() {
            let cols: Vec<String> = self.group_by.iter().map(|p| p.to_string()).collect();
            parts.push(format!("GROUP BY {}", cols.join(", ")));
        }

        if !self.order_by.is_empty() {
            let cols: Vec<String> = self
                .order_by
                .iter()
                .map(|o| match o.order {
                    SortOrder::Asc => o.property.to_string(),
                    SortOrder::Desc => format!("{} DESC", o.property),
                })
                .collect();
            parts.push(format!("ORDER BY {}", cols.join(", ")));
        }

        if let Some(n) = self.limit {
            parts.push(format!("LIMIT {}", n));
        }

        if let Some(n) = self.page {
            parts.push(format!("PAGE {}", n));
        }

        f.write_str(&parts.join(" "))
    }
}
