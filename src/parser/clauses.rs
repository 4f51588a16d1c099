//! Top-level clauses: `SELECT`, `FROM TREE`, `WHERE`, `GROUP BY`, `ORDER BY`,
//! `LIMIT` and `PAGE`.

use super::Parser;
use super::lexer::{Keyword, TokenKind};
use crate::ast::{AggregateFunc, OrderBy, PropertyRef, Query, SelectColumn, SortOrder};
use crate::error::ParseError;

impl<'t> Parser<'t> {
    pub(crate) fn query(&mut self) -> Result<Query, ParseError> {
        let mut query = Query::default();
        if self.at_end() {
            return Ok(query);
        }

        if self.eat_keyword(Keyword::Select) {
            query.select = self.select_list()?;
            if self.eat_keyword(Keyword::From) {
                query.tree_scope = Some(self.tree_name()?);
            }
            if self.eat_keyword(Keyword::Where) {
                query.filter = Some(self.condition()?);
            }
        } else if self.eat_keyword(Keyword::From) {
            // A tree scope outside SELECT is a fragment of its own.
            query.tree_scope = Some(self.tree_name()?);
            if !self.at_end() {
                return Err(self.unexpected("FROM TREE cannot be combined with other clauses here"));
            }
            return Ok(query);
        } else {
            if self.eat_keyword(Keyword::Where) && self.at_tail_clause() {
                return Err(self.unexpected("expected a condition after WHERE"));
            }
            if !self.at_tail_clause() {
                query.filter = Some(self.condition()?);
            }
        }

        self.tail_clauses(&mut query)?;

        if !self.at_end() {
            return Err(self.unexpected("expected AND, OR or end of query"));
        }
        Ok(query)
    }

    fn select_list(&mut self) -> Result<Vec<SelectColumn>, ParseError> {
        let mut columns = vec![self.select_column()?];
        while self.eat_punct(',') {
            columns.push(self.select_column()?);
        }
        Ok(columns)
    }

    fn select_column(&mut self) -> Result<SelectColumn, ParseError> {
        let is_call = matches!(
            (self.peek(), self.peek_at(1)),
            (Some(name), Some(open)) if name.kind == TokenKind::Identifier && open.is_punct('(')
        );
        if !is_call {
            return Ok(SelectColumn::Property(self.property()?));
        }

        let name = match self.advance() {
            Some(token) => token,
            None => return Err(self.unexpected("expected a column")),
        };
        let func = AggregateFunc::from_name(&name.text).ok_or_else(|| {
            ParseError::UnknownAggregate {
                name: name.text.clone(),
                position: name.offset,
            }
        })?;
        self.expect_punct('(')?;

        let target = if self.at_punct('*') {
            if func != AggregateFunc::Count {
                return Err(self.unexpected(&format!("{} needs a property", func)));
            }
            self.advance();
            None
        } else {
            Some(self.property()?)
        };
        self.expect_punct(')')?;

        Ok(SelectColumn::Aggregate { func, target })
    }

    /// `TREE <name>`, after `FROM` has been consumed.
    fn tree_name(&mut self) -> Result<String, ParseError> {
        self.expect_keyword(Keyword::Tree)?;
        match self.peek() {
            Some(token)
                if matches!(
                    token.kind,
                    TokenKind::Identifier | TokenKind::QuotedString(_)
                ) =>
            {
                self.advance();
                Ok(token.text.clone())
            }
            _ => Err(self.unexpected("expected a tree name")),
        }
    }

    /// `LIMIT` and `PAGE` are only clauses when a number follows, so a
    /// property called `limit` still works in a condition.
    fn at_tail_clause(&self) -> bool {
        if self.at_keyword(Keyword::Group) || self.at_keyword(Keyword::Order) {
            return true;
        }
        let numbered = self
            .peek_at(1)
            .map(|t| t.kind == TokenKind::Number)
            .unwrap_or(false);
        numbered && (self.at_word("limit") || self.at_word("page"))
    }

    fn tail_clauses(&mut self, query: &mut Query) -> Result<(), ParseError> {
        if self.eat_keyword(Keyword::Group) {
            self.expect_keyword(Keyword::By)?;
            query.group_by = self.property_list()?;
        }

        if self.eat_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            let mut order_by = vec![self.order_item()?];
            while self.eat_punct(',') {
                order_by.push(self.order_item()?);
            }
            query.order_by = order_by;
        }

        if self.eat_word("limit") {
            query.limit = Some(self.integer("LIMIT")?);
        }

        if self.at_word("page") {
            let position = self.position();
            self.advance();
            let page = self.integer("PAGE")?;
            if page == 0 {
                return Err(ParseError::syntax(position, "PAGE numbers start at 1"));
            }
            query.page = Some(page);
        }

        Ok(())
    }

    fn property_list(&mut self) -> Result<Vec<PropertyRef>, ParseError> {
        let mut properties = vec![self.property()?];
        while self.eat_punct(',') {
            properties.push(self.property()?);
        }
        Ok(properties)
    }

    fn order_item(&mut self) -> Result<OrderBy, ParseError> {
        let property = self.property()?;
        let order = if self.eat_word("desc") {
            SortOrder::Desc
        } else {
            self.eat_word("asc");
            SortOrder::Asc
        };
        Ok(OrderBy { property, order })
    }
}
