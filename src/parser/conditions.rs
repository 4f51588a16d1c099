//! Condition grammar: boolean operators, comparisons, `IN` lists and literals.

use super::Parser;
use super::lexer::{Keyword, TokenKind};
use crate::ast::{Condition, Literal, Operator, PropertyRef};
use crate::error::ParseError;

impl<'t> Parser<'t> {
    /// `or_expr := and_expr (OR and_expr)*`
    pub(crate) fn condition(&mut self) -> Result<Condition, ParseError> {
        let mut items = vec![self.and_expr()?];
        while self.eat_keyword(Keyword::Or) {
            items.push(self.and_expr()?);
        }
        Ok(Condition::or(items))
    }

    fn and_expr(&mut self) -> Result<Condition, ParseError> {
        let mut items = vec![self.not_expr()?];
        while self.eat_keyword(Keyword::And) {
            items.push(self.not_expr()?);
        }
        Ok(Condition::and(items))
    }

    fn not_expr(&mut self) -> Result<Condition, ParseError> {
        if self.eat_keyword(Keyword::Not) {
            return Ok(self.not_expr()?.negate());
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Condition, ParseError> {
        if self.eat_punct('(') {
            let inner = self.condition()?;
            self.expect_punct(')')?;
            return Ok(inner);
        }
        self.predicate()
    }

    /// `property op value`, `property IS [NOT] NULL`, `property [NOT] IN (...)`
    fn predicate(&mut self) -> Result<Condition, ParseError> {
        let property = self.property()?;

        if let Some(token) = self.peek() {
            if token.kind == TokenKind::Operator {
                let op = Operator::from_symbol(&token.text).ok_or_else(|| {
                    ParseError::syntax(token.offset, format!("unknown operator '{}'", token.text))
                })?;
                self.advance();
                let value = self.value()?;
                return Ok(Condition::comparison(property, op, value));
            }
        }

        if self.eat_keyword(Keyword::Is) {
            let op = if self.eat_keyword(Keyword::Not) {
                Operator::Ne
            } else {
                Operator::Eq
            };
            self.expect_keyword(Keyword::Null)?;
            return Ok(Condition::comparison(property, op, Literal::Null));
        }

        let negated = self.at_keyword(Keyword::Not)
            && self
                .peek_at(1)
                .map(|t| t.is_keyword(Keyword::In))
                .unwrap_or(false);
        if negated {
            self.advance();
        }
        if self.eat_keyword(Keyword::In) {
            let values = self.in_list()?;
            let cond = Condition::In { property, values };
            return Ok(if negated { cond.negate() } else { cond });
        }

        Err(self.unexpected(&format!("expected an operator after '{}'", property)))
    }

    /// A property name: bare word, quoted string, or the `NUMBER` keyword.
    pub(crate) fn property(&mut self) -> Result<PropertyRef, ParseError> {
        match self.peek() {
            Some(token) => match token.kind {
                TokenKind::Identifier | TokenKind::Keyword(Keyword::Number) => {
                    self.advance();
                    Ok(PropertyRef::new(token.text.clone()))
                }
                TokenKind::QuotedString(q) => {
                    self.advance();
                    Ok(PropertyRef::quoted(token.text.clone(), q))
                }
                _ => Err(self.unexpected("expected a property name")),
            },
            None => Err(self.unexpected("expected a property name")),
        }
    }

    fn in_list(&mut self) -> Result<Vec<Literal>, ParseError> {
        self.expect_punct('(')?;
        if self.at_punct(')') {
            return Err(self.unexpected("IN list must contain at least one value"));
        }

        let mut values = Vec::new();
        loop {
            values.push(self.value()?);
            if !self.eat_punct(',') {
                break;
            }
            if self.at_punct(')') {
                return Err(ParseError::syntax(
                    self.position(),
                    "trailing comma in IN list",
                ));
            }
        }
        self.expect_punct(')')?;
        Ok(values)
    }

    pub(crate) fn value(&mut self) -> Result<Literal, ParseError> {
        let token = match self.peek() {
            Some(t) => t,
            None => return Err(self.unexpected("expected a value")),
        };

        match token.kind {
            TokenKind::QuotedString(q) => {
                self.advance();
                Ok(Literal::Text {
                    value: token.text.clone(),
                    quote: Some(q),
                })
            }
            TokenKind::Number => {
                self.advance();
                Ok(Literal::Number(token.text.clone()))
            }
            TokenKind::Identifier => {
                self.advance();
                if token.is_word("current") && self.eat_word("user") {
                    return Ok(Literal::CurrentUser);
                }
                Ok(Literal::text(token.text.clone()))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Literal::Null)
            }
            TokenKind::Keyword(Keyword::Today) => {
                self.advance();
                Ok(Literal::Today)
            }
            TokenKind::Keyword(Keyword::Number) => {
                self.advance();
                let n = self.integer("NUMBER")?;
                let n = i64::try_from(n).map_err(|_| {
                    ParseError::syntax(token.offset, "card number is out of range")
                })?;
                Ok(Literal::CardNumber(n))
            }
            TokenKind::Punctuation if token.is_punct('(') => {
                self.advance();
                self.variable()
            }
            _ => Err(self.unexpected("expected a value")),
        }
    }

    /// Body of `(name)` or `(name - target)`; the opening paren is consumed.
    fn variable(&mut self) -> Result<Literal, ParseError> {
        let name = self.variable_words()?;
        let target = if self.eat_punct('-') {
            Some(self.variable_words()?)
        } else {
            None
        };
        self.expect_punct(')')?;
        Ok(Literal::Variable { name, target })
    }

    fn variable_words(&mut self) -> Result<String, ParseError> {
        let mut words: Vec<&str> = Vec::new();
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Identifier
                | TokenKind::Number
                | TokenKind::Keyword(_)
                | TokenKind::QuotedString(_) => {
                    words.push(&token.text);
                    self.advance();
                }
                _ => break,
            }
        }
        if words.is_empty() {
            return Err(self.unexpected("expected a project variable name"));
        }
        Ok(words.join(" "))
    }
}
