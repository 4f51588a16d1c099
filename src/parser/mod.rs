//! MQL parser.
//!
//! Text is split into tokens by [`lexer::tokenize`] and then parsed by a
//! recursive-descent parser into a raw [`Query`].
//!
//! # Syntax Overview
//!
//! ```text
//! SELECT name, COUNT(*) FROM TREE 'Planning' WHERE status = open
//!   AND release IN (1, 2) GROUP BY name ORDER BY name DESC LIMIT 25 PAGE 2
//!
//! status = open AND owner = CURRENT USER      -- bare filter
//! 'related card' = NUMBER 42
//! 'due date' < (current release - end date)   -- project variable
//! FROM TREE 'Planning'                        -- standalone tree scope
//! ```
//!
//! Precedence, loosest first: `OR`, `AND`, `NOT`, comparisons and `IN`,
//! parenthesized groups.

mod clauses;
mod conditions;
pub mod lexer;


use crate::ast::Query;
use crate::error::ParseError;
use lexer::{Keyword, Token, TokenKind};

/// Parse a complete MQL string into a raw query.
pub fn parse(input: &str) -> Result<Query, ParseError> {
    let tokens = lexer::tokenize(input)?;
    parse_tokens(&tokens, input.len())
}

/// Parse an already tokenized query. `source_len` positions end-of-input errors.
pub fn parse_tokens(tokens: &[Token], source_len: usize) -> Result<Query, ParseError> {
    let mut parser = Parser::new(tokens, source_len);
    let query = parser.query()?;
    tracing::debug!(
        tokens = tokens.len(),
        select = query.select.len(),
        has_filter = query.filter.is_some(),
        "parsed query"
    );
    Ok(query)
}

/// Cursor over the token stream.
pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    source_len: usize,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(tokens: &'t [Token], source_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            source_len,
        }
    }

    pub(crate) fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn peek_at(&self, ahead: usize) -> Option<&'t Token> {
        self.tokens.get(self.pos + ahead)
    }

    pub(crate) fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Offset of the current token, or the end of the source.
    pub(crate) fn position(&self) -> usize {
        self.peek().map(|t| t.offset).unwrap_or(self.source_len)
    }

    pub(crate) fn at_keyword(&self, kw: Keyword) -> bool {
        self.peek().map(|t| t.is_keyword(kw)).unwrap_or(false)
    }

    pub(crate) fn at_punct(&self, c: char) -> bool {
        self.peek().map(|t| t.is_punct(c)).unwrap_or(false)
    }

    pub(crate) fn at_word(&self, word: &str) -> bool {
        self.peek().map(|t| t.is_word(word)).unwrap_or(false)
    }

    pub(crate) fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_punct(&mut self, c: char) -> bool {
        if self.at_punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_keyword(&mut self, kw: Keyword) -> Result<(), ParseError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {}", kw)))
        }
    }

    pub(crate) fn expect_punct(&mut self, c: char) -> Result<(), ParseError> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected '{}'", c)))
        }
    }

    /// Error at the current token: "<what>, found '<token>'".
    pub(crate) fn unexpected(&self, what: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::syntax(
                token.offset,
                format!("{}, found '{}'", what, token.describe()),
            ),
            None => ParseError::syntax(self.source_len, format!("{}, found end of input", what)),
        }
    }

    /// A non-negative integer, as used by `LIMIT`, `PAGE` and `NUMBER`.
    pub(crate) fn integer(&mut self, what: &str) -> Result<u64, ParseError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Number => {
                let n = token.text.parse::<u64>().map_err(|_| {
                    ParseError::syntax(
                        token.offset,
                        format!("{} must be a whole number, found '{}'", what, token.text),
                    )
                })?;
                self.pos += 1;
                Ok(n)
            }
            _ => Err(self.unexpected(&format!("expected a number after {}", what))),
        }
    }
}
