//! MQL tokenizer built on nom.
//!
//! Whitespace and comments (`-- ...`, `/* ... */`) separate tokens and are
//! dropped. Quoted strings keep their unescaped content in [`Token::text`];
//! every other token keeps its raw spelling.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::{anychar, char, digit1, multispace1, not_line_ending, one_of},
    combinator::{map, opt, recognize, value},
    multi::{fold_many0, many0},
    sequence::{delimited, pair, preceded, tuple},
};
use serde::Serialize;
use std::fmt;

use crate::error::LexError;

/// Reserved words, matched case-insensitively outside quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Keyword {
    And,
    Or,
    Not,
    In,
    Is,
    Null,
    Today,
    Number,
    From,
    Tree,
    Select,
    Where,
    Order,
    By,
    Group,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Self> {
        let kw = match word.to_ascii_uppercase().as_str() {
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "NOT" => Keyword::Not,
            "IN" => Keyword::In,
            "IS" => Keyword::Is,
            "NULL" => Keyword::Null,
            "TODAY" => Keyword::Today,
            "NUMBER" => Keyword::Number,
            "FROM" => Keyword::From,
            "TREE" => Keyword::Tree,
            "SELECT" => Keyword::Select,
            "WHERE" => Keyword::Where,
            "ORDER" => Keyword::Order,
            "BY" => Keyword::By,
            "GROUP" => Keyword::Group,
            _ => return None,
        };
        Some(kw)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
            Keyword::In => "IN",
            Keyword::Is => "IS",
            Keyword::Null => "NULL",
            Keyword::Today => "TODAY",
            Keyword::Number => "NUMBER",
            Keyword::From => "FROM",
            Keyword::Tree => "TREE",
            Keyword::Select => "SELECT",
            Keyword::Where => "WHERE",
            Keyword::Order => "ORDER",
            Keyword::By => "BY",
            Keyword::Group => "GROUP",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Identifier,
    /// Carries the delimiter that was used.
    QuotedString(char),
    Number,
    /// `=`, `!=`, `<>`, `<`, `>`, `<=`, `>=`
    Operator,
    Keyword(Keyword),
    /// `(`, `)`, `,`, `*`, `-`
    Punctuation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the first character in the source.
    pub offset: usize,
}

impl Token {
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punctuation && self.text.len() == 1 && self.text.starts_with(c)
    }

    /// Identifier matching `word` case-insensitively (contextual words like `LIMIT`).
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text.eq_ignore_ascii_case(word)
    }

    /// How the token is shown in error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::QuotedString(q) => crate::fmt::quote_with(&self.text, q),
            _ => self.text.clone(),
        }
    }
}

/// Split MQL source into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut rest = source;

    loop {
        rest = match trivia(rest) {
            Ok((remaining, _)) => remaining,
            Err(_) => rest,
        };
        if rest.is_empty() {
            break;
        }

        let offset = source.len() - rest.len();
        match token(rest) {
            Ok((remaining, (kind, text))) => {
                tokens.push(Token { kind, text, offset });
                rest = remaining;
            }
            Err(_) => {
                let ch = rest.chars().next().unwrap_or_default();
                return Err(if ch == '\'' || ch == '"' {
                    LexError::UnterminatedString { offset }
                } else {
                    LexError::UnexpectedCharacter { ch, offset }
                });
            }
        }
    }

    tracing::trace!("tokenized {} bytes into {} tokens", source.len(), tokens.len());
    Ok(tokens)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whitespace and comments.
fn trivia(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            value((), multispace1),
            value((), pair(tag("--"), not_line_ending)),
            value((), delimited(tag("/*"), take_until("*/"), tag("*/"))),
        ))),
    )(input)
}

fn token(input: &str) -> IResult<&str, (TokenKind, String)> {
    alt((
        map(quoted_string, |(q, s)| (TokenKind::QuotedString(q), s)),
        map(digit_led_identifier, |s: &str| (TokenKind::Identifier, s.to_string())),
        map(number, |s: &str| (TokenKind::Number, s.to_string())),
        map(operator, |s: &str| (TokenKind::Operator, s.to_string())),
        map(one_of("(),*-"), |c| (TokenKind::Punctuation, c.to_string())),
        map(word, |s: &str| match Keyword::from_word(s) {
            Some(kw) => (TokenKind::Keyword(kw), s.to_string()),
            None => (TokenKind::Identifier, s.to_string()),
        }),
    ))(input)
}

fn word(input: &str) -> IResult<&str, &str> {
    take_while1(is_word_char)(input)
}

/// `1st_release`: digits immediately followed by word characters.
fn digit_led_identifier(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        digit1,
        take_while1(|c: char| is_word_char(c) && !c.is_ascii_digit()),
        take_while(is_word_char),
    )))(input)
}

/// `-?digits(.digits)?` or `-?.digits`. `1.2.3` lexes as `1.2` then `.3`.
fn number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(char('-')),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit1)))),
            recognize(pair(char('.'), digit1)),
        )),
    )))(input)
}

fn operator(input: &str) -> IResult<&str, &str> {
    alt((
        tag("!="),
        tag("<>"),
        tag("<="),
        tag(">="),
        tag("="),
        tag("<"),
        tag(">"),
    ))(input)
}

enum StringPiece<'a> {
    Chunk(&'a str),
    Escaped(char),
}

fn string_piece(input: &str, quote: char) -> IResult<&str, StringPiece<'_>> {
    alt((
        map(preceded(char('\\'), anychar), StringPiece::Escaped),
        map(pair(char(quote), char(quote)), move |_| StringPiece::Escaped(quote)),
        map(
            take_while1(move |c: char| c != quote && c != '\\'),
            StringPiece::Chunk,
        ),
    ))(input)
}

/// Single- or double-quoted string; `\x` and a doubled delimiter escape.
fn quoted_string(input: &str) -> IResult<&str, (char, String)> {
    let (input, quote) = one_of("'\"")(input)?;
    let (input, content) = fold_many0(
        move |i| string_piece(i, quote),
        String::new,
        |mut acc, piece| {
            match piece {
                StringPiece::Chunk(s) => acc.push_str(s),
                StringPiece::Escaped(c) => acc.push(c),
            }
            acc
        },
    )(input)?;
    let (input, _) = char(quote)(input)?;
    Ok((input, (quote, content)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_condition() {
        let tokens = tokenize("status = open").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].kind, TokenKind::Operator);
        assert_eq!(tokens[2].text, "open");
        assert_eq!(tokens[2].offset, 9);
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            kinds("a and B Or not c"),
            vec![
                TokenKind::Identifier,
                TokenKind::Keyword(Keyword::And),
                TokenKind::Identifier,
                TokenKind::Keyword(Keyword::Or),
                TokenKind::Keyword(Keyword::Not),
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn test_quoted_keyword_is_literal() {
        let tokens = tokenize("\"AND\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::QuotedString('"'));
        assert_eq!(tokens[0].text, "AND");
    }

    #[test]
    fn test_escapes() {
        let tokens = tokenize(r#"'it''s' "say \"hi\"" 'two
lines'"#)
        .unwrap();
        assert_eq!(tokens[0].text, "it's");
        assert_eq!(tokens[1].text, "say \"hi\"");
        assert_eq!(tokens[2].text, "two\nlines");
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("name = 'open").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { offset: 7 });
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("a = b; drop").unwrap_err();
        assert_eq!(err, LexError::UnexpectedCharacter { ch: ';', offset: 5 });
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("-1.5 42 .5").unwrap();
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Number));
        assert_eq!(tokens[0].text, "-1.5");
    }

    #[test]
    fn test_dotted_version_is_two_tokens() {
        let tokens = tokenize("1.2.3").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "1.2");
        assert_eq!(tokens[1].text, ".3");
    }

    #[test]
    fn test_digit_led_identifier() {
        let tokens = tokenize("1st_release = 2").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "1st_release");
        assert_eq!(tokens[2].kind, TokenKind::Number);
    }

    #[test]
    fn test_comments_separate_tokens() {
        let tokens = tokenize("a/* x */=b -- trailing\n").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].text, "b");
    }

    #[test]
    fn test_dash_before_space_is_punctuation() {
        let tokens = tokenize("(current release - end date)").unwrap();
        assert!(tokens[3].is_punct('-'));
        assert_eq!(tokens.len(), 7);
    }
}
