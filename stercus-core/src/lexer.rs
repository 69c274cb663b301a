//! Lexer for Stercus.
//!
//! Classifies the preprocessor's words into tagged tokens once, so later
//! stages never compare raw strings.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::builtins::{Builtin, find_builtin};
use crate::error::CoreError;
use crate::preprocessor::preprocess;

/// Placeholder for an application's argument in source text.
pub const PLACEHOLDER: &str = "$";
/// Local parameter the placeholder is replaced with inside a function body.
pub const PARAMETER: &str = "s0";

/// The three bracket kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bracket {
    /// `[` ... `]`
    Applicator,
    /// `(` ... `)`
    Conditional,
    /// `{` ... `}`
    Definition,
}

impl Bracket {
    pub const ALL: [Bracket; 3] = [Bracket::Applicator, Bracket::Conditional, Bracket::Definition];

    pub fn open_char(self) -> char {
        match self {
            Bracket::Applicator => '[',
            Bracket::Conditional => '(',
            Bracket::Definition => '{',
        }
    }

    pub fn close_char(self) -> char {
        match self {
            Bracket::Applicator => ']',
            Bracket::Conditional => ')',
            Bracket::Definition => '}',
        }
    }
}

/// A single token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Token {
    Literal(i64),
    Builtin(Builtin),
    Open(Bracket),
    Close(Bracket),
    /// Application name, or any other bare word.
    Identifier(String),
    /// `$` as written in source.
    Placeholder,
    /// The local parameter `$` is rewritten to inside application bodies.
    Parameter,
}

impl Token {
    pub fn is_open(&self, kind: Bracket) -> bool {
        matches!(self, Token::Open(k) if *k == kind)
    }

    pub fn is_close(&self, kind: Bracket) -> bool {
        matches!(self, Token::Close(k) if *k == kind)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(value) => write!(f, "{value}"),
            Token::Builtin(op) => f.write_str(op.symbol()),
            Token::Open(kind) => write!(f, "{}", kind.open_char()),
            Token::Close(kind) => write!(f, "{}", kind.close_char()),
            Token::Identifier(name) => f.write_str(name),
            Token::Placeholder => f.write_str(PLACEHOLDER),
            Token::Parameter => f.write_str(PARAMETER),
        }
    }
}

impl FromStr for Token {
    type Err = CoreError;

    fn from_str(word: &str) -> Result<Self, Self::Err> {
        if let Some(token) = bracket(word) {
            return Ok(token);
        }
        if let Some(op) = find_builtin(word) {
            return Ok(Token::Builtin(op));
        }
        match word {
            PLACEHOLDER => return Ok(Token::Placeholder),
            PARAMETER => return Ok(Token::Parameter),
            _ => {}
        }
        if looks_numeric(word) {
            return word
                .parse()
                .map(Token::Literal)
                .map_err(|_| CoreError::MalformedLiteral(word.to_string()));
        }
        if word.is_empty() {
            return Err(CoreError::UnknownToken(String::new()));
        }
        Ok(Token::Identifier(word.to_string()))
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.to_string()
    }
}

impl TryFrom<String> for Token {
    type Error = CoreError;

    fn try_from(word: String) -> Result<Self, Self::Error> {
        word.parse()
    }
}

fn bracket(word: &str) -> Option<Token> {
    let mut chars = word.chars();
    let ch = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    Bracket::ALL.into_iter().find_map(|kind| {
        if ch == kind.open_char() {
            Some(Token::Open(kind))
        } else if ch == kind.close_char() {
            Some(Token::Close(kind))
        } else {
            None
        }
    })
}

fn looks_numeric(word: &str) -> bool {
    let digits = word
        .strip_prefix('-')
        .or_else(|| word.strip_prefix('+'))
        .unwrap_or(word);
    digits.as_bytes().first().is_some_and(u8::is_ascii_digit)
}

/// Lex a source string into tokens, comments removed.
pub fn lex(source: &str) -> Result<Vec<Token>, CoreError> {
    preprocess(source).iter().map(|word| word.parse()).collect()
}

/// Render tokens back to space-separated source text.
pub fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_applicator() {
        let tokens = lex("[0 , .]").expect("lex");
        assert_eq!(
            tokens,
            vec![
                Token::Open(Bracket::Applicator),
                Token::Literal(0),
                Token::Builtin(Builtin::Input),
                Token::Builtin(Builtin::Output),
                Token::Close(Bracket::Applicator),
            ]
        );
    }

    #[test]
    fn lexes_conditional_with_nested_applicator() {
        let tokens = lex("(0 [0 -])").expect("lex");
        assert_eq!(render(&tokens), "( 0 [ 0 - ] )");
        assert!(tokens[0].is_open(Bracket::Conditional));
        assert_eq!(tokens[4], Token::Builtin(Builtin::Decrement));
    }

    #[test]
    fn lexes_definition_and_placeholder() {
        let tokens = lex("{inc [$ +]}").expect("lex");
        assert_eq!(tokens[1], Token::Identifier("inc".to_string()));
        assert_eq!(tokens[3], Token::Placeholder);
    }

    #[test]
    fn negative_numbers_are_literals_but_minus_is_builtin() {
        let tokens = lex("[0 -5 -]").expect("lex");
        assert_eq!(tokens[2], Token::Literal(-5));
        assert_eq!(tokens[3], Token::Builtin(Builtin::Decrement));
    }

    #[test]
    fn explicit_plus_sign_is_a_literal_but_plus_is_builtin() {
        let tokens = lex("[0 +5 +]").expect("lex");
        assert_eq!(tokens[2], Token::Literal(5));
        assert_eq!(tokens[3], Token::Builtin(Builtin::Increment));
        assert!(matches!(lex("[0 +5x]"), Err(CoreError::MalformedLiteral(word)) if word == "+5x"));
    }

    #[test]
    fn rejects_oversized_literal() {
        let err = lex("[0 99999999999999999999999]").unwrap_err();
        assert!(matches!(err, CoreError::MalformedLiteral(_)));
    }

    #[test]
    fn rejects_digits_followed_by_letters() {
        let err = lex("[0 12ab]").unwrap_err();
        assert!(matches!(err, CoreError::MalformedLiteral(word) if word == "12ab"));
    }

    #[test]
    fn tokens_round_trip_through_text() {
        for word in ["[", ")", "}", "+", "_", "$", "s0", "42", "-3", "inc"] {
            let token: Token = word.parse().expect("parse");
            assert_eq!(token.to_string(), word);
        }
    }
}
