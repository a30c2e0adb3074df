// This file is part of marsh, a modest POSIX shell.
// Copyright (C) 2024 the marsh authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Tokenization of arithmetic expressions

use std::ops::Range;
use thiserror::Error;

/// Operator token
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operator {
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Asterisk,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
}

/// Value of a token
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TokenValue<'a> {
    /// Operator
    Operator(Operator),
    /// Integer constant
    Integer(i64),
    /// Variable name
    Name(&'a str),
}

/// Token with the byte range it was read from
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Token<'a> {
    pub value: TokenValue<'a>,
    pub location: Range<usize>,
}

/// Error in tokenization
#[derive(Clone, Copy, Debug, Eq, Error, Hash, PartialEq)]
pub enum TokenError {
    /// A character that is not part of any token
    #[error("invalid character in expression")]
    InvalidCharacter,
    /// An integer constant with invalid digits or out of range
    #[error("invalid integer constant")]
    InvalidNumber,
}

/// Error with the byte range it occurred at
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    pub cause: TokenError,
    pub location: Range<usize>,
}

/// Iterator yielding tokens of an expression
///
/// The iterator produces `Result` items so tokenization errors surface where
/// the offending token would be.
#[derive(Clone, Debug)]
pub struct Tokens<'a> {
    source: &'a str,
    index: usize,
}

impl<'a> Tokens<'a> {
    /// Creates a tokenizer for the given expression.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Tokens { source, index: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.index..]
    }

    fn skip_blanks(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.index += rest.len() - trimmed.len();
    }

    fn integer(&mut self) -> Result<Token<'a>, Error> {
        let start = self.index;
        let len = self
            .rest()
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or_else(|| self.rest().len());
        let text = &self.source[start..start + len];
        self.index += len;
        let location = start..self.index;

        let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
        {
            i64::from_str_radix(hex, 16)
        } else if text.len() > 1 && text.starts_with('0') {
            i64::from_str_radix(&text[1..], 8)
        } else {
            text.parse()
        };
        match parsed {
            Ok(value) => Ok(Token {
                value: TokenValue::Integer(value),
                location,
            }),
            Err(_) => Err(Error {
                cause: TokenError::InvalidNumber,
                location,
            }),
        }
    }

    fn name(&mut self) -> Token<'a> {
        let start = self.index;
        let len = self
            .rest()
            .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .unwrap_or_else(|| self.rest().len());
        self.index += len;
        Token {
            value: TokenValue::Name(&self.source[start..self.index]),
            location: start..self.index,
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_blanks();
        let start = self.index;
        let c = self.rest().chars().next()?;

        use Operator::*;
        let operator = match c {
            '+' => Some(Plus),
            '-' => Some(Minus),
            '*' => Some(Asterisk),
            '/' => Some(Slash),
            '%' => Some(Percent),
            '(' => Some(OpenParen),
            ')' => Some(CloseParen),
            _ => None,
        };
        if let Some(operator) = operator {
            self.index += c.len_utf8();
            return Some(Ok(Token {
                value: TokenValue::Operator(operator),
                location: start..self.index,
            }));
        }

        if c.is_ascii_digit() {
            Some(self.integer())
        } else if c.is_ascii_alphabetic() || c == '_' {
            Some(Ok(self.name()))
        } else {
            self.index += c.len_utf8();
            Some(Err(Error {
                cause: TokenError::InvalidCharacter,
                location: start..self.index,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<TokenValue<'_>> {
        Tokens::new(source).map(|t| t.unwrap().value).collect()
    }

    #[test]
    fn operators_and_blanks() {
        use self::Operator::*;
        use TokenValue::*;
        assert_eq!(
            tokens(" ( 1+ x )\t% 2 "),
            [
                Operator(OpenParen),
                Integer(1),
                Operator(Plus),
                Name("x"),
                Operator(CloseParen),
                Operator(Percent),
                Integer(2),
            ]
        );
    }

    #[test]
    fn integer_bases() {
        assert_eq!(
            tokens("10 010 0x1F 0"),
            [
                TokenValue::Integer(10),
                TokenValue::Integer(8),
                TokenValue::Integer(31),
                TokenValue::Integer(0),
            ]
        );
    }

    #[test]
    fn names_may_contain_digits_and_underscores() {
        assert_eq!(
            tokens("_a b2"),
            [TokenValue::Name("_a"), TokenValue::Name("b2")]
        );
    }

    #[test]
    fn malformed_number() {
        let result: Vec<_> = Tokens::new("0xg").collect();
        assert_eq!(
            result,
            [Err(Error {
                cause: TokenError::InvalidNumber,
                location: 0..3,
            })]
        );
    }

    #[test]
    fn invalid_character() {
        let mut tokens = Tokens::new("1 @");
        assert!(tokens.next().unwrap().is_ok());
        assert_eq!(
            tokens.next(),
            Some(Err(Error {
                cause: TokenError::InvalidCharacter,
                location: 2..3,
            }))
        );
    }
}
