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

//! Part of the lexer that parses operators

use super::core::{Lexer, Token, TokenKind};
use crate::parser::Result;
use std::fmt;

/// Operator token identifier
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operator {
    /// `&`
    And,
    /// `&&`
    AndAnd,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `;`
    Semicolon,
    /// `;;`
    SemicolonSemicolon,
    /// `<`
    Less,
    /// `<&`
    LessAnd,
    /// `<<`
    LessLess,
    /// `<<-`
    LessLessDash,
    /// `<>`
    LessGreater,
    /// `>`
    Greater,
    /// `>&`
    GreaterAnd,
    /// `>>`
    GreaterGreater,
    /// `>|`
    GreaterBar,
    /// `|`
    Bar,
    /// `||`
    BarBar,
}

impl Operator {
    /// Returns the literal string representation of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        use Operator::*;
        match self {
            And => "&",
            AndAnd => "&&",
            OpenParen => "(",
            CloseParen => ")",
            Semicolon => ";",
            SemicolonSemicolon => ";;",
            Less => "<",
            LessAnd => "<&",
            LessLess => "<<",
            LessLessDash => "<<-",
            LessGreater => "<>",
            Greater => ">",
            GreaterAnd => ">&",
            GreaterGreater => ">>",
            GreaterBar => ">|",
            Bar => "|",
            BarBar => "||",
        }
    }

    /// Returns true if the operator introduces a redirection.
    #[must_use]
    pub const fn is_redirection(self) -> bool {
        use Operator::*;
        matches!(
            self,
            Less | LessAnd
                | LessLess
                | LessLessDash
                | LessGreater
                | Greater
                | GreaterAnd
                | GreaterGreater
                | GreaterBar
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if the character may start an operator.
#[must_use]
pub(super) const fn is_operator_start(c: char) -> bool {
    matches!(c, '&' | '(' | ')' | ';' | '<' | '>' | '|')
}

impl Lexer<'_> {
    /// Reads an operator token.
    ///
    /// Two-character operators are matched before their one-character
    /// prefixes, and `<<-` before `<<`.
    pub(super) fn operator_token(&mut self, line: u64) -> Result<Token> {
        use Operator::*;
        let first = self.next_char().unwrap_or_default();
        let operator = match (first, self.peek_char()) {
            ('&', Some('&')) => self.take_second(AndAnd),
            ('&', _) => And,
            ('(', _) => OpenParen,
            (')', _) => CloseParen,
            (';', Some(';')) => self.take_second(SemicolonSemicolon),
            (';', _) => Semicolon,
            ('<', Some('<')) => {
                self.next_char();
                if self.peek_char() == Some('-') {
                    self.next_char();
                    LessLessDash
                } else {
                    LessLess
                }
            }
            ('<', Some('&')) => self.take_second(LessAnd),
            ('<', Some('>')) => self.take_second(LessGreater),
            ('<', _) => Less,
            ('>', Some('>')) => self.take_second(GreaterGreater),
            ('>', Some('&')) => self.take_second(GreaterAnd),
            ('>', Some('|')) => self.take_second(GreaterBar),
            ('>', _) => Greater,
            ('|', Some('|')) => self.take_second(BarBar),
            ('|', _) => Bar,
            _ => unreachable!("not an operator start: {first:?}"),
        };
        Ok(Token {
            kind: TokenKind::Operator(operator),
            text: operator.as_str().to_owned(),
            line,
        })
    }

    fn take_second(&mut self, operator: Operator) -> Operator {
        self.next_char();
        operator
    }
}
