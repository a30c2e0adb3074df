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

//! Definition of errors that happen in the parser

use thiserror::Error;

/// Types of syntax errors
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum SyntaxError {
    /// A single quotation lacks a closing `'`.
    #[error("unclosed single quote")]
    UnclosedSingleQuote,
    /// A double quotation lacks a closing `"`.
    #[error("unclosed double quote")]
    UnclosedDoubleQuote,
    /// A backquoted command substitution lacks a closing `` ` ``.
    #[error("unclosed backquote")]
    UnclosedBackquote,
    /// A `$(` lacks a closing `)`.
    #[error("unclosed command substitution")]
    UnclosedCommandSubstitution,
    /// A `${` lacks a closing `}`.
    #[error("unclosed parameter expansion")]
    UnclosedParam,
    /// A here-document content lacks its delimiter line.
    #[error("here-document delimited by end of input (wanted `{delimiter}')")]
    UnclosedHereDocContent { delimiter: String },
    /// A `<<` or `<<-` operator lacks a delimiter word.
    #[error("missing here-document delimiter")]
    MissingHereDocDelimiter,
    /// The input ended in the middle of a construct.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A token appeared where it cannot.
    #[error("syntax error near unexpected token `{token}'")]
    UnexpectedToken { token: String },
    /// A specific token was required but another was found.
    #[error("expected `{expected}', found `{found}'")]
    ExpectedToken {
        expected: &'static str,
        found: String,
    },
}

/// Syntax error with the source line it occurred on
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{cause}")]
pub struct Error {
    /// Reason for the error
    pub cause: SyntaxError,
    /// 1-based source line number
    pub line: u64,
}

impl Error {
    /// Returns true if the error is the input ending in the middle of a
    /// construct, so that an interactive reader may ask for more input
    /// rather than report the error.
    #[must_use]
    pub fn is_premature_eof(&self) -> bool {
        matches!(
            self.cause,
            SyntaxError::UnexpectedEof | SyntaxError::UnclosedHereDocContent { .. }
        )
    }
}
