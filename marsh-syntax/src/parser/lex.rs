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

//! Lexical analysis of shell source text
//!
//! The [`Lexer`] produces [`Token`]s one at a time from a source string. A
//! token is a word, an operator, a reserved word, an IO number, a newline,
//! or end-of-input. Word tokens keep the raw source text of the word; the
//! lexer only needs to understand quoting well enough to find where a word
//! ends.
//!
//! [`probe_incomplete`] classifies a whole buffer as complete or wanting
//! more input, for interactive use.

mod core;
mod heredoc;
mod keyword;
mod op;
mod probe;
mod word;

pub use self::core::{Lexer, Token, TokenKind};
pub use self::keyword::Keyword;
pub use self::op::Operator;
pub use self::probe::{probe_incomplete, ProbeResult};
