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

//! Syntax parser for the shell language
//!
//! The parser is recursive descent with one token of lookahead, implemented
//! as a peek cache on the [lexer](lex::Lexer). Each submodule parses one
//! kind of construct.
//!
//! The [`Parser`] borrows its source text for the whole parse. Use
//! [`Parser::command_line`] to read one logical line at a time (a REPL does
//! this) or [`Parser::program`] to read a whole script.

pub mod lex;

mod command;
mod compound_command;
mod core;
mod error;
mod list;
mod redir;
mod simple_command;

pub use self::core::Parser;
pub use self::error::{Error, SyntaxError};

/// Result type for parsing operations
pub type Result<T> = std::result::Result<T, Error>;
