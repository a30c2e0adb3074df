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

//! Syntax of the shell command language
//!
//! This crate turns shell source text into abstract syntax trees. It contains
//! the [lexer](parser::lex), the recursive-descent [parser](parser), the
//! [AST types](syntax), and the [alias definitions](alias) the parser
//! substitutes while reading commands.
//!
//! Words in the AST are *raw*: quotes and the `$`-introduced expansion forms
//! are carried through as opaque spans of source text, to be interpreted by
//! the word expander at execution time. The parser's job is limited to
//! finding the boundaries of words, operators, and constructs.
//!
//! Most AST types implement [`Display`](std::fmt::Display), producing
//! single-line source code (with here-document contents omitted) that parses
//! back into an equivalent tree.
//!
//! ```
//! use marsh_syntax::parser::Parser;
//! let mut parser = Parser::new("x=1 echo hello >out; cat <<EOF\nbody\nEOF\n");
//! let list = parser.program().unwrap();
//! assert_eq!(list.to_string(), "x=1 echo hello >out; cat <<EOF");
//! ```

pub mod alias;
pub mod parser;
pub mod syntax;
