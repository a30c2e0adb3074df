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

//! Abstract syntax of patterns
//!
//! [`Ast::parse`] turns a sequence of [`PatternChar`]s into an [`Ast`], which
//! [`Ast::to_regex`] translates into a regular expression string. Parsing is
//! infallible: malformed constructs such as an unclosed bracket expression
//! degrade to their literal characters, as POSIX requires.

use regex_syntax::ast::ClassAsciiKind;
use std::ops::RangeInclusive;

mod parse;
mod regex;

/// Single member of a bracket expression
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketAtom {
    /// Literal character
    Char(char),
    /// ASCII character class (`[:digit:]`)
    CharClass(ClassAsciiKind),
}

/// Component of a bracket expression
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketItem {
    /// Single member
    Atom(BracketAtom),
    /// Character range (`a-z`)
    Range(RangeInclusive<char>),
}

/// Bracket expression
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bracket {
    /// Whether the expression starts with `!`, inverting the matched set
    pub complement: bool,
    /// Members of the matched set
    ///
    /// A syntactically valid bracket expression has at least one item.
    pub items: Vec<BracketItem>,
}

/// Pattern component
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Atom {
    /// Literal character
    Char(char),
    /// `?`
    AnyChar,
    /// `*`
    AnyString,
    /// Bracket expression
    Bracket(Bracket),
}

/// Abstract syntax tree for a whole pattern
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Ast {
    /// Components of the pattern, in order
    pub atoms: Vec<Atom>,
}
