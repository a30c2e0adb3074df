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

//! POSIX-compatible pattern matching
//!
//! This crate implements the pattern matching notation the shell uses for
//! `case` patterns, pathname expansion, and the prefix/suffix removal forms of
//! parameter expansion:
//!
//! - `?` matches any single character.
//! - `*` matches any (possibly empty) string.
//! - A bracket expression (`[...]`) matches one character out of a set, which
//!   may contain single characters, ranges (`a-z`), and ASCII character
//!   classes (`[:alpha:]`).
//! - Any other character matches itself.
//!
//! Matching is performed by translating the pattern into a regular expression
//! evaluated by the [`regex`] crate. A whole pattern always matches a whole
//! subject string; there is no substring search.
//!
//! Shell quoting is communicated through [`PatternChar`]: a
//! [`Literal`](PatternChar::Literal) character never acts as a wildcard even
//! if it is `?`, `*`, or `[`. Use [`with_escape`] to honor backslash escapes
//! in the pattern string, or [`without_escape`] to treat every character as
//! [`Normal`](PatternChar::Normal).
//!
//! ```
//! use marsh_fnmatch::{Pattern, with_escape, without_escape};
//! let p = Pattern::parse(without_escape("f*r")).unwrap();
//! assert!(p.is_match("fooba r"));
//! let p = Pattern::parse(with_escape(r"f\*r")).unwrap();
//! assert!(!p.is_match("foobar"));
//! assert!(p.is_match("f*r"));
//! ```
//!
//! The current implementation is not locale-aware: character classes match
//! ASCII characters only, and ranges compare scalar values.

pub mod ast;
mod char_iter;

pub use char_iter::{with_escape, without_escape, PatternChar};

use ast::{Ast, Atom};
use thiserror::Error;

/// Error produced while constructing a [`Pattern`]
#[derive(Debug, Error)]
pub enum Error {
    /// The translated regular expression was rejected by the regex engine.
    ///
    /// This is an internal error: the translation is expected to always
    /// produce a valid regular expression.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// Compiled pattern
///
/// A `Pattern` is created from a sequence of [`PatternChar`]s with
/// [`parse`](Self::parse) and matched against subject strings with
/// [`is_match`](Self::is_match).
#[derive(Clone, Debug)]
pub struct Pattern {
    regex: regex::Regex,
    /// Equivalent literal string, if the pattern contains no wildcard
    literal: Option<String>,
    /// First pattern character, if it is a literal or normal non-wildcard one
    leading_char: Option<char>,
}

impl Pattern {
    /// Compiles a pattern from pattern characters.
    pub fn parse<I>(pattern: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = PatternChar>,
        I::IntoIter: Clone,
    {
        let ast = Ast::parse(pattern);
        let literal = ast.to_literal();
        let leading_char = match ast.atoms.first() {
            Some(&Atom::Char(c)) => Some(c),
            _ => None,
        };
        let regex = regex::Regex::new(&ast.to_regex())?;
        Ok(Pattern {
            regex,
            literal,
            leading_char,
        })
    }

    /// Returns true if the whole of `subject` matches the pattern.
    #[must_use]
    pub fn is_match(&self, subject: &str) -> bool {
        match &self.literal {
            Some(literal) => literal == subject,
            None => self.regex.is_match(subject),
        }
    }

    /// Returns the string the pattern is equivalent to, if the pattern
    /// contains no wildcards.
    ///
    /// Pathname expansion uses this to visit a literal path component
    /// directly instead of scanning the containing directory.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    /// Returns true if the pattern starts with a literal `.`.
    ///
    /// A filename starting with a period is only matched by a pattern whose
    /// first character is a literal period; `?`, `*`, and bracket expressions
    /// do not count.
    #[must_use]
    pub fn matches_leading_period(&self) -> bool {
        self.leading_char == Some('.')
    }
}
