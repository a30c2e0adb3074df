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

//! Iterators adapting pattern strings for the parser

use std::str::Chars;

/// Character of a pattern string
///
/// The distinction between the two variants carries shell quoting into the
/// pattern parser: characters that were quoted in the shell source must match
/// themselves even if they would otherwise act as wildcards.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PatternChar {
    /// Character that may act as a wildcard
    ///
    /// `?`, `*`, and `[` have their special meaning when `Normal`; all other
    /// characters behave the same in both variants.
    Normal(char),
    /// Character that only matches itself
    Literal(char),
}

impl PatternChar {
    /// Returns the contained character, ignoring the variant.
    #[inline]
    #[must_use]
    pub const fn char_value(self) -> char {
        match self {
            PatternChar::Normal(c) | PatternChar::Literal(c) => c,
        }
    }
}

/// Iterator returned by [`with_escape`]
#[derive(Clone, Debug)]
pub struct WithEscape<'a>(Chars<'a>);

impl Iterator for WithEscape<'_> {
    type Item = PatternChar;
    fn next(&mut self) -> Option<PatternChar> {
        match self.0.next()? {
            '\\' => self.0.next().map(PatternChar::Literal),
            c => Some(PatternChar::Normal(c)),
        }
    }
}

/// Adapts a pattern string in which backslash escapes the next character.
///
/// The escaped character becomes [`PatternChar::Literal`]. A trailing lone
/// backslash is dropped.
#[must_use]
pub fn with_escape(pattern: &str) -> WithEscape<'_> {
    WithEscape(pattern.chars())
}

/// Iterator returned by [`without_escape`]
#[derive(Clone, Debug)]
pub struct WithoutEscape<'a>(Chars<'a>);

impl Iterator for WithoutEscape<'_> {
    type Item = PatternChar;
    fn next(&mut self) -> Option<PatternChar> {
        self.0.next().map(PatternChar::Normal)
    }
}

/// Adapts a pattern string in which backslash is an ordinary character.
#[must_use]
pub fn without_escape(pattern: &str) -> WithoutEscape<'_> {
    WithoutEscape(pattern.chars())
}
