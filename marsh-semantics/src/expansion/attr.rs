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

//! Intermediate expansion results
//!
//! The first expansion pass produces characters with attributes recording
//! how each character arose. Later passes consult the attributes: field
//! splitting applies only to unquoted characters that came out of an
//! expansion, pathname expansion treats quoted characters as literal
//! pattern characters, and quote removal drops the quoting characters
//! themselves.

use marsh_env::semantics::Field;
use marsh_fnmatch::PatternChar;

/// How a character came to be in the expansion result
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Origin {
    /// The character was copied from the word in the source code.
    Literal,
    /// The character came from a parameter expansion, command
    /// substitution, or arithmetic expansion, and is subject to field
    /// splitting where unquoted.
    SoftExpansion,
}

/// Character with attributes describing its derivation
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AttrChar {
    /// Character value
    pub value: char,
    /// Where the character came from
    pub origin: Origin,
    /// Whether the character is inside a quoted region or escaped
    pub is_quoted: bool,
    /// Whether the character is itself a quoting character (`\`, `'`, `"`)
    /// that quote removal will drop
    pub is_quoting: bool,
}

impl AttrChar {
    /// Plain unquoted literal character.
    #[must_use]
    pub fn literal(value: char) -> Self {
        AttrChar {
            value,
            origin: Origin::Literal,
            is_quoted: false,
            is_quoting: false,
        }
    }

    /// Quoting character dropped by quote removal.
    #[must_use]
    pub fn quoting(value: char) -> Self {
        AttrChar {
            value,
            origin: Origin::Literal,
            is_quoted: false,
            is_quoting: true,
        }
    }
}

/// String of attributed characters together with its source line
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttrField {
    /// Characters of the field
    pub chars: Vec<AttrChar>,
    /// Source line of the originating word
    pub line: u64,
}

impl AttrField {
    /// Performs quote removal, producing the final field value.
    #[must_use]
    pub fn remove_quotes(self) -> Field {
        let value = self
            .chars
            .iter()
            .filter(|c| !c.is_quoting)
            .map(|c| c.value)
            .collect();
        Field {
            value,
            line: self.line,
        }
    }

    /// Returns true if the field contains no characters at all, quoting
    /// characters included.
    #[must_use]
    pub fn is_entirely_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// Converts attributed characters into pattern characters.
///
/// Quoted characters become [`PatternChar::Literal`] so they match
/// themselves even if they are `*`, `?`, or `[`; quoting characters are
/// dropped.
pub fn to_pattern_chars(chars: &[AttrChar]) -> impl Iterator<Item = PatternChar> + Clone + '_ {
    chars.iter().filter(|c| !c.is_quoting).map(|c| {
        if c.is_quoted {
            PatternChar::Literal(c.value)
        } else {
            PatternChar::Normal(c.value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_removal_drops_quoting_chars() {
        let field = AttrField {
            chars: vec![
                AttrChar::quoting('"'),
                AttrChar {
                    value: 'a',
                    origin: Origin::Literal,
                    is_quoted: true,
                    is_quoting: false,
                },
                AttrChar::quoting('"'),
                AttrChar::literal('b'),
            ],
            line: 1,
        };
        let field = field.remove_quotes();
        assert_eq!(field.value, "ab");
    }

    #[test]
    fn pattern_chars_track_quoting() {
        let chars = [
            AttrChar::literal('*'),
            AttrChar {
                value: '*',
                origin: Origin::Literal,
                is_quoted: true,
                is_quoting: false,
            },
            AttrChar::quoting('\\'),
        ];
        let pattern: Vec<_> = to_pattern_chars(&chars).collect();
        assert_eq!(
            pattern,
            [PatternChar::Normal('*'), PatternChar::Literal('*')]
        );
    }
}
