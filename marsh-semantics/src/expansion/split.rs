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

//! Field splitting
//!
//! Splitting applies only to unquoted characters that came out of an
//! expansion; characters copied from the source are never delimiters.
//! The delimiter set is `$IFS`:
//!
//! - a run of IFS whitespace is one separator, and leading or trailing
//!   IFS whitespace is trimmed;
//! - each non-whitespace IFS character is exactly one separator, so two
//!   adjacent ones produce an empty field.
//!
//! A field that ends up empty survives only if it was produced by an
//! explicit separator or contains quoted content: an unquoted expansion
//! that yields nothing contributes no fields at all.

use super::attr::{AttrChar, Origin};
use marsh_env::arena::with_scratch;

/// Returns true if the character is an IFS whitespace character.
fn is_ifs_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

/// Splits one pre-split field into final fields.
pub(super) fn split_fields(chars: Vec<AttrChar>, ifs: &str) -> Vec<Vec<AttrChar>> {
    if ifs.is_empty() {
        return vec![chars];
    }

    let is_delimiter = |c: &AttrChar| {
        c.origin == Origin::SoftExpansion
            && !c.is_quoted
            && !c.is_quoting
            && ifs.contains(c.value)
    };

    with_scratch(|scratch| {
        let mut fields = Vec::new();
        let mut current: bumpalo::collections::Vec<'_, AttrChar> =
            bumpalo::collections::Vec::new_in(scratch);
        let mut emitted_any = false;
        let mut iter = chars.iter().copied().peekable();

        loop {
            // Copy field content up to the next delimiter run
            while let Some(c) = iter.peek().copied() {
                if is_delimiter(&c) {
                    break;
                }
                current.push(c);
                iter.next();
            }

            if iter.peek().is_none() {
                // Emit the last field unless it is an empty leftover
                if !current.is_empty() || !emitted_any && has_quoted_content(&chars) {
                    fields.push(current.to_vec());
                }
                return fields;
            }

            // Measure the delimiter run
            let mut non_whitespace = 0;
            while let Some(c) = iter.peek().copied() {
                if !is_delimiter(&c) {
                    break;
                }
                if !is_ifs_whitespace(c.value) {
                    non_whitespace += 1;
                }
                iter.next();
            }

            let at_start = !emitted_any && current.is_empty() && fields.is_empty();
            if at_start {
                // Leading whitespace is trimmed; each leading
                // non-whitespace delimiter produces an empty field
                for _ in 0..non_whitespace {
                    fields.push(Vec::new());
                    emitted_any = true;
                }
            } else {
                fields.push(current.to_vec());
                current.clear();
                emitted_any = true;
                for _ in 1..non_whitespace.max(1) {
                    fields.push(Vec::new());
                }
            }
        }
    })
}

/// Returns true if the field contains any quoted or quoting character,
/// which keeps an otherwise empty field alive (`''` expands to one empty
/// field; an unquoted `$empty` expands to none).
fn has_quoted_content(chars: &[AttrChar]) -> bool {
    chars.iter().any(|c| c.is_quoted || c.is_quoting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::attr::AttrChar;

    /// Characters of an expansion result (soft, unquoted)
    fn soft(s: &str) -> Vec<AttrChar> {
        s.chars()
            .map(|value| AttrChar {
                value,
                origin: Origin::SoftExpansion,
                is_quoted: false,
                is_quoting: false,
            })
            .collect()
    }

    fn values(fields: &[Vec<AttrChar>]) -> Vec<String> {
        fields
            .iter()
            .map(|f| f.iter().map(|c| c.value).collect())
            .collect()
    }

    #[test]
    fn whitespace_runs_collapse() {
        let fields = split_fields(soft("  a  b \t c  "), " \t\n");
        assert_eq!(values(&fields), ["a", "b", "c"]);
    }

    #[test]
    fn literal_characters_never_split() {
        let mut chars = Vec::new();
        chars.extend(soft("a"));
        chars.push(AttrChar::literal(' '));
        chars.extend(soft("b"));
        let fields = split_fields(chars, " \t\n");
        assert_eq!(values(&fields), ["a b"]);
    }

    #[test]
    fn quoted_expansion_never_splits() {
        let mut chars = soft("a b");
        for c in &mut chars {
            c.is_quoted = true;
        }
        let fields = split_fields(chars, " \t\n");
        assert_eq!(values(&fields), ["a b"]);
    }

    #[test]
    fn non_whitespace_delimiters_make_empty_fields() {
        let fields = split_fields(soft("a::b"), ":");
        assert_eq!(values(&fields), ["a", "", "b"]);
    }

    #[test]
    fn mixed_whitespace_around_non_whitespace_is_one_separator() {
        let fields = split_fields(soft("a : b"), " :");
        assert_eq!(values(&fields), ["a", "b"]);
    }

    #[test]
    fn leading_non_whitespace_delimiter_makes_empty_first_field() {
        let fields = split_fields(soft(":a"), ":");
        assert_eq!(values(&fields), ["", "a"]);
    }

    #[test]
    fn trailing_non_whitespace_delimiter_terminates_only() {
        let fields = split_fields(soft("a:"), ":");
        assert_eq!(values(&fields), ["a"]);
        let fields = split_fields(soft("a::"), ":");
        assert_eq!(values(&fields), ["a", ""]);
    }

    #[test]
    fn sole_delimiter_yields_one_empty_field() {
        let fields = split_fields(soft(":"), ":");
        assert_eq!(values(&fields), [""]);
    }

    #[test]
    fn empty_unquoted_expansion_yields_no_fields() {
        let fields = split_fields(soft(""), " \t\n");
        assert!(fields.is_empty());
        let fields = split_fields(soft("   "), " \t\n");
        assert!(fields.is_empty());
    }

    #[test]
    fn quoted_empty_field_survives() {
        let chars = vec![AttrChar::quoting('"'), AttrChar::quoting('"')];
        let fields = split_fields(chars, " \t\n");
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn empty_ifs_disables_splitting() {
        let fields = split_fields(soft("a b"), "");
        assert_eq!(values(&fields), ["a b"]);
    }

    #[test]
    fn whitespace_concatenation_round_trip() {
        // Joining the fields with a whitespace separator reproduces the
        // input with runs collapsed
        let input = "  one   two three ";
        let fields = split_fields(soft(input), " \t\n");
        let joined = values(&fields).join(" ");
        assert_eq!(joined, "one two three");
    }
}
