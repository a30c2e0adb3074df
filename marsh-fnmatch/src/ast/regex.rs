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

//! Translation of the pattern AST into a regular expression

use super::{Ast, Atom, Bracket, BracketAtom, BracketItem};
use regex_syntax::ast::ClassAsciiKind;

impl Ast {
    /// Produces a regular expression string equivalent to this pattern.
    ///
    /// The expression is anchored on both ends and runs in single-line mode
    /// so that `?` and `*` also match newline characters.
    #[must_use]
    pub fn to_regex(&self) -> String {
        let mut regex = String::from(r"\A(?s:");
        for atom in &self.atoms {
            match atom {
                Atom::Char(c) => {
                    regex_syntax::escape_into(c.encode_utf8(&mut [0; 4]), &mut regex)
                }
                Atom::AnyChar => regex.push('.'),
                Atom::AnyString => regex.push_str(".*"),
                Atom::Bracket(bracket) => write_bracket(bracket, &mut regex),
            }
        }
        regex.push_str(r")\z");
        regex
    }

    /// Returns the string this pattern matches literally, if the pattern
    /// contains no wildcards at all.
    #[must_use]
    pub fn to_literal(&self) -> Option<String> {
        self.atoms
            .iter()
            .map(|atom| match atom {
                Atom::Char(c) => Some(*c),
                _ => None,
            })
            .collect()
    }
}

fn write_bracket(bracket: &Bracket, regex: &mut String) {
    regex.push('[');
    if bracket.complement {
        regex.push('^');
    }
    for item in &bracket.items {
        match item {
            BracketItem::Atom(atom) => write_bracket_atom(atom, regex),
            BracketItem::Range(range) => {
                write_class_char(*range.start(), regex);
                regex.push('-');
                write_class_char(*range.end(), regex);
            }
        }
    }
    regex.push(']');
}

fn write_bracket_atom(atom: &BracketAtom, regex: &mut String) {
    match atom {
        BracketAtom::Char(c) => write_class_char(*c, regex),
        BracketAtom::CharClass(kind) => {
            regex.push_str("[:");
            regex.push_str(class_name(kind));
            regex.push_str(":]");
        }
    }
}

/// Writes one character as a character-class member, escaped as needed.
fn write_class_char(c: char, regex: &mut String) {
    if matches!(c, '[' | ']' | '^' | '-' | '\\' | '&' | '~') {
        regex.push('\\');
    }
    regex.push(c);
}

const fn class_name(kind: &ClassAsciiKind) -> &'static str {
    use ClassAsciiKind::*;
    match kind {
        Alnum => "alnum",
        Alpha => "alpha",
        Ascii => "ascii",
        Blank => "blank",
        Cntrl => "cntrl",
        Digit => "digit",
        Graph => "graph",
        Lower => "lower",
        Print => "print",
        Punct => "punct",
        Space => "space",
        Upper => "upper",
        Word => "word",
        Xdigit => "xdigit",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::char_iter::without_escape;

    fn regex_of(pattern: &str) -> String {
        Ast::parse(without_escape(pattern)).to_regex()
    }

    #[test]
    fn literal_characters_are_escaped() {
        assert_eq!(regex_of("a.b"), r"\A(?s:a\.b)\z");
    }

    #[test]
    fn wildcards() {
        assert_eq!(regex_of("a?*"), r"\A(?s:a..*)\z");
    }

    #[test]
    fn bracket_expressions() {
        assert_eq!(regex_of("[ab]"), r"\A(?s:[ab])\z");
        assert_eq!(regex_of("[!a-z]"), r"\A(?s:[^a-z])\z");
        assert_eq!(regex_of("[[:digit:]]"), r"\A(?s:[[:digit:]])\z");
    }

    #[test]
    fn bracket_members_are_escaped() {
        assert_eq!(regex_of("[]^]"), r"\A(?s:[\]\^])\z");
    }

    #[test]
    fn literal_conversion() {
        let ast = Ast::parse(without_escape("plain"));
        assert_eq!(ast.to_literal(), Some("plain".to_owned()));
        let ast = Ast::parse(without_escape("not*plain"));
        assert_eq!(ast.to_literal(), None);
    }
}
