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

//! Pattern parser

use super::{Ast, Atom, Bracket, BracketAtom, BracketItem};
use crate::char_iter::PatternChar;
use regex_syntax::ast::ClassAsciiKind;

impl Ast {
    /// Parses a whole pattern.
    ///
    /// The iterator must be `Clone` because the parser speculatively consumes
    /// a bracket expression and backtracks when it turns out to be unclosed.
    pub fn parse<I>(pattern: I) -> Self
    where
        I: IntoIterator<Item = PatternChar>,
        I::IntoIter: Clone,
    {
        let mut atoms = Vec::new();
        let mut i = pattern.into_iter();
        while let Some(pc) = i.next() {
            let atom = match pc {
                PatternChar::Normal('?') => Atom::AnyChar,
                PatternChar::Normal('*') => Atom::AnyString,
                PatternChar::Normal('[') => match Bracket::parse(i.clone()) {
                    Some((bracket, rest)) => {
                        i = rest;
                        Atom::Bracket(bracket)
                    }
                    None => Atom::Char('['),
                },
                pc => Atom::Char(pc.char_value()),
            };
            atoms.push(atom);
        }
        Ast { atoms }
    }
}

impl Bracket {
    /// Parses a bracket expression body, after the opening `[`.
    ///
    /// Returns the expression and the iterator advanced past the closing `]`,
    /// or `None` if the expression is not terminated.
    fn parse<I>(mut i: I) -> Option<(Bracket, I)>
    where
        I: Iterator<Item = PatternChar> + Clone,
    {
        let mut bracket = Bracket {
            complement: false,
            items: Vec::new(),
        };

        // `^` is accepted as a non-portable synonym of `!`
        let checkpoint = i.clone();
        match i.next() {
            Some(PatternChar::Normal('!' | '^')) => bracket.complement = true,
            _ => i = checkpoint,
        }

        loop {
            let atom = match i.next()? {
                // A `]` closes the expression unless it is the first member
                PatternChar::Normal(']') if !bracket.items.is_empty() => {
                    return Some((bracket, i));
                }
                PatternChar::Normal('[') => match class_atom(i.clone()) {
                    Some((class, rest)) => {
                        i = rest;
                        bracket.items.push(BracketItem::Atom(class));
                        continue;
                    }
                    None => BracketAtom::Char('['),
                },
                pc => BracketAtom::Char(pc.char_value()),
            };

            // Look for a range: `X-Y` where `Y` is not the closing bracket
            let after_atom = i.clone();
            if let (BracketAtom::Char(start), Some(PatternChar::Normal('-'))) =
                (&atom, i.next())
            {
                match i.next()? {
                    PatternChar::Normal(']') => {
                        // Trailing `-` is a literal member
                        bracket.items.push(BracketItem::Atom(atom));
                        bracket.items.push(BracketItem::Atom(BracketAtom::Char('-')));
                        return Some((bracket, i));
                    }
                    end => {
                        bracket
                            .items
                            .push(BracketItem::Range(*start..=end.char_value()));
                        continue;
                    }
                }
            }
            i = after_atom;
            bracket.items.push(BracketItem::Atom(atom));
        }
    }
}

/// Parses a character class after its opening `[`, e.g. `:alpha:]`.
fn class_atom<I>(mut i: I) -> Option<(BracketAtom, I)>
where
    I: Iterator<Item = PatternChar>,
{
    match i.next()? {
        PatternChar::Normal(':') => {}
        _ => return None,
    }
    let mut name = String::new();
    loop {
        match i.next()? {
            PatternChar::Normal(':') => break,
            pc => name.push(pc.char_value()),
        }
    }
    match i.next()? {
        PatternChar::Normal(']') => {}
        _ => return None,
    }
    let kind = ClassAsciiKind::from_name(&name)?;
    Some((BracketAtom::CharClass(kind), i))
}
