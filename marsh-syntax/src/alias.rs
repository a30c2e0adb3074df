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

//! Alias definitions
//!
//! Aliases are consulted by the [parser](crate::parser) when a word is about
//! to become a command name. Substitution never applies to tokens that were
//! classified as reserved words.

use std::collections::HashMap;

/// Collection of alias definitions
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AliasSet {
    definitions: HashMap<String, String>,
}

impl AliasSet {
    /// Creates an empty alias set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the replacement text for the given name, if defined.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.definitions.get(name).map(String::as_str)
    }

    /// Defines an alias, replacing any existing definition of the same name.
    pub fn define<N: Into<String>, V: Into<String>>(&mut self, name: N, replacement: V) {
        self.definitions.insert(name.into(), replacement.into());
    }

    /// Removes an alias definition. Returns true if it existed.
    pub fn undefine(&mut self, name: &str) -> bool {
        self.definitions.remove(name).is_some()
    }

    /// Iterates over `(name, replacement)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.definitions
            .iter()
            .map(|(name, replacement)| (name.as_str(), replacement.as_str()))
    }

    /// Returns the number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if there are no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
