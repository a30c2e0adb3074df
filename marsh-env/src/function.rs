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

//! Type definitions for shell functions
//!
//! Function bodies are owned by the [`FunctionSet`] and borrowed by the
//! executor while a call is in progress. The bodies are reference-counted
//! so a function can redefine or unset itself while it is running.

use marsh_syntax::syntax::FullCompoundCommand;
use std::collections::HashMap;
use std::rc::Rc;

/// Definition of a shell function
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Function {
    /// Name the function is invoked by
    pub name: String,
    /// Command executed when the function is called
    pub body: Rc<FullCompoundCommand>,
    /// Source line of the definition, for diagnostics
    pub line: u64,
}

/// Collection of function definitions
#[derive(Clone, Debug, Default)]
pub struct FunctionSet {
    functions: HashMap<String, Rc<Function>>,
}

impl FunctionSet {
    /// Creates an empty function set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the function with the given name, if defined.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rc<Function>> {
        self.functions.get(name)
    }

    /// Defines a function, replacing any existing definition of the same
    /// name.
    pub fn define(&mut self, function: Function) {
        self.functions
            .insert(function.name.clone(), Rc::new(function));
    }

    /// Removes a function definition. Returns true if it existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.functions.remove(name).is_some()
    }

    /// Iterates over the definitions in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<Function>> {
        self.functions.values()
    }

    /// Returns the number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if no function is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marsh_syntax::parser::Parser;
    use marsh_syntax::syntax::Command;

    fn body(source: &str) -> Rc<FullCompoundCommand> {
        let list = Parser::new(source).program().unwrap();
        match &*list.0[0].and_or.first.commands[0] {
            Command::Function(definition) => Rc::clone(&definition.body),
            other => panic!("not a function definition: {other:?}"),
        }
    }

    #[test]
    fn define_replaces_previous_definition() {
        let mut set = FunctionSet::new();
        set.define(Function {
            name: "f".to_owned(),
            body: body("f() { echo one; }"),
            line: 1,
        });
        set.define(Function {
            name: "f".to_owned(),
            body: body("f() { echo two; }"),
            line: 2,
        });
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("f").unwrap().line, 2);
    }

    #[test]
    fn unset_removes_definition() {
        let mut set = FunctionSet::new();
        set.define(Function {
            name: "f".to_owned(),
            body: body("f() { :; }"),
            line: 1,
        });
        assert!(set.unset("f"));
        assert!(!set.unset("f"));
        assert!(set.get("f").is_none());
    }

    #[test]
    fn body_outlives_removal_while_borrowed() {
        let mut set = FunctionSet::new();
        set.define(Function {
            name: "f".to_owned(),
            body: body("f() { :; }"),
            line: 1,
        });
        let running = Rc::clone(&set.get("f").unwrap().body);
        set.unset("f");
        // The body is still usable by the in-progress call
        assert!(matches!(
            running.command,
            marsh_syntax::syntax::CompoundCommand::Grouping(_)
        ));
    }
}
