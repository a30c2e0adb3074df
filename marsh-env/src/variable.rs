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

//! Items for shell variables
//!
//! A [`VariableSet`] is a single hash table of name–[`Variable`] pairs plus
//! a stack of scope frames. A scope frame records, for every name written
//! while the frame is active as a local, the state the name had before, so
//! popping the frame restores the table exactly.
//!
//! A handful of structurally permanent variables ([`Flags::FIXED`]) are
//! pre-installed and can be cleared but never removed from the table.
//!
//! Positional parameters are kept here too, as a contiguous vector that can
//! be saved and restored in O(1) when a function is called.

use bitflags::bitflags;
use itertools::Itertools;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ffi::CString;
use thiserror::Error;

/// Name of the field-separator variable
pub const IFS: &str = "IFS";
/// Default value of `$IFS`
pub const IFS_DEFAULT: &str = " \t\n";
/// Name of the command-search-path variable
pub const PATH: &str = "PATH";
/// Name of the primary-prompt variable
pub const PS1: &str = "PS1";
/// Name of the continuation-prompt variable
pub const PS2: &str = "PS2";
/// Name of the trace-prefix variable
pub const PS4: &str = "PS4";
/// Name of the getopts-index variable
pub const OPTIND: &str = "OPTIND";

/// Names of the structurally permanent variables
const FIXED_NAMES: [&str; 6] = [IFS, PATH, PS1, PS2, PS4, OPTIND];

bitflags! {
    /// Attributes of a [`Variable`]
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct Flags: u8 {
        /// The variable is passed to child processes.
        const EXPORTED = 1 << 0;
        /// The variable cannot be assigned to or unset.
        const READONLY = 1 << 1;
        /// The table entry is permanent; unsetting only clears the value.
        const FIXED = 1 << 2;
    }
}

/// Value and attributes of a shell variable
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Variable {
    /// Value, or `None` if the variable is unset
    ///
    /// An unset variable can still occupy a table entry, either because it
    /// is [fixed](Flags::FIXED) or because it carries attributes set by
    /// `export` or `readonly` before any assignment.
    pub value: Option<String>,
    /// Attributes
    pub flags: Flags,
}

impl Variable {
    /// Creates a set variable with no attributes.
    pub fn new<V: Into<String>>(value: V) -> Self {
        Variable {
            value: Some(value.into()),
            flags: Flags::empty(),
        }
    }

    /// Returns true if the variable is read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.flags.contains(Flags::READONLY)
    }

    /// Returns true if the variable is exported.
    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.flags.contains(Flags::EXPORTED)
    }
}

/// Error assigning to a read-only variable
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{name}: is read only")]
pub struct ReadOnlyError {
    /// Name of the variable
    pub name: String,
}

/// Record of a variable's state before it became a local
#[derive(Clone, Debug)]
struct LocalSave {
    name: String,
    /// State before the local was created; `None` if the name was new
    prior: Option<Variable>,
}

/// One layer of the scope stack
#[derive(Clone, Debug, Default)]
struct ScopeFrame {
    saves: Vec<LocalSave>,
}

/// Collection of variables, scopes, and positional parameters
#[derive(Clone, Debug, Default)]
pub struct VariableSet {
    all: HashMap<String, Variable>,
    scopes: Vec<ScopeFrame>,
    positional: Vec<String>,
}

impl VariableSet {
    /// Creates a variable set with the fixed entries pre-installed.
    ///
    /// `$IFS` starts with its default value; the other fixed variables
    /// start unset and are filled in from the environment or by the shell
    /// at startup.
    #[must_use]
    pub fn new() -> Self {
        let mut set = VariableSet::default();
        for name in FIXED_NAMES {
            set.all.insert(
                name.to_owned(),
                Variable {
                    value: None,
                    flags: Flags::FIXED,
                },
            );
        }
        if let Some(ifs) = set.all.get_mut(IFS) {
            ifs.value = Some(IFS_DEFAULT.to_owned());
        }
        set
    }

    /// Returns the variable with the given name, if it has a table entry.
    ///
    /// The entry may be unset; use [`value`](Self::value) to read the value
    /// of a set variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.all.get(name)
    }

    /// Returns the value of the given variable, or `None` if it is unset.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.all.get(name)?.value.as_deref()
    }

    /// Assigns a value to a variable, creating it if necessary.
    ///
    /// The assignment goes to the existing table entry; without a prior
    /// `local` declaration this creates or updates a global.
    pub fn assign<N, V>(&mut self, name: N, value: V) -> Result<(), ReadOnlyError>
    where
        N: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        match self.all.entry(name) {
            Entry::Occupied(mut occupied) => {
                let variable = occupied.get_mut();
                if variable.is_read_only() {
                    return Err(ReadOnlyError {
                        name: occupied.key().clone(),
                    });
                }
                variable.value = Some(value.into());
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Variable::new(value));
            }
        }
        Ok(())
    }

    /// Adds or removes flags on a variable, creating an unset entry if the
    /// variable does not exist (as `export name` and `readonly name` do).
    pub fn set_flags(&mut self, name: &str, add: Flags) {
        self.all.entry(name.to_owned()).or_default().flags |= add;
    }

    /// Unsets a variable.
    ///
    /// Fixed entries are cleared but keep their table entry and flags;
    /// other entries are removed. Unsetting a read-only variable is an
    /// error; unsetting a nonexistent one is not.
    pub fn unset(&mut self, name: &str) -> Result<(), ReadOnlyError> {
        match self.all.entry(name.to_owned()) {
            Entry::Occupied(mut occupied) => {
                let variable = occupied.get_mut();
                if variable.is_read_only() {
                    return Err(ReadOnlyError {
                        name: occupied.key().clone(),
                    });
                }
                if variable.flags.contains(Flags::FIXED) {
                    variable.value = None;
                } else {
                    occupied.remove();
                }
                Ok(())
            }
            Entry::Vacant(_) => Ok(()),
        }
    }

    /// Iterates over all `(name, variable)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.all
            .iter()
            .map(|(name, variable)| (name.as_str(), variable))
            .sorted_by_key(|&(name, _)| name)
    }

    /// Builds the environment for a child process: one `name=value` string
    /// for every exported, set variable.
    #[must_use]
    pub fn environment(&self) -> Vec<CString> {
        self.iter()
            .filter(|(_, variable)| variable.is_exported())
            .filter_map(|(name, variable)| {
                let value = variable.value.as_deref()?;
                CString::new(format!("{name}={value}")).ok()
            })
            .collect()
    }

    /// Pushes a scope frame. Every [`define_local`](Self::define_local) in
    /// the frame is undone when the frame is popped.
    pub fn push_scope(&mut self) {
        self.scopes.push(ScopeFrame::default());
    }

    /// Pops a scope frame, restoring every name declared local in it.
    ///
    /// Popping without a matching push is a programming error.
    pub fn pop_scope(&mut self) {
        let frame = self
            .scopes
            .pop()
            .expect("variable scope popped without a matching push");
        for save in frame.saves.into_iter().rev() {
            match save.prior {
                Some(prior) => self.all.insert(save.name, prior),
                None => self.all.remove(&save.name),
            };
        }
    }

    /// Returns the number of scope frames currently pushed.
    #[must_use]
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declares a variable local to the current scope.
    ///
    /// The variable's current state is saved in the innermost scope frame
    /// (once per name per frame) and the variable starts out unset with no
    /// attributes, except that fixed entries keep their FIXED flag. With
    /// `value`, the local is assigned immediately.
    ///
    /// Fails if there is no scope to attach the local to, or if the
    /// variable is read-only.
    pub fn define_local(
        &mut self,
        name: &str,
        value: Option<String>,
    ) -> Result<(), LocalError> {
        let Some(frame_index) = self.scopes.len().checked_sub(1) else {
            return Err(LocalError::NotInFunction);
        };
        let prior = self.all.get(name).cloned();
        if let Some(prior) = &prior {
            if prior.is_read_only() {
                return Err(LocalError::ReadOnly(ReadOnlyError {
                    name: name.to_owned(),
                }));
            }
        }

        let frame = &mut self.scopes[frame_index];
        if !frame.saves.iter().any(|save| save.name == name) {
            frame.saves.push(LocalSave {
                name: name.to_owned(),
                prior: prior.clone(),
            });
        }

        let flags = match &prior {
            Some(variable) => variable.flags & Flags::FIXED,
            None => Flags::empty(),
        };
        self.all
            .insert(name.to_owned(), Variable { value, flags });
        Ok(())
    }

    /// Returns the positional parameters.
    #[must_use]
    pub fn positional_params(&self) -> &[String] {
        &self.positional
    }

    /// Replaces the positional parameters.
    pub fn set_positional_params(&mut self, params: Vec<String>) {
        self.positional = params;
    }

    /// Exchanges the positional parameters with the given vector.
    ///
    /// Function calls save and restore positional parameters with this
    /// constant-time swap.
    pub fn swap_positional_params(&mut self, params: &mut Vec<String>) {
        std::mem::swap(&mut self.positional, params);
    }

    /// Removes the first `count` positional parameters.
    pub fn shift_positional_params(&mut self, count: usize) -> Result<(), ShiftError> {
        if count > self.positional.len() {
            return Err(ShiftError {
                count,
                available: self.positional.len(),
            });
        }
        self.positional.drain(..count);
        Ok(())
    }
}

/// Error in [`VariableSet::define_local`]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum LocalError {
    /// `local` used outside a function
    #[error("not in a function")]
    NotInFunction,
    /// The variable is read-only.
    #[error(transparent)]
    ReadOnly(#[from] ReadOnlyError),
}

/// Error in [`VariableSet::shift_positional_params`]
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("cannot shift {count} parameters, only {available} present")]
pub struct ShiftError {
    /// Requested shift count
    pub count: usize,
    /// Number of positional parameters present
    pub available: usize,
}
