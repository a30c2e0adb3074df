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

//! Type definitions for built-in utilities
//!
//! Concrete built-ins live in the `marsh-builtin` crate; this module only
//! defines the descriptor the executor dispatches through. The registry
//! in [`Env::builtins`](crate::Env::builtins) is filled at startup.

use crate::semantics::{Divert, ExitStatus, Field};
use crate::Env;
use std::ops::ControlFlow::{Break, Continue};

/// Types of built-in utilities
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Type {
    /// Special built-in
    ///
    /// Special built-ins are found before functions in command search,
    /// their assignment prefixes persist in the shell, and their errors
    /// are fatal in a non-interactive shell.
    Special,

    /// Ordinary built-in
    ///
    /// Ordinary built-ins are found after functions and behave like
    /// external utilities that happen to run in the shell process.
    Mandatory,
}

/// Result of built-in execution
///
/// Besides the exit status, a built-in can request a non-local transfer of
/// control (`break`, `continue`, `return`, `exit` do).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[must_use]
pub struct Result {
    /// Exit status of the built-in
    pub exit_status: ExitStatus,
    /// Control-flow request passed to the enclosing construct
    pub divert: crate::semantics::Result,
}

impl Result {
    /// Creates a result that continues execution normally.
    #[inline]
    pub const fn new(exit_status: ExitStatus) -> Self {
        Result {
            exit_status,
            divert: Continue(()),
        }
    }

    /// Creates a result carrying a divert.
    #[inline]
    pub const fn with_divert(exit_status: ExitStatus, divert: Divert) -> Self {
        Result {
            exit_status,
            divert: Break(divert),
        }
    }
}

impl From<ExitStatus> for Result {
    fn from(exit_status: ExitStatus) -> Self {
        Result::new(exit_status)
    }
}

/// Function implementing a built-in
pub type Main = fn(&mut Env, Vec<Field>) -> Result;

/// Descriptor of a built-in utility
#[derive(Clone, Copy, Debug)]
pub struct Builtin {
    /// How the built-in participates in command search
    pub r#type: Type,
    /// Entry point
    pub execute: Main,
}

impl Builtin {
    /// Returns true if the built-in is a special built-in.
    #[must_use]
    pub fn is_special(&self) -> bool {
        self.r#type == Type::Special
    }
}
