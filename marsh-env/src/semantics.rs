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

//! Type definitions for command execution

use std::ffi::c_int;
use std::ops::ControlFlow;
use std::process::{ExitCode, Termination};

/// Resultant string of word expansion
///
/// A field is a string accompanied by the source line of the word it was
/// expanded from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Field {
    /// String value of the field
    pub value: String,
    /// Source line of the originating word
    pub line: u64,
}

impl Field {
    /// Creates a field with line number 1, for tests and synthesized
    /// commands.
    #[inline]
    pub fn dummy<S: Into<String>>(value: S) -> Field {
        Field {
            value: value.into(),
            line: 1,
        }
    }

    /// Creates fields with [`dummy`](Self::dummy).
    pub fn dummies<I, S>(values: I) -> Vec<Field>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values.into_iter().map(Self::dummy).collect()
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

/// Number that summarizes the result of command execution
///
/// The special parameter `$?` expands to the exit status of the last
/// executed command, and compound commands branch on it.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ExitStatus(pub c_int);

impl ExitStatus {
    /// Exit status of 0: success
    pub const SUCCESS: ExitStatus = ExitStatus(0);

    /// Exit status of 1: failure
    pub const FAILURE: ExitStatus = ExitStatus(1);

    /// Exit status of 2: syntax or usage error
    pub const ERROR: ExitStatus = ExitStatus(2);

    /// Exit status of 126: command found but not executable
    pub const NOEXEC: ExitStatus = ExitStatus(126);

    /// Exit status of 127: command not found
    pub const NOT_FOUND: ExitStatus = ExitStatus(127);

    /// Returns true if and only if `self` is zero.
    #[must_use]
    pub const fn is_successful(&self) -> bool {
        self.0 == 0
    }

    /// Returns the exit status for a command killed by the given signal
    /// number: 128 plus the number.
    #[must_use]
    pub const fn from_signal_number(number: c_int) -> ExitStatus {
        ExitStatus(number + 128)
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<c_int> for ExitStatus {
    fn from(value: c_int) -> ExitStatus {
        ExitStatus(value)
    }
}

impl From<ExitStatus> for c_int {
    fn from(exit_status: ExitStatus) -> c_int {
        exit_status.0
    }
}

/// Converts the exit status to `ExitCode`, keeping the lowest 8 bits.
impl Termination for ExitStatus {
    fn report(self) -> ExitCode {
        ExitCode::from(self.0 as u8)
    }
}

/// Non-local result of interrupted command execution
///
/// A divert unwinds execution until the matching construct consumes it:
/// loops consume `Break` and `Continue`, function calls and dot scripts
/// consume `Return`, and the shell's main loop consumes the rest.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Divert {
    /// Continue the current loop.
    Continue {
        /// Number of enclosing loops to exit before continuing: `0`
        /// continues the innermost loop.
        count: usize,
    },

    /// Break the current loop.
    Break {
        /// Number of enclosing loops to exit: `0` breaks the innermost
        /// loop.
        count: usize,
    },

    /// Return from the current function or dot script.
    ///
    /// `None` keeps the current exit status.
    Return(Option<ExitStatus>),

    /// Abort the current command in an interactive shell, or exit a
    /// non-interactive one.
    Interrupt(Option<ExitStatus>),

    /// Exit the shell after running the EXIT trap.
    Exit(Option<ExitStatus>),
}

impl Divert {
    /// Returns the exit status carried by the divert, if any.
    #[must_use]
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self {
            Divert::Continue { .. } | Divert::Break { .. } => None,
            Divert::Return(exit_status)
            | Divert::Interrupt(exit_status)
            | Divert::Exit(exit_status) => *exit_status,
        }
    }
}

/// Result of command execution
///
/// Execution functions return `Break(divert)` when a non-local control
/// transfer is in progress and `Continue(value)` otherwise. The `?`
/// operator propagates diverts up to the construct that consumes them.
pub type Result<T = ()> = ControlFlow<Divert, T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status_constants() {
        assert!(ExitStatus::SUCCESS.is_successful());
        assert!(!ExitStatus::FAILURE.is_successful());
        assert_eq!(ExitStatus::from_signal_number(2), ExitStatus(130));
    }

    #[test]
    fn divert_exit_statuses() {
        assert_eq!(Divert::Break { count: 0 }.exit_status(), None);
        assert_eq!(
            Divert::Exit(Some(ExitStatus(3))).exit_status(),
            Some(ExitStatus(3))
        );
        assert_eq!(Divert::Return(None).exit_status(), None);
    }
}
