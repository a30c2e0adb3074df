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

//! Shell execution environment
//!
//! [`Env`] is the single value owning all mutable interpreter state:
//! variables and scopes, functions, aliases, traps, jobs, options, the
//! built-in registry, and the system handle. It is passed `&mut` to every
//! part of the interpreter, which keeps subshell forking and test
//! isolation easy to reason about.

pub mod arena;
pub mod builtin;
pub mod function;
pub mod io;
pub mod job;
pub mod option;
pub mod semantics;
pub mod system;
pub mod trap;
pub mod variable;

use crate::builtin::Builtin;
use crate::function::FunctionSet;
use crate::io::OutputBuffer;
use crate::job::JobSet;
use crate::option::{OptionSet, ShellOption};
use crate::semantics::ExitStatus;
use crate::system::RealSystem;
use crate::trap::TrapSet;
use crate::variable::VariableSet;
use marsh_syntax::alias::AliasSet;
use std::collections::HashMap;

/// Runtime stack frame
///
/// The executor pushes a frame when entering a loop, function call, or dot
/// script, so built-ins can check what construct they are running inside:
/// `break` needs an enclosing loop, `return` an enclosing function or dot
/// script.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Frame {
    /// A `for`, `while`, or `until` loop body or condition
    Loop,
    /// A function call
    Function,
    /// A script run with the `.` built-in
    DotScript,
    /// A context in which `errexit` is suppressed: an `if`, `while`, or
    /// `until` condition, or a non-final `&&`/`||` operand
    Condition,
}

/// Whole state of the shell interpreter
#[derive(Clone, Debug)]
pub struct Env {
    /// Alias definitions used by the parser
    pub aliases: AliasSet,
    /// Registry of built-in utilities, filled at startup
    pub builtins: HashMap<&'static str, Builtin>,
    /// Function definitions
    pub functions: FunctionSet,
    /// Variables, scopes, and positional parameters
    pub variables: VariableSet,
    /// Trap actions and the initially-ignored set
    pub traps: TrapSet,
    /// Asynchronous jobs
    pub jobs: JobSet,
    /// Shell options
    pub options: OptionSet,
    /// System call handle
    pub system: RealSystem,
    /// Runtime stack of loops, function calls, and dot scripts
    pub stack: Vec<Frame>,
    /// Exit status of the last command (`$?`)
    pub exit_status: ExitStatus,
    /// Exit status of the most recent command substitution in the current
    /// simple command, which becomes the command's status when it has no
    /// command word
    pub last_command_subst_status: Option<ExitStatus>,
    /// Line number of the command being executed (`$LINENO`)
    pub lineno: u64,
    /// Name the shell was invoked as (`$0` and the diagnostic prefix)
    pub shell_name: String,
    /// Process ID of the main shell (`$$`), stable across subshell forks
    pub shell_pid: job::Pid,
    /// Buffered standard output used by built-ins
    pub stdout: OutputBuffer,
}

impl Env {
    /// Creates an environment with default state.
    ///
    /// The built-in registry starts empty; startup code registers the
    /// built-ins and imports variables from the process environment.
    #[must_use]
    pub fn new(shell_name: String) -> Self {
        let system = RealSystem::new();
        Env {
            aliases: AliasSet::new(),
            builtins: HashMap::new(),
            functions: FunctionSet::new(),
            variables: VariableSet::new(),
            traps: TrapSet::new(),
            jobs: JobSet::new(),
            options: OptionSet::new(),
            system,
            stack: Vec::new(),
            exit_status: ExitStatus::SUCCESS,
            last_command_subst_status: None,
            lineno: 0,
            shell_name,
            shell_pid: system.process_id(),
            stdout: OutputBuffer::new(io::STDOUT),
        }
    }

    /// Returns true if the shell is interactive.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.options.get(ShellOption::Interactive)
    }

    /// Writes a diagnostic of the form `shell-name: message` to standard
    /// error.
    ///
    /// Failure to write a diagnostic is not itself reported.
    pub fn print_error(&self, message: &str) {
        let text = format!("{}: {}\n", self.shell_name, message);
        self.system.write_all(io::STDERR, text.as_bytes()).ok();
    }

    /// Returns the number of loops `break` and `continue` can currently
    /// reach: the [`Frame::Loop`] frames above the innermost function
    /// boundary.
    #[must_use]
    pub fn reachable_loops(&self) -> usize {
        self.stack
            .iter()
            .rev()
            .take_while(|frame| !matches!(frame, Frame::Function | Frame::DotScript))
            .filter(|frame| **frame == Frame::Loop)
            .count()
    }

    /// Returns true if `errexit` is currently suppressed by an enclosing
    /// condition context.
    #[must_use]
    pub fn errexit_suppressed(&self) -> bool {
        self.stack.contains(&Frame::Condition)
    }

    /// Returns true if execution is inside a function call or dot script,
    /// so `return` has somewhere to return to.
    #[must_use]
    pub fn can_return(&self) -> bool {
        self.stack
            .iter()
            .any(|frame| matches!(frame, Frame::Function | Frame::DotScript))
    }

    /// Adjusts state for a subshell child after a fork: traps revert to
    /// defaults (ignored signals stay ignored) and the parent's jobs are
    /// forgotten.
    pub fn enter_subshell(&mut self) {
        let mut system = self.system;
        self.traps.enter_subshell(&mut system).ok();
        self.jobs.clear();
    }
}
