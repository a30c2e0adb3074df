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

//! Semantics of the shell command language
//!
//! This crate walks the ASTs produced by `marsh-syntax` and turns them
//! into observable effects. Its two halves are:
//!
//! - the [word expander](expansion), which turns AST words into fields at
//!   execution time (tilde, parameter, command, and arithmetic expansion,
//!   quote removal, field splitting, and pathname expansion, in that
//!   order), and
//! - the [executor](command), which runs commands: dispatching built-ins,
//!   calling functions, forking externals and [pipelines](pipeline),
//!   applying [redirections](redir), and honoring [traps](trap) and the
//!   shell options.
//!
//! Execution communicates through [`marsh_env::Env`] and returns
//! [`marsh_env::semantics::Result`], whose `Break` variant carries the
//! non-local controls (`break`, `continue`, `return`, `exit`).

pub mod command;
pub mod command_search;
pub mod expansion;
pub mod pipeline;
pub mod redir;
pub mod runner;
pub mod trap;
pub mod xtrace;

pub use command::execute_list;
pub use runner::run_source;

#[cfg(test)]
pub(crate) mod test_util {
    use std::sync::{Mutex, MutexGuard};

    /// Tests that install redirections on real file descriptors take this
    /// lock so concurrent tests do not fight over descriptor numbers.
    static FD_LOCK: Mutex<()> = Mutex::new(());

    pub(crate) fn fd_lock() -> MutexGuard<'static, ()> {
        FD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}
