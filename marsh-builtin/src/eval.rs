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

//! Eval built-in
//!
//! Concatenates its operands with spaces and executes the result as
//! shell input in the current environment.

use marsh_env::builtin::Result;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::Env;
use std::ops::ControlFlow::{Break, Continue};

/// Entry point of the `eval` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let source = args[1..]
        .iter()
        .map(|f| f.value.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    if source.trim().is_empty() {
        return Result::new(ExitStatus::SUCCESS);
    }
    match marsh_semantics::run_source(env, &source) {
        Continue(()) => Result::new(env.exit_status),
        Break(divert) => Result {
            exit_status: env.exit_status,
            divert: Break(divert),
        },
    }
}
