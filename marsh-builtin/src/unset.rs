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

//! Unset built-in
//!
//! `unset [-v|-f] name...` removes variables (`-v`, the default) or
//! function definitions (`-f`). Unsetting a nonexistent name is not an
//! error; unsetting a read-only variable is.

use crate::common::special_error;
use marsh_env::builtin::Result;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::Env;

/// Entry point of the `unset` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let mut operands = &args[1..];
    let mut functions = false;
    match operands.first().map(|f| f.value.as_str()) {
        Some("-f") => {
            functions = true;
            operands = &operands[1..];
        }
        Some("-v") => operands = &operands[1..],
        _ => {}
    }

    for operand in operands {
        if functions {
            env.functions.unset(&operand.value);
        } else if let Err(error) = env.variables.unset(&operand.value) {
            return special_error(env, "unset", error);
        }
    }
    Result::new(ExitStatus::SUCCESS)
}
