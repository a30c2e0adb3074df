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

//! Return built-in
//!
//! `return [n]` exits the innermost function or dot script with status
//! `n`, defaulting to the current `$?`.

use crate::common::{failure, special_error};
use marsh_env::builtin::Result;
use marsh_env::semantics::{Divert, ExitStatus, Field};
use marsh_env::Env;

/// Entry point of the `return` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    if !env.can_return() {
        return failure(env, "return", "not in a function or sourced script");
    }
    let status = match args.get(1) {
        None => env.exit_status,
        Some(operand) => match operand.value.parse::<i32>() {
            Ok(number) => ExitStatus(number),
            Err(_) => {
                return special_error(
                    env,
                    "return",
                    format!("{}: numeric argument required", operand.value),
                );
            }
        },
    };
    Result::with_divert(status, Divert::Return(Some(status)))
}
