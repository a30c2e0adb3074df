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

//! Exit built-in
//!
//! `exit [n]` makes the shell exit with status `n`, defaulting to the
//! current `$?`. The EXIT trap runs during the shutdown this initiates.

use crate::common::special_error;
use marsh_env::builtin::Result;
use marsh_env::semantics::{Divert, ExitStatus, Field};
use marsh_env::Env;

/// Entry point of the `exit` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let status = match args.get(1) {
        None => env.exit_status,
        Some(operand) => match operand.value.parse::<i32>() {
            Ok(number) => ExitStatus(number),
            Err(_) => {
                return special_error(
                    env,
                    "exit",
                    format!("{}: numeric argument required", operand.value),
                );
            }
        },
    };
    Result::with_divert(status, Divert::Exit(Some(status)))
}

#[cfg(test)]
mod tests {
    use crate::test_helper::env;
    use assert_matches::assert_matches;
    use marsh_env::semantics::{Divert, ExitStatus};
    use std::ops::ControlFlow::Break;

    #[test]
    fn exit_with_status() {
        let mut env = env();
        let result = marsh_semantics::run_source(&mut env, "exit 3");
        assert_matches!(result, Break(Divert::Exit(Some(ExitStatus(3)))));
    }

    #[test]
    fn exit_defaults_to_last_status() {
        let mut env = env();
        let result = marsh_semantics::run_source(&mut env, "false; exit");
        assert_matches!(result, Break(Divert::Exit(Some(ExitStatus::FAILURE))));
    }
}
