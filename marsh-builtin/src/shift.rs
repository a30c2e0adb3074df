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

//! Shift built-in
//!
//! `shift [n]` discards the first `n` positional parameters. Shifting
//! more parameters than exist is an error.

use crate::common::special_error;
use marsh_env::builtin::Result;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::Env;

/// Entry point of the `shift` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let count = match args.get(1) {
        None => 1,
        Some(operand) => match operand.value.parse::<usize>() {
            Ok(count) => count,
            Err(_) => {
                return special_error(
                    env,
                    "shift",
                    format!("{}: not a non-negative integer", operand.value),
                );
            }
        },
    };
    match env.variables.shift_positional_params(count) {
        Ok(()) => Result::new(ExitStatus::SUCCESS),
        Err(error) => special_error(env, "shift", error),
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helper::{env, run_capturing};
    use assert_matches::assert_matches;
    use marsh_env::semantics::Divert;
    use std::ops::ControlFlow::Break;

    #[test]
    fn shift_discards_leading_parameters() {
        let mut env = env();
        env.variables.set_positional_params(
            ["a", "b", "c"].map(str::to_owned).to_vec(),
        );
        let output = run_capturing(&mut env, "shift; echo $1 $#; shift 2; echo $#");
        assert_eq!(output, "b 2\n0\n");
    }

    #[test]
    fn over_shifting_is_fatal_in_scripts() {
        let mut env = env();
        let result = marsh_semantics::run_source(&mut env, "shift 5; echo unreachable");
        assert_matches!(result, Break(Divert::Exit(_)));
    }
}
