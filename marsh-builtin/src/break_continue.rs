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

//! Break and continue built-ins
//!
//! `break [n]` exits the `n` innermost enclosing loops; `continue [n]`
//! resumes the `n`th innermost one. A count larger than the number of
//! enclosing loops targets the outermost loop. Loops inside a function
//! body are not reachable from outside it.

use crate::common::{failure, special_error};
use marsh_env::builtin::Result;
use marsh_env::semantics::{Divert, ExitStatus, Field};
use marsh_env::Env;

fn parse_count(env: &mut Env, builtin: &str, args: &[Field]) -> std::result::Result<usize, Result> {
    let count = match args.get(1) {
        None => 1,
        Some(operand) => match operand.value.parse::<usize>() {
            Ok(count) if count >= 1 => count,
            _ => {
                return Err(special_error(
                    env,
                    builtin,
                    format!("{}: not a positive integer", operand.value),
                ));
            }
        },
    };
    let reachable = env.reachable_loops();
    if reachable == 0 {
        return Err(failure(env, builtin, "only meaningful in a loop"));
    }
    Ok(count.min(reachable))
}

/// Entry point of the `break` built-in
pub fn break_main(env: &mut Env, args: Vec<Field>) -> Result {
    match parse_count(env, "break", &args) {
        Ok(count) => Result::with_divert(
            ExitStatus::SUCCESS,
            Divert::Break { count: count - 1 },
        ),
        Err(result) => result,
    }
}

/// Entry point of the `continue` built-in
pub fn continue_main(env: &mut Env, args: Vec<Field>) -> Result {
    match parse_count(env, "continue", &args) {
        Ok(count) => Result::with_divert(
            ExitStatus::SUCCESS,
            Divert::Continue { count: count - 1 },
        ),
        Err(result) => result,
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helper::{env, run, run_capturing};
    use marsh_env::semantics::ExitStatus;

    #[test]
    fn break_exits_loop() {
        let mut env = env();
        let output = run_capturing(&mut env, "for i in 1 2 3; do echo $i; break; done");
        assert_eq!(output, "1\n");
    }

    #[test]
    fn break_count_clamps_to_outermost() {
        let mut env = env();
        let output = run_capturing(
            &mut env,
            "for i in 1 2; do for j in a b; do echo $i$j; break 99; done; done",
        );
        assert_eq!(output, "1a\n");
    }

    #[test]
    fn continue_resumes_outer_loop() {
        let mut env = env();
        let output = run_capturing(
            &mut env,
            "for i in 1 2; do for j in a b; do continue 2; echo no; done; done; echo done",
        );
        assert_eq!(output, "done\n");
    }

    #[test]
    fn break_outside_loop_fails() {
        let mut env = env();
        run(&mut env, "break");
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
    }

    #[test]
    fn break_does_not_cross_function_boundary() {
        let mut env = env();
        run(
            &mut env,
            "f() { break; }; for i in 1; do f; done",
        );
        // The break inside the function body is an error, not a loop exit
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
    }
}
