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

//! Echo built-in
//!
//! Writes its arguments separated by spaces, followed by a newline. A
//! first operand of `-n` suppresses the newline. Arguments are written
//! as they are; backslashes are not special (use `printf` for escapes).

use marsh_env::builtin::Result;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::Env;

/// Entry point of the `echo` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let mut operands = &args[1..];
    let mut newline = true;
    if let Some(first) = operands.first() {
        if first.value == "-n" {
            newline = false;
            operands = &operands[1..];
        }
    }

    let mut first = true;
    for operand in operands {
        if !first {
            env.stdout.push_str(" ");
        }
        first = false;
        env.stdout.push_str(&operand.value);
    }
    if newline {
        env.stdout.push_str("\n");
    }
    Result::new(ExitStatus::SUCCESS)
}

#[cfg(test)]
mod tests {
    use crate::test_helper::{env, run_capturing};

    #[test]
    fn writes_arguments_and_newline() {
        let mut env = env();
        assert_eq!(run_capturing(&mut env, "echo hello world"), "hello world\n");
        assert_eq!(run_capturing(&mut env, "echo"), "\n");
    }

    #[test]
    fn minus_n_suppresses_newline() {
        let mut env = env();
        assert_eq!(run_capturing(&mut env, "echo -n abc"), "abc");
    }

    #[test]
    fn backslashes_are_not_special() {
        let mut env = env();
        assert_eq!(run_capturing(&mut env, r"echo 'a\nb'"), "a\\nb\n");
    }

    #[test]
    fn expanded_variable_round_trips() {
        let mut env = env();
        env.variables.assign("VAR", "some value with  spaces").unwrap();
        assert_eq!(
            run_capturing(&mut env, "echo \"$VAR\""),
            "some value with  spaces\n"
        );
    }
}
