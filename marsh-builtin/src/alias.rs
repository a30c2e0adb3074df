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

//! Alias and unalias built-ins

use crate::common::quote;
use itertools::Itertools;
use marsh_env::builtin::Result;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::Env;

/// Entry point of the `alias` built-in
///
/// `alias` prints all definitions; `alias name` prints one; `alias
/// name=value` defines.
pub fn alias_main(env: &mut Env, args: Vec<Field>) -> Result {
    let operands = &args[1..];
    if operands.is_empty() {
        let mut output = String::new();
        for (name, replacement) in env.aliases.iter().sorted() {
            output.push_str(&format!("alias {name}={}\n", quote(replacement)));
        }
        env.stdout.push_str(&output);
        return Result::new(ExitStatus::SUCCESS);
    }

    let mut status = ExitStatus::SUCCESS;
    for operand in operands {
        match operand.value.split_once('=') {
            Some((name, replacement)) => {
                env.aliases.define(name, replacement);
            }
            None => match env.aliases.get(&operand.value) {
                Some(replacement) => {
                    let line = format!("alias {}={}\n", operand.value, quote(replacement));
                    env.stdout.push_str(&line);
                }
                None => {
                    env.print_error(&format!("alias: {}: not found", operand.value));
                    status = ExitStatus::FAILURE;
                }
            },
        }
    }
    Result::new(status)
}

/// Entry point of the `unalias` built-in
///
/// `unalias -a` removes everything; `unalias name...` removes the named
/// definitions.
pub fn unalias_main(env: &mut Env, args: Vec<Field>) -> Result {
    let operands = &args[1..];
    if operands.first().map(|f| f.value.as_str()) == Some("-a") {
        let names: Vec<String> = env.aliases.iter().map(|(n, _)| n.to_owned()).collect();
        for name in names {
            env.aliases.undefine(&name);
        }
        return Result::new(ExitStatus::SUCCESS);
    }

    let mut status = ExitStatus::SUCCESS;
    for operand in operands {
        if !env.aliases.undefine(&operand.value) {
            env.print_error(&format!("unalias: {}: not found", operand.value));
            status = ExitStatus::FAILURE;
        }
    }
    Result::new(status)
}

#[cfg(test)]
mod tests {
    use crate::test_helper::{env, run, run_capturing};
    use marsh_env::semantics::ExitStatus;

    #[test]
    fn define_and_use() {
        let mut env = env();
        run(&mut env, "alias greet='echo hello'");
        assert_eq!(run_capturing(&mut env, "greet world"), "hello world\n");
    }

    #[test]
    fn print_definitions() {
        let mut env = env();
        run(&mut env, "alias a='x y' b=z");
        let output = run_capturing(&mut env, "alias");
        assert_eq!(output, "alias a='x y'\nalias b=z\n");
        assert_eq!(run_capturing(&mut env, "alias b"), "alias b=z\n");
    }

    #[test]
    fn unknown_alias_fails() {
        let mut env = env();
        run(&mut env, "alias nope");
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
    }

    #[test]
    fn unalias_removes() {
        let mut env = env();
        run(&mut env, "alias one=1 two=2");
        run(&mut env, "unalias one");
        assert!(env.aliases.get("one").is_none());
        assert!(env.aliases.get("two").is_some());
        run(&mut env, "unalias -a");
        assert!(env.aliases.is_empty());
    }
}
