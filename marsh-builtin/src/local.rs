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

//! Local built-in
//!
//! `local name[=value]...` declares variables local to the calling
//! function. The previous state of each name is restored when the
//! function returns. Usable only inside a function.

use crate::common::failure;
use marsh_env::builtin::Result;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::Env;

/// Entry point of the `local` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    for operand in &args[1..] {
        let (name, value) = match operand.value.split_once('=') {
            Some((name, value)) => (name, Some(value.to_owned())),
            None => (operand.value.as_str(), None),
        };
        if !is_name(name) {
            return failure(env, "local", format!("{name}: not a valid identifier"));
        }
        if let Err(error) = env.variables.define_local(name, value) {
            return failure(env, "local", error);
        }
    }
    Result::new(ExitStatus::SUCCESS)
}

fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use crate::test_helper::{env, run, run_capturing};
    use marsh_env::semantics::ExitStatus;

    #[test]
    fn local_shadows_and_restores() {
        let mut env = env();
        let output = run_capturing(
            &mut env,
            "x=outer; f() { local x=inner; echo $x; }; f; echo $x",
        );
        assert_eq!(output, "inner\nouter\n");
    }

    #[test]
    fn local_without_value_starts_unset() {
        let mut env = env();
        let output = run_capturing(
            &mut env,
            "x=outer; f() { local x; echo \"[${x-unset}]\"; }; f; echo $x",
        );
        assert_eq!(output, "[unset]\nouter\n");
    }

    #[test]
    fn local_new_name_is_removed_on_return() {
        let mut env = env();
        run(&mut env, "f() { local fresh=v; }; f");
        assert_eq!(env.variables.get("fresh"), None);
    }

    #[test]
    fn local_outside_function_fails() {
        let mut env = env();
        run(&mut env, "local x=1");
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
    }

    #[test]
    fn nested_functions_nest_scopes() {
        let mut env = env();
        let output = run_capturing(
            &mut env,
            "x=0; g() { local x=2; echo $x; }; f() { local x=1; g; echo $x; }; f; echo $x",
        );
        assert_eq!(output, "2\n1\n0\n");
    }
}
