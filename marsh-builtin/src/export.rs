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

//! Export and readonly built-ins
//!
//! Both set an attribute on named variables, optionally assigning with
//! `name=value` operands. With `-p` (or no operands) the current set is
//! printed in re-input form.

use crate::common::{quote, special_error};
use marsh_env::builtin::Result;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::variable::Flags;
use marsh_env::Env;

/// Entry point of the `export` built-in
pub fn export_main(env: &mut Env, args: Vec<Field>) -> Result {
    attribute_main(env, args, "export", Flags::EXPORTED)
}

/// Entry point of the `readonly` built-in
pub fn readonly_main(env: &mut Env, args: Vec<Field>) -> Result {
    attribute_main(env, args, "readonly", Flags::READONLY)
}

fn attribute_main(env: &mut Env, args: Vec<Field>, builtin: &str, flag: Flags) -> Result {
    let mut operands = &args[1..];
    if let Some(first) = operands.first() {
        if first.value == "-p" {
            operands = &operands[1..];
        }
    }
    if operands.is_empty() {
        print_flagged(env, builtin, flag);
        return Result::new(ExitStatus::SUCCESS);
    }

    for operand in operands {
        let (name, value) = match operand.value.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (operand.value.as_str(), None),
        };
        if !is_name(name) {
            return special_error(env, builtin, format!("{name}: not a valid identifier"));
        }
        if let Some(value) = value {
            if let Err(error) = env.variables.assign(name, value) {
                return special_error(env, builtin, error);
            }
        }
        env.variables.set_flags(name, flag);
    }
    Result::new(ExitStatus::SUCCESS)
}

fn print_flagged(env: &mut Env, builtin: &str, flag: Flags) {
    let mut output = String::new();
    for (name, variable) in env.variables.iter() {
        if !variable.flags.contains(flag) {
            continue;
        }
        match &variable.value {
            Some(value) => {
                output.push_str(&format!("{builtin} {name}={}\n", quote(value)));
            }
            None => output.push_str(&format!("{builtin} {name}\n")),
        }
    }
    env.stdout.push_str(&output);
}

fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
