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

//! Set built-in
//!
//! Without arguments, prints every set variable as `name=value`, one per
//! line, sorted by name. With arguments:
//!
//! - `-x`/`+x` style clusters enable and disable short options,
//! - `-o name`/`+o name` do the same by long name; `-o` alone lists,
//! - `--` ends option processing; remaining operands (or any operands)
//!   replace the positional parameters.

use crate::common::special_error;
use marsh_env::builtin::Result;
use marsh_env::option::ShellOption;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::Env;

/// Entry point of the `set` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    if args.len() == 1 {
        print_variables(env);
        return Result::new(ExitStatus::SUCCESS);
    }

    let mut index = 1;
    let mut saw_separator = false;
    while index < args.len() {
        let arg = args[index].value.as_str();
        match arg {
            "--" => {
                index += 1;
                saw_separator = true;
                break;
            }
            "-o" | "+o" => {
                let enable = arg.starts_with('-');
                match args.get(index + 1) {
                    None => {
                        print_options(env, enable);
                        index += 1;
                    }
                    Some(name) => {
                        let Some(option) = ShellOption::from_long_name(&name.value) else {
                            return special_error(
                                env,
                                "set",
                                format!("{}: unknown option", name.value),
                            );
                        };
                        if !option.is_modifiable() {
                            return special_error(
                                env,
                                "set",
                                format!("{}: cannot be changed", name.value),
                            );
                        }
                        env.options.set(option, enable);
                        index += 2;
                    }
                }
            }
            _ if arg.len() > 1 && (arg.starts_with('-') || arg.starts_with('+')) => {
                let enable = arg.starts_with('-');
                for letter in arg[1..].chars() {
                    let Some(option) = ShellOption::from_short_name(letter) else {
                        return special_error(env, "set", format!("-{letter}: unknown option"));
                    };
                    if !option.is_modifiable() {
                        return special_error(
                            env,
                            "set",
                            format!("-{letter}: cannot be changed"),
                        );
                    }
                    env.options.set(option, enable);
                }
                index += 1;
            }
            _ => break,
        }
    }

    if index < args.len() || saw_separator {
        let params: Vec<String> = args[index..].iter().map(|f| f.value.clone()).collect();
        env.variables.set_positional_params(params);
    }
    Result::new(ExitStatus::SUCCESS)
}

/// Prints all set variables in name order.
fn print_variables(env: &mut Env) {
    let mut output = String::new();
    for (name, variable) in env.variables.iter() {
        if let Some(value) = &variable.value {
            output.push_str(name);
            output.push('=');
            output.push_str(value);
            output.push('\n');
        }
    }
    env.stdout.push_str(&output);
}

/// Prints the state of every named option.
fn print_options(env: &mut Env, as_commands: bool) {
    let mut output = String::new();
    for option in ShellOption::all() {
        let enabled = env.options.get(option);
        if as_commands {
            // `-o` lists in a form suitable for re-input
            let sign = if enabled { '-' } else { '+' };
            output.push_str(&format!("set {sign}o {}\n", option.long_name()));
        } else {
            let state = if enabled { "on" } else { "off" };
            output.push_str(&format!("{:<12}{state}\n", option.long_name()));
        }
    }
    env.stdout.push_str(&output);
}
