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

//! Startup and top level of the marsh shell
//!
//! The [`run`] function ties the core crates together: it parses the
//! invocation, initializes the [environment](marsh_env::Env) with the
//! built-ins registered and variables imported, and then runs commands
//! from a `-c` string, a script file, or standard input (interactively
//! when standard input is a terminal).

pub mod repl;
pub mod startup;

use marsh_env::option::ShellOption;
use marsh_env::semantics::ExitStatus;
use marsh_env::Env;
use startup::{init_env, parse_invocation, Source};
use std::ops::ControlFlow::{Break, Continue};

/// Runs the shell with the given command-line arguments (including the
/// program name) and returns its exit status.
pub fn run(args: Vec<String>) -> ExitStatus {
    let argv0 = args
        .first()
        .cloned()
        .unwrap_or_else(|| "marsh".to_owned());
    let invocation = match parse_invocation(&args[1..]) {
        Ok(invocation) => invocation,
        Err(error) => {
            eprintln!("{argv0}: {error}");
            eprintln!(
                "usage: {argv0} [--login] [-options] [-c command [name]] [-s] [--] [file] [argument...]"
            );
            return ExitStatus::ERROR;
        }
    };

    let mut env = init_env(&invocation, &argv0);

    match invocation.source {
        Source::Command { ref command, .. } => {
            let command = command.clone();
            finish(&mut env, &command)
        }
        Source::File { ref path } => match std::fs::read_to_string(path) {
            Ok(source) => finish(&mut env, &source),
            Err(error) => {
                env.print_error(&format!("{path}: {error}"));
                match error.kind() {
                    std::io::ErrorKind::NotFound => ExitStatus::NOT_FOUND,
                    _ => ExitStatus::NOEXEC,
                }
            }
        },
        Source::Stdin => {
            if env.is_interactive() {
                startup::source_env_file(&mut env);
                let status = repl::interactive_loop(&mut env);
                env.exit_status = status;
                marsh_semantics::trap::run_exit_trap(&mut env);
                env.exit_status
            } else {
                let mut source = String::new();
                match std::io::Read::read_to_string(&mut std::io::stdin(), &mut source) {
                    Ok(_) => finish(&mut env, &source),
                    Err(error) => {
                        env.print_error(&format!("cannot read standard input: {error}"));
                        ExitStatus::ERROR
                    }
                }
            }
        }
    }
}

/// Runs a complete source text and performs orderly shutdown: the EXIT
/// trap fires exactly once, and the status of an `exit` divert wins.
fn finish(env: &mut Env, source: &str) -> ExitStatus {
    if env.options.get(ShellOption::Verbose) {
        env.system
            .write_all(marsh_env::io::STDERR, source.as_bytes())
            .ok();
    }
    match marsh_semantics::run_source(env, source) {
        Continue(()) => {}
        Break(divert) => {
            if let Some(status) = divert.exit_status() {
                env.exit_status = status;
            }
        }
    }
    let system = env.system;
    env.stdout.flush(&system).ok();
    marsh_semantics::trap::run_exit_trap(env);
    env.stdout.flush(&system).ok();
    env.exit_status
}
