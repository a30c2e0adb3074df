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

//! Shell startup: invocation parsing and environment initialization
//!
//! Invocation: `marsh [--login] [-options] [-c command [name]] [-s] [--]
//! [file] [argument...]`. The recognized option letters are those of the
//! `set` built-in plus `-i` (force interactive).

use marsh_env::option::ShellOption;
use marsh_env::trap::SignalSystem;
use marsh_env::variable::Flags;
use marsh_env::Env;
use std::fmt;

/// How the shell gets its commands
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source {
    /// `-c`: run a command string
    Command { command: String, name: Option<String> },
    /// `-s` or no file operand: read standard input
    Stdin,
    /// Run a script file
    File { path: String },
}

/// Parsed invocation
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation {
    /// `--login` (accepted; profile processing is not implemented)
    pub login: bool,
    /// Options to enable (`-x`) or disable (`+x`) at startup
    pub option_changes: Vec<(ShellOption, bool)>,
    /// Where commands come from
    pub source: Source,
    /// Initial positional parameters
    pub params: Vec<String>,
}

/// Error in the invocation arguments
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvocationError(pub String);

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Parses the command line, excluding the program name.
pub fn parse_invocation(args: &[String]) -> Result<Invocation, InvocationError> {
    let mut login = false;
    let mut option_changes = Vec::new();
    let mut command_mode = false;
    let mut stdin_mode = false;

    let mut index = 0;
    while index < args.len() {
        let arg = args[index].as_str();
        match arg {
            "--login" => login = true,
            "--" => {
                index += 1;
                break;
            }
            _ if arg.len() > 1 && (arg.starts_with('-') || arg.starts_with('+')) => {
                let enable = arg.starts_with('-');
                for letter in arg[1..].chars() {
                    match letter {
                        'c' if enable => command_mode = true,
                        's' if enable => stdin_mode = true,
                        letter => match ShellOption::from_short_name(letter) {
                            Some(option) => option_changes.push((option, enable)),
                            None => {
                                return Err(InvocationError(format!(
                                    "-{letter}: unknown option"
                                )));
                            }
                        },
                    }
                }
            }
            _ => break,
        }
        index += 1;
    }

    let mut operands = args[index..].to_vec();
    let source;
    let params;
    if command_mode {
        if operands.is_empty() {
            return Err(InvocationError("-c requires a command string".to_owned()));
        }
        let command = operands.remove(0);
        let name = if operands.is_empty() {
            None
        } else {
            Some(operands.remove(0))
        };
        source = Source::Command { command, name };
        params = operands;
    } else if stdin_mode || operands.is_empty() {
        source = Source::Stdin;
        params = operands;
    } else {
        let path = operands.remove(0);
        source = Source::File { path };
        params = operands;
    }

    Ok(Invocation {
        login,
        option_changes,
        source,
        params,
    })
}

/// Builds the initial environment for an invocation.
pub fn init_env(invocation: &Invocation, argv0: &str) -> Env {
    let shell_name = match &invocation.source {
        Source::Command {
            name: Some(name), ..
        } => name.clone(),
        Source::File { path } => path.clone(),
        _ => argv0.to_owned(),
    };
    let mut env = Env::new(shell_name);
    marsh_builtin::register(&mut env);

    // Import the process environment as exported variables
    for (name, value) in std::env::vars() {
        if env.variables.assign(name.clone(), value).is_ok() {
            env.variables.set_flags(&name, Flags::EXPORTED);
        }
    }

    // Variables the shell maintains itself
    if let Ok(dir) = env.system.current_dir() {
        env.variables
            .assign("PWD", dir.to_string_lossy().into_owned())
            .ok();
    }
    env.variables
        .assign("PPID", env.system.parent_process_id().to_string())
        .ok();
    for (name, default) in [("PS1", "$ "), ("PS2", "> "), ("PS4", "+ "), ("OPTIND", "1")] {
        if env.variables.value(name).is_none() {
            env.variables.assign(name, default).ok();
        }
    }

    for &(option, enable) in &invocation.option_changes {
        env.options.set(option, enable);
    }
    env.variables.set_positional_params(invocation.params.clone());

    // Interactive when reading a terminal, or when forced with -i
    let forced = invocation
        .option_changes
        .iter()
        .any(|&(option, enable)| option == ShellOption::Interactive && enable);
    let interactive = forced
        || (matches!(invocation.source, Source::Stdin)
            && env.system.is_tty(marsh_env::io::STDIN)
            && env.system.is_tty(marsh_env::io::STDERR));
    env.options.set(ShellOption::Interactive, interactive);

    let mut system = env.system;
    env.traps.enable_sigchld_handler(&mut system).ok();
    if interactive {
        env.traps.enable_interactive_sigint(&mut system).ok();
        system
            .set_disposition(
                nix::sys::signal::Signal::SIGQUIT,
                marsh_env::trap::Disposition::Ignore,
            )
            .ok();
        env.traps
            .set_initially_ignored(nix::sys::signal::Signal::SIGQUIT);
    }
    env
}

/// Sources `$ENV` for an interactive shell, if it names a readable file.
pub fn source_env_file(env: &mut Env) {
    let Some(path) = env.variables.value("ENV").map(str::to_owned) else {
        return;
    };
    let Ok(source) = std::fs::read_to_string(&path) else {
        return;
    };
    // Errors in the init file do not keep the shell from starting
    let _ = marsh_semantics::run_source(env, &source);
}
