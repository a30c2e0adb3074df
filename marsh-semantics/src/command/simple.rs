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

//! Execution of simple commands
//!
//! The assignments are expanded first, then the command words. Without a
//! command word, the assignments apply to the current shell. With one,
//! the name resolves in the search order of
//! [`command_search`](crate::command_search), and assignment prefixes
//! persist in the shell for built-ins and functions but only enter the
//! environment of an external command.

use crate::command_search::{search, Target};
use crate::expansion::{self, ExpansionError};
use crate::pipeline::wait_foreground;
use crate::redir::{apply_redirs, RedirError};
use crate::xtrace;
use marsh_env::builtin::Builtin;
use marsh_env::function::Function;
use marsh_env::option::ShellOption;
use marsh_env::semantics::{Divert, ExitStatus, Field, Result};
use marsh_env::system::Errno;
use marsh_env::variable::Flags;
use marsh_env::{Env, Frame};
use marsh_syntax::syntax::{Redir, SimpleCommand};
use nix::unistd::ForkResult;
use std::ffi::CString;
use std::ops::ControlFlow::{Break, Continue};
use std::rc::Rc;

pub(super) fn execute_simple(env: &mut Env, command: &SimpleCommand) -> Result {
    env.lineno = command.line;
    env.last_command_subst_status = None;

    let assigns = match expand_assigns(env, command) {
        Ok(assigns) => assigns,
        Err(error) => return expansion_failure(env, &error),
    };
    let fields = match expansion::expand_words(env, &command.words) {
        Ok(fields) => fields,
        Err(error) => return expansion_failure(env, &error),
    };

    xtrace::trace(env, &assigns, &fields);

    let Some(name) = fields.first() else {
        return assignments_only(env, command, assigns);
    };

    match search(env, &name.value) {
        Target::Builtin(builtin) => {
            apply_assigns(env, assigns)?;
            // The redirections of a bare `exec` outlive the command
            if builtin.is_special() && name.value == "exec" && fields.len() == 1 {
                return match apply_redirs(env, &command.redirs, false) {
                    Ok(_guard) => {
                        env.exit_status = ExitStatus::SUCCESS;
                        Continue(())
                    }
                    Err(error) => redir_failure(env, &error),
                };
            }
            run_builtin(env, builtin, fields, &command.redirs)
        }
        Target::Function(function) => {
            apply_assigns(env, assigns)?;
            run_function(env, function, fields, &command.redirs)
        }
        Target::External { path } => run_external(env, &path, fields, assigns, &command.redirs),
        Target::NotFound => {
            env.print_error(&format!("{}: not found", name.value));
            env.exit_status = ExitStatus::NOT_FOUND;
            Continue(())
        }
    }
}

/// Expands the assignment values, in order.
fn expand_assigns(
    env: &mut Env,
    command: &SimpleCommand,
) -> std::result::Result<Vec<(String, String)>, ExpansionError> {
    command
        .assigns
        .iter()
        .map(|assign| {
            let value = expansion::expand_value(env, &assign.value)?;
            Ok((assign.name.clone(), value))
        })
        .collect()
}

/// Applies assignments to the current shell.
///
/// A read-only violation aborts the current command context like an
/// expansion error.
fn apply_assigns(env: &mut Env, assigns: Vec<(String, String)>) -> Result {
    let allexport = env.options.get(ShellOption::AllExport);
    for (name, value) in assigns {
        if let Err(error) = env.variables.assign(&name, value) {
            env.print_error(&error.to_string());
            env.exit_status = ExitStatus::ERROR;
            return interrupt(env);
        }
        if allexport {
            env.variables.set_flags(&name, Flags::EXPORTED);
        }
    }
    Continue(())
}

/// A command with no command word: assignments and redirections only.
fn assignments_only(
    env: &mut Env,
    command: &SimpleCommand,
    assigns: Vec<(String, String)>,
) -> Result {
    apply_assigns(env, assigns)?;
    if !command.redirs.is_empty() {
        // The redirections are performed and immediately undone, for
        // their side effects and error checking
        match apply_redirs(env, &command.redirs, true) {
            Ok(guard) => guard.undo(),
            Err(error) => return redir_failure(env, &error),
        }
    }
    env.exit_status = env
        .last_command_subst_status
        .take()
        .unwrap_or(ExitStatus::SUCCESS);
    Continue(())
}

/// Runs a built-in with redirections installed around it.
fn run_builtin(
    env: &mut Env,
    builtin: Builtin,
    fields: Vec<Field>,
    redirs: &[Redir],
) -> Result {
    let guard = match apply_redirs(env, redirs, true) {
        Ok(guard) => guard,
        Err(error) => return redir_failure(env, &error),
    };
    let result = (builtin.execute)(env, fields);
    let system = env.system;
    env.stdout.flush(&system).ok();
    guard.undo();
    env.exit_status = result.exit_status;
    result.divert
}

/// Calls a function: positional parameters are swapped in O(1), a
/// variable scope and a stack frame are pushed, and `return` is consumed
/// at this boundary.
fn run_function(
    env: &mut Env,
    function: Rc<Function>,
    fields: Vec<Field>,
    redirs: &[Redir],
) -> Result {
    let guard = match apply_redirs(env, redirs, true) {
        Ok(guard) => guard,
        Err(error) => return redir_failure(env, &error),
    };

    let mut saved_params: Vec<String> =
        fields.into_iter().skip(1).map(|field| field.value).collect();
    env.variables.swap_positional_params(&mut saved_params);
    env.variables.push_scope();
    env.stack.push(Frame::Function);

    let result = super::compound::execute_full_compound(env, &function.body);

    env.stack.pop();
    env.variables.pop_scope();
    env.variables.swap_positional_params(&mut saved_params);
    guard.undo();

    match result {
        Break(Divert::Return(status)) => {
            if let Some(status) = status {
                env.exit_status = status;
            }
            Continue(())
        }
        other => other,
    }
}

/// Forks and execs an external utility.
fn run_external(
    env: &mut Env,
    path: &CString,
    fields: Vec<Field>,
    assigns: Vec<(String, String)>,
    redirs: &[Redir],
) -> Result {
    let system = env.system;
    env.stdout.flush(&system).ok();

    let Ok(args) = fields
        .iter()
        .map(|field| CString::new(field.value.as_str()))
        .collect::<std::result::Result<Vec<CString>, _>>()
    else {
        env.print_error("invalid argument: embedded NUL byte");
        env.exit_status = ExitStatus::FAILURE;
        return Continue(());
    };
    let environment = child_environment(env, assigns);
    let monitor = env.options.get(ShellOption::Monitor);

    match system.fork() {
        Ok(ForkResult::Child) => {
            system.reset_signals_for_child();
            if monitor {
                system
                    .set_process_group(
                        marsh_env::job::Pid::from_raw(0),
                        marsh_env::job::Pid::from_raw(0),
                    )
                    .ok();
            }
            if let Err(error) = apply_redirs(env, redirs, false) {
                env.print_error(&error.to_string());
                system.exit_process(ExitStatus::FAILURE);
            }
            let error = match system.execve(path, &args, &environment) {
                Err(errno) => errno,
                Ok(impossible) => match impossible {},
            };
            let name = fields[0].value.as_str();
            env.print_error(&format!("{name}: {error}"));
            let status = match error {
                Errno::ENOENT => ExitStatus::NOT_FOUND,
                _ => ExitStatus::NOEXEC,
            };
            system.exit_process(status)
        }
        Ok(ForkResult::Parent { child }) => {
            if monitor {
                system.set_process_group(child, child).ok();
            }
            env.exit_status = wait_foreground(env, child);
            Continue(())
        }
        Err(errno) => {
            env.print_error(&format!("cannot fork: {errno}"));
            env.exit_status = ExitStatus::FAILURE;
            Continue(())
        }
    }
}

/// Builds the environment vector for a child: every exported variable,
/// with the command's assignment prefixes overriding.
fn child_environment(env: &Env, assigns: Vec<(String, String)>) -> Vec<CString> {
    let mut environment = env.variables.environment();
    for (name, value) in assigns {
        let prefix = format!("{name}=");
        environment.retain(|entry| !entry.as_bytes().starts_with(prefix.as_bytes()));
        if let Ok(entry) = CString::new(format!("{name}={value}")) {
            environment.push(entry);
        }
    }
    environment
}

/// Reports an expansion error and aborts the current command context.
///
/// A non-interactive shell exits; an interactive one returns to the
/// prompt.
pub(crate) fn expansion_failure(env: &mut Env, error: &ExpansionError) -> Result {
    env.print_error(&error.to_string());
    env.exit_status = ExitStatus::ERROR;
    interrupt(env)
}

/// Aborts the current command: exits a non-interactive shell with the
/// current status, interrupts back to the prompt otherwise.
pub(crate) fn interrupt(env: &mut Env) -> Result {
    if env.is_interactive() {
        Break(Divert::Interrupt(Some(env.exit_status)))
    } else {
        Break(Divert::Exit(Some(env.exit_status)))
    }
}

/// Reports a redirection error; the command is not run but the shell
/// continues.
pub(crate) fn redir_failure(env: &mut Env, error: &RedirError) -> Result {
    env.print_error(&error.to_string());
    env.exit_status = ExitStatus::FAILURE;
    Continue(())
}
