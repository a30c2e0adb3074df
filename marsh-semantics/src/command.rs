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

//! Command execution
//!
//! [`execute_list`] is the executor's entry point: it walks a parsed
//! [`List`], polling traps before each item, running asynchronous items
//! in forked children, and letting `&&`/`||` short-circuit. The submodule
//! per command kind does the rest.

mod compound;
mod simple;


use crate::pipeline::execute_pipeline;
use crate::trap::poll_traps;
use marsh_env::function::Function;
use marsh_env::io;
use marsh_env::option::ShellOption;
use marsh_env::semantics::{ExitStatus, Result};
use marsh_env::{Env, Frame};
use marsh_syntax::syntax::{AndOr, AndOrList, Command, Item, List};
use nix::unistd::ForkResult;
use std::ops::ControlFlow::{Break, Continue};
use std::rc::Rc;

/// Executes a command list.
pub fn execute_list(env: &mut Env, list: &List) -> Result {
    for item in &list.0 {
        poll_traps(env)?;
        env.lineno = item.line;
        if item.is_async {
            start_async(env, item);
        } else {
            execute_and_or(env, &item.and_or)?;
        }
    }
    Continue(())
}

/// Executes pipelines joined by `&&` and `||`.
///
/// Every pipeline but the last runs in an errexit-suppressed context.
/// Skipped pipelines leave `$?` untouched.
pub fn execute_and_or(env: &mut Env, list: &AndOrList) -> Result {
    let total = list.rest.len();
    if total == 0 {
        return execute_pipeline(env, &list.first);
    }

    env.stack.push(Frame::Condition);
    let result = execute_pipeline(env, &list.first);
    env.stack.pop();
    result?;

    for (index, (operator, pipeline)) in list.rest.iter().enumerate() {
        let run = match operator {
            AndOr::AndThen => env.exit_status.is_successful(),
            AndOr::OrElse => !env.exit_status.is_successful(),
        };
        if !run {
            continue;
        }
        if index + 1 == total {
            execute_pipeline(env, pipeline)?;
        } else {
            env.stack.push(Frame::Condition);
            let result = execute_pipeline(env, pipeline);
            env.stack.pop();
            result?;
        }
    }
    Continue(())
}

/// Executes one pipeline element.
pub fn execute_command(env: &mut Env, command: &Command) -> Result {
    match command {
        Command::Simple(simple) => simple::execute_simple(env, simple),
        Command::Compound(full) => compound::execute_full_compound(env, full),
        Command::Function(definition) => {
            // The function table takes ownership of the body, which
            // outlives this parse
            env.functions.define(Function {
                name: definition.name.clone(),
                body: Rc::clone(&definition.body),
                line: definition.line,
            });
            env.exit_status = ExitStatus::SUCCESS;
            Continue(())
        }
    }
}

/// Starts an asynchronous item: forks a child for the and-or list,
/// records it as a job, and sets `$!`.
fn start_async(env: &mut Env, item: &Item) {
    let system = env.system;
    env.stdout.flush(&system).ok();
    let monitor = env.options.get(ShellOption::Monitor);

    match system.fork() {
        Ok(ForkResult::Child) => {
            env.enter_subshell();
            if monitor {
                system
                    .set_process_group(
                        marsh_env::job::Pid::from_raw(0),
                        marsh_env::job::Pid::from_raw(0),
                    )
                    .ok();
            } else {
                // Without job control, an asynchronous command reads from
                // /dev/null
                if let Ok(null) =
                    system.open(c"/dev/null", libc::O_RDONLY, 0)
                {
                    system.dup2(null, io::STDIN).ok();
                    if null != io::STDIN {
                        system.close(null).ok();
                    }
                }
            }
            let status = match execute_and_or(env, &item.and_or) {
                Continue(()) => env.exit_status,
                Break(divert) => divert.exit_status().unwrap_or(env.exit_status),
            };
            env.stdout.flush(&system).ok();
            system.exit_process(status)
        }
        Ok(ForkResult::Parent { child }) => {
            if monitor {
                system.set_process_group(child, child).ok();
            }
            env.jobs.add(child, child, item.and_or.to_string());
            env.jobs.set_last_async_pid(child);
            // Starting an asynchronous command succeeds immediately
            env.exit_status = ExitStatus::SUCCESS;
        }
        Err(errno) => {
            env.print_error(&format!("cannot fork: {errno}"));
            env.exit_status = ExitStatus::FAILURE;
        }
    }
}
