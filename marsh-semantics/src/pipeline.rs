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

//! Pipeline execution
//!
//! A single-command pipeline runs in the current shell. A multi-stage
//! pipeline forks one child per stage, wiring each stage's standard
//! output to the next stage's standard input; the parent closes every
//! pipe end it does not own and waits for all stages. The pipeline's
//! status is the last stage's status, inverted by a leading `!`.

use crate::command::execute_command;
use crate::expansion::wait_exit_status;
use marsh_env::io;
use marsh_env::job::Pid;
use marsh_env::option::ShellOption;
use marsh_env::semantics::{Divert, ExitStatus, Result};
use marsh_env::system::Errno;
use marsh_env::{trap, Env, Frame};
use marsh_syntax::syntax::Pipeline;
use nix::unistd::ForkResult;
use std::ops::ControlFlow::{Break, Continue};
use std::os::unix::io::RawFd;

/// Executes a pipeline and applies `errexit` to its result.
pub fn execute_pipeline(env: &mut Env, pipeline: &Pipeline) -> Result {
    if pipeline.negation {
        env.stack.push(Frame::Condition);
        let result = run_stages(env, pipeline);
        env.stack.pop();
        result?;
        env.exit_status = if env.exit_status.is_successful() {
            ExitStatus::FAILURE
        } else {
            ExitStatus::SUCCESS
        };
        // A negated pipeline is exempt from errexit
        return Continue(());
    }

    run_stages(env, pipeline)?;
    errexit_check(env)
}

/// Makes the shell exit when `errexit` is in effect, the last command
/// failed, and no enclosing context suppresses it.
fn errexit_check(env: &mut Env) -> Result {
    if env.options.get(ShellOption::ErrExit)
        && !env.errexit_suppressed()
        && !env.exit_status.is_successful()
    {
        Break(Divert::Exit(Some(env.exit_status)))
    } else {
        Continue(())
    }
}

fn run_stages(env: &mut Env, pipeline: &Pipeline) -> Result {
    match &pipeline.commands[..] {
        [] => Continue(()),
        [command] => execute_command(env, command),
        commands => match fork_stages(env, commands) {
            Ok(()) => Continue(()),
            Err(errno) => {
                env.print_error(&format!("cannot start pipeline: {errno}"));
                env.exit_status = ExitStatus::FAILURE;
                Continue(())
            }
        },
    }
}

/// Forks and wires all stages of a multi-command pipeline, then waits.
fn fork_stages(
    env: &mut Env,
    commands: &[std::rc::Rc<marsh_syntax::syntax::Command>],
) -> std::result::Result<(), Errno> {
    let system = env.system;
    env.stdout.flush(&system).ok();

    let monitor = env.options.get(ShellOption::Monitor);
    let mut pids: Vec<Pid> = Vec::with_capacity(commands.len());
    let mut group: Option<Pid> = None;
    let mut previous_read: Option<RawFd> = None;

    for (index, command) in commands.iter().enumerate() {
        let next_pipe = if index + 1 < commands.len() {
            Some(system.pipe()?)
        } else {
            None
        };

        match system.fork()? {
            ForkResult::Child => {
                if monitor {
                    let pgid = group.unwrap_or(Pid::from_raw(0));
                    system.set_process_group(Pid::from_raw(0), pgid).ok();
                }
                if let Some(read) = previous_read {
                    system.dup2(read, io::STDIN).ok();
                    system.close(read).ok();
                }
                if let Some((read, write)) = next_pipe {
                    system.close(read).ok();
                    system.dup2(write, io::STDOUT).ok();
                    system.close(write).ok();
                }
                env.enter_subshell();
                let status = match execute_command(env, command) {
                    Continue(()) => env.exit_status,
                    Break(divert) => divert.exit_status().unwrap_or(env.exit_status),
                };
                env.stdout.flush(&system).ok();
                system.exit_process(status)
            }
            ForkResult::Parent { child } => {
                if monitor {
                    let pgid = group.unwrap_or(child);
                    system.set_process_group(child, pgid).ok();
                    group = Some(pgid);
                }
                if let Some(read) = previous_read {
                    system.close(read).ok();
                }
                previous_read = match next_pipe {
                    Some((read, write)) => {
                        system.close(write).ok();
                        Some(read)
                    }
                    None => None,
                };
                pids.push(child);
            }
        }
    }

    // The pipeline's status is the final stage's status
    let mut status = env.exit_status;
    for (index, pid) in pids.iter().enumerate() {
        let stage_status = wait_foreground(env, *pid);
        if index + 1 == pids.len() {
            status = stage_status;
        }
    }
    env.exit_status = status;
    Ok(())
}

/// Waits for a foreground child.
///
/// `EINTR` restarts the wait, except that `SIGINT` in an interactive
/// shell without an INT trap aborts it with status 130; the child gets
/// the same signal and dies on its own.
pub(crate) fn wait_foreground(env: &mut Env, pid: Pid) -> ExitStatus {
    loop {
        match env.system.wait_for(pid) {
            Ok(status) => return wait_exit_status(env, status),
            Err(Errno::EINTR) => {
                if env.is_interactive() && trap::sigint_pending() {
                    use marsh_env::trap::{Action, Condition};
                    use nix::sys::signal::Signal;
                    let trapped = matches!(
                        env.traps.get_action(Condition::Signal(Signal::SIGINT)),
                        Action::Command(_)
                    );
                    if !trapped {
                        let _ = trap::take_sigint();
                        return ExitStatus::from_signal_number(Signal::SIGINT as i32);
                    }
                }
            }
            Err(Errno::ECHILD) => return env.exit_status,
            Err(_) => return ExitStatus::FAILURE,
        }
    }
}
