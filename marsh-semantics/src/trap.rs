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

//! Running trap actions
//!
//! Signal handlers only set pending flags; this module turns pending
//! flags into work at the executor's safe points. Each pending signal's
//! recorded command string is re-parsed and executed as an ordinary
//! command list, with `$?` restored afterwards.

use crate::runner;
use marsh_env::job::Pid;
use marsh_env::semantics::Result;
use marsh_env::trap::{self, Action, Condition};
use marsh_env::Env;
use nix::sys::signal::Signal;
use std::ops::ControlFlow::{Break, Continue};
use std::rc::Rc;

/// Polls for pending signals and runs their trap actions.
///
/// Called before executing each AST list item, before reading input in
/// interactive mode, and after interrupted blocking calls. Exited
/// children are reaped here too.
pub fn poll_traps(env: &mut Env) -> Result {
    if !trap::take_pending() {
        return Continue(());
    }

    let child_changed = trap::take_sigchld();
    if child_changed {
        reap_jobs(env);
        if let Action::Command(command) =
            env.traps.get_action(Condition::Signal(Signal::SIGCHLD))
        {
            let command = Rc::clone(command);
            run_trap_command(env, &command)?;
        }
    }

    while let Some((_condition, command)) = env.traps.take_caught_command() {
        run_trap_command(env, &command)?;
    }
    Continue(())
}

/// Updates job statuses with a non-blocking wait per tracked process.
pub fn reap_jobs(env: &mut Env) {
    let pids: Vec<Pid> = env
        .jobs
        .iter()
        .filter(|job| !job.status.is_terminal())
        .map(|job| job.pid)
        .collect();
    for pid in pids {
        if let Ok(Some(status)) = env.system.wait_nonblocking(pid) {
            env.jobs.update_status(pid, status);
        }
    }
}

/// Parses and executes one trap action, restoring `$?`.
fn run_trap_command(env: &mut Env, command: &str) -> Result {
    let saved_status = env.exit_status;
    let result = runner::run_source(env, command);
    match result {
        Continue(()) => {
            env.exit_status = saved_status;
            Continue(())
        }
        Break(divert) => Break(divert),
    }
}

/// Runs the EXIT trap during orderly shutdown.
///
/// The trap fires exactly once: its action is reset before running, so an
/// `exit` inside the trap does not re-trigger it. The shell's final exit
/// status is preserved unless the trap itself calls `exit` with a status.
pub fn run_exit_trap(env: &mut Env) {
    let Action::Command(command) = env.traps.get_action(Condition::Exit) else {
        return;
    };
    let command = Rc::clone(command);
    let mut system = env.system;
    env.traps
        .set_action(&mut system, Condition::Exit, Action::Default)
        .ok();

    let saved_status = env.exit_status;
    match runner::run_source(env, &command) {
        Continue(()) => env.exit_status = saved_status,
        Break(divert) => {
            env.exit_status = divert.exit_status().unwrap_or(saved_status);
        }
    }
}
