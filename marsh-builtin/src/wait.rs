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

//! Wait built-in
//!
//! `wait` blocks until all jobs finish; `wait pid` or `wait %spec` until
//! the named one does. The status of the last awaited job becomes the
//! built-in's status; an unknown process yields 127. Waited jobs are
//! removed from the job table.

use crate::common::failure;
use marsh_env::builtin::Result;
use marsh_env::job::Pid;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::system::Errno;
use marsh_env::Env;
use marsh_semantics::trap::reap_jobs;

/// Entry point of the `wait` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    reap_jobs(env);

    let operands = &args[1..];
    let mut status = ExitStatus::SUCCESS;

    if operands.is_empty() {
        let ids: Vec<usize> = env.jobs.iter().map(|job| job.id).collect();
        for id in ids {
            status = await_job(env, id);
        }
        return Result::new(status);
    }

    for operand in operands {
        let id = match resolve_jobspec(env, &operand.value) {
            Ok(Some(id)) => id,
            Ok(None) => {
                // Not a known job: report status 127 per POSIX
                status = ExitStatus::NOT_FOUND;
                continue;
            }
            Err(message) => return failure(env, "wait", message),
        };
        status = await_job(env, id);
    }
    Result::new(status)
}

/// Finds the job id a `wait` operand names.
fn resolve_jobspec(env: &Env, spec: &str) -> std::result::Result<Option<usize>, String> {
    if let Some(job_spec) = spec.strip_prefix('%') {
        return match job_spec {
            "%" | "+" => Ok(env.jobs.current().map(|job| job.id)),
            _ => match job_spec.parse::<usize>() {
                Ok(id) => Ok(env.jobs.get(id).map(|job| job.id)),
                Err(_) => Err(format!("{spec}: invalid job specification")),
            },
        };
    }
    match spec.parse::<i32>() {
        Ok(pid) => Ok(env.jobs.find_by_pid(Pid::from_raw(pid)).map(|job| job.id)),
        Err(_) => Err(format!("{spec}: invalid process ID")),
    }
}

/// Blocks until the job reaches a terminal state, then removes it.
fn await_job(env: &mut Env, id: usize) -> ExitStatus {
    loop {
        let Some(job) = env.jobs.get(id) else {
            return ExitStatus::NOT_FOUND;
        };
        if let Some(status) = job.status.exit_status() {
            env.jobs.remove(id);
            return status;
        }
        let pid = job.pid;

        match env.system.wait_for(pid) {
            Ok(status) => {
                env.jobs.update_status(pid, status);
            }
            Err(Errno::EINTR) => {
                if marsh_env::trap::sigint_pending() && env.is_interactive() {
                    let _ = marsh_env::trap::take_sigint();
                    return ExitStatus::from_signal_number(
                        nix::sys::signal::Signal::SIGINT as i32,
                    );
                }
                // Run pending traps, then keep waiting
                let _ = marsh_semantics::trap::poll_traps(env);
            }
            Err(Errno::ECHILD) => {
                // Someone else reaped it; whatever status was recorded is
                // all we will ever know
                let recorded = env
                    .jobs
                    .get(id)
                    .and_then(|job| job.status.exit_status())
                    .unwrap_or(ExitStatus::NOT_FOUND);
                env.jobs.remove(id);
                return recorded;
            }
            Err(_) => {
                env.jobs.remove(id);
                return ExitStatus::FAILURE;
            }
        }
    }
}
