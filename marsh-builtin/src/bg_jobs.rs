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

//! Jobs built-in
//!
//! Lists the known jobs with their state. Jobs reported in a terminal
//! state are removed from the table afterwards, so each completion is
//! reported once.

use marsh_env::builtin::Result;
use marsh_env::job::JobStatus;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::Env;
use marsh_semantics::trap::reap_jobs;

/// Entry point of the `jobs` built-in
pub fn main(env: &mut Env, _args: Vec<Field>) -> Result {
    reap_jobs(env);

    let mut output = String::new();
    let mut finished = Vec::new();
    let current = env.jobs.current().map(|job| job.id);

    for job in env.jobs.iter() {
        let mark = if Some(job.id) == current { '+' } else { '-' };
        let state = match job.status {
            JobStatus::Running => "Running".to_owned(),
            JobStatus::Stopped => "Stopped".to_owned(),
            JobStatus::Done(status) if status.is_successful() => "Done".to_owned(),
            JobStatus::Done(status) => format!("Done({status})"),
            JobStatus::Terminated(status) => format!("Terminated({status})"),
        };
        output.push_str(&format!("[{}] {} {:<10} {}\n", job.id, mark, state, job.name));
        if job.status.is_terminal() {
            finished.push(job.id);
        }
    }

    env.stdout.push_str(&output);
    for id in finished {
        env.jobs.remove(id);
    }
    Result::new(ExitStatus::SUCCESS)
}
