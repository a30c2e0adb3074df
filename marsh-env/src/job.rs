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

//! Type definitions for job management
//!
//! A [`Job`] tracks one process group launched asynchronously or as a
//! pipeline. Jobs get monotonically increasing ids and stay in the
//! [`JobSet`] until explicitly removed after their terminal state has been
//! reported.

use crate::semantics::ExitStatus;
#[doc(no_inline)]
pub use nix::sys::wait::WaitStatus;
#[doc(no_inline)]
pub use nix::unistd::Pid;

/// State of a job
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JobStatus {
    /// The job is running.
    Running,
    /// The job was stopped by a signal.
    Stopped,
    /// The job exited.
    Done(ExitStatus),
    /// The job was killed by a signal; the exit status is 128 plus the
    /// signal number.
    Terminated(ExitStatus),
}

impl JobStatus {
    /// Returns true if the job has reached a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done(_) | JobStatus::Terminated(_))
    }

    /// Returns the exit status of a finished job.
    #[must_use]
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self {
            JobStatus::Done(exit_status) | JobStatus::Terminated(exit_status) => {
                Some(*exit_status)
            }
            JobStatus::Running | JobStatus::Stopped => None,
        }
    }

    /// Converts a wait status into a job status, if it carries one.
    #[must_use]
    pub fn from_wait_status(status: WaitStatus) -> Option<JobStatus> {
        match status {
            WaitStatus::Exited(_, code) => Some(JobStatus::Done(ExitStatus(code))),
            WaitStatus::Signaled(_, signal, _) => Some(JobStatus::Terminated(
                ExitStatus::from_signal_number(signal as i32),
            )),
            WaitStatus::Stopped(_, _) => Some(JobStatus::Stopped),
            WaitStatus::Continued(_) => Some(JobStatus::Running),
            _ => None,
        }
    }
}

/// Record of one asynchronous command or pipeline
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Job {
    /// Job id, unique and monotonically assigned
    pub id: usize,
    /// Process ID of the job's process (group leader)
    pub pid: Pid,
    /// Process group the job runs in
    pub pgid: Pid,
    /// Source text of the command, for reporting
    pub name: String,
    /// Current state
    pub status: JobStatus,
    /// Whether the state changed since the last report
    pub status_changed: bool,
}

/// Collection of jobs
#[derive(Clone, Debug)]
pub struct JobSet {
    jobs: Vec<Job>,
    next_id: usize,
    last_async_pid: Pid,
}

impl Default for JobSet {
    fn default() -> Self {
        JobSet {
            jobs: Vec::new(),
            next_id: 1,
            last_async_pid: Pid::from_raw(0),
        }
    }
}

impl JobSet {
    /// Creates an empty job set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a running job and returns its id.
    pub fn add(&mut self, pid: Pid, pgid: Pid, name: String) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.jobs.push(Job {
            id,
            pid,
            pgid,
            name,
            status: JobStatus::Running,
            status_changed: false,
        });
        id
    }

    /// Returns the job with the given id.
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == id)
    }

    /// Returns the job running the given process.
    #[must_use]
    pub fn find_by_pid(&self, pid: Pid) -> Option<&Job> {
        self.jobs.iter().find(|job| job.pid == pid)
    }

    /// Returns the most recently added job, the one `%%` and `%+` select.
    #[must_use]
    pub fn current(&self) -> Option<&Job> {
        self.jobs.last()
    }

    /// Iterates over the jobs in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Returns true if no jobs are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Records a status reported by `waitpid` for the given process.
    ///
    /// Jobs are never removed here; removal happens only on explicit
    /// [`remove`](Self::remove) once the state has been consumed.
    pub fn update_status(&mut self, pid: Pid, status: WaitStatus) {
        let Some(new_status) = JobStatus::from_wait_status(status) else {
            return;
        };
        if let Some(job) = self.jobs.iter_mut().find(|job| job.pid == pid) {
            if job.status != new_status {
                job.status = new_status;
                job.status_changed = true;
            }
        }
    }

    /// Removes the job with the given id, returning it.
    pub fn remove(&mut self, id: usize) -> Option<Job> {
        let index = self.jobs.iter().position(|job| job.id == id)?;
        Some(self.jobs.remove(index))
    }

    /// Removes all jobs, as a subshell does after forking.
    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    /// Returns the process ID of the most recent asynchronous command, the
    /// value of `$!`.
    #[must_use]
    pub fn last_async_pid(&self) -> Pid {
        self.last_async_pid
    }

    /// Sets the process ID of the most recent asynchronous command.
    pub fn set_last_async_pid(&mut self, pid: Pid) {
        self.last_async_pid = pid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;

    #[test]
    fn ids_are_monotonic() {
        let mut jobs = JobSet::new();
        let a = jobs.add(Pid::from_raw(10), Pid::from_raw(10), "a".to_owned());
        let b = jobs.add(Pid::from_raw(11), Pid::from_raw(11), "b".to_owned());
        assert_eq!((a, b), (1, 2));
        jobs.remove(a);
        let c = jobs.add(Pid::from_raw(12), Pid::from_raw(12), "c".to_owned());
        assert_eq!(c, 3);
    }

    #[test]
    fn current_is_most_recent() {
        let mut jobs = JobSet::new();
        jobs.add(Pid::from_raw(10), Pid::from_raw(10), "a".to_owned());
        jobs.add(Pid::from_raw(11), Pid::from_raw(11), "b".to_owned());
        assert_eq!(jobs.current().unwrap().name, "b");
    }

    #[test]
    fn update_status_marks_change() {
        let mut jobs = JobSet::new();
        let id = jobs.add(Pid::from_raw(10), Pid::from_raw(10), "a".to_owned());
        jobs.update_status(Pid::from_raw(10), WaitStatus::Exited(Pid::from_raw(10), 3));
        let job = jobs.get(id).unwrap();
        assert_eq!(job.status, JobStatus::Done(ExitStatus(3)));
        assert!(job.status_changed);
        assert!(job.status.is_terminal());
    }

    #[test]
    fn signaled_job_gets_offset_status() {
        let status = JobStatus::from_wait_status(WaitStatus::Signaled(
            Pid::from_raw(10),
            Signal::SIGINT,
            false,
        ))
        .unwrap();
        assert_eq!(status, JobStatus::Terminated(ExitStatus(130)));
    }

    #[test]
    fn removal_only_on_request() {
        let mut jobs = JobSet::new();
        let id = jobs.add(Pid::from_raw(10), Pid::from_raw(10), "a".to_owned());
        jobs.update_status(Pid::from_raw(10), WaitStatus::Exited(Pid::from_raw(10), 0));
        assert!(jobs.get(id).is_some());
        let job = jobs.remove(id).unwrap();
        assert_eq!(job.id, id);
        assert!(jobs.get(id).is_none());
    }

    #[test]
    fn last_async_pid_round_trip() {
        let mut jobs = JobSet::new();
        assert_eq!(jobs.last_async_pid(), Pid::from_raw(0));
        jobs.set_last_async_pid(Pid::from_raw(42));
        assert_eq!(jobs.last_async_pid(), Pid::from_raw(42));
    }
}
