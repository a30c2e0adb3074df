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

//! Access to the underlying operating system
//!
//! [`RealSystem`] is a thin synchronous wrapper over the syscalls the shell
//! needs. File descriptor plumbing goes through `libc` directly; process
//! and signal management uses the `nix` abstractions.
//!
//! The shell is single-threaded: blocking calls simply block, and callers
//! restart them on `EINTR` after polling for pending traps.

use crate::semantics::ExitStatus;
use crate::trap::{catching_handler, Disposition, SignalSystem};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus};
use nix::unistd::{ForkResult, Pid};
use std::convert::Infallible;
use std::ffi::{c_int, CStr, CString};
use std::os::unix::io::RawFd;
use std::path::PathBuf;

#[doc(no_inline)]
pub use nix::errno::Errno;

/// Result type for system operations
pub type Result<T> = std::result::Result<T, Errno>;

/// Lowest file descriptor the shell uses for its internal purposes
///
/// Descriptors below this are the user's; saved copies of redirected
/// descriptors are moved here or above so they do not collide.
pub const MIN_INTERNAL_FD: RawFd = 10;

/// Retries an operation while it fails with `EINTR`.
///
/// Waits that must be interruptible by `SIGINT` do not use this; they
/// check the pending flag between attempts instead.
pub fn retry_on_eintr<T>(mut operation: impl FnMut() -> Result<T>) -> Result<T> {
    loop {
        match operation() {
            Err(Errno::EINTR) => continue,
            other => return other,
        }
    }
}

/// Handle for calling into the operating system
///
/// The handle is a unit struct: all state lives in the kernel. It exists
/// so the places that touch the system are explicit and so signal-related
/// logic can be tested against a [`SignalSystem`] substitute.
#[derive(Clone, Copy, Debug, Default)]
pub struct RealSystem;

impl RealSystem {
    /// Creates a system handle.
    #[must_use]
    pub fn new() -> Self {
        RealSystem
    }

    /// Creates a pipe, returning `(read_end, write_end)`.
    pub fn pipe(&self) -> Result<(RawFd, RawFd)> {
        let mut fds = [0 as RawFd; 2];
        Errno::result(unsafe { libc::pipe(fds.as_mut_ptr()) })?;
        Ok((fds[0], fds[1]))
    }

    /// Duplicates a file descriptor onto a specific number.
    pub fn dup2(&self, from: RawFd, to: RawFd) -> Result<RawFd> {
        retry_on_eintr(|| Errno::result(unsafe { libc::dup2(from, to) }))
    }

    /// Duplicates a file descriptor to an internal slot at or above
    /// [`MIN_INTERNAL_FD`], with close-on-exec set.
    ///
    /// Used to save a descriptor before a redirection overwrites it.
    pub fn dup_internal(&self, fd: RawFd) -> Result<RawFd> {
        Errno::result(unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, MIN_INTERNAL_FD) })
    }

    /// Closes a file descriptor.
    pub fn close(&self, fd: RawFd) -> Result<()> {
        Errno::result(unsafe { libc::close(fd) }).map(drop)
    }

    /// Opens a file. `flags` and `mode` are the raw `O_*` and permission
    /// bits.
    pub fn open(&self, path: &CStr, flags: c_int, mode: libc::mode_t) -> Result<RawFd> {
        retry_on_eintr(|| {
            Errno::result(unsafe {
                libc::open(path.as_ptr(), flags, mode as libc::c_uint)
            })
        })
    }

    /// Reads from a file descriptor. Fails with `EINTR` if a signal
    /// arrives; the caller decides whether to restart.
    pub fn read(&self, fd: RawFd, buffer: &mut [u8]) -> Result<usize> {
        let count = Errno::result(unsafe {
            libc::read(fd, buffer.as_mut_ptr().cast(), buffer.len())
        })?;
        Ok(count as usize)
    }

    /// Writes a whole buffer, restarting on `EINTR` and partial writes.
    pub fn write_all(&self, fd: RawFd, mut buffer: &[u8]) -> Result<()> {
        while !buffer.is_empty() {
            let count = retry_on_eintr(|| {
                Errno::result(unsafe {
                    libc::write(fd, buffer.as_ptr().cast(), buffer.len())
                })
            })?;
            buffer = &buffer[count as usize..];
        }
        Ok(())
    }

    /// Rewinds a file descriptor to offset 0.
    pub fn rewind(&self, fd: RawFd) -> Result<()> {
        Errno::result(unsafe { libc::lseek(fd, 0, libc::SEEK_SET) }).map(drop)
    }

    /// Returns true if the descriptor refers to a terminal.
    #[must_use]
    pub fn is_tty(&self, fd: RawFd) -> bool {
        unsafe { libc::isatty(fd) != 0 }
    }

    /// Returns true if the path names an executable file.
    #[must_use]
    pub fn is_executable(&self, path: &CStr) -> bool {
        unsafe { libc::access(path.as_ptr(), libc::X_OK) == 0 }
    }

    /// Returns true if the path names an existing file.
    #[must_use]
    pub fn path_exists(&self, path: &CStr) -> bool {
        unsafe { libc::access(path.as_ptr(), libc::F_OK) == 0 }
    }

    /// Forks the process.
    ///
    /// Safety requirements are those of `fork(2)` in a program that may
    /// have allocated: the child must confine itself to async-signal-safe
    /// operations or exec promptly. The shell is single-threaded, which is
    /// what makes its fork-then-work pattern sound.
    pub fn fork(&self) -> Result<ForkResult> {
        unsafe { nix::unistd::fork() }
    }

    /// Replaces the process image, retrying on `EINTR`.
    pub fn execve(
        &self,
        path: &CStr,
        args: &[CString],
        env: &[CString],
    ) -> Result<Infallible> {
        retry_on_eintr(|| nix::unistd::execve(path, args, env))
    }

    /// Terminates the process immediately, without running destructors or
    /// flushing anything.
    pub fn exit_process(&self, exit_status: ExitStatus) -> ! {
        unsafe { libc::_exit(exit_status.0) }
    }

    /// Waits for a specific child process, blocking.
    ///
    /// Fails with `EINTR` when a signal arrives so the caller can poll
    /// traps and decide whether to keep waiting.
    pub fn wait_for(&self, pid: Pid) -> Result<WaitStatus> {
        nix::sys::wait::waitpid(pid, None)
    }

    /// Reaps a specific child if it has changed state, without blocking.
    ///
    /// Returns `None` when the child has nothing to report. Waiting on a
    /// specific process keeps the job reaper from stealing the status of a
    /// foreground child someone else is waiting for.
    pub fn wait_nonblocking(&self, pid: Pid) -> Result<Option<WaitStatus>> {
        let options = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED;
        match nix::sys::wait::waitpid(pid, Some(options)) {
            Ok(WaitStatus::StillAlive) => Ok(None),
            Ok(status) => Ok(Some(status)),
            Err(Errno::ECHILD) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Returns the shell's process ID.
    #[must_use]
    pub fn process_id(&self) -> Pid {
        nix::unistd::getpid()
    }

    /// Returns the parent process ID.
    #[must_use]
    pub fn parent_process_id(&self) -> Pid {
        nix::unistd::getppid()
    }

    /// Moves a process into a process group. `Pid::from_raw(0)` values
    /// follow the `setpgid(2)` conventions.
    pub fn set_process_group(&self, pid: Pid, pgid: Pid) -> Result<()> {
        nix::unistd::setpgid(pid, pgid)
    }

    /// Sends a signal to a process or process group.
    pub fn kill(&self, pid: Pid, signal: Signal) -> Result<()> {
        nix::sys::signal::kill(pid, signal)
    }

    /// Returns the current working directory.
    pub fn current_dir(&self) -> Result<PathBuf> {
        nix::unistd::getcwd()
    }

    /// Changes the working directory.
    pub fn change_dir(&self, path: &CStr) -> Result<()> {
        nix::unistd::chdir(path)
    }

    /// Looks up a user's home directory for tilde expansion.
    #[must_use]
    pub fn home_directory(&self, user: &str) -> Option<PathBuf> {
        Some(nix::unistd::User::from_name(user).ok()??.dir)
    }

    /// Sets the file-creation mask, returning the previous one.
    pub fn set_umask(&self, mask: libc::mode_t) -> libc::mode_t {
        unsafe { libc::umask(mask) }
    }

    /// Returns process times in clock ticks along with the tick rate.
    pub fn times(&self) -> Result<ProcessTimes> {
        let mut times = libc::tms {
            tms_utime: 0,
            tms_stime: 0,
            tms_cutime: 0,
            tms_cstime: 0,
        };
        Errno::result(unsafe { libc::times(&mut times) } as libc::c_long)?;
        let ticks_per_second = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        Ok(ProcessTimes {
            user: times.tms_utime,
            system: times.tms_stime,
            children_user: times.tms_cutime,
            children_system: times.tms_cstime,
            ticks_per_second: if ticks_per_second > 0 {
                ticks_per_second
            } else {
                100
            },
        })
    }

    /// Resets the job-control-related signal dispositions to their
    /// defaults, as a child must before `execve`.
    pub fn reset_signals_for_child(&self) {
        for signal in [
            Signal::SIGINT,
            Signal::SIGQUIT,
            Signal::SIGTSTP,
            Signal::SIGTTIN,
            Signal::SIGTTOU,
            Signal::SIGCHLD,
        ] {
            let action =
                SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
            // Failure to reset a disposition is not reportable in a child
            // that is about to exec
            unsafe { sigaction(signal, &action) }.ok();
        }
    }
}

impl SignalSystem for RealSystem {
    fn set_disposition(
        &mut self,
        signal: Signal,
        disposition: Disposition,
    ) -> std::result::Result<(), Errno> {
        let handler = match disposition {
            Disposition::Default => SigHandler::SigDfl,
            Disposition::Ignore => SigHandler::SigIgn,
            Disposition::Catch => SigHandler::Handler(catching_handler()),
        };
        // No SA_RESTART: blocking calls must see EINTR so traps get polled
        let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
        unsafe { sigaction(signal, &action) }.map(drop)
    }
}

/// Times consumed by the shell and its children, in clock ticks
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProcessTimes {
    pub user: libc::clock_t,
    pub system: libc::clock_t,
    pub children_user: libc::clock_t,
    pub children_system: libc::clock_t,
    pub ticks_per_second: libc::c_long,
}
