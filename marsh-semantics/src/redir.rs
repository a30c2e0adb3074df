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

//! Application of redirections
//!
//! Redirections apply left to right. When the command runs in the shell
//! process (builtins, functions, compound commands), each redirected
//! descriptor's original is first duplicated to an internal slot and the
//! returned [`RedirGuard`] restores everything afterwards, on every exit
//! path. A child about to `exec` applies redirections without saving.
//!
//! A here-document becomes the read end of a pipe when its contents fit
//! in one atomic pipe write; larger contents go to an unlinked temporary
//! file rewound to the start.

use crate::expansion::{self, ExpansionError};
use marsh_env::system::{Errno, RealSystem};
use marsh_env::Env;
use marsh_syntax::syntax::{Redir, RedirBody, RedirOp};
use std::ffi::CString;
use std::os::unix::io::{IntoRawFd, RawFd};
use thiserror::Error;

/// Error applying a redirection
#[derive(Debug, Error)]
pub enum RedirError {
    /// Expanding the target word failed.
    #[error(transparent)]
    Expansion(#[from] ExpansionError),
    /// The target file could not be opened.
    #[error("cannot open {target}: {errno}")]
    Open { target: String, errno: Errno },
    /// `noclobber` forbade overwriting an existing file.
    #[error("cannot overwrite existing file {target}")]
    Clobber { target: String },
    /// The operand of `<&` or `>&` is not a number or `-`.
    #[error("{operand}: not a valid file descriptor")]
    InvalidFd { operand: String },
    /// A descriptor operation failed.
    #[error(transparent)]
    System(#[from] Errno),
}

/// Undo record for redirections applied in the shell process
#[must_use = "redirections must be restored on every exit path"]
#[derive(Debug)]
pub struct RedirGuard {
    system: RealSystem,
    /// `(fd, saved)` pairs in application order; `None` means the
    /// descriptor was closed before the redirection
    saved: Vec<(RawFd, Option<RawFd>)>,
}

impl RedirGuard {
    fn new(system: RealSystem) -> Self {
        RedirGuard {
            system,
            saved: Vec::new(),
        }
    }

    /// Restores all redirected descriptors to their saved originals.
    pub fn undo(self) {
        for &(fd, saved) in self.saved.iter().rev() {
            match saved {
                Some(copy) => {
                    self.system.dup2(copy, fd).ok();
                    self.system.close(copy).ok();
                }
                None => {
                    self.system.close(fd).ok();
                }
            }
        }
    }
}

/// Applies redirections in order.
///
/// With `save`, the returned guard restores the originals; without (in a
/// forked child), nothing is recorded. On error, whatever was already
/// applied is undone before returning when saving.
pub fn apply_redirs(
    env: &mut Env,
    redirs: &[Redir],
    save: bool,
) -> Result<RedirGuard, RedirError> {
    let system = env.system;
    let mut guard = RedirGuard::new(system);
    for redir in redirs {
        match apply_one(env, redir, save, &mut guard) {
            Ok(()) => {}
            Err(error) => {
                guard.undo();
                return Err(error);
            }
        }
    }
    Ok(guard)
}

fn apply_one(
    env: &mut Env,
    redir: &Redir,
    save: bool,
    guard: &mut RedirGuard,
) -> Result<(), RedirError> {
    let system = env.system;
    let fd = redir.fd_or_default();

    match &redir.body {
        RedirBody::Normal { operator, operand } => {
            let target = expansion::expand_word(env, operand)?;
            match operator {
                RedirOp::FdIn | RedirOp::FdOut => {
                    if target.value == "-" {
                        save_fd(system, fd, save, guard)?;
                        system.close(fd).ok();
                        return Ok(());
                    }
                    let source: RawFd = target.value.parse().map_err(|_| {
                        RedirError::InvalidFd {
                            operand: target.value.clone(),
                        }
                    })?;
                    save_fd(system, fd, save, guard)?;
                    if let Err(errno) = system.dup2(source, fd) {
                        return Err(RedirError::InvalidFd {
                            operand: format!("{source}: {errno}"),
                        });
                    }
                }
                _ => {
                    let opened = open_file(env, *operator, &target.value)?;
                    save_fd(system, fd, save, guard)?;
                    if opened != fd {
                        system.dup2(opened, fd)?;
                        system.close(opened).ok();
                    }
                }
            }
        }
        RedirBody::HereDoc(here_doc) => {
            let content = expansion::expand_heredoc(env, here_doc)?;
            let reader = materialize_heredoc(system, content.as_bytes())?;
            save_fd(system, fd, save, guard)?;
            if reader != fd {
                system.dup2(reader, fd)?;
                system.close(reader).ok();
            }
        }
    }
    Ok(())
}

/// Saves the current occupant of `fd`, if saving is requested.
fn save_fd(
    system: RealSystem,
    fd: RawFd,
    save: bool,
    guard: &mut RedirGuard,
) -> Result<(), RedirError> {
    if !save {
        return Ok(());
    }
    match system.dup_internal(fd) {
        Ok(copy) => guard.saved.push((fd, Some(copy))),
        // The descriptor was closed; restoring means closing it again
        Err(Errno::EBADF) => guard.saved.push((fd, None)),
        Err(errno) => return Err(errno.into()),
    }
    Ok(())
}

/// Opens the target file of a file redirection.
fn open_file(env: &Env, operator: RedirOp, target: &str) -> Result<RawFd, RedirError> {
    use marsh_env::option::ShellOption;

    let open_error = |errno| RedirError::Open {
        target: target.to_owned(),
        errno,
    };
    let path = CString::new(target)
        .map_err(|_| open_error(Errno::EINVAL))?;

    let flags = match operator {
        RedirOp::FileIn => libc::O_RDONLY,
        RedirOp::FileInOut => libc::O_RDWR | libc::O_CREAT,
        RedirOp::FileAppend => libc::O_WRONLY | libc::O_CREAT | libc::O_APPEND,
        RedirOp::FileClobber => libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC,
        RedirOp::FileOut => {
            if env.options.get(ShellOption::NoClobber) {
                // Fail if the file exists, unless it is a device
                return match env.system.open(
                    &path,
                    libc::O_WRONLY | libc::O_CREAT | libc::O_EXCL,
                    0o666,
                ) {
                    Ok(fd) => Ok(fd),
                    Err(Errno::EEXIST) if is_device(target) => env
                        .system
                        .open(&path, libc::O_WRONLY, 0)
                        .map_err(open_error),
                    Err(Errno::EEXIST) => Err(RedirError::Clobber {
                        target: target.to_owned(),
                    }),
                    Err(errno) => Err(open_error(errno)),
                };
            }
            libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC
        }
        RedirOp::FdIn | RedirOp::FdOut => unreachable!("handled by the caller"),
    };
    env.system.open(&path, flags, 0o666).map_err(open_error)
}

fn is_device(target: &str) -> bool {
    use std::os::unix::fs::FileTypeExt;
    std::fs::metadata(target)
        .map(|metadata| {
            let file_type = metadata.file_type();
            file_type.is_char_device() || file_type.is_block_device()
        })
        .unwrap_or(false)
}

/// Produces a readable descriptor delivering the here-document content.
fn materialize_heredoc(system: RealSystem, content: &[u8]) -> Result<RawFd, RedirError> {
    if content.len() <= libc::PIPE_BUF {
        let (reader, writer) = system.pipe()?;
        let result = system
            .write_all(writer, content)
            .and_then(|()| system.close(writer));
        if let Err(errno) = result {
            system.close(reader).ok();
            return Err(errno.into());
        }
        Ok(reader)
    } else {
        let file = tempfile::tempfile().map_err(io_errno)?;
        let fd = file.into_raw_fd();
        let result = system
            .write_all(fd, content)
            .and_then(|()| system.rewind(fd));
        if let Err(errno) = result {
            system.close(fd).ok();
            return Err(errno.into());
        }
        Ok(fd)
    }
}

fn io_errno(error: std::io::Error) -> RedirError {
    RedirError::System(Errno::from_raw(
        error.raw_os_error().unwrap_or(libc::EIO),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use marsh_syntax::parser::Parser;
    use marsh_syntax::syntax::Command;

    fn env() -> Env {
        Env::new("marsh".to_owned())
    }

    /// Parses the redirections of a simple command.
    fn redirs(source: &str) -> Vec<Redir> {
        let list = Parser::new(source).program().unwrap();
        match &*list.0[0].and_or.first.commands[0] {
            Command::Simple(simple) => simple.redirs.clone(),
            other => panic!("not a simple command: {other:?}"),
        }
    }

    fn read_all(system: RealSystem, fd: RawFd) -> Vec<u8> {
        let mut all = Vec::new();
        let mut buffer = [0; 256];
        loop {
            match system.read(fd, &mut buffer) {
                Ok(0) => return all,
                Ok(n) => all.extend_from_slice(&buffer[..n]),
                Err(e) => panic!("read failed: {e}"),
            }
        }
    }

    #[test]
    fn file_output_and_restore() {
        let _fds = crate::test_util::fd_lock();
        let mut env = env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");
        // Use a high descriptor so the test does not disturb its own
        // standard streams
        let source = format!("x 7>{}", path.display());
        let guard = apply_redirs(&mut env, &redirs(&source), true).unwrap();
        env.system.write_all(7, b"written").unwrap();
        guard.undo();
        assert_eq!(std::fs::read(&path).unwrap(), b"written");
        // After undo the descriptor is closed again
        assert_eq!(env.system.write_all(7, b"x"), Err(Errno::EBADF));
    }

    #[test]
    fn append_mode() {
        let _fds = crate::test_util::fd_lock();
        let mut env = env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log");
        std::fs::write(&path, "first\n").unwrap();
        let source = format!("x 7>>{}", path.display());
        let guard = apply_redirs(&mut env, &redirs(&source), true).unwrap();
        env.system.write_all(7, b"second\n").unwrap();
        guard.undo();
        assert_eq!(std::fs::read(&path).unwrap(), b"first\nsecond\n");
    }

    #[test]
    fn input_redirection() {
        let _fds = crate::test_util::fd_lock();
        let mut env = env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in");
        std::fs::write(&path, "contents").unwrap();
        let source = format!("x 8<{}", path.display());
        let guard = apply_redirs(&mut env, &redirs(&source), true).unwrap();
        assert_eq!(read_all(env.system, 8), b"contents");
        guard.undo();
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let mut env = env();
        let error = apply_redirs(&mut env, &redirs("x 8</definitely/not/here"), true)
            .unwrap_err();
        assert!(matches!(error, RedirError::Open { .. }));
    }

    #[test]
    fn fd_duplication_and_closing() {
        let _fds = crate::test_util::fd_lock();
        let mut env = env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");
        let source = format!("x 7>{} 8>&7 7>&-", path.display());
        let guard = apply_redirs(&mut env, &redirs(&source), true).unwrap();
        // 8 still works, 7 is closed
        env.system.write_all(8, b"via 8").unwrap();
        assert_eq!(env.system.write_all(7, b"x"), Err(Errno::EBADF));
        guard.undo();
        assert_eq!(std::fs::read(&path).unwrap(), b"via 8");
    }

    #[test]
    fn bad_fd_operand_is_an_error() {
        let mut env = env();
        let error = apply_redirs(&mut env, &redirs("x 7>&notanumber"), true).unwrap_err();
        assert!(matches!(error, RedirError::InvalidFd { .. }));
    }

    #[test]
    fn noclobber_respects_and_clobber_overrides() {
        let _fds = crate::test_util::fd_lock();
        use marsh_env::option::ShellOption;
        let mut env = env();
        env.options.set(ShellOption::NoClobber, true);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exists");
        std::fs::write(&path, "old").unwrap();

        let source = format!("x 7>{}", path.display());
        let error = apply_redirs(&mut env, &redirs(&source), true).unwrap_err();
        assert!(matches!(error, RedirError::Clobber { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"old");

        let source = format!("x 7>|{}", path.display());
        let guard = apply_redirs(&mut env, &redirs(&source), true).unwrap();
        env.system.write_all(7, b"new").unwrap();
        guard.undo();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn heredoc_becomes_readable_input() {
        let _fds = crate::test_util::fd_lock();
        let mut env = env();
        let guard =
            apply_redirs(&mut env, &redirs("x 9<<EOF\nline one\nline two\nEOF\n"), true)
                .unwrap();
        assert_eq!(read_all(env.system, 9), b"line one\nline two\n");
        guard.undo();
    }

    #[test]
    fn heredoc_with_expansion() {
        let _fds = crate::test_util::fd_lock();
        let mut env = env();
        env.variables.assign("V", "world").unwrap();
        let guard =
            apply_redirs(&mut env, &redirs("x 9<<EOF\nhello $V\nEOF\n"), true).unwrap();
        assert_eq!(read_all(env.system, 9), b"hello world\n");
        guard.undo();
    }

    #[test]
    fn empty_heredoc_reads_as_empty_file() {
        let _fds = crate::test_util::fd_lock();
        let mut env = env();
        let guard = apply_redirs(&mut env, &redirs("x 9<<EOF\nEOF\n"), true).unwrap();
        assert_eq!(read_all(env.system, 9), b"");
        guard.undo();
    }

    #[test]
    fn large_heredoc_goes_through_a_temporary_file() {
        let _fds = crate::test_util::fd_lock();
        let mut env = env();
        let big = "a".repeat(libc::PIPE_BUF * 4);
        let source = format!("x 9<<EOF\n{big}\nEOF\n");
        let guard = apply_redirs(&mut env, &redirs(&source), true).unwrap();
        let contents = read_all(env.system, 9);
        assert_eq!(contents.len(), big.len() + 1);
        guard.undo();
    }

    #[test]
    fn failed_middle_redirection_undoes_earlier_ones() {
        let _fds = crate::test_util::fd_lock();
        let mut env = env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");
        let source = format!("x 7>{} 8</nope/nope", path.display());
        let error = apply_redirs(&mut env, &redirs(&source), true);
        assert!(error.is_err());
        // 7 was restored (closed)
        assert_eq!(env.system.write_all(7, b"x"), Err(Errno::EBADF));
    }
}
