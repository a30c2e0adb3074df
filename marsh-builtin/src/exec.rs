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

//! Exec built-in
//!
//! With operands, replaces the shell with the named external utility
//! without forking; on failure a non-interactive shell exits with 126 or
//! 127. Without operands it does nothing, but its redirections persist
//! in the shell (the executor arranges that).

use crate::common::special_error;
use marsh_env::builtin::Result;
use marsh_env::semantics::{Divert, ExitStatus, Field};
use marsh_env::system::Errno;
use marsh_env::variable::PATH;
use marsh_env::Env;
use std::ffi::CString;

/// Finds the external utility to exec. Built-ins and functions are not
/// candidates: only a real utility can replace the shell.
fn resolve(env: &Env, name: &str) -> Option<CString> {
    if name.contains('/') {
        return CString::new(name).ok();
    }
    let path = env.variables.value(PATH).unwrap_or("");
    for dir in path.split(':') {
        let dir = if dir.is_empty() { "." } else { dir };
        let candidate = CString::new(format!("{dir}/{name}")).ok()?;
        if env.system.is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Entry point of the `exec` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let Some(name) = args.get(1) else {
        return Result::new(ExitStatus::SUCCESS);
    };

    let Some(path) = resolve(env, &name.value) else {
        let failure = special_error(env, "exec", format!("{}: not found", name.value));
        return Result {
            exit_status: ExitStatus::NOT_FOUND,
            ..failure
        };
    };

    let Ok(argv) = args[1..]
        .iter()
        .map(|field| CString::new(field.value.as_str()))
        .collect::<std::result::Result<Vec<CString>, _>>()
    else {
        return special_error(env, "exec", "invalid argument: embedded NUL byte");
    };

    let system = env.system;
    env.stdout.flush(&system).ok();
    system.reset_signals_for_child();
    let errno = match system.execve(&path, &argv, &env.variables.environment()) {
        Err(errno) => errno,
        Ok(impossible) => match impossible {},
    };

    let status = match errno {
        Errno::ENOENT => ExitStatus::NOT_FOUND,
        _ => ExitStatus::NOEXEC,
    };
    env.print_error(&format!("exec: {}: {errno}", name.value));
    if env.is_interactive() {
        Result::new(status)
    } else {
        Result::with_divert(status, Divert::Exit(Some(status)))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helper::env;
    use assert_matches::assert_matches;
    use marsh_env::semantics::{Divert, ExitStatus};
    use std::ops::ControlFlow::Break;

    #[test]
    fn exec_without_operands_succeeds() {
        let mut env = env();
        crate::test_helper::run(&mut env, "exec");
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn exec_missing_command_is_fatal() {
        let mut env = env();
        env.variables.assign("PATH", "/nonexistent").unwrap();
        let result = marsh_semantics::run_source(&mut env, "exec no-such-cmd");
        assert_matches!(result, Break(Divert::Exit(_)));
    }

    #[test]
    fn exec_redirections_persist() {
        let mut env = env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");
        crate::test_helper::run(&mut env, &format!("exec 5>{}", path.display()));
        // Descriptor 5 is still open after the command
        env.system.write_all(5, b"kept").unwrap();
        env.system.close(5).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"kept");
    }
}
