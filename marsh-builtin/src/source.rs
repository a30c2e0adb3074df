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

//! Dot built-in
//!
//! `. file` reads and executes commands from `file` in the current
//! environment. A name without a slash is searched for on `$PATH` (the
//! file needs to be readable, not executable). `return` inside the file
//! stops reading it.

use crate::common::special_error;
use marsh_env::builtin::Result;
use marsh_env::semantics::{Divert, ExitStatus, Field};
use marsh_env::variable::PATH;
use marsh_env::{Env, Frame};
use std::ops::ControlFlow::{Break, Continue};
use std::path::PathBuf;

/// Entry point of the `.` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let Some(operand) = args.get(1) else {
        return special_error(env, ".", "filename operand required");
    };

    let Some(path) = resolve(env, &operand.value) else {
        return special_error(env, ".", format!("{}: not found", operand.value));
    };
    let source = match std::fs::read_to_string(&path) {
        Ok(source) => source,
        Err(error) => {
            return special_error(env, ".", format!("{}: {error}", path.display()));
        }
    };

    env.stack.push(Frame::DotScript);
    let result = marsh_semantics::run_source(env, &source);
    env.stack.pop();

    match result {
        Continue(()) => Result::new(env.exit_status),
        Break(Divert::Return(status)) => {
            let status = status.unwrap_or(env.exit_status);
            Result::new(status)
        }
        Break(divert) => Result {
            exit_status: env.exit_status,
            divert: Break(divert),
        },
    }
}

/// Finds the file to read: literally if the name has a slash, otherwise
/// by walking `$PATH` for a readable file.
fn resolve(env: &Env, name: &str) -> Option<PathBuf> {
    if name.contains('/') {
        return Some(PathBuf::from(name));
    }
    let path = env.variables.value(PATH).unwrap_or("");
    for dir in path.split(':') {
        let dir = if dir.is_empty() { "." } else { dir };
        let candidate = PathBuf::from(dir).join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use crate::test_helper::{env, run, run_capturing};
    use assert_matches::assert_matches;
    use marsh_env::semantics::{Divert, ExitStatus};
    use marsh_env::variable::PATH as PATH_VAR;
    use std::ops::ControlFlow::Break;

    #[test]
    fn runs_file_in_current_environment() {
        let mut env = env();
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("lib.sh");
        std::fs::write(&script, "sourced_var=yes\ngreet() { echo hi; }\n").unwrap();

        run(&mut env, &format!(". {}", script.display()));
        assert_eq!(env.variables.value("sourced_var"), Some("yes"));
        assert_eq!(run_capturing(&mut env, "greet"), "hi\n");
    }

    #[test]
    fn return_stops_the_script() {
        let mut env = env();
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("early.sh");
        std::fs::write(&script, "x=before\nreturn 4\nx=after\n").unwrap();

        run(&mut env, &format!(". {}", script.display()));
        assert_eq!(env.variables.value("x"), Some("before"));
        assert_eq!(env.exit_status, ExitStatus(4));
    }

    #[test]
    fn missing_file_is_fatal_in_scripts() {
        let mut env = env();
        env.variables.assign("PATH", "/nonexistent").unwrap();
        let result = marsh_semantics::run_source(&mut env, ". does-not-exist");
        assert_matches!(result, Break(Divert::Exit(_)));
    }

    #[test]
    fn path_search_without_slash() {
        let mut env = env();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("findme.sh"), "found=1\n").unwrap();
        env.variables
            .assign(PATH_VAR, dir.path().display().to_string())
            .unwrap();
        run(&mut env, ". findme.sh");
        assert_eq!(env.variables.value("found"), Some("1"));
    }
}
