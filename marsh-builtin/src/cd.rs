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

//! Cd built-in
//!
//! `cd [dir]` changes the working directory, defaulting to `$HOME`.
//! `cd -` goes to `$OLDPWD` and prints the new directory. `$PWD` and
//! `$OLDPWD` are maintained.

use crate::common::failure;
use marsh_env::builtin::Result;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::Env;
use std::ffi::CString;

/// Entry point of the `cd` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let mut print_destination = false;
    let target = match args.get(1).map(|f| f.value.as_str()) {
        None => match env.variables.value("HOME") {
            Some(home) => home.to_owned(),
            None => return failure(env, "cd", "HOME not set"),
        },
        Some("-") => match env.variables.value("OLDPWD") {
            Some(oldpwd) => {
                print_destination = true;
                oldpwd.to_owned()
            }
            None => return failure(env, "cd", "OLDPWD not set"),
        },
        Some(dir) => dir.to_owned(),
    };

    let previous = env
        .system
        .current_dir()
        .map(|dir| dir.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Ok(path) = CString::new(target.as_str()) else {
        return failure(env, "cd", format!("{target}: invalid directory name"));
    };
    if let Err(errno) = env.system.change_dir(&path) {
        return failure(env, "cd", format!("{target}: {errno}"));
    }

    let current = env
        .system
        .current_dir()
        .map(|dir| dir.to_string_lossy().into_owned())
        .unwrap_or(target);
    env.variables.assign("OLDPWD", previous).ok();
    env.variables.assign("PWD", current.clone()).ok();
    if print_destination {
        env.stdout.push_str(&current);
        env.stdout.push_str("\n");
    }
    Result::new(ExitStatus::SUCCESS)
}

#[cfg(test)]
mod tests {
    use crate::test_helper::{env, run};
    use marsh_env::semantics::ExitStatus;
    use std::sync::{Mutex, MutexGuard};

    /// The working directory is process-global; serialize these tests.
    static CWD_LOCK: Mutex<()> = Mutex::new(());

    fn lock() -> MutexGuard<'static, ()> {
        CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    #[test]
    fn changes_directory_and_updates_pwd_vars() {
        let _lock = lock();
        let mut env = env();
        let original = env.system.current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().canonicalize().unwrap();

        run(&mut env, &format!("cd {}", target.display()));
        assert_eq!(env.system.current_dir().unwrap(), target);
        assert_eq!(
            env.variables.value("PWD"),
            Some(target.to_string_lossy().as_ref())
        );
        assert_eq!(
            env.variables.value("OLDPWD"),
            Some(original.to_string_lossy().as_ref())
        );

        run(&mut env, &format!("cd {}", original.display()));
        assert_eq!(env.system.current_dir().unwrap(), original);
    }

    #[test]
    fn missing_directory_fails() {
        let _lock = lock();
        let mut env = env();
        run(&mut env, "cd /definitely/not/a/directory");
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
    }
}
