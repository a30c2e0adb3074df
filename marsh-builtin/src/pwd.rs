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

//! Pwd built-in
//!
//! Prints the working directory. `-L` and `-P` are accepted; the printed
//! path is always the physical one the kernel reports.

use crate::common::failure;
use marsh_env::builtin::Result;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::Env;

/// Entry point of the `pwd` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    for arg in &args[1..] {
        if arg.value != "-L" && arg.value != "-P" {
            return failure(env, "pwd", format!("{}: unexpected operand", arg.value));
        }
    }
    match env.system.current_dir() {
        Ok(dir) => {
            env.stdout.push_str(&dir.to_string_lossy());
            env.stdout.push_str("\n");
            Result::new(ExitStatus::SUCCESS)
        }
        Err(errno) => failure(env, "pwd", errno),
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helper::{env, run_capturing};

    #[test]
    fn prints_current_directory() {
        let mut env = env();
        let expected = format!(
            "{}\n",
            env.system.current_dir().unwrap().to_string_lossy()
        );
        assert_eq!(run_capturing(&mut env, "pwd"), expected);
        assert_eq!(run_capturing(&mut env, "pwd -P"), expected);
    }
}
