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

//! Umask built-in
//!
//! Without an operand, prints the current file-creation mask in octal.
//! With an octal operand, sets it. Symbolic modes are not supported.

use crate::common::failure;
use marsh_env::builtin::Result;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::Env;

/// Entry point of the `umask` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    match args.get(1) {
        None => {
            // Querying requires a set-and-restore round trip
            let current = env.system.set_umask(0);
            env.system.set_umask(current);
            env.stdout.push_str(&format!("{current:04o}\n"));
            Result::new(ExitStatus::SUCCESS)
        }
        Some(operand) => match u32::from_str_radix(&operand.value, 8) {
            Ok(mask) if mask <= 0o777 => {
                env.system.set_umask(mask as libc::mode_t);
                Result::new(ExitStatus::SUCCESS)
            }
            _ => failure(
                env,
                "umask",
                format!("{}: invalid octal mask", operand.value),
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helper::{env, run, run_capturing};
    use marsh_env::semantics::ExitStatus;

    #[test]
    fn set_and_query_round_trip() {
        let mut env = env();
        let saved = env.system.set_umask(0o022);

        run(&mut env, "umask 027");
        assert_eq!(run_capturing(&mut env, "umask"), "0027\n");

        run(&mut env, "umask bogus");
        assert_eq!(env.exit_status, ExitStatus::FAILURE);

        env.system.set_umask(saved);
    }
}
