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

//! Times built-in
//!
//! Prints the accumulated user and system times of the shell and of its
//! children, in the POSIX `MmS.SSs` format, one line each.

use crate::common::failure;
use marsh_env::builtin::Result;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::Env;

fn format_ticks(ticks: libc::clock_t, ticks_per_second: libc::c_long) -> String {
    let seconds = ticks as f64 / ticks_per_second as f64;
    let minutes = (seconds / 60.0) as u64;
    format!("{}m{:.2}s", minutes, seconds - minutes as f64 * 60.0)
}

/// Entry point of the `times` built-in
pub fn main(env: &mut Env, _args: Vec<Field>) -> Result {
    let times = match env.system.times() {
        Ok(times) => times,
        Err(errno) => return failure(env, "times", errno),
    };
    let line = format!(
        "{} {}\n{} {}\n",
        format_ticks(times.user, times.ticks_per_second),
        format_ticks(times.system, times.ticks_per_second),
        format_ticks(times.children_user, times.ticks_per_second),
        format_ticks(times.children_system, times.ticks_per_second),
    );
    env.stdout.push_str(&line);
    Result::new(ExitStatus::SUCCESS)
}
