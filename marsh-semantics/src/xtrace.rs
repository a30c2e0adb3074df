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

//! Execution tracing (`set -x`)
//!
//! With `-x` enabled, each simple command is written to standard error
//! after expansion, prefixed with the expansion of `$PS4`.

use crate::expansion;
use itertools::Itertools;
use marsh_env::io::STDERR;
use marsh_env::option::ShellOption;
use marsh_env::semantics::Field;
use marsh_env::variable::PS4;
use marsh_env::Env;

/// Default trace prefix when `$PS4` is unset
const PS4_DEFAULT: &str = "+ ";

/// Writes the trace line for one expanded simple command.
pub fn trace(env: &mut Env, assigns: &[(String, String)], fields: &[Field]) {
    if !env.options.get(ShellOption::Xtrace) {
        return;
    }

    let raw_prefix = env
        .variables
        .value(PS4)
        .unwrap_or(PS4_DEFAULT)
        .to_owned();
    let line = env.lineno;
    let prefix = expansion::expand_text(env, &raw_prefix, line).unwrap_or(raw_prefix);

    let parts = assigns
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .chain(fields.iter().map(|field| field.value.clone()));
    let output = format!("{prefix}{}\n", parts.format(" "));
    env.system.write_all(STDERR, output.as_bytes()).ok();
}
