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

//! Helpers shared by the built-in implementations
//!
//! Diagnostics take the form `shell-name: builtin-name: detail` on
//! standard error. An error in a special built-in is fatal in a
//! non-interactive shell.

use marsh_env::builtin::Result;
use marsh_env::semantics::{Divert, ExitStatus};
use marsh_env::Env;
use std::fmt::Display;

/// Reports a non-fatal error: the message is printed and the built-in
/// fails with status 1.
pub fn failure(env: &mut Env, builtin: &str, message: impl Display) -> Result {
    env.print_error(&format!("{builtin}: {message}"));
    Result::new(ExitStatus::FAILURE)
}

/// Reports an error in a special built-in: status 2, and a
/// non-interactive shell exits.
pub fn special_error(env: &mut Env, builtin: &str, message: impl Display) -> Result {
    env.print_error(&format!("{builtin}: {message}"));
    if env.is_interactive() {
        Result::with_divert(
            ExitStatus::ERROR,
            Divert::Interrupt(Some(ExitStatus::ERROR)),
        )
    } else {
        Result::with_divert(ExitStatus::ERROR, Divert::Exit(Some(ExitStatus::ERROR)))
    }
}

/// Parses an option-free decimal operand, such as a loop count or exit
/// status.
pub fn parse_number<T: std::str::FromStr>(operand: &str) -> Option<T> {
    operand.parse().ok()
}

/// Quotes a string for re-input to the shell, with single quotes.
#[must_use]
pub fn quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | '%' | '+' | ',' | '@'))
    {
        return value.to_owned();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}
