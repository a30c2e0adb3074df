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

//! Parsing and executing a complete source string
//!
//! This is the path shared by scripts, `-c` strings, `eval`, `.`, and
//! trap actions: parse the whole text with the current aliases, then
//! execute it. The interactive read-eval loop lives in the CLI instead,
//! where input arrives line by line.

use crate::command::execute_list;
use marsh_env::option::ShellOption;
use marsh_env::semantics::{Divert, ExitStatus, Result};
use marsh_env::Env;
use marsh_syntax::parser::Parser;
use std::ops::ControlFlow::{Break, Continue};

/// Parses and executes shell source text.
///
/// A syntax error is reported with its line number and aborts with
/// status 2: a non-interactive shell exits, an interactive one returns to
/// the prompt. With `-n` (noexec) the text is only parsed.
pub fn run_source(env: &mut Env, source: &str) -> Result {
    let list = match Parser::with_aliases(source, &env.aliases).program() {
        Ok(list) => list,
        Err(error) => {
            env.print_error(&format!("line {}: {}", error.line, error));
            env.exit_status = ExitStatus::ERROR;
            return if env.is_interactive() {
                Break(Divert::Interrupt(Some(ExitStatus::ERROR)))
            } else {
                Break(Divert::Exit(Some(ExitStatus::ERROR)))
            };
        }
    };
    if env.options.get(ShellOption::NoExec) {
        return Continue(());
    }
    execute_list(env, &list)
}
