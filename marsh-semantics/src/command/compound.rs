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

//! Execution of compound commands
//!
//! Conditions of `if`, `while`, and `until` run in an errexit-suppressed
//! context. Loops consume `break` and `continue` diverts, decrementing
//! multi-level counts as they pass through. A subshell forks; a group
//! runs in place.

use super::execute_list;
use super::simple::{expansion_failure, interrupt, redir_failure};
use crate::expansion::{self, attr::to_pattern_chars};
use crate::pipeline::wait_foreground;
use crate::redir::apply_redirs;
use marsh_env::semantics::{Divert, ExitStatus, Result};
use marsh_env::{Env, Frame};
use marsh_fnmatch::Pattern;
use marsh_syntax::syntax::{CompoundCommand, FullCompoundCommand, List, Word};
use nix::unistd::ForkResult;
use std::ops::ControlFlow::{Break, Continue};

/// Executes a compound command with its redirections installed.
pub(crate) fn execute_full_compound(env: &mut Env, full: &FullCompoundCommand) -> Result {
    env.lineno = full.line;
    let guard = match apply_redirs(env, &full.redirs, true) {
        Ok(guard) => guard,
        Err(error) => return redir_failure(env, &error),
    };
    let result = execute_compound(env, &full.command);
    guard.undo();
    result
}

fn execute_compound(env: &mut Env, command: &CompoundCommand) -> Result {
    use CompoundCommand::*;
    match command {
        Grouping(body) => execute_list(env, body),
        Subshell(body) => execute_subshell(env, body),
        If {
            condition,
            body,
            elifs,
            r#else,
        } => execute_if(env, condition, body, elifs, r#else.as_ref()),
        While { condition, body } => execute_loop(env, condition, body, false),
        Until { condition, body } => execute_loop(env, condition, body, true),
        For { name, values, body } => execute_for(env, name, values.as_deref(), body),
        Case { subject, items } => execute_case(env, subject, items),
    }
}

/// Runs a condition list with errexit suppressed.
fn condition(env: &mut Env, list: &List) -> Result<bool> {
    env.stack.push(Frame::Condition);
    let result = execute_list(env, list);
    env.stack.pop();
    result?;
    Continue(env.exit_status.is_successful())
}

fn execute_if(
    env: &mut Env,
    if_condition: &List,
    body: &List,
    elifs: &[marsh_syntax::syntax::ElifThen],
    r#else: Option<&List>,
) -> Result {
    if condition(env, if_condition)? {
        return execute_list(env, body);
    }
    for elif in elifs {
        if condition(env, &elif.condition)? {
            return execute_list(env, &elif.body);
        }
    }
    match r#else {
        Some(body) => execute_list(env, body),
        None => {
            env.exit_status = ExitStatus::SUCCESS;
            Continue(())
        }
    }
}

/// What to do after a loop iteration part has run
enum Iteration {
    Proceed,
    ExitLoop,
}

/// Consumes `break`/`continue` diverts aimed at this loop; anything else
/// propagates.
fn loop_divert(result: Result) -> Result<Iteration> {
    match result {
        Continue(()) => Continue(Iteration::Proceed),
        Break(Divert::Break { count: 0 }) => Continue(Iteration::ExitLoop),
        Break(Divert::Break { count }) => Break(Divert::Break { count: count - 1 }),
        Break(Divert::Continue { count: 0 }) => Continue(Iteration::Proceed),
        Break(Divert::Continue { count }) => Break(Divert::Continue { count: count - 1 }),
        Break(other) => Break(other),
    }
}

fn execute_loop(env: &mut Env, cond: &List, body: &List, until: bool) -> Result {
    env.stack.push(Frame::Loop);
    let result = loop_body(env, cond, body, until);
    env.stack.pop();
    result
}

fn loop_body(env: &mut Env, cond: &List, body: &List, until: bool) -> Result {
    let mut status = ExitStatus::SUCCESS;
    loop {
        env.stack.push(Frame::Condition);
        let cond_result = execute_list(env, cond);
        env.stack.pop();
        match loop_divert(cond_result)? {
            Iteration::ExitLoop => break,
            Iteration::Proceed => {}
        }
        let proceed = env.exit_status.is_successful() != until;
        if !proceed {
            break;
        }

        match loop_divert(execute_list(env, body))? {
            Iteration::ExitLoop => {
                status = env.exit_status;
                break;
            }
            Iteration::Proceed => status = env.exit_status,
        }
    }
    env.exit_status = status;
    Continue(())
}

fn execute_for(
    env: &mut Env,
    name: &str,
    values: Option<&[Word]>,
    body: &List,
) -> Result {
    let values: Vec<String> = match values {
        Some(words) => match expansion::expand_words(env, words) {
            Ok(fields) => fields.into_iter().map(|field| field.value).collect(),
            Err(error) => return expansion_failure(env, &error),
        },
        None => env.variables.positional_params().to_vec(),
    };

    env.stack.push(Frame::Loop);
    let result = for_body(env, name, values, body);
    env.stack.pop();
    result
}

fn for_body(env: &mut Env, name: &str, values: Vec<String>, body: &List) -> Result {
    let mut status = ExitStatus::SUCCESS;
    for value in values {
        if let Err(error) = env.variables.assign(name, value) {
            env.print_error(&error.to_string());
            env.exit_status = ExitStatus::ERROR;
            return interrupt(env);
        }
        match loop_divert(execute_list(env, body))? {
            Iteration::ExitLoop => {
                status = env.exit_status;
                break;
            }
            Iteration::Proceed => status = env.exit_status,
        }
    }
    env.exit_status = status;
    Continue(())
}

fn execute_case(
    env: &mut Env,
    subject: &Word,
    items: &[marsh_syntax::syntax::CaseItem],
) -> Result {
    let subject = match expansion::expand_word(env, subject) {
        Ok(field) => field.value,
        Err(error) => return expansion_failure(env, &error),
    };

    for item in items {
        for pattern_word in &item.patterns {
            let attr = match expansion::expand_word_attr(env, pattern_word) {
                Ok(attr) => attr,
                Err(error) => return expansion_failure(env, &error),
            };
            let Ok(pattern) = Pattern::parse(to_pattern_chars(&attr.chars)) else {
                continue;
            };
            if pattern.is_match(&subject) {
                env.exit_status = ExitStatus::SUCCESS;
                return execute_list(env, &item.body);
            }
        }
    }
    env.exit_status = ExitStatus::SUCCESS;
    Continue(())
}

fn execute_subshell(env: &mut Env, body: &List) -> Result {
    let system = env.system;
    env.stdout.flush(&system).ok();
    match system.fork() {
        Ok(ForkResult::Child) => {
            env.enter_subshell();
            let status = match execute_list(env, body) {
                Continue(()) => env.exit_status,
                Break(divert) => divert.exit_status().unwrap_or(env.exit_status),
            };
            env.stdout.flush(&system).ok();
            system.exit_process(status)
        }
        Ok(ForkResult::Parent { child }) => {
            env.exit_status = wait_foreground(env, child);
            Continue(())
        }
        Err(errno) => {
            env.print_error(&format!("cannot fork: {errno}"));
            env.exit_status = ExitStatus::FAILURE;
            Continue(())
        }
    }
}
