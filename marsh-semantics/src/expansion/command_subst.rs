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

//! Command substitution
//!
//! `$(command)` and `` `command` `` parse and run the command, capture its
//! standard output, and yield it with trailing newlines removed. The
//! general path forks a subshell with its output connected to a pipe.
//!
//! A curated set of side-effect-free builtins (`echo`, `printf`, `pwd`,
//! `:`, `true`, `false`) with no redirections is captured in-process
//! instead: the builtin runs against a substitute output buffer whose
//! bytes become the captured output, and the variable table is restored
//! afterwards so the capture stays observationally identical to the
//! forking path.

use super::{expand_words, ExpansionError};
use marsh_env::io::OutputBuffer;
use marsh_env::semantics::ExitStatus;
use marsh_env::{io, Env};
use marsh_syntax::parser::Parser;
use marsh_syntax::syntax::{Command, List, SimpleCommand};
use nix::unistd::ForkResult;
use std::ops::ControlFlow::{Break, Continue};

/// Builtins safe to capture without forking
const CAPTURE_SAFE: [&str; 6] = ["echo", "printf", "pwd", ":", "true", "false"];

/// Parses and executes a command substitution, returning the captured
/// output with trailing newlines removed.
pub fn command_substitution(env: &mut Env, source: &str) -> Result<String, ExpansionError> {
    let list = Parser::with_aliases(source, &env.aliases).program()?;

    let candidate = capture_candidate(&list)
        .filter(|simple| env.builtins.contains_key(simple.words[0].text.as_str()))
        .cloned();
    let mut output = match candidate {
        Some(simple) => capture_in_process(env, &simple)?,
        None => capture_forking(env, &list)?,
    };
    env.last_command_subst_status = Some(env.exit_status);

    while output.ends_with('\n') {
        output.pop();
    }
    Ok(output)
}

/// Recognizes a command that the in-process path can capture: one
/// synchronous simple command, no redirections or assignments, whose name
/// is literally one of the curated builtins.
fn capture_candidate(list: &List) -> Option<&SimpleCommand> {
    let [item] = &list.0[..] else { return None };
    if item.is_async || !item.and_or.rest.is_empty() {
        return None;
    }
    let pipeline = &item.and_or.first;
    if pipeline.negation {
        return None;
    }
    let [command] = &pipeline.commands[..] else {
        return None;
    };
    let Command::Simple(simple) = &**command else {
        return None;
    };
    if !simple.redirs.is_empty() || !simple.assigns.is_empty() {
        return None;
    }
    let name = simple.words.first()?;
    CAPTURE_SAFE.contains(&name.text.as_str()).then_some(simple)
}

/// Runs a curated builtin against a substitute output buffer.
fn capture_in_process(
    env: &mut Env,
    simple: &SimpleCommand,
) -> Result<String, ExpansionError> {
    // Restoring the variables afterwards keeps expansion side effects
    // (such as `${x=y}` in an argument) from escaping, as they would not
    // escape a forked subshell.
    let saved_variables = env.variables.clone();
    let saved_stdout = std::mem::replace(&mut env.stdout, OutputBuffer::new(io::STDOUT));

    let result = (|| -> Result<(), ExpansionError> {
        let fields = expand_words(env, &simple.words)?;
        let name = fields
            .first()
            .expect("capture candidate has a command word");
        let builtin = *env
            .builtins
            .get(name.value.as_str())
            .expect("capture candidate is a registered builtin");
        let result = (builtin.execute)(env, fields);
        env.exit_status = result.exit_status;
        Ok(())
    })();

    let bytes = env.stdout.take_bytes();
    env.stdout = saved_stdout;
    env.variables = saved_variables;
    result?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Forks a subshell with its standard output connected to a pipe and
/// drains the pipe.
fn capture_forking(env: &mut Env, list: &List) -> Result<String, ExpansionError> {
    let system = env.system;
    env.stdout.flush(&system).ok();
    let (reader, writer) = system.pipe()?;

    match system.fork()? {
        ForkResult::Child => {
            env.enter_subshell();
            system.close(reader).ok();
            system.dup2(writer, io::STDOUT).ok();
            system.close(writer).ok();
            let status = match crate::execute_list(env, list) {
                Continue(()) => env.exit_status,
                Break(divert) => divert.exit_status().unwrap_or(env.exit_status),
            };
            env.stdout.flush(&system).ok();
            system.exit_process(status)
        }
        ForkResult::Parent { child } => {
            system.close(writer)?;
            let mut output = Vec::new();
            let mut buffer = [0; 4096];
            loop {
                match system.read(reader, &mut buffer) {
                    Ok(0) => break,
                    Ok(count) => output.extend_from_slice(&buffer[..count]),
                    Err(marsh_env::system::Errno::EINTR) => continue,
                    Err(error) => {
                        system.close(reader).ok();
                        return Err(error.into());
                    }
                }
            }
            system.close(reader)?;

            let status = marsh_env::system::retry_on_eintr(|| system.wait_for(child))?;
            env.exit_status = wait_exit_status(env, status);
            Ok(String::from_utf8_lossy(&output).into_owned())
        }
    }
}

/// Converts a wait status into an exit status.
pub(crate) fn wait_exit_status(
    env: &Env,
    status: nix::sys::wait::WaitStatus,
) -> ExitStatus {
    use nix::sys::wait::WaitStatus;
    match status {
        WaitStatus::Exited(_, code) => ExitStatus(code),
        WaitStatus::Signaled(_, signal, _) => ExitStatus::from_signal_number(signal as i32),
        WaitStatus::Stopped(_, signal) => ExitStatus::from_signal_number(signal as i32),
        _ => env.exit_status,
    }
}
