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

//! Implementation of the built-in utilities
//!
//! Each submodule implements one utility as a `main` function receiving
//! the execution environment and the expanded argument fields (the first
//! field is the utility name). [`BUILTINS`] lists them all;
//! [`register`] inserts them into an environment's registry.
//!
//! The special built-ins report their errors through
//! [`common::special_error`], which makes a non-interactive shell exit as
//! POSIX requires.

pub mod common;

pub mod alias;
pub mod bg_jobs;
pub mod break_continue;
pub mod cd;
pub mod colon;
pub mod echo;
pub mod eval;
pub mod exec;
pub mod exit;
pub mod export;
pub mod local;
pub mod printf;
pub mod pwd;
pub mod read;
pub mod r#return;
pub mod set;
pub mod shift;
pub mod source;
pub mod times;
pub mod trap;
pub mod true_false;
pub mod umask;
pub mod unset;
pub mod wait;

use marsh_env::builtin::{Builtin, Type};
use marsh_env::Env;

/// All built-in utilities with their names and types
pub const BUILTINS: &[(&str, Builtin)] = &[
    // Special built-ins
    (
        ".",
        Builtin {
            r#type: Type::Special,
            execute: source::main,
        },
    ),
    (
        ":",
        Builtin {
            r#type: Type::Special,
            execute: colon::main,
        },
    ),
    (
        "break",
        Builtin {
            r#type: Type::Special,
            execute: break_continue::break_main,
        },
    ),
    (
        "continue",
        Builtin {
            r#type: Type::Special,
            execute: break_continue::continue_main,
        },
    ),
    (
        "eval",
        Builtin {
            r#type: Type::Special,
            execute: eval::main,
        },
    ),
    (
        "exec",
        Builtin {
            r#type: Type::Special,
            execute: exec::main,
        },
    ),
    (
        "exit",
        Builtin {
            r#type: Type::Special,
            execute: exit::main,
        },
    ),
    (
        "export",
        Builtin {
            r#type: Type::Special,
            execute: export::export_main,
        },
    ),
    (
        "readonly",
        Builtin {
            r#type: Type::Special,
            execute: export::readonly_main,
        },
    ),
    (
        "return",
        Builtin {
            r#type: Type::Special,
            execute: r#return::main,
        },
    ),
    (
        "set",
        Builtin {
            r#type: Type::Special,
            execute: set::main,
        },
    ),
    (
        "shift",
        Builtin {
            r#type: Type::Special,
            execute: shift::main,
        },
    ),
    (
        "times",
        Builtin {
            r#type: Type::Special,
            execute: times::main,
        },
    ),
    (
        "trap",
        Builtin {
            r#type: Type::Special,
            execute: trap::main,
        },
    ),
    (
        "unset",
        Builtin {
            r#type: Type::Special,
            execute: unset::main,
        },
    ),
    // Ordinary built-ins
    (
        "alias",
        Builtin {
            r#type: Type::Mandatory,
            execute: alias::alias_main,
        },
    ),
    (
        "unalias",
        Builtin {
            r#type: Type::Mandatory,
            execute: alias::unalias_main,
        },
    ),
    (
        "cd",
        Builtin {
            r#type: Type::Mandatory,
            execute: cd::main,
        },
    ),
    (
        "echo",
        Builtin {
            r#type: Type::Mandatory,
            execute: echo::main,
        },
    ),
    (
        "false",
        Builtin {
            r#type: Type::Mandatory,
            execute: true_false::false_main,
        },
    ),
    (
        "jobs",
        Builtin {
            r#type: Type::Mandatory,
            execute: bg_jobs::main,
        },
    ),
    (
        "local",
        Builtin {
            r#type: Type::Mandatory,
            execute: local::main,
        },
    ),
    (
        "printf",
        Builtin {
            r#type: Type::Mandatory,
            execute: printf::main,
        },
    ),
    (
        "pwd",
        Builtin {
            r#type: Type::Mandatory,
            execute: pwd::main,
        },
    ),
    (
        "read",
        Builtin {
            r#type: Type::Mandatory,
            execute: read::main,
        },
    ),
    (
        "true",
        Builtin {
            r#type: Type::Mandatory,
            execute: true_false::true_main,
        },
    ),
    (
        "umask",
        Builtin {
            r#type: Type::Mandatory,
            execute: umask::main,
        },
    ),
    (
        "wait",
        Builtin {
            r#type: Type::Mandatory,
            execute: wait::main,
        },
    ),
];

/// Registers every built-in in the environment.
pub fn register(env: &mut Env) {
    for &(name, builtin) in BUILTINS {
        env.builtins.insert(name, builtin);
    }
}

#[cfg(test)]
pub(crate) mod test_helper {
    use marsh_env::Env;

    /// An environment with all built-ins registered.
    pub(crate) fn env() -> Env {
        let mut env = Env::new("marsh".to_owned());
        super::register(&mut env);
        env
    }

    /// Runs source and panics on an unexpected divert.
    pub(crate) fn run(env: &mut Env, source: &str) {
        match marsh_semantics::run_source(env, source) {
            std::ops::ControlFlow::Continue(()) => {}
            std::ops::ControlFlow::Break(divert) => {
                panic!("unexpected divert {divert:?} running {source:?}")
            }
        }
    }

    /// Captures what the source writes to the shell's buffered stdout.
    ///
    /// The buffer is swapped out so nothing reaches the real standard
    /// output even when a builtin flushes.
    pub(crate) fn run_capturing(env: &mut Env, source: &str) -> String {
        let result = capture(env, |env| run(env, source));
        result.1
    }

    /// Serializes tests that redirect the process-wide standard streams.
    static CAPTURE_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    /// Takes the standard-stream lock for a test that redirects a
    /// standard descriptor without going through [`capture`].
    pub(crate) fn io_lock() -> std::sync::MutexGuard<'static, ()> {
        CAPTURE_LOCK
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    /// Runs a closure with stdout buffered into a pipe and returns its
    /// result and the captured bytes.
    pub(crate) fn capture<R>(env: &mut Env, f: impl FnOnce(&mut Env) -> R) -> (R, String) {
        let _lock = CAPTURE_LOCK
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        let system = env.system;
        let (reader, writer) = system.pipe().unwrap();
        let saved = system.dup_internal(1).unwrap();
        system.dup2(writer, 1).unwrap();
        system.close(writer).unwrap();

        let result = f(env);
        env.stdout.flush(&system).ok();

        system.dup2(saved, 1).unwrap();
        system.close(saved).unwrap();

        let mut output = Vec::new();
        let mut buffer = [0; 4096];
        loop {
            match system.read(reader, &mut buffer) {
                Ok(0) => break,
                Ok(count) => output.extend_from_slice(&buffer[..count]),
                Err(marsh_env::system::Errno::EINTR) => continue,
                Err(error) => panic!("read failed: {error}"),
            }
        }
        system.close(reader).unwrap();
        (result, String::from_utf8_lossy(&output).into_owned())
    }
}
