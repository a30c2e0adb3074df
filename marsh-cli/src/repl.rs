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

//! Interactive read-eval loop
//!
//! One prompt-read-execute cycle per logical command. Input is collected
//! line by line; the [incomplete-input
//! probe](marsh_syntax::parser::lex::probe_incomplete) and the parser's
//! premature-EOF report decide when to show the continuation prompt
//! instead of parsing. `SIGINT` discards the current input buffer and
//! returns to the prompt with status 130.
//!
//! Trivially safe lines (blank lines, comments, a plain `name=value`
//! assignment, a lone `:`) are handled without building an AST.

use marsh_env::io::{STDERR, STDIN};
use marsh_env::option::ShellOption;
use marsh_env::semantics::{Divert, ExitStatus};
use marsh_env::system::Errno;
use marsh_env::variable::Flags;
use marsh_env::{trap as trap_flags, Env};
use marsh_syntax::parser::lex::{probe_incomplete, ProbeResult};
use marsh_syntax::parser::Parser;
use std::ops::ControlFlow::{Break, Continue};

/// Outcome of reading one input line
enum ReadLine {
    /// A line (with its newline) was appended to the buffer.
    Line,
    /// End of input.
    Eof,
    /// `SIGINT` arrived; the buffer should be discarded.
    Interrupted,
    /// A trap that ran while waiting asked the shell to exit.
    Exit,
}

/// Runs the interactive loop until end of input or an `exit`.
pub fn interactive_loop(env: &mut Env) -> ExitStatus {
    loop {
        match marsh_semantics::trap::poll_traps(env) {
            Continue(()) => {}
            Break(Divert::Exit(status)) => {
                return status.unwrap_or(env.exit_status);
            }
            Break(_) => {}
        }
        report_finished_jobs(env);

        prompt(env, "PS1", "$ ");
        let mut buffer = String::new();
        let complete = loop {
            match read_line(env, &mut buffer) {
                ReadLine::Eof => {
                    if buffer.is_empty() {
                        return env.exit_status;
                    }
                    break true;
                }
                ReadLine::Interrupted => {
                    env.system.write_all(STDERR, b"\n").ok();
                    env.exit_status = ExitStatus(130);
                    break false;
                }
                ReadLine::Exit => return env.exit_status,
                ReadLine::Line => {}
            }
            match probe_incomplete(&buffer) {
                ProbeResult::Complete => break true,
                _ => prompt(env, "PS2", "> "),
            }
        };
        if !complete {
            continue;
        }

        if env.options.get(ShellOption::Verbose) {
            env.system.write_all(STDERR, buffer.as_bytes()).ok();
        }
        if fast_path(env, &buffer) {
            continue;
        }

        match execute_buffer(env, &mut buffer) {
            Continue(()) => {}
            Break(Divert::Exit(status)) => {
                return status.unwrap_or(env.exit_status);
            }
            // An interrupt (or a stray loop control) abandons the line
            Break(_) => {}
        }
    }
}

/// Parses and executes a collected buffer, asking for more input while
/// the parser reports a construct cut off by end of input.
fn execute_buffer(env: &mut Env, buffer: &mut String) -> marsh_env::semantics::Result {
    loop {
        let parsed = Parser::with_aliases(buffer, &env.aliases).program();
        match parsed {
            Ok(list) => {
                let result = marsh_semantics::execute_list(env, &list);
                let system = env.system;
                env.stdout.flush(&system).ok();
                return result;
            }
            Err(error) if error.is_premature_eof() => {
                prompt(env, "PS2", "> ");
                match read_line(env, buffer) {
                    ReadLine::Line => continue,
                    ReadLine::Eof => {
                        env.print_error(&format!("line {}: {}", error.line, error));
                        env.exit_status = ExitStatus::ERROR;
                        return Continue(());
                    }
                    ReadLine::Interrupted => {
                        env.system.write_all(STDERR, b"\n").ok();
                        env.exit_status = ExitStatus(130);
                        return Continue(());
                    }
                    ReadLine::Exit => {
                        return Break(Divert::Exit(Some(env.exit_status)));
                    }
                }
            }
            Err(error) => {
                // The buffer is discarded and the loop re-prompts
                env.print_error(&format!("line {}: {}", error.line, error));
                env.exit_status = ExitStatus::ERROR;
                return Continue(());
            }
        }
    }
}

/// Writes a prompt, expanding the named prompt variable.
fn prompt(env: &mut Env, variable: &str, default: &str) {
    let raw = env
        .variables
        .value(variable)
        .unwrap_or(default)
        .to_owned();
    let line = env.lineno;
    let text = marsh_semantics::expansion::expand_text(env, &raw, line).unwrap_or(raw);
    env.system.write_all(STDERR, text.as_bytes()).ok();
}

/// Reads one line from standard input into the buffer.
fn read_line(env: &mut Env, buffer: &mut String) -> ReadLine {
    let system = env.system;
    let mut bytes = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        match system.read(STDIN, &mut byte) {
            Ok(0) => {
                if bytes.is_empty() {
                    return ReadLine::Eof;
                }
                buffer.push_str(&String::from_utf8_lossy(&bytes));
                return ReadLine::Line;
            }
            Ok(_) => {
                bytes.push(byte[0]);
                if byte[0] == b'\n' {
                    buffer.push_str(&String::from_utf8_lossy(&bytes));
                    return ReadLine::Line;
                }
            }
            Err(Errno::EINTR) => {
                if trap_flags::take_sigint() {
                    return ReadLine::Interrupted;
                }
                match marsh_semantics::trap::poll_traps(env) {
                    Continue(()) => {}
                    Break(Divert::Exit(status)) => {
                        if let Some(status) = status {
                            env.exit_status = status;
                        }
                        return ReadLine::Exit;
                    }
                    Break(_) => return ReadLine::Interrupted,
                }
            }
            Err(_) => return ReadLine::Eof,
        }
    }
}

/// Reports background jobs that reached a terminal state, then forgets
/// them.
fn report_finished_jobs(env: &mut Env) {
    marsh_semantics::trap::reap_jobs(env);
    let finished: Vec<(usize, String, String)> = env
        .jobs
        .iter()
        .filter(|job| job.status.is_terminal() && job.status_changed)
        .map(|job| {
            let state = match job.status.exit_status() {
                Some(status) if status.is_successful() => "Done".to_owned(),
                Some(status) => format!("Done({status})"),
                None => "Done".to_owned(),
            };
            (job.id, state, job.name.clone())
        })
        .collect();
    for (id, state, name) in finished {
        let line = format!("[{id}] {state} {name}\n");
        env.system.write_all(STDERR, line.as_bytes()).ok();
        env.jobs.remove(id);
    }
}

/// Executes trivially safe input without parsing: a blank line, a
/// comment, a lone `:`, or one plain `name=value` assignment.
///
/// Returns false when the buffer needs the real parser. The effects here
/// must be identical to what the slow path would do.
fn fast_path(env: &mut Env, buffer: &str) -> bool {
    let line = buffer.trim_matches(|c| c == ' ' || c == '\t' || c == '\n');
    if line.is_empty() || line.starts_with('#') {
        return true;
    }
    if line == ":" {
        env.exit_status = ExitStatus::SUCCESS;
        return true;
    }

    // name=value with nothing the expander would touch
    let Some((name, value)) = line.split_once('=') else {
        return false;
    };
    let name_ok = !name.is_empty()
        && name
            .chars()
            .enumerate()
            .all(|(i, c)| c.is_ascii_alphanumeric() && (i > 0 || !c.is_ascii_digit()) || c == '_');
    if !name_ok {
        return false;
    }
    let value_safe = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '+' | ',' | '@' | '%'));
    if !value_safe {
        return false;
    }
    if env.variables.assign(name, value).is_err() {
        // Let the slow path produce the proper diagnostic
        return false;
    }
    if env.options.get(ShellOption::AllExport) {
        env.variables.set_flags(name, Flags::EXPORTED);
    }
    env.exit_status = ExitStatus::SUCCESS;
    true
}

#[cfg(test)]
mod tests {
    use super::fast_path;
    use marsh_env::semantics::ExitStatus;
    use marsh_env::Env;

    fn env() -> Env {
        let mut env = Env::new("marsh".to_owned());
        marsh_builtin::register(&mut env);
        env
    }

    #[test]
    fn blank_and_comment_lines() {
        let mut env = env();
        assert!(fast_path(&mut env, "\n"));
        assert!(fast_path(&mut env, "   \n"));
        assert!(fast_path(&mut env, "# just a comment\n"));
    }

    #[test]
    fn colon_resets_status() {
        let mut env = env();
        env.exit_status = ExitStatus::FAILURE;
        assert!(fast_path(&mut env, ":\n"));
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn simple_assignment() {
        let mut env = env();
        assert!(fast_path(&mut env, "x=simple.value\n"));
        assert_eq!(env.variables.value("x"), Some("simple.value"));
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn anything_else_declines() {
        let mut env = env();
        assert!(!fast_path(&mut env, "echo hi\n"));
        assert!(!fast_path(&mut env, "x=$y\n"));
        assert!(!fast_path(&mut env, "x='quoted'\n"));
        assert!(!fast_path(&mut env, "x=a b\n"));
        assert!(!fast_path(&mut env, "1x=v\n"));
        assert!(!fast_path(&mut env, "x=v; y=w\n"));
    }

    #[test]
    fn fast_and_slow_assignment_agree() {
        let mut fast = env();
        assert!(fast_path(&mut fast, "v=abc\n"));

        let mut slow = env();
        let _ = marsh_semantics::run_source(&mut slow, "v=abc\n");

        assert_eq!(
            fast.variables.value("v"),
            slow.variables.value("v")
        );
        assert_eq!(fast.exit_status, slow.exit_status);
    }

    #[test]
    fn readonly_assignment_declines_to_slow_path() {
        let mut env = env();
        let _ = marsh_semantics::run_source(&mut env, "readonly r=1");
        assert!(!fast_path(&mut env, "r=2\n"));
    }
}
