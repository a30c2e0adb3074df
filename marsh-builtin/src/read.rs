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

//! Read built-in
//!
//! `read [-r] var...` reads one line from standard input and splits it
//! into the named variables using `$IFS`: each non-whitespace IFS
//! character delimits exactly one field, and whatever remains after the
//! last-but-one variable goes to the last variable with trailing IFS
//! whitespace removed.
//!
//! Without `-r`, a backslash escapes the next character (protecting it
//! from splitting) and a backslash-newline continues the line.

use crate::common::failure;
use marsh_env::builtin::Result;
use marsh_env::io::STDIN;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::system::Errno;
use marsh_env::variable::{IFS, IFS_DEFAULT};
use marsh_env::Env;

/// Entry point of the `read` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let mut operands = &args[1..];
    let mut raw = false;
    if operands.first().map(|f| f.value.as_str()) == Some("-r") {
        raw = true;
        operands = &operands[1..];
    }
    if operands.is_empty() {
        return failure(env, "read", "variable name operand required");
    }
    for operand in operands {
        if !is_name(&operand.value) {
            return failure(
                env,
                "read",
                format!("{}: not a valid identifier", operand.value),
            );
        }
    }

    let (bytes, saw_input) = match read_line(env, raw) {
        Ok(line) => line,
        Err(errno) => return failure(env, "read", errno),
    };

    let ifs = env
        .variables
        .value(IFS)
        .map(str::to_owned)
        .unwrap_or_else(|| IFS_DEFAULT.to_owned());
    let fields = split_line(&bytes, &ifs, operands.len());

    for (index, operand) in operands.iter().enumerate() {
        let value = fields.get(index).cloned().unwrap_or_default();
        if let Err(error) = env.variables.assign(&operand.value, value) {
            return failure(env, "read", error);
        }
    }

    if saw_input {
        Result::new(ExitStatus::SUCCESS)
    } else {
        Result::new(ExitStatus::FAILURE)
    }
}

/// Reads bytes up to a newline or end of input.
///
/// Each byte is paired with an "escaped" flag. The boolean result is
/// false when end of input arrived before any byte was read.
fn read_line(env: &mut Env, raw: bool) -> std::result::Result<(Vec<(u8, bool)>, bool), Errno> {
    let system = env.system;
    let mut bytes = Vec::new();
    let mut any = false;

    loop {
        let mut buffer = [0u8; 1];
        let count = marsh_env::system::retry_on_eintr(|| system.read(STDIN, &mut buffer))?;
        if count == 0 {
            return Ok((bytes, any));
        }
        any = true;
        match buffer[0] {
            b'\n' => return Ok((bytes, true)),
            b'\\' if !raw => {
                let count =
                    marsh_env::system::retry_on_eintr(|| system.read(STDIN, &mut buffer))?;
                if count == 0 {
                    return Ok((bytes, true));
                }
                // Backslash-newline continues the line
                if buffer[0] != b'\n' {
                    bytes.push((buffer[0], true));
                }
            }
            byte => bytes.push((byte, false)),
        }
    }
}

/// Splits the line into at most `count` fields per the IFS rules.
fn split_line(bytes: &[(u8, bool)], ifs: &str, count: usize) -> Vec<String> {
    let is_delimiter =
        |&(byte, escaped): &(u8, bool)| !escaped && ifs.contains(byte as char);
    let is_ifs_whitespace = |byte: u8| {
        matches!(byte, b' ' | b'\t' | b'\n') && ifs.contains(byte as char)
    };

    let mut fields = Vec::new();
    let mut index = 0;
    let total = bytes.len();

    for variable in 0..count {
        // Leading IFS whitespace never starts a field
        while index < total && is_delimiter(&bytes[index]) && is_ifs_whitespace(bytes[index].0)
        {
            index += 1;
        }

        if variable + 1 == count {
            // The remainder, minus trailing unescaped IFS whitespace
            let mut slice = &bytes[index..];
            while let Some(&(byte, escaped)) = slice.last() {
                if !escaped && is_ifs_whitespace(byte) {
                    slice = &slice[..slice.len() - 1];
                } else {
                    break;
                }
            }
            let raw: Vec<u8> = slice.iter().map(|&(byte, _)| byte).collect();
            fields.push(String::from_utf8_lossy(&raw).into_owned());
            index = total;
        } else {
            let mut field = Vec::new();
            while index < total && !is_delimiter(&bytes[index]) {
                field.push(bytes[index].0);
                index += 1;
            }
            fields.push(String::from_utf8_lossy(&field).into_owned());

            // One separator: optional whitespace, at most one
            // non-whitespace delimiter, more whitespace
            while index < total
                && is_delimiter(&bytes[index])
                && is_ifs_whitespace(bytes[index].0)
            {
                index += 1;
            }
            if index < total
                && is_delimiter(&bytes[index])
                && !is_ifs_whitespace(bytes[index].0)
            {
                index += 1;
                while index < total
                    && is_delimiter(&bytes[index])
                    && is_ifs_whitespace(bytes[index].0)
                {
                    index += 1;
                }
            }
        }
    }
    fields
}

fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::split_line;
    use crate::test_helper::{env, run};
    use marsh_env::semantics::ExitStatus;

    fn plain(s: &str) -> Vec<(u8, bool)> {
        s.bytes().map(|b| (b, false)).collect()
    }

    #[test]
    fn whitespace_splitting() {
        assert_eq!(
            split_line(&plain("  a  b  c  "), " \t\n", 3),
            ["a", "b", "c"]
        );
    }

    #[test]
    fn excess_fields_go_to_the_last_variable() {
        assert_eq!(
            split_line(&plain("one two three four"), " \t\n", 2),
            ["one", "two three four"]
        );
        // Trailing whitespace is stripped from the remainder
        assert_eq!(split_line(&plain("a b  "), " \t\n", 2), ["a", "b"]);
    }

    #[test]
    fn missing_fields_are_empty() {
        assert_eq!(split_line(&plain("only"), " \t\n", 3), ["only", "", ""]);
    }

    #[test]
    fn non_whitespace_delimiters() {
        assert_eq!(split_line(&plain("a:b:c"), ":", 3), ["a", "b", "c"]);
        assert_eq!(split_line(&plain("a::c"), ":", 3), ["a", "", "c"]);
        assert_eq!(split_line(&plain("a : b"), " :", 2), ["a", "b"]);
    }

    #[test]
    fn escaped_bytes_do_not_delimit() {
        let mut bytes = plain("a");
        bytes.push((b' ', true));
        bytes.extend(plain("b c"));
        assert_eq!(split_line(&bytes, " \t\n", 2), ["a b", "c"]);
    }

    #[test]
    fn read_from_heredoc() {
        let _io = crate::test_helper::io_lock();
        let mut env = env();
        run(&mut env, "read x y <<EOF\nhello world extra\nEOF");
        assert_eq!(env.variables.value("x"), Some("hello"));
        assert_eq!(env.variables.value("y"), Some("world extra"));
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn read_without_r_processes_backslashes() {
        let _io = crate::test_helper::io_lock();
        let mut env = env();
        run(&mut env, "read x y <<EOF\na\\ b c\nEOF");
        assert_eq!(env.variables.value("x"), Some("a b"));
        assert_eq!(env.variables.value("y"), Some("c"));
    }

    #[test]
    fn read_with_r_keeps_backslashes() {
        let _io = crate::test_helper::io_lock();
        let mut env = env();
        run(&mut env, "read -r x <<EOF\na\\nb\nEOF");
        assert_eq!(env.variables.value("x"), Some("a\\nb"));
    }

    #[test]
    fn read_at_eof_fails_with_empty_variables() {
        let _io = crate::test_helper::io_lock();
        let mut env = env();
        run(&mut env, "x=old; read x <<EOF\nEOF");
        // The here-document is empty: end of input straight away
        assert_eq!(env.variables.value("x"), Some(""));
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
    }
}
