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

//! Printf built-in
//!
//! Formats and writes its operands. The format supports the backslash
//! escapes `\\ \a \b \f \n \r \t \v` and the conversions
//! `%s %c %d %i %u %o %x %X %%`. As POSIX requires, the format is reused
//! until all operands are consumed.

use crate::common::failure;
use marsh_env::builtin::Result;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::Env;

/// Entry point of the `printf` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let Some(format) = args.get(1) else {
        return failure(env, "printf", "missing format operand");
    };
    let format = format.value.clone();
    let operands: Vec<String> = args[2..].iter().map(|f| f.value.clone()).collect();

    let mut output = String::new();
    let mut next_operand = 0;
    let mut bad_number = false;

    loop {
        let consumed_before = next_operand;
        format_once(
            &format,
            &operands,
            &mut next_operand,
            &mut output,
            &mut bad_number,
        );
        // Reuse the format only while it consumes operands
        if next_operand >= operands.len() || next_operand == consumed_before {
            break;
        }
    }

    env.stdout.push_str(&output);
    if bad_number {
        return failure(env, "printf", "invalid number");
    }
    Result::new(ExitStatus::SUCCESS)
}

/// Applies the format once.
fn format_once(
    format: &str,
    operands: &[String],
    next_operand: &mut usize,
    output: &mut String,
    bad_number: &mut bool,
) {
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\\') => output.push('\\'),
                Some('a') => output.push('\x07'),
                Some('b') => output.push('\x08'),
                Some('f') => output.push('\x0c'),
                Some('n') => output.push('\n'),
                Some('r') => output.push('\r'),
                Some('t') => output.push('\t'),
                Some('v') => output.push('\x0b'),
                Some(other) => {
                    output.push('\\');
                    output.push(other);
                }
                None => output.push('\\'),
            },
            '%' => match chars.next() {
                Some('%') => output.push('%'),
                Some('s') => output.push_str(&take(operands, next_operand)),
                Some('c') => {
                    if let Some(c) = take(operands, next_operand).chars().next() {
                        output.push(c);
                    }
                }
                Some(conversion @ ('d' | 'i' | 'u' | 'o' | 'x' | 'X')) => {
                    let operand = take(operands, next_operand);
                    let number = parse_integer(&operand);
                    match number {
                        Some(number) => {
                            let formatted = match conversion {
                                'o' => format!("{number:o}"),
                                'x' => format!("{number:x}"),
                                'X' => format!("{number:X}"),
                                _ => number.to_string(),
                            };
                            output.push_str(&formatted);
                        }
                        None => {
                            *bad_number = true;
                            output.push('0');
                        }
                    }
                }
                Some(other) => {
                    output.push('%');
                    output.push(other);
                }
                None => output.push('%'),
            },
            c => output.push(c),
        }
    }
}

/// Takes the next operand, or an empty string when exhausted.
fn take(operands: &[String], next: &mut usize) -> String {
    let value = operands.get(*next).cloned().unwrap_or_default();
    *next += 1;
    value
}

/// Parses an integer operand in C constant syntax; empty counts as zero.
fn parse_integer(operand: &str) -> Option<i64> {
    let trimmed = operand.trim();
    if trimmed.is_empty() {
        return Some(0);
    }
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}
