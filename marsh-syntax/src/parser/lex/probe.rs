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

//! Incomplete-input probe
//!
//! An interactive reader collects input line by line. Before handing a
//! buffer to the parser, it asks [`probe_incomplete`] whether the buffer
//! obviously wants more input, so it can print a continuation prompt
//! instead of reporting a syntax error in the middle of a quoted string.

/// Classification of a whole input buffer
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProbeResult {
    /// The buffer may be parsed as is.
    Complete,
    /// A single-quoted string is still open.
    UnclosedSingleQuote,
    /// A double-quoted string is still open.
    UnclosedDoubleQuote,
    /// The buffer ends in a line continuation.
    BackslashContinuation,
}

/// Scans a buffer for obviously incomplete input.
///
/// The probe tracks quoting and comments only; it does not parse. A buffer
/// that is `Complete` can still fail to parse (for example, an unterminated
/// `if`), which the parser reports separately.
#[must_use]
pub fn probe_incomplete(buffer: &str) -> ProbeResult {
    #[derive(Clone, Copy, Eq, PartialEq)]
    enum State {
        Normal,
        SingleQuote,
        DoubleQuote,
    }
    use State::*;

    let mut state = Normal;
    let mut escape = false;
    let mut comment = false;
    // Whether a `#` here would start a comment
    let mut word_break = true;
    // Whether the last consumed characters were a line continuation
    let mut continued = false;

    for c in buffer.chars() {
        if comment {
            if c == '\n' {
                comment = false;
                word_break = true;
            }
            continue;
        }
        if escape {
            escape = false;
            continued = c == '\n';
            word_break = false;
            continue;
        }
        continued = false;
        match state {
            Normal => match c {
                '\\' => escape = true,
                '\'' => {
                    state = SingleQuote;
                    word_break = false;
                }
                '"' => {
                    state = DoubleQuote;
                    word_break = false;
                }
                '#' if word_break => comment = true,
                ' ' | '\t' | '\n' | ';' | '&' | '|' | '<' | '>' | '(' | ')' => word_break = true,
                _ => word_break = false,
            },
            SingleQuote => {
                if c == '\'' {
                    state = Normal;
                }
            }
            DoubleQuote => match c {
                '\\' => escape = true,
                '"' => state = Normal,
                _ => {}
            },
        }
    }

    match state {
        SingleQuote => ProbeResult::UnclosedSingleQuote,
        DoubleQuote => ProbeResult::UnclosedDoubleQuote,
        Normal if escape || continued => ProbeResult::BackslashContinuation,
        Normal => ProbeResult::Complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProbeResult::*;

    #[test]
    fn complete_buffers() {
        assert_eq!(probe_incomplete(""), Complete);
        assert_eq!(probe_incomplete("echo hello\n"), Complete);
        assert_eq!(probe_incomplete("echo 'done'\n"), Complete);
        assert_eq!(probe_incomplete("echo \"done\"\n"), Complete);
        assert_eq!(probe_incomplete("echo a\\ b\n"), Complete);
    }

    #[test]
    fn unclosed_quotes() {
        assert_eq!(probe_incomplete("echo 'open\n"), UnclosedSingleQuote);
        assert_eq!(probe_incomplete("echo \"open\n"), UnclosedDoubleQuote);
        assert_eq!(probe_incomplete("echo \"it's\n"), UnclosedDoubleQuote);
    }

    #[test]
    fn backslash_continuation() {
        assert_eq!(probe_incomplete("echo \\"), BackslashContinuation);
        assert_eq!(probe_incomplete("echo \\\n"), BackslashContinuation);
    }

    #[test]
    fn continuation_followed_by_more_input_is_complete() {
        assert_eq!(probe_incomplete("echo \\\nhi\n"), Complete);
    }

    #[test]
    fn quotes_in_comments_do_not_count() {
        assert_eq!(probe_incomplete("# don't\n"), Complete);
        assert_eq!(probe_incomplete("echo hi # \"open\n"), Complete);
    }

    #[test]
    fn escaped_quote_does_not_open_a_string() {
        assert_eq!(probe_incomplete("echo \\'\n"), Complete);
    }

    #[test]
    fn quote_closed_across_lines() {
        assert_eq!(probe_incomplete("echo 'a\nb'\n"), Complete);
    }
}
