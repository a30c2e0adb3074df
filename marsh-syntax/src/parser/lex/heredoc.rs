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

//! Here-document content reader

use super::core::Lexer;
use crate::parser::error::SyntaxError;
use crate::parser::Result;

impl Lexer<'_> {
    /// Reads a here-document body.
    ///
    /// Input is consumed up to and including a line equal to `delimiter`.
    /// With `remove_tabs` (the `<<-` operator), leading tab characters are
    /// stripped from every content line and from the line compared against
    /// the delimiter.
    ///
    /// The returned body ends with a newline unless it is empty. No quote
    /// or expansion processing happens here; lines are taken literally.
    pub fn read_heredoc_body(&mut self, delimiter: &str, remove_tabs: bool) -> Result<String> {
        let mut content = String::new();
        loop {
            if self.peek_char().is_none() {
                return Err(self.error(SyntaxError::UnclosedHereDocContent {
                    delimiter: delimiter.to_owned(),
                }));
            }
            let mut line = String::new();
            while let Some(c) = self.next_char() {
                if c == '\n' {
                    break;
                }
                line.push(c);
            }
            let line = if remove_tabs {
                line.trim_start_matches('\t')
            } else {
                &line[..]
            };
            if line == delimiter {
                return Ok(content);
            }
            content.push_str(line);
            content.push('\n');
        }
    }
}
