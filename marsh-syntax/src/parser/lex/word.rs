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

//! Part of the lexer that accumulates words
//!
//! A word runs until an unquoted blank, newline, or operator character.
//! Quoted regions and the `$`-introduced expansion forms are copied into
//! the token text verbatim so the word expander can interpret them later;
//! the lexer only tracks enough structure to know where the word ends.

use super::core::{Lexer, Token, TokenKind};
use super::keyword::Keyword;
use super::op::is_operator_start;
use crate::parser::error::SyntaxError;
use crate::parser::Result;

impl Lexer<'_> {
    /// Reads a word token.
    pub(super) fn word_token(&mut self, line: u64) -> Result<Token> {
        let mut text = String::new();
        loop {
            let Some(c) = self.peek_char() else { break };
            match c {
                ' ' | '\t' | '\n' => break,
                c if is_operator_start(c) => break,
                '\\' => {
                    self.next_char();
                    match self.peek_char() {
                        // Line continuation: both characters vanish
                        Some('\n') => {
                            self.next_char();
                        }
                        Some(c) => {
                            text.push('\\');
                            text.push(c);
                            self.next_char();
                        }
                        None => text.push('\\'),
                    }
                }
                '\'' => {
                    self.next_char();
                    text.push('\'');
                    self.single_quote_span(&mut text)?;
                }
                '"' => {
                    self.next_char();
                    text.push('"');
                    self.double_quote_span(&mut text)?;
                }
                '`' => {
                    self.next_char();
                    text.push('`');
                    self.backquote_span(&mut text)?;
                }
                '$' => {
                    self.next_char();
                    text.push('$');
                    self.dollar_span(&mut text)?;
                }
                _ => {
                    text.push(c);
                    self.next_char();
                }
            }
        }

        let kind = if !text.is_empty()
            && text.bytes().all(|b| b.is_ascii_digit())
            && matches!(self.peek_char(), Some('<' | '>'))
        {
            TokenKind::IoNumber
        } else if let Ok(keyword) = text.parse::<Keyword>() {
            TokenKind::Keyword(keyword)
        } else {
            TokenKind::Word
        };
        Ok(Token { kind, text, line })
    }

    /// Copies characters up to and including the closing `'`.
    ///
    /// Single quotes preserve everything literally; there are no escapes.
    fn single_quote_span(&mut self, text: &mut String) -> Result<()> {
        loop {
            match self.next_char() {
                Some('\'') => {
                    text.push('\'');
                    return Ok(());
                }
                Some(c) => text.push(c),
                None => return Err(self.error(SyntaxError::UnclosedSingleQuote)),
            }
        }
    }

    /// Copies characters up to and including the closing `"`.
    ///
    /// Backslash-newline is a line continuation and vanishes. Any other
    /// backslash pair, and embedded command substitutions, backquotes, and
    /// parameter expansions, are carried through verbatim.
    fn double_quote_span(&mut self, text: &mut String) -> Result<()> {
        loop {
            match self.next_char() {
                Some('"') => {
                    text.push('"');
                    return Ok(());
                }
                Some('\\') => match self.peek_char() {
                    Some('\n') => {
                        self.next_char();
                    }
                    Some(c) => {
                        text.push('\\');
                        text.push(c);
                        self.next_char();
                    }
                    None => return Err(self.error(SyntaxError::UnclosedDoubleQuote)),
                },
                Some('`') => {
                    text.push('`');
                    self.backquote_span(text)?;
                }
                Some('$') => {
                    text.push('$');
                    self.dollar_span(text)?;
                }
                Some(c) => text.push(c),
                None => return Err(self.error(SyntaxError::UnclosedDoubleQuote)),
            }
        }
    }

    /// Copies characters up to and including the closing `` ` ``.
    ///
    /// A backslash keeps the following character from closing the span, so
    /// `` \` `` is carried through as an escaped backquote.
    fn backquote_span(&mut self, text: &mut String) -> Result<()> {
        loop {
            match self.next_char() {
                Some('`') => {
                    text.push('`');
                    return Ok(());
                }
                Some('\\') => {
                    text.push('\\');
                    if let Some(c) = self.next_char() {
                        text.push(c);
                    }
                }
                Some(c) => text.push(c),
                None => return Err(self.error(SyntaxError::UnclosedBackquote)),
            }
        }
    }

    /// Copies the rest of a `$(...)` or `${...}` region after the `$`.
    ///
    /// A plain `$` followed by anything else needs no copying here; the
    /// following characters are ordinary word characters.
    pub(super) fn dollar_span(&mut self, text: &mut String) -> Result<()> {
        match self.peek_char() {
            Some('(') => {
                self.next_char();
                text.push('(');
                self.command_subst_span(text)
            }
            Some('{') => {
                self.next_char();
                text.push('{');
                self.braced_param_span(text)
            }
            _ => Ok(()),
        }
    }

    /// Copies a `$(...)` body up to the matching `)`.
    ///
    /// Nesting is tracked by parenthesis depth, with quoted regions carried
    /// through so a quoted `)` does not close the substitution. `$((...))`
    /// needs no special case: the depth count closes both parentheses.
    fn command_subst_span(&mut self, text: &mut String) -> Result<()> {
        let mut depth: u32 = 1;
        loop {
            match self.next_char() {
                Some('(') => {
                    text.push('(');
                    depth += 1;
                }
                Some(')') => {
                    text.push(')');
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some('\\') => {
                    text.push('\\');
                    if let Some(c) = self.next_char() {
                        text.push(c);
                    }
                }
                Some('\'') => {
                    text.push('\'');
                    self.single_quote_span(text)?;
                }
                Some('"') => {
                    text.push('"');
                    self.double_quote_span(text)?;
                }
                Some('`') => {
                    text.push('`');
                    self.backquote_span(text)?;
                }
                Some(c) => text.push(c),
                None => {
                    return Err(self.error(SyntaxError::UnclosedCommandSubstitution));
                }
            }
        }
    }

    /// Copies a `${...}` body up to the matching `}`, respecting nested
    /// quotes and nested expansions.
    fn braced_param_span(&mut self, text: &mut String) -> Result<()> {
        let mut depth: u32 = 1;
        loop {
            match self.next_char() {
                Some('{') => {
                    text.push('{');
                    depth += 1;
                }
                Some('}') => {
                    text.push('}');
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some('\\') => {
                    text.push('\\');
                    if let Some(c) = self.next_char() {
                        text.push(c);
                    }
                }
                Some('\'') => {
                    text.push('\'');
                    self.single_quote_span(text)?;
                }
                Some('"') => {
                    text.push('"');
                    self.double_quote_span(text)?;
                }
                Some('`') => {
                    text.push('`');
                    self.backquote_span(text)?;
                }
                Some('$') => {
                    text.push('$');
                    self.dollar_span(text)?;
                }
                Some(c) => text.push(c),
                None => return Err(self.error(SyntaxError::UnclosedParam)),
            }
        }
    }
}
