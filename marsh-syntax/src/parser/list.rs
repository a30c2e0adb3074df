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

//! Parsing of lists, and-or lists, and pipelines

use super::core::{starts_command, Parser};
use super::lex::{Keyword, Operator, TokenKind};
use super::Result;
use crate::syntax::{AndOr, AndOrList, Item, List, Pipeline};
use std::rc::Rc;

impl Parser<'_> {
    /// Consumes any number of newline tokens.
    ///
    /// Pending here-document contents are read at each newline.
    pub(super) fn linebreak(&mut self) -> Result<()> {
        while self.peek()?.kind == TokenKind::Newline {
            self.take()?;
            self.read_pending_heredocs()?;
        }
        Ok(())
    }

    /// Parses the body of a compound command: and-or lists separated by
    /// `;`, `&`, or newlines.
    ///
    /// Parsing stops (without consuming the token) at the first token that
    /// cannot begin a command, such as `fi`, `done`, `;;`, or `)`. The
    /// caller checks that the terminating token is the one it expects.
    pub(super) fn compound_list(&mut self) -> Result<List> {
        let mut items = Vec::new();
        loop {
            self.linebreak()?;
            let token = self.peek()?;
            if !starts_command(token.kind) {
                break;
            }
            let line = token.line;
            let and_or = Rc::new(self.and_or_list()?);
            let mut is_async = false;
            match self.peek()?.kind {
                TokenKind::Operator(Operator::Semicolon) => {
                    self.take()?;
                }
                TokenKind::Operator(Operator::And) => {
                    self.take()?;
                    is_async = true;
                }
                _ => {}
            }
            items.push(Item {
                and_or,
                is_async,
                line,
            });
        }
        Ok(List(items))
    }

    /// Parses pipelines separated by `&&` and `||`.
    pub(super) fn and_or_list(&mut self) -> Result<AndOrList> {
        let first = self.pipeline()?;
        let mut rest = Vec::new();
        loop {
            let and_or = match self.peek()?.kind {
                TokenKind::Operator(Operator::AndAnd) => AndOr::AndThen,
                TokenKind::Operator(Operator::BarBar) => AndOr::OrElse,
                _ => break,
            };
            self.take()?;
            self.linebreak()?;
            rest.push((and_or, self.pipeline()?));
        }
        Ok(AndOrList { first, rest })
    }

    /// Parses commands separated by `|`, with an optional leading `!`.
    pub(super) fn pipeline(&mut self) -> Result<Pipeline> {
        let negation = if self.peek()?.is_keyword(Keyword::Bang) {
            self.take()?;
            true
        } else {
            false
        };
        let mut commands = vec![Rc::new(self.command()?)];
        while self.peek()?.is_operator(Operator::Bar) {
            self.take()?;
            self.linebreak()?;
            commands.push(Rc::new(self.command()?));
        }
        Ok(Pipeline { commands, negation })
    }

    /// Parses one logical line of input.
    ///
    /// The line's terminating newline is consumed and any here-document
    /// contents are read past it. Returns `None` at the end of input.
    ///
    /// An empty line parses into `Some` empty list.
    pub fn command_line(&mut self) -> Result<Option<List>> {
        let mut items = Vec::new();
        loop {
            let token = self.peek()?;
            let line = token.line;
            match token.kind {
                TokenKind::Eof => {
                    // Errors out if a here-document is still missing its
                    // contents
                    self.read_pending_heredocs()?;
                    return Ok(if items.is_empty() {
                        None
                    } else {
                        Some(List(items))
                    });
                }
                TokenKind::Newline => {
                    self.take()?;
                    self.read_pending_heredocs()?;
                    return Ok(Some(List(items)));
                }
                kind if starts_command(kind) => {
                    let and_or = Rc::new(self.and_or_list()?);
                    let mut is_async = false;
                    match self.peek()?.kind {
                        TokenKind::Operator(Operator::Semicolon) => {
                            self.take()?;
                        }
                        TokenKind::Operator(Operator::And) => {
                            self.take()?;
                            is_async = true;
                        }
                        TokenKind::Newline | TokenKind::Eof => {}
                        _ => {
                            let token = self.peek()?;
                            return Err(Self::unexpected(token));
                        }
                    }
                    items.push(Item {
                        and_or,
                        is_async,
                        line,
                    });
                }
                _ => return Err(Self::unexpected(token)),
            }
        }
    }

    /// Parses a whole program, up to the end of input.
    pub fn program(&mut self) -> Result<List> {
        let mut list = List::default();
        while let Some(mut line) = self.command_line()? {
            list.0.append(&mut line.0);
        }
        Ok(list)
    }
}
