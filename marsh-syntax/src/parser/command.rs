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

//! Parsing of a single pipeline element

use super::core::Parser;
use super::lex::{Keyword, Operator, TokenKind};
use super::Result;
use crate::syntax::{Command, FunctionDefinition};
use std::rc::Rc;

impl Parser<'_> {
    /// Parses one element of a pipeline: a compound command with optional
    /// redirections, a function definition, or a simple command.
    pub(super) fn command(&mut self) -> Result<Command> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Keyword(
                Keyword::If
                | Keyword::While
                | Keyword::Until
                | Keyword::For
                | Keyword::Case
                | Keyword::OpenBrace,
            )
            | TokenKind::Operator(Operator::OpenParen) => {
                Ok(Command::Compound(self.full_compound_command()?))
            }
            TokenKind::Keyword(Keyword::Function) => self.function_with_keyword(),
            TokenKind::Keyword(keyword) if keyword.is_clause_delimiter() => {
                Err(Self::unexpected(token))
            }
            TokenKind::Keyword(Keyword::Bang | Keyword::In) => Err(Self::unexpected(token)),
            _ => self.simple_command(),
        }
    }

    /// Parses a function definition of the non-portable form
    /// `function name compound-command`, with optional `()` after the name.
    fn function_with_keyword(&mut self) -> Result<Command> {
        let keyword = self.take()?;
        let token = self.peek()?;
        if token.kind != TokenKind::Word || !super::simple_command::is_name(&token.text) {
            return Err(Self::expectation_error("function name", token));
        }
        let name = self.take()?;
        if self.peek()?.is_operator(Operator::OpenParen) {
            self.take()?;
            self.expect_operator(Operator::CloseParen)?;
        }
        self.linebreak()?;
        self.require_compound_start()?;
        let body = self.full_compound_command()?;
        Ok(Command::Function(FunctionDefinition {
            name: name.text,
            body: Rc::new(body),
            line: keyword.line,
        }))
    }

    /// Fails unless the next token can start a compound command.
    pub(super) fn require_compound_start(&mut self) -> Result<()> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Keyword(
                Keyword::If
                | Keyword::While
                | Keyword::Until
                | Keyword::For
                | Keyword::Case
                | Keyword::OpenBrace,
            )
            | TokenKind::Operator(Operator::OpenParen) => Ok(()),
            _ => Err(Self::expectation_error("compound command", token)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SyntaxError;
    use crate::syntax::CompoundCommand;
    use assert_matches::assert_matches;

    fn parse_command(source: &str) -> Command {
        let list = Parser::new(source)
            .program()
            .unwrap_or_else(|e| panic!("parse error in {source:?}: {e}"));
        let command = &list.0[0].and_or.first.commands[0];
        (**command).clone()
    }

    #[test]
    fn function_definition_posix_form() {
        let command = parse_command("f() { echo hi; }");
        assert_matches!(command, Command::Function(definition) => {
            assert_eq!(definition.name, "f");
            assert_matches!(
                definition.body.command,
                CompoundCommand::Grouping(_)
            );
        });
    }

    #[test]
    fn function_definition_keyword_form() {
        let command = parse_command("function f { echo hi; }");
        assert_matches!(command, Command::Function(definition) => {
            assert_eq!(definition.name, "f");
        });

        let command = parse_command("function f() (echo hi)");
        assert_matches!(command, Command::Function(definition) => {
            assert_eq!(definition.name, "f");
            assert_matches!(
                definition.body.command,
                CompoundCommand::Subshell(_)
            );
        });
    }

    #[test]
    fn function_body_with_redirections() {
        let command = parse_command("f() { echo hi; } >log 2>&1");
        assert_matches!(command, Command::Function(definition) => {
            assert_eq!(definition.body.redirs.len(), 2);
        });
    }

    #[test]
    fn function_body_must_be_compound() {
        let error = Parser::new("f() echo hi").program().unwrap_err();
        assert_matches!(error.cause, SyntaxError::ExpectedToken { expected, .. } => {
            assert_eq!(expected, "compound command");
        });
    }

    #[test]
    fn subshell_as_pipeline_element() {
        let command = parse_command("(a; b)");
        assert_matches!(command, Command::Compound(compound) => {
            assert_matches!(compound.command, CompoundCommand::Subshell(list) => {
                assert_eq!(list.0.len(), 2);
            });
        });
    }
}
