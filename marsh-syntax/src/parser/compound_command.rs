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

//! Parsing of compound commands

use super::core::Parser;
use super::lex::{Keyword, Operator, TokenKind};
use super::simple_command::is_name;
use super::Result;
use crate::syntax::{
    CaseItem, CompoundCommand, ElifThen, FullCompoundCommand, List, Word,
};

impl Parser<'_> {
    /// Parses a compound command with its trailing redirections.
    pub(super) fn full_compound_command(&mut self) -> Result<FullCompoundCommand> {
        let line = self.peek()?.line;
        let command = self.compound_command()?;
        let redirs = self.redirections()?;
        Ok(FullCompoundCommand {
            command,
            redirs,
            line,
        })
    }

    fn compound_command(&mut self) -> Result<CompoundCommand> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Operator(Operator::OpenParen) => self.subshell(),
            TokenKind::Keyword(Keyword::OpenBrace) => self.grouping(),
            TokenKind::Keyword(Keyword::If) => self.if_command(),
            TokenKind::Keyword(Keyword::While) => self.while_or_until(true),
            TokenKind::Keyword(Keyword::Until) => self.while_or_until(false),
            TokenKind::Keyword(Keyword::For) => self.for_command(),
            TokenKind::Keyword(Keyword::Case) => self.case_command(),
            _ => Err(Self::unexpected(token)),
        }
    }

    /// Parses a compound list and requires it to contain at least one
    /// command.
    fn nonempty_compound_list(&mut self) -> Result<List> {
        let list = self.compound_list()?;
        if list.0.is_empty() {
            let token = self.peek()?;
            Err(Self::unexpected(token))
        } else {
            Ok(list)
        }
    }

    fn subshell(&mut self) -> Result<CompoundCommand> {
        self.take()?; // `(`
        let body = self.nonempty_compound_list()?;
        self.expect_operator(Operator::CloseParen)?;
        Ok(CompoundCommand::Subshell(body))
    }

    fn grouping(&mut self) -> Result<CompoundCommand> {
        self.take()?; // `{`
        let body = self.nonempty_compound_list()?;
        self.expect_keyword(Keyword::CloseBrace)?;
        Ok(CompoundCommand::Grouping(body))
    }

    fn if_command(&mut self) -> Result<CompoundCommand> {
        self.take()?; // `if`
        let condition = self.nonempty_compound_list()?;
        self.expect_keyword(Keyword::Then)?;
        let body = self.nonempty_compound_list()?;

        let mut elifs = Vec::new();
        while self.peek()?.is_keyword(Keyword::Elif) {
            self.take()?;
            let condition = self.nonempty_compound_list()?;
            self.expect_keyword(Keyword::Then)?;
            let body = self.nonempty_compound_list()?;
            elifs.push(ElifThen { condition, body });
        }

        let r#else = if self.peek()?.is_keyword(Keyword::Else) {
            self.take()?;
            Some(self.nonempty_compound_list()?)
        } else {
            None
        };

        self.expect_keyword(Keyword::Fi)?;
        Ok(CompoundCommand::If {
            condition,
            body,
            elifs,
            r#else,
        })
    }

    fn while_or_until(&mut self, is_while: bool) -> Result<CompoundCommand> {
        self.take()?; // `while` or `until`
        let condition = self.nonempty_compound_list()?;
        let body = self.do_group()?;
        Ok(if is_while {
            CompoundCommand::While { condition, body }
        } else {
            CompoundCommand::Until { condition, body }
        })
    }

    fn do_group(&mut self) -> Result<List> {
        self.expect_keyword(Keyword::Do)?;
        let body = self.nonempty_compound_list()?;
        self.expect_keyword(Keyword::Done)?;
        Ok(body)
    }

    fn for_command(&mut self) -> Result<CompoundCommand> {
        self.take()?; // `for`

        let token = self.peek()?;
        let name_ok = matches!(token.kind, TokenKind::Word | TokenKind::Keyword(_))
            && is_name(&token.text);
        if !name_ok {
            return Err(Self::expectation_error("identifier", token));
        }
        let name = self.take()?.text;

        self.linebreak()?;
        let values = if self.peek()?.is_keyword(Keyword::In) {
            self.take()?;
            let mut values = Vec::new();
            loop {
                let token = self.peek()?;
                match token.kind {
                    TokenKind::Word | TokenKind::IoNumber | TokenKind::Keyword(_) => {
                        values.push(self.take_word()?);
                    }
                    TokenKind::Operator(Operator::Semicolon) => {
                        self.take()?;
                        break;
                    }
                    TokenKind::Newline => break,
                    _ => return Err(Self::unexpected(token)),
                }
            }
            self.linebreak()?;
            Some(values)
        } else {
            if self.peek()?.is_operator(Operator::Semicolon) {
                self.take()?;
            }
            self.linebreak()?;
            None
        };

        let body = self.do_group()?;
        Ok(CompoundCommand::For { name, values, body })
    }

    fn case_command(&mut self) -> Result<CompoundCommand> {
        self.take()?; // `case`

        let token = self.peek()?;
        let subject = match token.kind {
            TokenKind::Word | TokenKind::IoNumber | TokenKind::Keyword(_) => self.take_word()?,
            _ => return Err(Self::expectation_error("word", token)),
        };

        self.linebreak()?;
        self.expect_keyword(Keyword::In)?;
        self.linebreak()?;

        let mut items = Vec::new();
        loop {
            if self.peek()?.is_keyword(Keyword::Esac) {
                self.take()?;
                break;
            }
            items.push(self.case_item()?);
        }
        Ok(CompoundCommand::Case { subject, items })
    }

    fn case_item(&mut self) -> Result<CaseItem> {
        if self.peek()?.is_operator(Operator::OpenParen) {
            self.take()?;
        }

        let mut patterns = vec![self.case_pattern()?];
        while self.peek()?.is_operator(Operator::Bar) {
            self.take()?;
            patterns.push(self.case_pattern()?);
        }
        self.expect_operator(Operator::CloseParen)?;

        let body = self.compound_list()?;

        let token = self.peek()?;
        match token.kind {
            TokenKind::Operator(Operator::SemicolonSemicolon) => {
                self.take()?;
                self.linebreak()?;
            }
            // The last item may omit the `;;`
            TokenKind::Keyword(Keyword::Esac) => {}
            _ => return Err(Self::expectation_error(";;", token)),
        }
        Ok(CaseItem { patterns, body })
    }

    fn case_pattern(&mut self) -> Result<Word> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Word | TokenKind::IoNumber | TokenKind::Keyword(_) => self.take_word(),
            _ => Err(Self::expectation_error("pattern", token)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SyntaxError;
    use crate::syntax::Command;
    use assert_matches::assert_matches;

    fn parse_compound(source: &str) -> CompoundCommand {
        let list = Parser::new(source)
            .program()
            .unwrap_or_else(|e| panic!("parse error in {source:?}: {e}"));
        assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Compound(full) => full.command.clone()
        )
    }

    #[test]
    fn if_with_elif_and_else() {
        let command = parse_compound("if a; then b; elif c; then d; elif e; then f; else g; fi");
        assert_matches!(command, CompoundCommand::If { elifs, r#else, .. } => {
            assert_eq!(elifs.len(), 2);
            assert!(r#else.is_some());
        });
    }

    #[test]
    fn if_without_else() {
        let command = parse_compound("if a; then b; fi");
        assert_matches!(command, CompoundCommand::If { elifs, r#else, .. } => {
            assert!(elifs.is_empty());
            assert!(r#else.is_none());
        });
    }

    #[test]
    fn while_and_until_loops() {
        assert_matches!(
            parse_compound("while a; do b; done"),
            CompoundCommand::While { .. }
        );
        assert_matches!(
            parse_compound("until a\ndo b\ndone"),
            CompoundCommand::Until { .. }
        );
    }

    #[test]
    fn for_with_word_list() {
        let command = parse_compound("for x in a b c; do echo $x; done");
        assert_matches!(command, CompoundCommand::For { name, values, .. } => {
            assert_eq!(name, "x");
            let values: Vec<_> = values.unwrap().iter().map(|w| w.text.clone()).collect();
            assert_eq!(values, ["a", "b", "c"]);
        });
    }

    #[test]
    fn for_with_empty_word_list() {
        let command = parse_compound("for x in ; do echo $x; done");
        assert_matches!(command, CompoundCommand::For { values, .. } => {
            assert_eq!(values, Some(Vec::new()));
        });
    }

    #[test]
    fn for_without_in_iterates_positional_parameters() {
        let command = parse_compound("for x do echo $x; done");
        assert_matches!(command, CompoundCommand::For { values, .. } => {
            assert_eq!(values, None);
        });
        let command = parse_compound("for x; do echo $x; done");
        assert_matches!(command, CompoundCommand::For { values, .. } => {
            assert_eq!(values, None);
        });
    }

    #[test]
    fn for_with_newline_separated_word_list() {
        let command = parse_compound("for x in a b\ndo echo $x; done");
        assert_matches!(command, CompoundCommand::For { values, .. } => {
            assert_eq!(values.unwrap().len(), 2);
        });
    }

    #[test]
    fn case_items() {
        let command = parse_compound("case $x in bar) echo B;; f*|g?) echo F;; *) ;; esac");
        assert_matches!(command, CompoundCommand::Case { items, .. } => {
            assert_eq!(items.len(), 3);
            assert_eq!(items[0].patterns[0].text, "bar");
            let second: Vec<_> = items[1].patterns.iter().map(|w| w.text.clone()).collect();
            assert_eq!(second, ["f*", "g?"]);
            assert!(items[2].body.0.is_empty());
        });
    }

    #[test]
    fn case_with_open_paren_patterns() {
        let command = parse_compound("case x in (a) echo A;; (b) echo B;; esac");
        assert_matches!(command, CompoundCommand::Case { items, .. } => {
            assert_eq!(items.len(), 2);
        });
    }

    #[test]
    fn case_last_item_may_omit_dsemi() {
        let command = parse_compound("case x in a) echo A\nesac");
        assert_matches!(command, CompoundCommand::Case { items, .. } => {
            assert_eq!(items.len(), 1);
        });
    }

    #[test]
    fn case_with_no_items() {
        let command = parse_compound("case x in esac");
        assert_matches!(command, CompoundCommand::Case { items, .. } => {
            assert!(items.is_empty());
        });
    }

    #[test]
    fn empty_group_is_an_error() {
        let error = Parser::new("{ }").program().unwrap_err();
        assert_matches!(error.cause, SyntaxError::UnexpectedToken { .. });
    }

    #[test]
    fn unterminated_if_reports_premature_eof() {
        let error = Parser::new("if a; then b;").program().unwrap_err();
        assert_eq!(error.cause, SyntaxError::UnexpectedEof);
        assert!(error.is_premature_eof());
    }

    #[test]
    fn missing_then_is_an_error() {
        let error = Parser::new("if a; fi").program().unwrap_err();
        assert_matches!(error.cause, SyntaxError::ExpectedToken { expected, found } => {
            assert_eq!(expected, "then");
            assert_eq!(found, "fi");
        });
    }

    #[test]
    fn redirections_after_compound_command() {
        let list = Parser::new("{ a; } >out 2>&1").program().unwrap();
        assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Compound(full) => assert_eq!(full.redirs.len(), 2)
        );
    }
}
