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

//! Parsing of redirections

use super::core::Parser;
use super::error::{Error, SyntaxError};
use super::lex::{Operator, TokenKind};
use super::Result;
use crate::syntax::{HereDoc, Redir, RedirBody, RedirOp};
use std::cell::OnceCell;
use std::rc::Rc;

impl Parser<'_> {
    /// Parses any number of redirections.
    pub(super) fn redirections(&mut self) -> Result<Vec<Redir>> {
        let mut redirs = Vec::new();
        loop {
            let kind = self.peek()?.kind;
            let is_redir = kind == TokenKind::IoNumber
                || matches!(kind, TokenKind::Operator(op) if op.is_redirection());
            if !is_redir {
                return Ok(redirs);
            }
            redirs.push(self.redirection()?);
        }
    }

    /// Parses one redirection: an optional IO number, an operator, and an
    /// operand (or here-document delimiter).
    pub(super) fn redirection(&mut self) -> Result<Redir> {
        let fd = if self.peek()?.kind == TokenKind::IoNumber {
            let token = self.take()?;
            match token.text.parse() {
                Ok(fd) => Some(fd),
                Err(_) => {
                    return Err(Error {
                        cause: SyntaxError::UnexpectedToken { token: token.text },
                        line: token.line,
                    });
                }
            }
        } else {
            None
        };

        let token = self.take()?;
        let TokenKind::Operator(operator) = token.kind else {
            return Err(Self::unexpected(&token));
        };

        use Operator::*;
        let body = match operator {
            LessLess | LessLessDash => {
                let remove_tabs = operator == LessLessDash;
                let kind = self.peek()?.kind;
                if !matches!(
                    kind,
                    TokenKind::Word | TokenKind::IoNumber | TokenKind::Keyword(_)
                ) {
                    return Err(Error {
                        cause: SyntaxError::MissingHereDocDelimiter,
                        line: token.line,
                    });
                }
                let delimiter = self.take_word()?;
                let (delimiter_unquoted, quoted) = unquote(&delimiter.text);
                let here_doc = Rc::new(HereDoc {
                    delimiter,
                    delimiter_unquoted,
                    quoted,
                    remove_tabs,
                    content: OnceCell::new(),
                });
                self.defer_heredoc(Rc::clone(&here_doc));
                RedirBody::HereDoc(here_doc)
            }
            _ => {
                let redir_op = match operator {
                    Less => RedirOp::FileIn,
                    LessGreater => RedirOp::FileInOut,
                    Greater => RedirOp::FileOut,
                    GreaterGreater => RedirOp::FileAppend,
                    GreaterBar => RedirOp::FileClobber,
                    LessAnd => RedirOp::FdIn,
                    GreaterAnd => RedirOp::FdOut,
                    _ => return Err(Self::unexpected(&token)),
                };
                let peeked = self.peek()?;
                if !matches!(
                    peeked.kind,
                    TokenKind::Word | TokenKind::IoNumber | TokenKind::Keyword(_)
                ) {
                    return Err(Self::expectation_error("word", peeked));
                }
                let operand = self.take_word()?;
                RedirBody::Normal {
                    operator: redir_op,
                    operand,
                }
            }
        };
        Ok(Redir { fd, body })
    }
}

/// Performs quote removal on a here-document delimiter.
///
/// Returns the unquoted delimiter and whether any part of it was quoted.
/// A quoted delimiter makes the here-document content literal.
fn unquote(text: &str) -> (String, bool) {
    let mut result = String::new();
    let mut quoted = false;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                quoted = true;
                if let Some(c) = chars.next() {
                    result.push(c);
                }
            }
            '\'' => {
                quoted = true;
                for c in chars.by_ref() {
                    if c == '\'' {
                        break;
                    }
                    result.push(c);
                }
            }
            '"' => {
                quoted = true;
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => match chars.next() {
                            Some(c2 @ ('$' | '`' | '"' | '\\')) => result.push(c2),
                            Some(c2) => {
                                result.push('\\');
                                result.push(c2);
                            }
                            None => result.push('\\'),
                        },
                        _ => result.push(c),
                    }
                }
            }
            _ => result.push(c),
        }
    }
    (result, quoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SyntaxError;
    use crate::syntax::Command;
    use assert_matches::assert_matches;

    fn parse_redirs(source: &str) -> Vec<Redir> {
        let list = Parser::new(source)
            .program()
            .unwrap_or_else(|e| panic!("parse error in {source:?}: {e}"));
        assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Simple(simple) => simple.redirs.clone()
        )
    }

    #[test]
    fn default_file_descriptors() {
        let redirs = parse_redirs("cmd <in >out >>app <&3 >&4 <>rw >|clob");
        let defaults: Vec<_> = redirs.iter().map(Redir::fd_or_default).collect();
        assert_eq!(defaults, [0, 1, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn explicit_io_numbers() {
        let redirs = parse_redirs("cmd 2>err 0<in 10>&1");
        assert_eq!(redirs[0].fd, Some(2));
        assert_eq!(redirs[1].fd, Some(0));
        assert_eq!(redirs[2].fd, Some(10));
    }

    #[test]
    fn operand_words() {
        let redirs = parse_redirs("cmd > $file");
        assert_matches!(&redirs[0].body, RedirBody::Normal { operator, operand } => {
            assert_eq!(*operator, RedirOp::FileOut);
            assert_eq!(operand.text, "$file");
        });
    }

    #[test]
    fn heredoc_operator_defers_content() {
        let list = Parser::new("cat <<-END\n\tindented\n\tEND\n")
            .program()
            .unwrap();
        let redirs = assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Simple(simple) => simple.redirs.clone()
        );
        assert_matches!(&redirs[0].body, RedirBody::HereDoc(here_doc) => {
            assert!(here_doc.remove_tabs);
            assert!(!here_doc.quoted);
            assert_eq!(here_doc.content.get().map(String::as_str), Some("indented\n"));
        });
    }

    #[test]
    fn quoted_delimiter_marks_heredoc_literal() {
        let list = Parser::new("cat <<'EOF'\n$x\nEOF\n").program().unwrap();
        let redirs = assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Simple(simple) => simple.redirs.clone()
        );
        assert_matches!(&redirs[0].body, RedirBody::HereDoc(here_doc) => {
            assert!(here_doc.quoted);
            assert_eq!(here_doc.delimiter_unquoted, "EOF");
            assert_eq!(here_doc.content.get().map(String::as_str), Some("$x\n"));
        });
    }

    #[test]
    fn multiple_heredocs_consumed_in_order() {
        let list = Parser::new("cat <<A <<B\nfirst\nA\nsecond\nB\n")
            .program()
            .unwrap();
        let redirs = assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Simple(simple) => simple.redirs.clone()
        );
        assert_matches!(&redirs[0].body, RedirBody::HereDoc(here_doc) => {
            assert_eq!(here_doc.content.get().map(String::as_str), Some("first\n"));
        });
        assert_matches!(&redirs[1].body, RedirBody::HereDoc(here_doc) => {
            assert_eq!(here_doc.content.get().map(String::as_str), Some("second\n"));
        });
    }

    #[test]
    fn heredoc_after_semicolon_waits_for_newline() {
        let list = Parser::new("cat <<EOF; echo next\nbody\nEOF\n")
            .program()
            .unwrap();
        assert_eq!(list.0.len(), 2);
        let redirs = assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Simple(simple) => simple.redirs.clone()
        );
        assert_matches!(&redirs[0].body, RedirBody::HereDoc(here_doc) => {
            assert_eq!(here_doc.content.get().map(String::as_str), Some("body\n"));
        });
    }

    #[test]
    fn heredoc_in_pipeline_reads_after_linebreak() {
        let list = Parser::new("cat <<EOF |\nbody\nEOF\nwc -l\n")
            .program()
            .unwrap();
        let pipeline = &list.0[0].and_or.first;
        assert_eq!(pipeline.commands.len(), 2);
    }

    #[test]
    fn unterminated_heredoc_is_an_error() {
        let error = Parser::new("cat <<EOF\nno end").program().unwrap_err();
        assert_matches!(
            error.cause,
            SyntaxError::UnclosedHereDocContent { delimiter } => {
                assert_eq!(delimiter, "EOF");
            }
        );
    }

    #[test]
    fn missing_heredoc_delimiter_is_an_error() {
        let error = Parser::new("cat <<\n").program().unwrap_err();
        assert_eq!(error.cause, SyntaxError::MissingHereDocDelimiter);
    }

    #[test]
    fn unquote_cases() {
        assert_eq!(unquote("EOF"), ("EOF".to_owned(), false));
        assert_eq!(unquote("'EOF'"), ("EOF".to_owned(), true));
        assert_eq!(unquote("\"EOF\""), ("EOF".to_owned(), true));
        assert_eq!(unquote("E\\OF"), ("EOF".to_owned(), true));
        assert_eq!(unquote("E'O'F"), ("EOF".to_owned(), true));
    }
}
