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

//! Fundamentals of the parser

use super::error::{Error, SyntaxError};
use super::lex::{Keyword, Lexer, Operator, Token, TokenKind};
use super::Result;
use crate::alias::AliasSet;
use crate::syntax::{HereDoc, Word};
use std::collections::VecDeque;
use std::rc::Rc;

/// Shell language parser
///
/// The parser wraps a [`Lexer`] and produces AST nodes. Submodules of
/// [`parser`](crate::parser) define one parsing function per construct; this
/// module holds the state they share:
///
/// - the token stream, with alias-substituted tokens queued in front,
/// - the set of aliases being substituted (to stop recursive substitution),
/// - here-documents whose contents are still to be read.
#[derive(Debug)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    aliases: Option<&'a AliasSet>,
    /// Tokens produced by alias substitution, consumed before the lexer
    substituted: VecDeque<Token>,
    /// Names of aliases whose substituted tokens are still being consumed
    expanding_aliases: Vec<String>,
    /// Here-documents parsed on the current logical line, in declaration
    /// order, whose contents follow the next newline
    pending_heredocs: Vec<Rc<HereDoc>>,
}

impl<'a> Parser<'a> {
    /// Creates a parser that reads the given source text.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            aliases: None,
            substituted: VecDeque::new(),
            expanding_aliases: Vec::new(),
            pending_heredocs: Vec::new(),
        }
    }

    /// Creates a parser that substitutes the given aliases.
    #[must_use]
    pub fn with_aliases(source: &'a str, aliases: &'a AliasSet) -> Self {
        Parser {
            aliases: Some(aliases),
            ..Parser::new(source)
        }
    }

    /// Returns the next token without consuming it.
    pub(super) fn peek(&mut self) -> Result<&Token> {
        if self.substituted.is_empty() {
            self.lexer.peek_token()
        } else {
            Ok(&self.substituted[0])
        }
    }

    /// Consumes and returns the next token.
    pub(super) fn take(&mut self) -> Result<Token> {
        if let Some(token) = self.substituted.pop_front() {
            if self.substituted.is_empty() {
                self.expanding_aliases.clear();
            }
            Ok(token)
        } else {
            self.lexer.next_token()
        }
    }

    /// Consumes the next token, which must be a word-like token, and returns
    /// it as a [`Word`]. Keywords and IO numbers are demoted to plain words.
    pub(super) fn take_word(&mut self) -> Result<Word> {
        let token = self.take()?;
        Ok(Word::new(token.text, token.line))
    }

    /// Creates an error for an unexpected token.
    pub(super) fn unexpected(token: &Token) -> Error {
        let cause = match token.kind {
            TokenKind::Eof => SyntaxError::UnexpectedEof,
            _ => SyntaxError::UnexpectedToken {
                token: token.text.clone(),
            },
        };
        Error {
            cause,
            line: token.line,
        }
    }

    pub(super) fn expectation_error(expected: &'static str, found: &Token) -> Error {
        let cause = match found.kind {
            TokenKind::Eof => SyntaxError::UnexpectedEof,
            _ => SyntaxError::ExpectedToken {
                expected,
                found: found.text.clone(),
            },
        };
        Error {
            cause,
            line: found.line,
        }
    }

    /// Consumes the next token, requiring it to be the given keyword.
    pub(super) fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token> {
        let token = self.peek()?;
        if token.is_keyword(keyword) {
            self.take()
        } else {
            Err(Self::expectation_error(keyword.as_str(), token))
        }
    }

    /// Consumes the next token, requiring it to be the given operator.
    pub(super) fn expect_operator(&mut self, operator: Operator) -> Result<Token> {
        let token = self.peek()?;
        if token.is_operator(operator) {
            self.take()
        } else {
            Err(Self::expectation_error(operator.as_str(), token))
        }
    }

    /// Registers a here-document whose content follows the next newline.
    pub(super) fn defer_heredoc(&mut self, here_doc: Rc<HereDoc>) {
        self.pending_heredocs.push(here_doc);
    }

    /// Returns true if here-documents are waiting for their contents.
    pub(super) fn has_pending_heredocs(&self) -> bool {
        !self.pending_heredocs.is_empty()
    }

    /// Reads the contents of all pending here-documents, in declaration
    /// order.
    ///
    /// This must be called right after consuming a newline token, before
    /// peeking any further: the contents start at the current lexer
    /// position.
    pub(super) fn read_pending_heredocs(&mut self) -> Result<()> {
        for here_doc in self.pending_heredocs.drain(..) {
            let body = self
                .lexer
                .read_heredoc_body(&here_doc.delimiter_unquoted, here_doc.remove_tabs)?;
            // The cell cannot be filled already: each here-document is
            // deferred exactly once.
            here_doc.content.set(body).ok();
        }
        Ok(())
    }

    /// Substitutes an alias for the next token, which must be a word token
    /// with the given text.
    ///
    /// Returns `None` if no substitution applies. Otherwise the word token
    /// is consumed, the replacement is tokenized in its place, and the
    /// result tells whether the replacement ended in a blank (in which case
    /// the following word is also subject to alias substitution).
    pub(super) fn try_substitute_alias(&mut self, name: &str) -> Result<Option<bool>> {
        let Some(aliases) = self.aliases else {
            return Ok(None);
        };
        let Some(replacement) = aliases.get(name) else {
            return Ok(None);
        };
        if self.expanding_aliases.iter().any(|n| n == name) {
            return Ok(None);
        }

        let original = self.take()?;
        let blank_ending = replacement.ends_with(' ') || replacement.ends_with('\t');

        let mut tokens = Vec::new();
        let mut lexer = Lexer::new(replacement);
        loop {
            let mut token = lexer.next_token()?;
            if matches!(token.kind, TokenKind::Eof | TokenKind::Newline) {
                break;
            }
            token.line = original.line;
            tokens.push(token);
        }

        if !tokens.is_empty() {
            self.expanding_aliases.push(name.to_owned());
            for token in tokens.into_iter().rev() {
                self.substituted.push_front(token);
            }
        }
        Ok(Some(blank_ending))
    }
}

/// Returns true if a token of this kind can begin a command.
pub(super) fn starts_command(kind: TokenKind) -> bool {
    match kind {
        TokenKind::Word | TokenKind::IoNumber => true,
        TokenKind::Operator(operator) => {
            operator == Operator::OpenParen || operator.is_redirection()
        }
        TokenKind::Keyword(keyword) => {
            !keyword.is_clause_delimiter() && keyword != Keyword::In
        }
        TokenKind::Newline | TokenKind::Eof => false,
    }
}
