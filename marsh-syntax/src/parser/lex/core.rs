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

//! Fundamentals of the lexer

use super::keyword::Keyword;
use super::op::{is_operator_start, Operator};
use crate::parser::error::{Error, SyntaxError};
use crate::parser::Result;

/// Type of a [`Token`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenKind {
    /// End of input
    Eof,
    /// Newline
    Newline,
    /// Plain word
    Word,
    /// Reserved word
    Keyword(Keyword),
    /// Operator
    Operator(Operator),
    /// Word consisting of digits only, directly followed by `<` or `>`
    IoNumber,
}

/// Result of lexical analysis
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    /// Type of the token
    pub kind: TokenKind,
    /// Raw text of the token, with line continuations removed
    pub text: String,
    /// 1-based source line the token started on
    pub line: u64,
}

impl Token {
    /// Returns true if the token is the given operator.
    #[must_use]
    pub fn is_operator(&self, operator: Operator) -> bool {
        self.kind == TokenKind::Operator(operator)
    }

    /// Returns true if the token is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}

/// Lexical analyzer of shell source text
///
/// The lexer reads a source string from beginning to end, producing one
/// token per [`next_token`](Self::next_token) call. A single token of
/// lookahead is available through [`peek_token`](Self::peek_token).
#[derive(Clone, Debug)]
pub struct Lexer<'a> {
    source: &'a str,
    index: usize,
    line: u64,
    peeked: Option<Token>,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer that reads the given source text.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            index: 0,
            line: 1,
            peeked: None,
        }
    }

    /// Returns the current 1-based line number.
    #[must_use]
    pub fn line(&self) -> u64 {
        self.line
    }

    fn rest(&self) -> &'a str {
        &self.source[self.index..]
    }

    /// Returns the next character without consuming it.
    pub(super) fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consumes and returns the next character, counting lines.
    pub(super) fn next_char(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.index += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Creates an error at the current position.
    pub(super) fn error(&self, cause: SyntaxError) -> Error {
        Error {
            cause,
            line: self.line,
        }
    }

    /// Skips blanks, line continuations, and a comment.
    ///
    /// A `#` at this position (the start of a token) begins a comment that
    /// runs to the next newline; the newline itself is not consumed.
    fn skip_blanks_and_comment(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ' | '\t') => {
                    self.next_char();
                }
                Some('\\') if self.rest().starts_with("\\\n") => {
                    self.next_char();
                    self.next_char();
                }
                Some('#') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.next_char();
                    }
                }
                _ => break,
            }
        }
    }

    /// Returns the next token, advancing past it.
    pub fn next_token(&mut self) -> Result<Token> {
        if let Some(token) = self.peeked.take() {
            return Ok(token);
        }
        self.skip_blanks_and_comment();
        let line = self.line;
        match self.peek_char() {
            None => Ok(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                line,
            }),
            Some('\n') => {
                self.next_char();
                Ok(Token {
                    kind: TokenKind::Newline,
                    text: "\n".to_owned(),
                    line,
                })
            }
            Some(c) if is_operator_start(c) => self.operator_token(line),
            Some(_) => self.word_token(line),
        }
    }

    /// Returns the next token without consuming it.
    pub fn peek_token(&mut self) -> Result<&Token> {
        if self.peeked.is_none() {
            let token = self.next_token()?;
            self.peeked = Some(token);
        }
        Ok(self.peeked.as_ref().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            let eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if eof {
                break;
            }
        }
        tokens
    }

    fn texts(source: &str) -> Vec<String> {
        tokens(source)
            .into_iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn empty_input() {
        let tokens = tokens("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(tokens[0].line, 1);
    }

    #[test]
    fn words_and_blanks() {
        assert_eq!(texts("echo  hello\tworld"), ["echo", "hello", "world"]);
    }

    #[test]
    fn comments_run_to_newline() {
        let tokens = tokens("echo hi # a 'comment\nnext");
        let texts: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            texts,
            [
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::Newline,
                TokenKind::Word,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[3].text, "next");
        assert_eq!(tokens[3].line, 2);
    }

    #[test]
    fn hash_inside_word_is_literal() {
        assert_eq!(texts("a#b"), ["a#b"]);
    }

    #[test]
    fn line_continuation_outside_quotes() {
        assert_eq!(texts("ec\\\nho"), ["echo"]);
        assert_eq!(texts("echo \\\n hi"), ["echo", "hi"]);
    }

    #[test]
    fn escaped_character_is_preserved() {
        assert_eq!(texts(r"a\ b"), [r"a\ b"]);
        assert_eq!(texts(r"\<\>"), [r"\<\>"]);
    }

    #[test]
    fn single_quotes_are_opaque() {
        assert_eq!(texts("echo 'a b; c'"), ["echo", "'a b; c'"]);
        assert_eq!(texts(r"'a\'"), [r"'a\'"]);
    }

    #[test]
    fn double_quotes_carry_expansions() {
        assert_eq!(texts(r#"echo "a $(b c) `d` ${e} f""#), [
            "echo",
            r#""a $(b c) `d` ${e} f""#,
        ]);
    }

    #[test]
    fn command_substitution_by_paren_depth() {
        assert_eq!(texts("$(a $(b) c)x"), ["$(a $(b) c)x"]);
        assert_eq!(texts("$((1 + 2))"), ["$((1 + 2))"]);
    }

    #[test]
    fn command_substitution_with_quoted_paren() {
        assert_eq!(texts(r#"$(echo ")")"#), [r#"$(echo ")")"#]);
    }

    #[test]
    fn backquotes_honor_escaped_backquote() {
        assert_eq!(texts(r"`a \` b`"), [r"`a \` b`"]);
    }

    #[test]
    fn braced_param_with_nested_quotes() {
        assert_eq!(texts("${x:-'}'}"), ["${x:-'}'}"]);
        assert_eq!(texts("${x:-${y}}"), ["${x:-${y}}"]);
    }

    #[test]
    fn io_number_reclassification() {
        let tokens = tokens("2>err 2 >out 10<in x2>y");
        assert_eq!(tokens[0].kind, TokenKind::IoNumber);
        assert_eq!(tokens[0].text, "2");
        // A blank between the digits and the operator keeps the word a word
        assert_eq!(tokens[3].kind, TokenKind::Word);
        assert_eq!(tokens[3].text, "2");
        assert_eq!(tokens[6].kind, TokenKind::IoNumber);
        assert_eq!(tokens[6].text, "10");
        // Digits preceded by other characters are part of the word
        assert_eq!(tokens[9].kind, TokenKind::Word);
        assert_eq!(tokens[9].text, "x2");
    }

    #[test]
    fn keywords_are_classified() {
        let tokens = tokens("if x; then fi");
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::If));
        assert_eq!(tokens[1].kind, TokenKind::Word);
        assert_eq!(tokens[3].kind, TokenKind::Keyword(Keyword::Then));
        assert_eq!(tokens[4].kind, TokenKind::Keyword(Keyword::Fi));
    }

    #[test]
    fn quoted_keyword_is_a_word() {
        let tokens = tokens("'if' \\if");
        assert_eq!(tokens[0].kind, TokenKind::Word);
        assert_eq!(tokens[1].kind, TokenKind::Word);
    }

    #[test]
    fn line_numbers() {
        let tokens = tokens("a\nb\n'c\nd'\ne");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[2].line, 2); // b
        assert_eq!(tokens[4].line, 3); // 'c\nd'
        assert_eq!(tokens[6].line, 5); // e
    }

    #[test]
    fn peeking_does_not_consume() {
        let mut lexer = Lexer::new("one two");
        assert_eq!(lexer.peek_token().unwrap().text, "one");
        assert_eq!(lexer.peek_token().unwrap().text, "one");
        assert_eq!(lexer.next_token().unwrap().text, "one");
        assert_eq!(lexer.next_token().unwrap().text, "two");
    }

    #[test]
    fn unclosed_single_quote_is_an_error() {
        let mut lexer = Lexer::new("'abc");
        let error = lexer.next_token().unwrap_err();
        assert_eq!(error.cause, SyntaxError::UnclosedSingleQuote);
    }
}
