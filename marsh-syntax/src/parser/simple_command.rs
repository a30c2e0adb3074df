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

//! Parsing of simple commands
//!
//! A simple command is a sequence of assignment words, command words, and
//! redirections in any order, with the restriction that assignments are
//! only recognized before the first command word. This module also
//! recognizes the POSIX function definition form `name() compound-command`,
//! which starts like a simple command.

use super::core::Parser;
use super::lex::{Operator, TokenKind};
use super::Result;
use crate::syntax::{Assign, Command, FunctionDefinition, SimpleCommand, Word};
use std::rc::Rc;

/// Returns true if the string is a valid variable or function name.
pub(super) fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits an assignment word into its name and value parts.
///
/// The name must be a valid identifier; since identifier characters cannot
/// be quoted, any quoting before the `=` disqualifies the word.
fn split_assignment(text: &str) -> Option<(&str, &str)> {
    for (index, c) in text.char_indices() {
        match c {
            '=' => {
                return if index == 0 {
                    None
                } else {
                    Some((&text[..index], &text[index + 1..]))
                };
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                if index == 0 && c.is_ascii_digit() {
                    return None;
                }
            }
            _ => return None,
        }
    }
    None
}

impl Parser<'_> {
    /// Parses a simple command (or the function definition form).
    pub(super) fn simple_command(&mut self) -> Result<Command> {
        let line = self.peek()?.line;
        let mut command = SimpleCommand {
            line,
            ..SimpleCommand::default()
        };
        // Whether the next word is subject to alias substitution: true at
        // the command name position and after a blank-ending substitution
        let mut alias_position = true;

        loop {
            let token = self.peek()?;
            let kind = token.kind;
            match kind {
                TokenKind::IoNumber => command.redirs.push(self.redirection()?),
                TokenKind::Operator(op) if op.is_redirection() => {
                    command.redirs.push(self.redirection()?);
                }
                TokenKind::Operator(Operator::OpenParen)
                    if command.words.len() == 1
                        && command.assigns.is_empty()
                        && command.redirs.is_empty()
                        && is_name(&command.words[0].text) =>
                {
                    let name = command.words.pop().unwrap();
                    return self.function_definition(name);
                }
                TokenKind::Word | TokenKind::Keyword(_) => {
                    // A keyword here is not at a command position; it is
                    // demoted to an ordinary word.
                    if command.words.is_empty() && kind == TokenKind::Word {
                        let text = token.text.clone();
                        if let Some((name, value)) = split_assignment(&text) {
                            let (name, value) = (name.to_owned(), value.to_owned());
                            let token = self.take()?;
                            command.assigns.push(Assign {
                                name,
                                value: Word::new(value, token.line),
                                line: token.line,
                            });
                            continue;
                        }
                    }
                    if alias_position && kind == TokenKind::Word {
                        let name = token.text.clone();
                        if let Some(blank_ending) = self.try_substitute_alias(&name)? {
                            alias_position = blank_ending;
                            continue;
                        }
                    }
                    alias_position = false;
                    command.words.push(self.take_word()?);
                }
                _ => break,
            }
        }

        if command.is_empty() {
            let token = self.peek()?;
            Err(Self::unexpected(token))
        } else {
            Ok(Command::Simple(command))
        }
    }

    /// Parses the rest of `name() compound-command`, after the name.
    fn function_definition(&mut self, name: Word) -> Result<Command> {
        let line = name.line;
        self.take()?; // the `(`
        self.expect_operator(Operator::CloseParen)?;
        self.linebreak()?;
        self.require_compound_start()?;
        let body = self.full_compound_command()?;
        Ok(Command::Function(FunctionDefinition {
            name: name.text,
            body: Rc::new(body),
            line,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasSet;
    use crate::syntax::RedirBody;
    use assert_matches::assert_matches;

    fn parse_simple(source: &str) -> SimpleCommand {
        let list = Parser::new(source)
            .program()
            .unwrap_or_else(|e| panic!("parse error in {source:?}: {e}"));
        assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Simple(simple) => simple.clone()
        )
    }

    #[test]
    fn name_validation() {
        assert!(is_name("x"));
        assert!(is_name("_private"));
        assert!(is_name("ABC_123"));
        assert!(!is_name(""));
        assert!(!is_name("1x"));
        assert!(!is_name("a-b"));
    }

    #[test]
    fn assignment_splitting() {
        assert_eq!(split_assignment("a=b"), Some(("a", "b")));
        assert_eq!(split_assignment("a="), Some(("a", "")));
        assert_eq!(split_assignment("a=b=c"), Some(("a", "b=c")));
        assert_eq!(split_assignment("=x"), None);
        assert_eq!(split_assignment("1a=x"), None);
        assert_eq!(split_assignment("a b"), None);
        assert_eq!(split_assignment("'a'=x"), None);
    }

    #[test]
    fn assignments_before_command_word() {
        let simple = parse_simple("x=1 y=$z cmd a=b");
        let assigns: Vec<_> = simple
            .assigns
            .iter()
            .map(|a| (a.name.as_str(), a.value.text.as_str()))
            .collect();
        assert_eq!(assigns, [("x", "1"), ("y", "$z")]);
        let words: Vec<_> = simple.words.iter().map(|w| w.text.as_str()).collect();
        // After the command word, `a=b` is an ordinary argument
        assert_eq!(words, ["cmd", "a=b"]);
    }

    #[test]
    fn assignments_only_command() {
        let simple = parse_simple("x=1 y=2");
        assert_eq!(simple.assigns.len(), 2);
        assert!(simple.words.is_empty());
    }

    #[test]
    fn redirections_attach_anywhere() {
        let simple = parse_simple(">a cmd <b arg 2>&1");
        assert_eq!(simple.redirs.len(), 3);
        assert_eq!(simple.redirs[2].fd, Some(2));
        let words: Vec<_> = simple.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(words, ["cmd", "arg"]);
    }

    #[test]
    fn keyword_in_argument_position_is_a_word() {
        let simple = parse_simple("echo if then done");
        let words: Vec<_> = simple.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(words, ["echo", "if", "then", "done"]);
    }

    #[test]
    fn heredoc_redir_captures_body() {
        let list = Parser::new("cat <<EOF\nhello\nEOF\n").program().unwrap();
        let simple = assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Simple(simple) => simple.clone()
        );
        assert_matches!(&simple.redirs[0].body, RedirBody::HereDoc(here_doc) => {
            assert_eq!(here_doc.content.get().map(String::as_str), Some("hello\n"));
        });
    }

    #[test]
    fn alias_substitution_at_command_position() {
        let mut aliases = AliasSet::new();
        aliases.define("ll", "ls -l");
        let list = Parser::with_aliases("ll /tmp", &aliases).program().unwrap();
        let simple = assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Simple(simple) => simple.clone()
        );
        let words: Vec<_> = simple.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(words, ["ls", "-l", "/tmp"]);
    }

    #[test]
    fn alias_not_substituted_in_argument_position() {
        let mut aliases = AliasSet::new();
        aliases.define("ll", "ls -l");
        let list = Parser::with_aliases("echo ll", &aliases).program().unwrap();
        let simple = assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Simple(simple) => simple.clone()
        );
        let words: Vec<_> = simple.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(words, ["echo", "ll"]);
    }

    #[test]
    fn blank_ending_alias_checks_next_word() {
        let mut aliases = AliasSet::new();
        aliases.define("run", "env ");
        aliases.define("ll", "ls -l");
        let list = Parser::with_aliases("run ll", &aliases).program().unwrap();
        let simple = assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Simple(simple) => simple.clone()
        );
        let words: Vec<_> = simple.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(words, ["env", "ls", "-l"]);
    }

    #[test]
    fn recursive_alias_does_not_loop() {
        let mut aliases = AliasSet::new();
        aliases.define("ls", "ls --color");
        let list = Parser::with_aliases("ls", &aliases).program().unwrap();
        let simple = assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Simple(simple) => simple.clone()
        );
        let words: Vec<_> = simple.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(words, ["ls", "--color"]);
    }
}
