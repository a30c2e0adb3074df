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

//! The initial expansion scan
//!
//! [`Expander`] walks the raw text of one word left to right, resolving
//! tilde prefixes, quoting, parameter expansions, command substitutions,
//! and arithmetic expansions into attributed characters. The output is a
//! *phrase*: a list of pre-split fields. Most input produces a single
//! field; `$@` and `$*` introduce field boundaries.

use super::attr::{AttrChar, Origin};
use super::{command_subst, param, ExpansionError};
use marsh_env::variable::{IFS, IFS_DEFAULT};
use marsh_env::Env;

/// List of pre-split fields produced by one word
pub(super) type Phrase = Vec<Vec<AttrChar>>;

/// State of one word's initial expansion
pub(super) struct Expander<'a> {
    pub(super) env: &'a mut Env,
    text: &'a str,
    index: usize,
    pub(super) line: u64,
    fields: Phrase,
    current: Vec<AttrChar>,
    /// Set when `$@` or `$*` expanded to no positional parameters while
    /// quoted; a word that produced nothing else collapses to no fields
    only_empty_positional: bool,
}

impl<'a> Expander<'a> {
    pub(super) fn new(env: &'a mut Env, text: &'a str, line: u64) -> Self {
        Expander {
            env,
            text,
            index: 0,
            line,
            fields: Vec::new(),
            current: Vec::new(),
            only_empty_positional: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.index..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += c.len_utf8();
        Some(c)
    }

    pub(super) fn push(&mut self, c: AttrChar) {
        if !c.is_quoting {
            self.only_empty_positional = false;
        }
        self.current.push(c);
    }

    /// Appends an expansion result string.
    pub(super) fn push_soft_str(&mut self, s: &str, quoted: bool) {
        for value in s.chars() {
            self.push(AttrChar {
                value,
                origin: Origin::SoftExpansion,
                is_quoted: quoted,
                is_quoting: false,
            });
        }
    }

    /// Closes the current field; subsequent output goes to a new one.
    pub(super) fn field_boundary(&mut self) {
        let field = std::mem::take(&mut self.current);
        self.fields.push(field);
    }

    /// Splices a sub-phrase (from a `${...}` modifier word) into the
    /// output, preserving its field boundaries.
    pub(super) fn splice(&mut self, phrase: Phrase) {
        let count = phrase.len();
        for (index, field) in phrase.into_iter().enumerate() {
            for c in field {
                self.push(c);
            }
            if index + 1 < count {
                self.field_boundary();
            }
        }
    }

    fn finalize(mut self) -> Phrase {
        let drop_all = self.only_empty_positional
            && self.fields.is_empty()
            && self.current.iter().all(|c| c.is_quoting);
        self.fields.push(self.current);
        if drop_all {
            return Vec::new();
        }
        self.fields
    }

    /// Performs the whole scan for a word.
    pub(super) fn run(mut self) -> Result<Phrase, ExpansionError> {
        self.tilde();
        while let Some(c) = self.bump() {
            match c {
                '\\' => match self.peek() {
                    Some(next) => {
                        self.bump();
                        self.push(AttrChar::quoting('\\'));
                        self.push(AttrChar {
                            value: next,
                            origin: Origin::Literal,
                            is_quoted: true,
                            is_quoting: false,
                        });
                    }
                    None => self.push(AttrChar::literal('\\')),
                },
                '\'' => {
                    self.push(AttrChar::quoting('\''));
                    self.single_quotes();
                }
                '"' => {
                    self.push(AttrChar::quoting('"'));
                    self.double_quotes()?;
                }
                '$' => self.dollar(false)?,
                '`' => self.backquote(false)?,
                c => self.push(AttrChar::literal(c)),
            }
        }
        Ok(self.finalize())
    }

    /// Expands text that behaves like the inside of a double-quoted
    /// string: here-document contents and prompt strings.
    fn run_double_quote_like(mut self) -> Result<String, ExpansionError> {
        while let Some(c) = self.bump() {
            match c {
                '\\' => match self.peek() {
                    // Escaped newline joins lines
                    Some('\n') => {
                        self.bump();
                    }
                    Some(next @ ('$' | '`' | '\\')) => {
                        self.bump();
                        self.push(AttrChar {
                            value: next,
                            origin: Origin::Literal,
                            is_quoted: true,
                            is_quoting: false,
                        });
                    }
                    _ => self.push(AttrChar::literal('\\')),
                },
                '$' => self.dollar(true)?,
                '`' => self.backquote(true)?,
                c => self.push(AttrChar::literal(c)),
            }
        }
        let phrase = self.finalize();
        let mut result = String::new();
        for (index, field) in phrase.into_iter().enumerate() {
            if index > 0 {
                result.push(' ');
            }
            result.extend(field.iter().filter(|c| !c.is_quoting).map(|c| c.value));
        }
        Ok(result)
    }

    /// Copies a single-quoted span: everything is literal.
    fn single_quotes(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\'' {
                self.push(AttrChar::quoting('\''));
                return;
            }
            self.push(AttrChar {
                value: c,
                origin: Origin::Literal,
                is_quoted: true,
                is_quoting: false,
            });
        }
    }

    /// Processes a double-quoted span after the opening quote.
    fn double_quotes(&mut self) -> Result<(), ExpansionError> {
        while let Some(c) = self.bump() {
            match c {
                '"' => {
                    self.push(AttrChar::quoting('"'));
                    return Ok(());
                }
                '\\' => match self.peek() {
                    Some(next @ ('$' | '`' | '"' | '\\')) => {
                        self.bump();
                        self.push(AttrChar::quoting('\\'));
                        self.push(AttrChar {
                            value: next,
                            origin: Origin::Literal,
                            is_quoted: true,
                            is_quoting: false,
                        });
                    }
                    // The backslash itself is preserved
                    _ => self.push(AttrChar {
                        value: '\\',
                        origin: Origin::Literal,
                        is_quoted: true,
                        is_quoting: false,
                    }),
                },
                '$' => self.dollar(true)?,
                '`' => self.backquote(true)?,
                c => self.push(AttrChar {
                    value: c,
                    origin: Origin::Literal,
                    is_quoted: true,
                    is_quoting: false,
                }),
            }
        }
        // The lexer guarantees the closing quote; reaching here means the
        // text came from elsewhere, which we tolerate.
        Ok(())
    }

    /// Processes what follows a `$`.
    fn dollar(&mut self, quoted: bool) -> Result<(), ExpansionError> {
        match self.peek() {
            Some('(') => {
                self.bump();
                if self.peek() == Some('(') {
                    self.bump();
                    self.arith_or_command_subst(quoted)
                } else {
                    let content = self.span_to_matching_paren();
                    let output = command_subst::command_substitution(self.env, &content)?;
                    self.push_soft_str(&output, quoted);
                    Ok(())
                }
            }
            Some('{') => {
                self.bump();
                let inner = self.span_to_matching_brace();
                param::braced(self, &inner, quoted)
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                param::named(self, &name, quoted)
            }
            Some(c) if c.is_ascii_digit() => {
                self.bump();
                param::positional(self, c as usize - '0' as usize, quoted)
            }
            Some(c @ ('@' | '*' | '#' | '?' | '-' | '$' | '!')) => {
                self.bump();
                param::special(self, c, quoted)
            }
            _ => {
                self.push(AttrChar {
                    value: '$',
                    origin: Origin::Literal,
                    is_quoted: quoted,
                    is_quoting: false,
                });
                Ok(())
            }
        }
    }

    /// Handles `$((...))`: arithmetic expansion, or a command substitution
    /// starting with a subshell when the parentheses do not pair up as
    /// `))`.
    fn arith_or_command_subst(&mut self, quoted: bool) -> Result<(), ExpansionError> {
        let start = self.index;
        let mut depth: u32 = 2;
        let mut one_end = None;
        while let Some(c) = self.bump() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    match depth {
                        1 => one_end = Some(self.index - 1),
                        0 => {
                            let end = self.index - 1;
                            if one_end == Some(end - 1) {
                                // A proper `))`: arithmetic
                                let expression = self.text[start..end - 1].to_owned();
                                let value = self.arith(&expression)?;
                                self.push_soft_str(&value, quoted);
                            } else {
                                // Reparse as `$( (...)...)`
                                let content = format!("({}", &self.text[start..end]);
                                let output =
                                    command_subst::command_substitution(self.env, &content)?;
                                self.push_soft_str(&output, quoted);
                            }
                            return Ok(());
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Evaluates an arithmetic expression, pre-expanding any embedded
    /// parameter expansions and command substitutions.
    fn arith(&mut self, expression: &str) -> Result<String, ExpansionError> {
        let expanded = expand_double_quote_like(self.env, expression, self.line)?;
        let value = marsh_arith::eval(&expanded, &VariableEnv(self.env))?;
        Ok(value.to_string())
    }

    /// Copies a `$(...)` body (the `(` already consumed), returning the
    /// content without the closing `)`.
    fn span_to_matching_paren(&mut self) -> String {
        let mut content = String::new();
        let mut depth: u32 = 1;
        while let Some(c) = self.bump() {
            match c {
                '(' => {
                    depth += 1;
                    content.push(c);
                }
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    content.push(c);
                }
                '\\' => {
                    content.push(c);
                    if let Some(c) = self.bump() {
                        content.push(c);
                    }
                }
                quote @ ('\'' | '"' | '`') => {
                    content.push(quote);
                    self.copy_quoted_span(quote, &mut content);
                }
                c => content.push(c),
            }
        }
        content
    }

    /// Copies a `${...}` body (the `{` already consumed), returning the
    /// content without the closing `}`.
    fn span_to_matching_brace(&mut self) -> String {
        let mut content = String::new();
        let mut depth: u32 = 1;
        while let Some(c) = self.bump() {
            match c {
                '{' => {
                    depth += 1;
                    content.push(c);
                }
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    content.push(c);
                }
                '\\' => {
                    content.push(c);
                    if let Some(c) = self.bump() {
                        content.push(c);
                    }
                }
                quote @ ('\'' | '"' | '`') => {
                    content.push(quote);
                    self.copy_quoted_span(quote, &mut content);
                }
                c => content.push(c),
            }
        }
        content
    }

    /// Copies source text up to and including the closing quote character,
    /// without interpreting it.
    fn copy_quoted_span(&mut self, quote: char, content: &mut String) {
        while let Some(c) = self.bump() {
            content.push(c);
            if c == quote {
                return;
            }
            if c == '\\' && quote != '\'' {
                if let Some(c) = self.bump() {
                    content.push(c);
                }
            }
        }
    }

    /// Processes a backquoted command substitution after the opening
    /// backquote.
    fn backquote(&mut self, quoted: bool) -> Result<(), ExpansionError> {
        let mut content = String::new();
        while let Some(c) = self.bump() {
            match c {
                '`' => break,
                '\\' => match self.bump() {
                    Some(c @ ('$' | '`' | '\\')) => content.push(c),
                    Some(c) => {
                        content.push('\\');
                        content.push(c);
                    }
                    None => break,
                },
                c => content.push(c),
            }
        }
        let output = command_subst::command_substitution(self.env, &content)?;
        self.push_soft_str(&output, quoted);
        Ok(())
    }

    /// Performs tilde expansion on the leading `~` of the word, if any.
    ///
    /// The prefix must consist of plain literal characters up to the first
    /// `/` or the end of the word. The expanded home directory is treated
    /// as quoted: it undergoes neither field splitting nor globbing.
    fn tilde(&mut self) {
        if !self.text.starts_with('~') {
            return;
        }
        let rest = &self.text[1..];
        let end = rest.find('/').unwrap_or(rest.len());
        let name = &rest[..end];
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return;
        }
        let home = if name.is_empty() {
            self.env.variables.value("HOME").map(str::to_owned)
        } else {
            self.env
                .system
                .home_directory(name)
                .map(|path| path.to_string_lossy().into_owned())
        };
        // An unknown user leaves the word unchanged
        let Some(home) = home else { return };
        self.index = 1 + end;
        for value in home.chars() {
            self.push(AttrChar {
                value,
                origin: Origin::SoftExpansion,
                is_quoted: true,
                is_quoting: false,
            });
        }
    }

    /// Expands `$@` or `$*`.
    pub(super) fn positional_all(&mut self, star: bool, quoted: bool) {
        let params = self.env.variables.positional_params().to_vec();
        if quoted && star {
            let separator = self.join_separator();
            let mut first = true;
            for param in &params {
                if !first {
                    if let Some(sep) = separator {
                        self.push(AttrChar {
                            value: sep,
                            origin: Origin::SoftExpansion,
                            is_quoted: true,
                            is_quoting: false,
                        });
                    }
                }
                first = false;
                self.push_soft_str(param, true);
            }
            return;
        }
        if params.is_empty() {
            if quoted {
                self.only_empty_positional = true;
            }
            return;
        }
        let mut first = true;
        for param in &params {
            if !first {
                self.field_boundary();
            }
            first = false;
            self.push_soft_str(param, quoted);
        }
    }

    /// Returns the character `"$*"` joins fields with: the first character
    /// of `$IFS`, a space if `IFS` is unset, or nothing if it is empty.
    fn join_separator(&self) -> Option<char> {
        match self.env.variables.get(IFS) {
            None => IFS_DEFAULT.chars().next(),
            Some(variable) => match &variable.value {
                None => IFS_DEFAULT.chars().next(),
                Some(value) => value.chars().next(),
            },
        }
    }
}

/// Adapter exposing shell variables to the arithmetic evaluator
struct VariableEnv<'a>(&'a Env);

impl marsh_arith::Env for VariableEnv<'_> {
    fn get_variable(&self, name: &str) -> Option<&str> {
        self.0.variables.value(name)
    }
}

/// Expands a string that behaves like the inside of a double-quoted
/// string: parameter, command, and arithmetic expansion apply; backslash
/// escapes `$`, `` ` ``, `\`, and newline; quotes are not special.
pub(super) fn expand_double_quote_like(
    env: &mut Env,
    text: &str,
    line: u64,
) -> Result<String, ExpansionError> {
    Expander::new(env, text, line).run_double_quote_like()
}

/// Expands the text of a `${...}` modifier word.
///
/// The word has its own quoting. When the whole expansion is inside
/// double quotes, every produced character counts as quoted. Otherwise
/// unquoted literal characters are re-marked as expansion output so that
/// field splitting applies to them, as it does to everything a `${...}`
/// produces.
pub(super) fn subexpand(
    env: &mut Env,
    text: &str,
    line: u64,
    quoted: bool,
) -> Result<Phrase, ExpansionError> {
    let mut phrase = Expander::new(env, text, line).run()?;
    for field in &mut phrase {
        for c in field {
            if quoted {
                c.is_quoted = true;
            } else if !c.is_quoted && !c.is_quoting {
                c.origin = Origin::SoftExpansion;
            }
        }
    }
    Ok(phrase)
}

/// Expands the text of a `${x#pattern}`-family pattern word, keeping
/// quoting attributes for pattern compilation.
pub(super) fn subexpand_pattern(
    env: &mut Env,
    text: &str,
    line: u64,
) -> Result<Vec<AttrChar>, ExpansionError> {
    let phrase = Expander::new(env, text, line).run()?;
    Ok(phrase.into_iter().flatten().collect())
}
