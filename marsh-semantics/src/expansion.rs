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

//! Word expansion
//!
//! Words in the AST are raw source text. At execution time they go
//! through, in order: tilde expansion; parameter, command, and arithmetic
//! expansion (one left-to-right scan respecting quoting); quote removal;
//! field splitting of the expansion-derived unquoted parts; and pathname
//! expansion.
//!
//! [`expand_words`] performs the full pipeline for argument positions.
//! [`expand_word`] produces exactly one field and skips splitting and
//! globbing, for contexts like assignment values, redirection targets,
//! and `case` subjects. [`expand_word_attr`] additionally keeps the
//! quoting attributes, for `case` patterns.

pub mod attr;
mod command_subst;
mod glob;
mod param;
mod split;
mod text;

pub use attr::{AttrChar, AttrField, Origin};
pub use command_subst::command_substitution;
pub(crate) use command_subst::wait_exit_status;

use crate::expansion::text::Expander;
use marsh_env::option::ShellOption;
use marsh_env::semantics::Field;
use marsh_env::variable::{ReadOnlyError, IFS, IFS_DEFAULT};
use marsh_env::Env;
use marsh_syntax::syntax::{HereDoc, Word};
use thiserror::Error;

/// Error that aborts the expansion of the current command
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ExpansionError {
    /// An unset parameter was expanded while `-u` is in effect.
    #[error("{name}: parameter not set")]
    UnsetParameter { name: String },
    /// A `${name?}` expansion found the parameter unset or null.
    #[error("{name}: {message}")]
    EmptyOrUnset { name: String, message: String },
    /// Arithmetic expansion failed.
    #[error("arithmetic expression: {0}")]
    Arith(#[from] marsh_arith::Error),
    /// An assignment performed by `${name=word}` failed.
    #[error(transparent)]
    Assign(#[from] ReadOnlyError),
    /// The command of a command substitution has a syntax error.
    #[error("command substitution: {0}")]
    CommandSubstitution(#[from] marsh_syntax::parser::Error),
    /// A `${...}` expansion does not have a recognized form.
    #[error("${{{text}}}: bad substitution")]
    BadSubstitution { text: String },
    /// A system call failed while setting up a command substitution.
    #[error(transparent)]
    System(#[from] marsh_env::system::Errno),
}

/// Expands words in argument position.
///
/// Each word goes through the full pipeline including field splitting and
/// (unless `-f` is in effect) pathname expansion. The result may contain
/// any number of fields, including zero.
pub fn expand_words(env: &mut Env, words: &[Word]) -> Result<Vec<Field>, ExpansionError> {
    let mut fields = Vec::new();
    for word in words {
        expand_word_into(env, word, &mut fields)?;
    }
    Ok(fields)
}

fn expand_word_into(
    env: &mut Env,
    word: &Word,
    fields: &mut Vec<Field>,
) -> Result<(), ExpansionError> {
    let phrase = Expander::new(env, &word.text, word.line).run()?;
    let ifs = match env.variables.get(IFS) {
        None => IFS_DEFAULT.to_owned(),
        Some(variable) => variable
            .value
            .clone()
            .unwrap_or_else(|| IFS_DEFAULT.to_owned()),
    };
    let globbing = !env.options.get(ShellOption::NoGlob);
    for raw_field in phrase {
        for split_field in split::split_fields(raw_field, &ifs) {
            let attr_field = AttrField {
                chars: split_field,
                line: word.line,
            };
            if globbing {
                fields.extend(glob::glob_field(env, attr_field));
            } else {
                fields.push(attr_field.remove_quotes());
            }
        }
    }
    Ok(())
}

/// Expands a word to exactly one field, without splitting or globbing.
///
/// Used for assignment values, redirection targets, `case` subjects, and
/// here-document contents. If the word expands `$@` to several fields,
/// they are joined with single spaces.
pub fn expand_word(env: &mut Env, word: &Word) -> Result<Field, ExpansionError> {
    Ok(expand_word_attr(env, word)?.remove_quotes())
}

/// Expands a word to one field, keeping the quoting attributes.
///
/// `case` patterns are expanded this way: the quoting must survive into
/// pattern compilation so quoted wildcards match literally.
pub fn expand_word_attr(env: &mut Env, word: &Word) -> Result<AttrField, ExpansionError> {
    let phrase = Expander::new(env, &word.text, word.line).run()?;
    let mut chars = Vec::new();
    for (index, field) in phrase.into_iter().enumerate() {
        if index > 0 {
            chars.push(AttrChar {
                value: ' ',
                origin: Origin::SoftExpansion,
                is_quoted: true,
                is_quoting: false,
            });
        }
        chars.extend(field);
    }
    Ok(AttrField {
        chars,
        line: word.line,
    })
}

/// Expands the value of an assignment, yielding a plain string.
pub fn expand_value(env: &mut Env, word: &Word) -> Result<String, ExpansionError> {
    Ok(expand_word(env, word)?.value)
}

/// Expands the content of a here-document.
///
/// With a quoted delimiter the content is literal. Otherwise it undergoes
/// parameter, command, and arithmetic expansion like a double-quoted
/// string, with backslash escaping `$`, `` ` ``, `\`, and newline.
pub fn expand_heredoc(env: &mut Env, here_doc: &HereDoc) -> Result<String, ExpansionError> {
    let content = here_doc.content.get().map(String::as_str).unwrap_or("");
    if here_doc.quoted {
        return Ok(content.to_owned());
    }
    text::expand_double_quote_like(env, content, here_doc.delimiter.line)
}

/// Expands an unquoted string outside any word, such as `$PS4`.
pub fn expand_text(env: &mut Env, string: &str, line: u64) -> Result<String, ExpansionError> {
    text::expand_double_quote_like(env, string, line)
}

#[cfg(test)]
mod tests;
