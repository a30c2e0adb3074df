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

//! Parameter expansion
//!
//! This module resolves `$name`, `$1`, the special parameters, and the
//! whole `${...}` modifier set: defaulting (`-`), assignment (`=`),
//! alternation (`+`), error (`?`), length (`#`), and the prefix/suffix
//! trims (`#`, `##`, `%`, `%%`), each with and without the null-testing
//! colon.

use super::attr::to_pattern_chars;
use super::text::{subexpand, subexpand_pattern, Expander};
use super::ExpansionError;
use marsh_env::option::ShellOption;
use marsh_fnmatch::Pattern;

/// Result of looking up a parameter
enum Lookup {
    /// The parameter has this value.
    Value(String),
    /// The parameter is unset.
    Unset,
}

/// Looks up an ordinary, positional, or special parameter by its string
/// form. `$@` and `$*` are not handled here.
fn lookup(expander: &Expander, name: &str) -> Lookup {
    let env = &expander.env;
    if name.len() == 1 {
        match name.as_bytes()[0] {
            b'?' => return Lookup::Value(env.exit_status.to_string()),
            b'$' => return Lookup::Value(env.shell_pid.to_string()),
            b'#' => {
                return Lookup::Value(env.variables.positional_params().len().to_string());
            }
            b'-' => return Lookup::Value(env.options.to_flag_string()),
            b'0' => return Lookup::Value(env.shell_name.clone()),
            b'!' => {
                let pid = env.jobs.last_async_pid();
                return if pid.as_raw() == 0 {
                    Lookup::Unset
                } else {
                    Lookup::Value(pid.to_string())
                };
            }
            _ => {}
        }
    }
    if name.chars().all(|c| c.is_ascii_digit()) {
        let index: usize = match name.parse() {
            Ok(index) => index,
            Err(_) => return Lookup::Unset,
        };
        return match index
            .checked_sub(1)
            .and_then(|i| env.variables.positional_params().get(i))
        {
            Some(value) => Lookup::Value(value.clone()),
            None => Lookup::Unset,
        };
    }
    // The line number is maintained by the executor, not the table
    if name == "LINENO" {
        return Lookup::Value(env.lineno.to_string());
    }
    match env.variables.value(name) {
        Some(value) => Lookup::Value(value.to_owned()),
        None => Lookup::Unset,
    }
}

fn nounset_error(expander: &Expander, name: &str) -> Result<(), ExpansionError> {
    if expander.env.options.get(ShellOption::NoUnset) {
        Err(ExpansionError::UnsetParameter {
            name: name.to_owned(),
        })
    } else {
        Ok(())
    }
}

/// Expands `$name`.
pub(super) fn named(
    expander: &mut Expander,
    name: &str,
    quoted: bool,
) -> Result<(), ExpansionError> {
    match lookup(expander, name) {
        Lookup::Value(value) => expander.push_soft_str(&value, quoted),
        Lookup::Unset => nounset_error(expander, name)?,
    }
    Ok(())
}

/// Expands `$1` through `$9`.
pub(super) fn positional(
    expander: &mut Expander,
    index: usize,
    quoted: bool,
) -> Result<(), ExpansionError> {
    named(expander, &index.to_string(), quoted)
}

/// Expands an unbraced special parameter.
pub(super) fn special(
    expander: &mut Expander,
    name: char,
    quoted: bool,
) -> Result<(), ExpansionError> {
    match name {
        '@' => {
            expander.positional_all(false, quoted);
            Ok(())
        }
        '*' => {
            expander.positional_all(true, quoted);
            Ok(())
        }
        name => named(expander, &name.to_string(), quoted),
    }
}

/// Kind of a `${...}` modifier
enum Modifier<'a> {
    /// No modifier: `${name}`
    None,
    /// `${#name}`
    Length,
    /// `-`, `=`, `+`, or `?`, optionally with a leading `:`
    Switch {
        kind: char,
        test_null: bool,
        word: &'a str,
    },
    /// `#`, `##`, `%`, or `%%`
    Trim {
        prefix: bool,
        longest: bool,
        pattern: &'a str,
    },
}

/// Splits the inside of a `${...}` into the parameter name and modifier.
fn parse_braced(inner: &str) -> Option<(&str, Modifier<'_>)> {
    // `${#name}` is a length expansion unless the whole text is a
    // parameter like `#` or `##`
    if let Some(rest) = inner.strip_prefix('#') {
        if !rest.is_empty() && is_param(rest) {
            return Some((rest, Modifier::Length));
        }
    }

    let name_len = param_prefix_len(inner)?;
    let (name, rest) = inner.split_at(name_len);
    if rest.is_empty() {
        return Some((name, Modifier::None));
    }

    let mut chars = rest.chars();
    match chars.next()? {
        ':' => {
            let kind = chars.next()?;
            if !matches!(kind, '-' | '=' | '+' | '?') {
                return None;
            }
            Some((
                name,
                Modifier::Switch {
                    kind,
                    test_null: true,
                    word: chars.as_str(),
                },
            ))
        }
        kind @ ('-' | '=' | '+' | '?') => Some((
            name,
            Modifier::Switch {
                kind,
                test_null: false,
                word: chars.as_str(),
            },
        )),
        side @ ('#' | '%') => {
            let longest = chars.clone().next() == Some(side);
            let pattern = if longest {
                chars.next();
                chars.as_str()
            } else {
                chars.as_str()
            };
            Some((
                name,
                Modifier::Trim {
                    prefix: side == '#',
                    longest,
                    pattern,
                },
            ))
        }
        _ => None,
    }
}

/// Returns the length of the leading parameter in the braced text: a
/// name, a run of digits, or one special character.
fn param_prefix_len(inner: &str) -> Option<usize> {
    let first = inner.chars().next()?;
    if first.is_ascii_alphabetic() || first == '_' {
        Some(
            inner
                .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .unwrap_or(inner.len()),
        )
    } else if first.is_ascii_digit() {
        Some(
            inner
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(inner.len()),
        )
    } else if matches!(first, '@' | '*' | '#' | '?' | '-' | '$' | '!') {
        Some(first.len_utf8())
    } else {
        None
    }
}

/// Returns true if the whole string is one parameter.
fn is_param(s: &str) -> bool {
    param_prefix_len(s) == Some(s.len())
}

/// Expands a `${...}` expansion given its inner text.
pub(super) fn braced(
    expander: &mut Expander,
    inner: &str,
    quoted: bool,
) -> Result<(), ExpansionError> {
    let bad = || ExpansionError::BadSubstitution {
        text: inner.to_owned(),
    };
    let (name, modifier) = parse_braced(inner).ok_or_else(bad)?;

    // `$@` and `$*` support the plain braced form only
    if name == "@" || name == "*" {
        return match modifier {
            Modifier::None => {
                expander.positional_all(name == "*", quoted);
                Ok(())
            }
            _ => Err(bad()),
        };
    }

    match modifier {
        Modifier::None => named(expander, name, quoted),
        Modifier::Length => {
            let length = match lookup(expander, name) {
                Lookup::Value(value) => value.chars().count(),
                Lookup::Unset => {
                    nounset_error(expander, name)?;
                    0
                }
            };
            expander.push_soft_str(&length.to_string(), quoted);
            Ok(())
        }
        Modifier::Switch {
            kind,
            test_null,
            word,
        } => switch(expander, name, kind, test_null, word, quoted),
        Modifier::Trim {
            prefix,
            longest,
            pattern,
        } => trim(expander, name, prefix, longest, pattern, quoted),
    }
}

/// Evaluates a `-`, `=`, `+`, or `?` modifier.
fn switch(
    expander: &mut Expander,
    name: &str,
    kind: char,
    test_null: bool,
    word: &str,
    quoted: bool,
) -> Result<(), ExpansionError> {
    let value = match lookup(expander, name) {
        Lookup::Value(value) if !(test_null && value.is_empty()) => Some(value),
        Lookup::Value(_) | Lookup::Unset => None,
    };

    match (kind, value) {
        ('+', Some(_)) => {
            let line = expander.line;
            let phrase = subexpand(expander.env, word, line, quoted)?;
            expander.splice(phrase);
            Ok(())
        }
        ('+', None) => Ok(()),
        (_, Some(value)) => {
            expander.push_soft_str(&value, quoted);
            Ok(())
        }
        ('-', None) => {
            let line = expander.line;
            let phrase = subexpand(expander.env, word, line, quoted)?;
            expander.splice(phrase);
            Ok(())
        }
        ('=', None) => {
            // Only a variable can be assigned to
            let first = name.chars().next();
            if !first.is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
                return Err(ExpansionError::BadSubstitution {
                    text: name.to_owned(),
                });
            }
            let line = expander.line;
            let phrase = subexpand(expander.env, word, line, quoted)?;
            let value: String = phrase
                .iter()
                .flatten()
                .filter(|c| !c.is_quoting)
                .map(|c| c.value)
                .collect();
            expander.env.variables.assign(name, value.clone())?;
            expander.push_soft_str(&value, quoted);
            Ok(())
        }
        ('?', None) => {
            let message = if word.is_empty() {
                if test_null {
                    "parameter null or not set".to_owned()
                } else {
                    "parameter not set".to_owned()
                }
            } else {
                let line = expander.line;
                let phrase = subexpand(expander.env, word, line, quoted)?;
                phrase
                    .iter()
                    .flatten()
                    .filter(|c| !c.is_quoting)
                    .map(|c| c.value)
                    .collect()
            };
            Err(ExpansionError::EmptyOrUnset {
                name: name.to_owned(),
                message,
            })
        }
        _ => unreachable!("switch kind is one of -=+?"),
    }
}

/// Evaluates a `#`, `##`, `%`, or `%%` modifier.
fn trim(
    expander: &mut Expander,
    name: &str,
    prefix: bool,
    longest: bool,
    pattern_text: &str,
    quoted: bool,
) -> Result<(), ExpansionError> {
    let value = match lookup(expander, name) {
        Lookup::Value(value) => value,
        Lookup::Unset => {
            nounset_error(expander, name)?;
            String::new()
        }
    };

    let line = expander.line;
    let chars = subexpand_pattern(expander.env, pattern_text, line)?;
    let pattern = Pattern::parse(to_pattern_chars(&chars)).map_err(|_| {
        ExpansionError::BadSubstitution {
            text: pattern_text.to_owned(),
        }
    })?;

    let boundaries: Vec<usize> = value
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(value.len()))
        .collect();

    let result = if prefix {
        // Remove the shortest or longest matching prefix
        let candidates: Box<dyn Iterator<Item = &usize>> = if longest {
            Box::new(boundaries.iter().rev())
        } else {
            Box::new(boundaries.iter())
        };
        let mut result = &value[..];
        for &i in candidates {
            if pattern.is_match(&value[..i]) {
                result = &value[i..];
                break;
            }
        }
        result
    } else {
        // Remove the shortest or longest matching suffix
        let candidates: Box<dyn Iterator<Item = &usize>> = if longest {
            Box::new(boundaries.iter())
        } else {
            Box::new(boundaries.iter().rev())
        };
        let mut result = &value[..];
        for &i in candidates {
            if pattern.is_match(&value[i..]) {
                result = &value[..i];
                break;
            }
        }
        result
    };

    expander.push_soft_str(result, quoted);
    Ok(())
}
