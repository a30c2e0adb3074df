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

//! Pathname expansion
//!
//! A field containing an unquoted `*`, `?`, or bracket expression is
//! matched against the filesystem. The field is cut at `/` into
//! components; components with wildcards scan their directory, literal
//! components are simply appended. Quoted characters match literally, a
//! name starting with `.` is only matched by a literal `.`, and scan
//! errors are ignored. The results are sorted; if nothing matches, the
//! field is left as it is (minus its quoting).

use super::attr::{to_pattern_chars, AttrChar, AttrField};
use either::Either;
use marsh_env::semantics::Field;
use marsh_env::Env;
use marsh_fnmatch::{Pattern, PatternChar};

/// Expands one field, yielding the matching pathnames or the field
/// itself.
pub(super) fn glob_field(_env: &Env, field: AttrField) -> impl Iterator<Item = Field> {
    if !has_unquoted_wildcard(&field.chars) {
        return Either::Left(std::iter::once(field.remove_quotes()));
    }

    let line = field.line;
    let mut paths = match expand_paths(&field.chars) {
        Some(paths) if !paths.is_empty() => paths,
        // No match leaves the field unchanged
        _ => return Either::Left(std::iter::once(field.remove_quotes())),
    };
    paths.sort();
    Either::Right(paths.into_iter().map(move |value| Field { value, line }))
}

/// Returns true if any unquoted character could make this field a
/// pattern.
fn has_unquoted_wildcard(chars: &[AttrChar]) -> bool {
    chars
        .iter()
        .any(|c| !c.is_quoted && !c.is_quoting && matches!(c.value, '*' | '?' | '['))
}

/// Walks the filesystem for the pattern, component by component.
///
/// Returns `None` when the pattern is malformed enough that matching is
/// not attempted.
fn expand_paths(chars: &[AttrChar]) -> Option<Vec<String>> {
    let components: Vec<&[AttrChar]> = chars
        .split(|c| !c.is_quoting && c.value == '/')
        .collect();
    let absolute = chars.first().is_some_and(|c| c.value == '/' && !c.is_quoting);

    // A trailing slash means only directories match
    let want_directory = components.last().is_some_and(|c| c.is_empty());
    let components = if want_directory {
        &components[..components.len() - 1]
    } else {
        &components[..]
    };

    let mut candidates: Vec<String> = vec![if absolute {
        "/".to_owned()
    } else {
        String::new()
    }];
    // The leading empty component of an absolute path is already consumed
    let components = if absolute { &components[1..] } else { components };

    for component in components {
        if component.is_empty() {
            // Doubled slashes collapse
            continue;
        }
        let pattern_chars: Vec<PatternChar> = to_pattern_chars(component).collect();
        let is_literal = !component
            .iter()
            .any(|c| !c.is_quoted && !c.is_quoting && matches!(c.value, '*' | '?' | '['));

        if is_literal {
            let text: String = pattern_chars.iter().map(|c| c.char_value()).collect();
            for candidate in &mut candidates {
                if !candidate.is_empty() && !candidate.ends_with('/') {
                    candidate.push('/');
                }
                candidate.push_str(&text);
            }
            continue;
        }

        let pattern = Pattern::parse(pattern_chars.iter().copied()).ok()?;
        let mut next = Vec::new();
        for candidate in &candidates {
            let dir = if candidate.is_empty() {
                "."
            } else {
                candidate.as_str()
            };
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with('.') && !pattern.matches_leading_period() {
                    continue;
                }
                if pattern.is_match(&name) {
                    let mut path = candidate.clone();
                    if !path.is_empty() && !path.ends_with('/') {
                        path.push('/');
                    }
                    path.push_str(&name);
                    next.push(path);
                }
            }
        }
        candidates = next;
        if candidates.is_empty() {
            return Some(Vec::new());
        }
    }

    // Components appended literally must actually exist
    candidates.retain(|path| {
        let target = if path.is_empty() { "." } else { path.as_str() };
        match std::fs::symlink_metadata(target) {
            Ok(metadata) => !want_directory || metadata.is_dir() || {
                // A symlink to a directory also counts
                std::fs::metadata(target).map(|m| m.is_dir()).unwrap_or(false)
            },
            Err(_) => false,
        }
    });
    if want_directory {
        for path in &mut candidates {
            path.push('/');
        }
    }
    Some(candidates)
}
