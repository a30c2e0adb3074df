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

//! Command search
//!
//! A command name resolves in this order: special built-in, function,
//! ordinary built-in, external utility found on `$PATH`. A name
//! containing a slash skips the search and is executed directly.

use marsh_env::builtin::Builtin;
use marsh_env::function::Function;
use marsh_env::variable::PATH;
use marsh_env::Env;
use std::ffi::CString;
use std::rc::Rc;

/// What a command name resolved to
#[derive(Clone, Debug)]
pub enum Target {
    /// A built-in utility (special or ordinary)
    Builtin(Builtin),
    /// A shell function
    Function(Rc<Function>),
    /// An external utility
    External { path: CString },
    /// Nothing was found.
    NotFound,
}

/// Resolves a command name.
pub fn search(env: &Env, name: &str) -> Target {
    if let Some(builtin) = env.builtins.get(name) {
        if builtin.is_special() {
            return Target::Builtin(*builtin);
        }
    }
    if let Some(function) = env.functions.get(name) {
        return Target::Function(Rc::clone(function));
    }
    if let Some(builtin) = env.builtins.get(name) {
        return Target::Builtin(*builtin);
    }

    if name.contains('/') {
        return match CString::new(name) {
            Ok(path) => Target::External { path },
            Err(_) => Target::NotFound,
        };
    }

    let path = env.variables.value(PATH).unwrap_or("");
    for dir in path.split(':') {
        let dir = if dir.is_empty() { "." } else { dir };
        let candidate = format!("{dir}/{name}");
        let Ok(candidate) = CString::new(candidate) else {
            continue;
        };
        if env.system.is_executable(&candidate) {
            return Target::External { path: candidate };
        }
    }
    Target::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use marsh_env::builtin::Type;
    use marsh_env::semantics::{ExitStatus, Field};
    use std::os::unix::fs::PermissionsExt;

    fn nop(_: &mut Env, _: Vec<Field>) -> marsh_env::builtin::Result {
        marsh_env::builtin::Result::new(ExitStatus::SUCCESS)
    }

    fn function(name: &str) -> Function {
        use marsh_syntax::parser::Parser;
        use marsh_syntax::syntax::Command;
        let source = format!("{name}() {{ :; }}");
        let list = Parser::new(&source).program().unwrap();
        match &*list.0[0].and_or.first.commands[0] {
            Command::Function(definition) => Function {
                name: definition.name.clone(),
                body: Rc::clone(&definition.body),
                line: 1,
            },
            other => panic!("not a function definition: {other:?}"),
        }
    }

    #[test]
    fn special_builtin_beats_function() {
        let mut env = Env::new("marsh".to_owned());
        env.builtins.insert(
            "set",
            Builtin {
                r#type: Type::Special,
                execute: nop,
            },
        );
        env.functions.define(function("set"));
        assert_matches!(search(&env, "set"), Target::Builtin(b) => assert!(b.is_special()));
    }

    #[test]
    fn function_beats_ordinary_builtin() {
        let mut env = Env::new("marsh".to_owned());
        env.builtins.insert(
            "pwd",
            Builtin {
                r#type: Type::Mandatory,
                execute: nop,
            },
        );
        env.functions.define(function("pwd"));
        assert_matches!(search(&env, "pwd"), Target::Function(f) => {
            assert_eq!(f.name, "pwd");
        });
    }

    #[test]
    fn path_walk_finds_executables() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("mycmd");
        std::fs::write(&exe, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut env = Env::new("marsh".to_owned());
        env.variables
            .assign(PATH, format!("/nonexistent:{}", dir.path().display()))
            .unwrap();
        assert_matches!(search(&env, "mycmd"), Target::External { path } => {
            assert_eq!(path.to_str().unwrap(), exe.to_str().unwrap());
        });
        assert_matches!(search(&env, "not-there"), Target::NotFound);
    }

    #[test]
    fn slash_bypasses_path_search() {
        let env = Env::new("marsh".to_owned());
        assert_matches!(
            search(&env, "/does/not/matter"),
            Target::External { path } => {
                assert_eq!(path.to_str().unwrap(), "/does/not/matter");
            }
        );
    }

    #[test]
    fn non_executable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data");
        std::fs::write(&file, "not a program").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o644)).unwrap();

        let mut env = Env::new("marsh".to_owned());
        env.variables
            .assign(PATH, dir.path().display().to_string())
            .unwrap();
        assert_matches!(search(&env, "data"), Target::NotFound);
    }
}
