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

//! Tests of the whole expansion pipeline

use super::*;
use assert_matches::assert_matches;
use marsh_env::builtin::{Builtin, Type};
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::Env;
use marsh_syntax::syntax::Word;

fn test_echo(env: &mut Env, fields: Vec<Field>) -> marsh_env::builtin::Result {
    let line = fields[1..]
        .iter()
        .map(|f| f.value.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    env.stdout.push_str(&line);
    env.stdout.push_str("\n");
    marsh_env::builtin::Result::new(ExitStatus::SUCCESS)
}

fn test_false(env: &mut Env, _: Vec<Field>) -> marsh_env::builtin::Result {
    let _ = env;
    marsh_env::builtin::Result::new(ExitStatus::FAILURE)
}

fn env() -> Env {
    let mut env = Env::new("marsh".to_owned());
    env.builtins.insert(
        "echo",
        Builtin {
            r#type: Type::Mandatory,
            execute: test_echo,
        },
    );
    env.builtins.insert(
        "false",
        Builtin {
            r#type: Type::Mandatory,
            execute: test_false,
        },
    );
    env
}

fn word(text: &str) -> Word {
    Word::new(text, 1)
}

/// Expands one word in argument position, returning the field values.
fn fields(env: &mut Env, text: &str) -> Vec<String> {
    expand_words(env, &[word(text)])
        .unwrap_or_else(|e| panic!("expansion of {text:?} failed: {e}"))
        .into_iter()
        .map(|field| field.value)
        .collect()
}

/// Expands one word in single-field position.
fn single(env: &mut Env, text: &str) -> String {
    expand_word(env, &word(text))
        .unwrap_or_else(|e| panic!("expansion of {text:?} failed: {e}"))
        .value
}

#[test]
fn literals_and_quote_removal() {
    let mut env = env();
    assert_eq!(fields(&mut env, "plain"), ["plain"]);
    assert_eq!(fields(&mut env, "'a b'"), ["a b"]);
    assert_eq!(fields(&mut env, r#""a b""#), ["a b"]);
    assert_eq!(fields(&mut env, r"a\ b"), ["a b"]);
    assert_eq!(fields(&mut env, r#"mi"x'e"d"#), ["mix'ed"]);
}

#[test]
fn backslash_rules_in_double_quotes() {
    let mut env = env();
    assert_eq!(single(&mut env, r#""\$x""#), "$x");
    assert_eq!(single(&mut env, r#""\a""#), r"\a");
    assert_eq!(single(&mut env, r#""\\""#), r"\");
}

#[test]
fn parameter_basics() {
    let mut env = env();
    env.variables.assign("x", "value").unwrap();
    assert_eq!(fields(&mut env, "$x"), ["value"]);
    assert_eq!(fields(&mut env, "${x}"), ["value"]);
    assert_eq!(fields(&mut env, "a${x}b"), ["avalueb"]);
    assert_eq!(fields(&mut env, "$unset_thing"), Vec::<String>::new());
    assert_eq!(single(&mut env, "$unset_thing"), "");
}

#[test]
fn switch_modifiers() {
    let mut env = env();

    // unset a
    assert_eq!(single(&mut env, "${a:-default}"), "default");
    assert_eq!(single(&mut env, "${a-default}"), "default");
    assert_eq!(single(&mut env, "${#a}"), "0");

    // a set but null
    env.variables.assign("a", "").unwrap();
    assert_eq!(single(&mut env, "${a:-default}"), "default");
    assert_eq!(single(&mut env, "${a-set}"), "");
    assert_eq!(single(&mut env, "${a:+alt}"), "");
    assert_eq!(single(&mut env, "${a+alt}"), "alt");

    // a set and non-null
    env.variables.assign("a", "val").unwrap();
    assert_eq!(single(&mut env, "${a:-default}"), "val");
    assert_eq!(single(&mut env, "${a:+alt}"), "alt");
    assert_eq!(single(&mut env, "${#a}"), "3");
}

#[test]
fn assign_modifier_sets_variable() {
    let mut env = env();
    assert_eq!(single(&mut env, "${newvar:=filled}"), "filled");
    assert_eq!(env.variables.value("newvar"), Some("filled"));
    // Now set: the existing value wins
    assert_eq!(single(&mut env, "${newvar:=other}"), "filled");
}

#[test]
fn error_modifier() {
    let mut env = env();
    let error = expand_word(&mut env, &word("${nope:?no such}")).unwrap_err();
    assert_matches!(error, ExpansionError::EmptyOrUnset { name, message } => {
        assert_eq!(name, "nope");
        assert_eq!(message, "no such");
    });
    let error = expand_word(&mut env, &word("${nope?}")).unwrap_err();
    assert_matches!(error, ExpansionError::EmptyOrUnset { message, .. } => {
        assert_eq!(message, "parameter not set");
    });
}

#[test]
fn trim_modifiers() {
    let mut env = env();
    env.variables.assign("path", "a/b/c.txt").unwrap();
    assert_eq!(single(&mut env, "${path#*/}"), "b/c.txt");
    assert_eq!(single(&mut env, "${path##*/}"), "c.txt");
    assert_eq!(single(&mut env, "${path%/*}"), "a/b");
    assert_eq!(single(&mut env, "${path%%/*}"), "a");
    assert_eq!(single(&mut env, "${path%.txt}"), "a/b/c");
    // Unmatched patterns leave the value whole
    assert_eq!(single(&mut env, "${path#zzz}"), "a/b/c.txt");
    // Quoted wildcards in the pattern are literal
    env.variables.assign("star", "*x").unwrap();
    assert_eq!(single(&mut env, r"${star#\*}"), "x");
}

#[test]
fn special_parameters() {
    let mut env = env();
    env.exit_status = ExitStatus(42);
    assert_eq!(single(&mut env, "$?"), "42");
    assert_eq!(single(&mut env, "$0"), "marsh");
    assert_eq!(single(&mut env, "$$"), env.shell_pid.to_string());
    assert_eq!(single(&mut env, "$#"), "0");

    env.variables
        .set_positional_params(vec!["one".to_owned(), "two".to_owned()]);
    assert_eq!(single(&mut env, "$#"), "2");
    assert_eq!(single(&mut env, "$1"), "one");
    assert_eq!(single(&mut env, "$2"), "two");
    assert_eq!(single(&mut env, "$3"), "");

    let many: Vec<String> = (1..=11).map(|i| i.to_string()).collect();
    env.variables.set_positional_params(many);
    assert_eq!(single(&mut env, "${10}"), "10");
    // Unbraced, only one digit belongs to the parameter: `$1` then `0`
    assert_eq!(single(&mut env, "$10"), "10");
}

#[test]
fn at_and_star() {
    let mut env = env();

    // Zero positional parameters: quoted $@ makes zero fields
    assert_eq!(fields(&mut env, "\"$@\""), Vec::<String>::new());
    assert_eq!(fields(&mut env, "\"\""), [""]);

    env.variables
        .set_positional_params(vec!["a b".to_owned(), "c".to_owned()]);
    assert_eq!(fields(&mut env, "\"$@\""), ["a b", "c"]);
    assert_eq!(fields(&mut env, "$@"), ["a", "b", "c"]);
    assert_eq!(fields(&mut env, "\"$*\""), ["a b c"]);
    assert_eq!(fields(&mut env, "$*"), ["a", "b", "c"]);

    // "$*" joins with the first character of IFS
    env.variables.assign("IFS", ":").unwrap();
    assert_eq!(fields(&mut env, "\"$*\""), ["a b:c"]);
}

#[test]
fn quoted_at_with_affixes() {
    let mut env = env();
    env.variables
        .set_positional_params(vec!["a".to_owned(), "b".to_owned()]);
    assert_eq!(fields(&mut env, "\"x$@y\""), ["xa", "by"]);
}

#[test]
fn field_splitting_applies_to_expansions_only() {
    let mut env = env();
    env.variables.assign("spaced", "one two  three").unwrap();
    assert_eq!(fields(&mut env, "$spaced"), ["one", "two", "three"]);
    assert_eq!(fields(&mut env, "\"$spaced\""), ["one two  three"]);
    assert_eq!(fields(&mut env, "pre$spaced"), ["preone", "two", "three"]);

    env.variables.assign("IFS", ":").unwrap();
    env.variables.assign("csv", "a::b:").unwrap();
    assert_eq!(fields(&mut env, "$csv"), ["a", "", "b"]);
}

#[test]
fn default_word_is_subject_to_splitting() {
    let mut env = env();
    assert_eq!(fields(&mut env, "${u:-a b}"), ["a", "b"]);
    assert_eq!(fields(&mut env, "${u:-'a b'}"), ["a b"]);
}

#[test]
fn arithmetic_expansion() {
    let mut env = env();
    assert_eq!(single(&mut env, "$((1 + 2 * 3))"), "7");
    assert_eq!(single(&mut env, "$(((1 + 2) * 3))"), "9");
    env.variables.assign("n", "10").unwrap();
    assert_eq!(single(&mut env, "$((n - 1))"), "9");
    assert_eq!(single(&mut env, "$(($n - 1))"), "9");
    assert_eq!(single(&mut env, "$((unset_var + 5))"), "5");

    let error = expand_word(&mut env, &word("$((0/0))")).unwrap_err();
    assert_matches!(error, ExpansionError::Arith(_));
}

#[test]
fn tilde_expansion() {
    let mut env = env();
    env.variables.assign("HOME", "/home/me").unwrap();
    assert_eq!(fields(&mut env, "~"), ["/home/me"]);
    assert_eq!(fields(&mut env, "~/docs"), ["/home/me/docs"]);
    // Quoted or non-leading tildes are literal
    assert_eq!(fields(&mut env, "'~'"), ["~"]);
    assert_eq!(fields(&mut env, "x~"), ["x~"]);
    // The result is not field-split
    env.variables.assign("HOME", "/home/with space").unwrap();
    assert_eq!(fields(&mut env, "~"), ["/home/with space"]);
}

#[test]
fn nounset_option() {
    let mut env = env();
    env.options.set(marsh_env::option::ShellOption::NoUnset, true);
    let error = expand_word(&mut env, &word("$missing")).unwrap_err();
    assert_matches!(error, ExpansionError::UnsetParameter { name } => {
        assert_eq!(name, "missing");
    });
    // Defaulting forms are exempt
    assert_eq!(single(&mut env, "${missing:-ok}"), "ok");
}

#[test]
fn command_substitution_in_process() {
    let mut env = env();
    assert_eq!(fields(&mut env, "$(echo hi)"), ["hi"]);
    assert_eq!(fields(&mut env, "`echo hi`"), ["hi"]);
    assert_eq!(single(&mut env, "a$(echo b)c"), "abc");
    // Trailing newlines are stripped, embedded ones stay
    assert_eq!(single(&mut env, "\"$(echo hi)\""), "hi");
    // The captured output is split when unquoted
    assert_eq!(fields(&mut env, "$(echo one two)"), ["one", "two"]);
    assert_eq!(fields(&mut env, "\"$(echo one two)\""), ["one two"]);
}

#[test]
fn command_substitution_sets_exit_status() {
    let mut env = env();
    assert_eq!(single(&mut env, "$(false)"), "");
    assert_eq!(env.exit_status, ExitStatus::FAILURE);
    assert_eq!(single(&mut env, "$(echo ok)"), "ok");
    assert_eq!(env.exit_status, ExitStatus::SUCCESS);
}

#[test]
fn command_substitution_side_effects_do_not_escape() {
    let mut env = env();
    assert_eq!(single(&mut env, "$(echo ${leak:=oops})"), "oops");
    assert_eq!(env.variables.value("leak"), None);
}

#[test]
fn backquote_escapes() {
    let mut env = env();
    env.variables.assign("v", "var").unwrap();
    assert_eq!(single(&mut env, r"`echo \$v`"), "$v");
}

#[test]
fn bad_substitution() {
    let mut env = env();
    let error = expand_word(&mut env, &word("${x;}")).unwrap_err();
    assert_matches!(error, ExpansionError::BadSubstitution { .. });
}

#[test]
fn heredoc_expansion() {
    use marsh_syntax::parser::Parser;
    use marsh_syntax::syntax::{Command, RedirBody};

    let mut env = env();
    env.variables.assign("V", "world").unwrap();

    let list = Parser::new("cat <<EOF\nhello $V\nEOF\n").program().unwrap();
    let Command::Simple(simple) = &*list.0[0].and_or.first.commands[0] else {
        panic!("not a simple command");
    };
    let RedirBody::HereDoc(here_doc) = &simple.redirs[0].body else {
        panic!("not a here-document");
    };
    assert_eq!(expand_heredoc(&mut env, here_doc).unwrap(), "hello world\n");

    let list = Parser::new("cat <<'EOF'\nhello $V\nEOF\n").program().unwrap();
    let Command::Simple(simple) = &*list.0[0].and_or.first.commands[0] else {
        panic!("not a simple command");
    };
    let RedirBody::HereDoc(here_doc) = &simple.redirs[0].body else {
        panic!("not a here-document");
    };
    assert_eq!(expand_heredoc(&mut env, here_doc).unwrap(), "hello $V\n");
}
