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

//! Implementations of [`Display`] for the syntax types
//!
//! The displayed form is single-line source code. Here-document contents are
//! omitted; everything else parses back into an equivalent tree.

use super::*;
use itertools::Itertools;
use std::fmt::{self, Display, Formatter, Write};

impl Display for Word {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Display for Assign {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

impl Display for RedirOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use RedirOp::*;
        f.write_str(match self {
            FileIn => "<",
            FileInOut => "<>",
            FileOut => ">",
            FileAppend => ">>",
            FileClobber => ">|",
            FdIn => "<&",
            FdOut => ">&",
        })
    }
}

impl Display for Redir {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(fd) = self.fd {
            write!(f, "{fd}")?;
        }
        match &self.body {
            RedirBody::Normal { operator, operand } => write!(f, "{operator}{operand}"),
            RedirBody::HereDoc(here_doc) => {
                let operator = if here_doc.remove_tabs { "<<-" } else { "<<" };
                write!(f, "{operator}{}", here_doc.delimiter)
            }
        }
    }
}

impl Display for SimpleCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let parts = self
            .assigns
            .iter()
            .map(ToString::to_string)
            .chain(self.words.iter().map(ToString::to_string))
            .chain(self.redirs.iter().map(ToString::to_string));
        f.write_str(&parts.format(" ").to_string())
    }
}

/// Writes a compound list followed by `; ` (or `& ` for a trailing
/// asynchronous item, which serves as its own separator).
fn write_clause(f: &mut Formatter<'_>, list: &List) -> fmt::Result {
    write!(f, "{list}")?;
    match list.0.last() {
        Some(item) if item.is_async => f.write_char(' '),
        Some(_) => f.write_str("; "),
        None => Ok(()),
    }
}

impl Display for CompoundCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use CompoundCommand::*;
        match self {
            Grouping(list) => {
                f.write_str("{ ")?;
                write_clause(f, list)?;
                f.write_char('}')
            }
            Subshell(list) => write!(f, "({list})"),
            For { name, values, body } => {
                write!(f, "for {name}")?;
                if let Some(values) = values {
                    f.write_str(" in")?;
                    for value in values {
                        write!(f, " {value}")?;
                    }
                }
                f.write_str("; do ")?;
                write_clause(f, body)?;
                f.write_str("done")
            }
            While { condition, body } => {
                f.write_str("while ")?;
                write_clause(f, condition)?;
                f.write_str("do ")?;
                write_clause(f, body)?;
                f.write_str("done")
            }
            Until { condition, body } => {
                f.write_str("until ")?;
                write_clause(f, condition)?;
                f.write_str("do ")?;
                write_clause(f, body)?;
                f.write_str("done")
            }
            If {
                condition,
                body,
                elifs,
                r#else,
            } => {
                f.write_str("if ")?;
                write_clause(f, condition)?;
                f.write_str("then ")?;
                write_clause(f, body)?;
                for elif in elifs {
                    f.write_str("elif ")?;
                    write_clause(f, &elif.condition)?;
                    f.write_str("then ")?;
                    write_clause(f, &elif.body)?;
                }
                if let Some(r#else) = r#else {
                    f.write_str("else ")?;
                    write_clause(f, r#else)?;
                }
                f.write_str("fi")
            }
            Case { subject, items } => {
                write!(f, "case {subject} in ")?;
                for item in items {
                    write!(f, "({})", item.patterns.iter().format("|"))?;
                    if !item.body.0.is_empty() {
                        write!(f, " {}", item.body)?;
                    }
                    f.write_str(";; ")?;
                }
                f.write_str("esac")
            }
        }
    }
}

impl Display for FullCompoundCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for redir in &self.redirs {
            write!(f, " {redir}")?;
        }
        Ok(())
    }
}

impl Display for FunctionDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}() {}", self.name, self.body)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Command::Simple(command) => command.fmt(f),
            Command::Compound(command) => command.fmt(f),
            Command::Function(definition) => definition.fmt(f),
        }
    }
}

impl Display for Pipeline {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.negation {
            f.write_str("! ")?;
        }
        write!(f, "{}", self.commands.iter().format(" | "))
    }
}

impl Display for AndOr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AndOr::AndThen => "&&",
            AndOr::OrElse => "||",
        })
    }
}

impl Display for AndOrList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        for (and_or, pipeline) in &self.rest {
            write!(f, " {and_or} {pipeline}")?;
        }
        Ok(())
    }
}

impl Display for List {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, item) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{}", item.and_or)?;
            if item.is_async {
                f.write_str(" &")?;
            } else if index + 1 < self.0.len() {
                f.write_char(';')?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::Parser;

    /// Parses, displays, and checks the displayed form.
    fn unparse(source: &str) -> String {
        Parser::new(source)
            .program()
            .unwrap_or_else(|e| panic!("parse error in {source:?}: {e}"))
            .to_string()
    }

    #[test]
    fn simple_commands() {
        assert_eq!(unparse("echo  hello   world"), "echo hello world");
        assert_eq!(unparse("x=1 y=2 cmd a b"), "x=1 y=2 cmd a b");
        assert_eq!(unparse("cmd 'a b' \"c d\""), "cmd 'a b' \"c d\"");
    }

    #[test]
    fn lists_and_pipelines() {
        assert_eq!(unparse("a; b; c"), "a; b; c");
        assert_eq!(unparse("a & b"), "a & b");
        assert_eq!(unparse("a | b | c"), "a | b | c");
        assert_eq!(unparse("! a || b && c"), "! a || b && c");
        assert_eq!(unparse("a\nb\n"), "a; b");
    }

    #[test]
    fn redirections() {
        assert_eq!(unparse("cmd >out 2>&1 <in"), "cmd >out 2>&1 <in");
        assert_eq!(unparse("cmd >>log 3<>rw"), "cmd >>log 3<>rw");
        assert_eq!(unparse("cat <<EOF\nbody\nEOF"), "cat <<EOF");
    }

    #[test]
    fn compound_commands() {
        assert_eq!(
            unparse("if a; then b; else c; fi"),
            "if a; then b; else c; fi"
        );
        assert_eq!(
            unparse("if a\nthen b\nelif c\nthen d\nfi"),
            "if a; then b; elif c; then d; fi"
        );
        assert_eq!(unparse("while a; do b; done"), "while a; do b; done");
        assert_eq!(unparse("until a; do b; done"), "until a; do b; done");
        assert_eq!(
            unparse("for x in 1 2 3; do echo $x; done"),
            "for x in 1 2 3; do echo $x; done"
        );
        assert_eq!(unparse("for x do y; done"), "for x; do y; done");
        assert_eq!(unparse("{ a; b; }"), "{ a; b; }");
        assert_eq!(unparse("(a; b)"), "(a; b)");
        assert_eq!(
            unparse("case $x in foo) a;; b*|c) d;; esac"),
            "case $x in (foo) a;; (b*|c) d;; esac"
        );
    }

    #[test]
    fn function_definitions() {
        assert_eq!(unparse("f() { echo hi; }"), "f() { echo hi; }");
    }

    #[test]
    fn reparsing_display_output_is_stable() {
        for source in [
            "x=1 echo hello >out; cat <in",
            "if a; then b; else c; fi",
            "for x in a b; do echo $x & done",
            "case $x in (a) b;; esac",
            "f() (echo hi)",
            "! a | b && c || d",
        ] {
            let first = unparse(source);
            assert_eq!(unparse(&first), first, "not stable for {source:?}");
        }
    }
}
