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

//! Shell command language syntax
//!
//! This module defines the abstract syntax trees of the shell language. The
//! type representing a whole script is [`List`], a sequence of possibly
//! asynchronous [`Item`]s. An `Item` holds an [`AndOrList`] of conditionally
//! executed [`Pipeline`]s, and a `Pipeline` is a sequence of [`Command`]s
//! connected by `|`.
//!
//! A [`Word`] is an unparsed span of source text: quotes, parameter
//! expansions, command substitutions, and arithmetic expansions are kept
//! verbatim for the word expander to interpret when the command runs.
//!
//! Every node records the 1-based source line it started on, which feeds
//! `$LINENO` and diagnostics.
//!
//! All types implement [`Display`](std::fmt::Display), which produces
//! single-line source code with here-document contents omitted. For any
//! successfully parsed input, the displayed form parses into a tree that
//! behaves identically.

use std::cell::OnceCell;
use std::rc::Rc;

#[cfg(unix)]
use std::os::unix::io::RawFd;
#[cfg(not(unix))]
type RawFd = i32;

mod impl_display;

/// Token that may involve quoting and expansions
///
/// The `text` field is the raw source text of the word with line
/// continuations removed. An empty word is valid only in contexts that allow
/// it; it is the parser's responsibility not to produce one elsewhere.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Word {
    /// Raw source text of the word
    pub text: String,
    /// Source line the word started on
    pub line: u64,
}

impl Word {
    /// Creates a word from its raw text.
    pub fn new<T: Into<String>>(text: T, line: u64) -> Self {
        Word {
            text: text.into(),
            line,
        }
    }
}

/// Assignment word (`name=value`)
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Assign {
    /// Name of the variable, a valid identifier
    pub name: String,
    /// Unexpanded value
    pub value: Word,
    /// Source line of the assignment word
    pub line: u64,
}

/// Redirection operators other than here-documents
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RedirOp {
    /// `<` (open a file for input)
    FileIn,
    /// `<>` (open a file for input and output)
    FileInOut,
    /// `>` (open a file for output; fail if existing and `noclobber` is set)
    FileOut,
    /// `>>` (open a file for output, appending)
    FileAppend,
    /// `>|` (open a file for output; always truncate)
    FileClobber,
    /// `<&` (copy or close a file descriptor for input)
    FdIn,
    /// `>&` (copy or close a file descriptor for output)
    FdOut,
}

/// Here-document
#[derive(Debug)]
pub struct HereDoc {
    /// Delimiter word, with its quoting intact
    pub delimiter: Word,

    /// Delimiter after quote removal, used to find the end of the content
    pub delimiter_unquoted: String,

    /// Whether the delimiter was quoted in the source
    ///
    /// A quoted delimiter makes the content entirely literal; otherwise the
    /// content undergoes parameter, command, and arithmetic expansion when
    /// the redirection is applied.
    pub quoted: bool,

    /// Whether leading tab characters are removed from each content line
    ///
    /// This is `true` for the `<<-` operator and `false` for `<<`.
    pub remove_tabs: bool,

    /// Content of the here-document
    ///
    /// The content is parsed separately from the operator: the cell starts
    /// empty when the operator is parsed and is filled when the rest of the
    /// logical line has been consumed. The content ends with a newline
    /// unless it is empty.
    pub content: OnceCell<String>,
}

impl PartialEq for HereDoc {
    fn eq(&self, other: &Self) -> bool {
        self.delimiter == other.delimiter
            && self.remove_tabs == other.remove_tabs
            && self.content.get() == other.content.get()
    }
}

impl Eq for HereDoc {}

/// Part of a redirection that defines the nature of the resulting file
/// descriptor
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RedirBody {
    /// Redirection to or from a file or file descriptor
    Normal {
        /// Operator
        operator: RedirOp,
        /// Operand word, expanded when the redirection is applied
        operand: Word,
    },
    /// Here-document
    HereDoc(Rc<HereDoc>),
}

/// Redirection
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Redir {
    /// Explicit file descriptor the redirection modifies, if any
    pub fd: Option<RawFd>,
    /// Nature of the resulting file descriptor
    pub body: RedirBody,
}

impl Redir {
    /// Returns the file descriptor this redirection modifies.
    ///
    /// When no IO_NUMBER was given, the default depends on the operator:
    /// 0 for input-like operators and here-documents, 1 for output-like
    /// operators.
    #[must_use]
    pub fn fd_or_default(&self) -> RawFd {
        use RedirOp::*;
        self.fd.unwrap_or(match &self.body {
            RedirBody::Normal { operator, .. } => match operator {
                FileIn | FileInOut | FdIn => 0,
                FileOut | FileAppend | FileClobber | FdOut => 1,
            },
            RedirBody::HereDoc(_) => 0,
        })
    }
}

/// Command that consists of assignments, words, and redirections
///
/// A syntactically valid simple command contains at least one of the three.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SimpleCommand {
    /// Assignment prefixes, in source order
    pub assigns: Vec<Assign>,
    /// Command name and arguments, in source order
    pub words: Vec<Word>,
    /// Redirections, in source order
    pub redirs: Vec<Redir>,
    /// Source line the command started on
    pub line: u64,
}

impl SimpleCommand {
    /// Returns true if the command has no assignments, words, or
    /// redirections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigns.is_empty() && self.words.is_empty() && self.redirs.is_empty()
    }
}

/// `elif condition; then body` clause of an `if` command
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ElifThen {
    pub condition: List,
    pub body: List,
}

/// Branch of a `case` command
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CaseItem {
    /// Patterns matched against the subject word
    ///
    /// A syntactically valid case item has at least one pattern.
    pub patterns: Vec<Word>,
    /// Commands executed when a pattern matches
    pub body: List,
}

/// Command that contains other commands
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CompoundCommand {
    /// `{ list; }`, executed in the current environment
    Grouping(List),
    /// `(list)`, executed in a subshell
    Subshell(List),
    /// `for name [in word...]; do list; done`
    ///
    /// When `values` is `None`, the loop iterates over the positional
    /// parameters.
    For {
        name: String,
        values: Option<Vec<Word>>,
        body: List,
    },
    /// `while list; do list; done`
    While { condition: List, body: List },
    /// `until list; do list; done`
    Until { condition: List, body: List },
    /// `if list; then list; [elif list; then list;]* [else list;] fi`
    If {
        condition: List,
        body: List,
        elifs: Vec<ElifThen>,
        r#else: Option<List>,
    },
    /// `case word in [pattern) list;;]* esac`
    Case { subject: Word, items: Vec<CaseItem> },
}

/// Compound command with attached redirections
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FullCompoundCommand {
    /// The main part
    pub command: CompoundCommand,
    /// Redirections
    pub redirs: Vec<Redir>,
    /// Source line the command started on
    pub line: u64,
}

/// Function definition command
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FunctionDefinition {
    /// Function name
    pub name: String,
    /// Function body
    ///
    /// The body is reference-counted so the function table can own it
    /// without cloning the tree when the definition is executed.
    pub body: Rc<FullCompoundCommand>,
    /// Source line the definition started on
    pub line: u64,
}

/// Element of a pipeline
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Simple command
    Simple(SimpleCommand),
    /// Compound command
    Compound(FullCompoundCommand),
    /// Function definition command
    Function(FunctionDefinition),
}

impl Command {
    /// Returns the source line the command started on.
    #[must_use]
    pub fn line(&self) -> u64 {
        match self {
            Command::Simple(command) => command.line,
            Command::Compound(command) => command.line,
            Command::Function(definition) => definition.line,
        }
    }
}

/// Commands separated by `|`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pipeline {
    /// Elements of the pipeline
    ///
    /// A valid pipeline has at least one command. Commands are
    /// reference-counted so pipeline stages can be passed to child
    /// execution contexts without cloning.
    pub commands: Vec<Rc<Command>>,
    /// Whether the pipeline starts with `!`, negating its exit status
    pub negation: bool,
}

/// Operator connecting pipelines in an and-or list
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AndOr {
    /// `&&`
    AndThen,
    /// `||`
    OrElse,
}

/// Pipelines separated by `&&` and `||`, short-circuiting left to right
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AndOrList {
    pub first: Pipeline,
    pub rest: Vec<(AndOr, Pipeline)>,
}

/// Element of a [`List`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Item {
    /// Main part of the item
    pub and_or: Rc<AndOrList>,
    /// Whether the item is terminated by `&` and runs asynchronously
    pub is_async: bool,
    /// Source line the item started on
    pub line: u64,
}

/// Sequence of [`Item`]s separated by `;`, `&`, or newlines
///
/// Whether an empty list is valid depends on context.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct List(pub Vec<Item>);
