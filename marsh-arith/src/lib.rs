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

//! Shell arithmetic expansion
//!
//! This crate evaluates the expression of an arithmetic expansion
//! (`$((expression))`). The expression grammar is signed 64-bit integer
//! arithmetic with, in decreasing precedence:
//!
//! 1. parenthesized sub-expressions,
//! 2. unary `+` and `-`,
//! 3. `*`, `/`, and `%`,
//! 4. binary `+` and `-`.
//!
//! An operand is an integer constant in C syntax (decimal, octal with a `0`
//! prefix, or hexadecimal with a `0x` prefix) or a variable name. Variables
//! are accessed through the [`Env`] trait the caller implements; an unset or
//! empty variable evaluates to zero, and a value that does not parse as an
//! integer is an error.
//!
//! ```
//! use std::collections::HashMap;
//! let mut env = HashMap::new();
//! env.insert("two".to_owned(), "2".to_owned());
//! assert_eq!(marsh_arith::eval("1 + two * 3", &env), Ok(7));
//! ```
//!
//! All errors carry the byte range of the offending part of the expression
//! so the shell can point at it in diagnostics.

mod eval;
mod token;

pub use token::TokenError;

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::ops::Range;
use thiserror::Error;

/// Interface for reading variables during evaluation
///
/// This crate does not store variables. The caller of [`eval`] provides an
/// implementation of this trait that resolves the variable names appearing in
/// the expression.
pub trait Env {
    /// Returns the value of the named variable, or `None` if unset.
    fn get_variable(&self, name: &str) -> Option<&str>;
}

impl Env for HashMap<String, String> {
    fn get_variable(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl Env for BTreeMap<String, String> {
    fn get_variable(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Cause of an arithmetic expansion error
#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum ErrorCause {
    /// Error in tokenization
    #[error(transparent)]
    TokenError(#[from] TokenError),
    /// An operator is missing its operand.
    #[error("expected an operand")]
    MissingOperand,
    /// A token was left over after the expression ended.
    #[error("unexpected token")]
    UnexpectedToken,
    /// A `(` has no matching `)`.
    #[error("unmatched parenthesis")]
    UnmatchedParenthesis,
    /// A variable value cannot be parsed as a number.
    #[error("variable value {0:?} cannot be parsed as a number")]
    InvalidVariableValue(String),
    /// The result or an intermediate value does not fit in an `i64`.
    #[error("overflow")]
    Overflow,
    /// The right-hand side of `/` or `%` is zero.
    #[error("division by zero")]
    DivisionByZero,
}

/// Description of an error that occurred during evaluation
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Error {
    /// Cause of the error
    pub cause: ErrorCause,
    /// Byte range of the substring of the evaluated expression where the
    /// error occurred
    pub location: Range<usize>,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.cause.fmt(f)
    }
}

impl std::error::Error for Error {}

/// Evaluates an arithmetic expression.
pub fn eval<E: Env>(expression: &str, env: &E) -> Result<i64, Error> {
    eval::expression(expression, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn env() -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("ten".to_owned(), "10".to_owned());
        env.insert("empty".to_owned(), "".to_owned());
        env.insert("word".to_owned(), "hello".to_owned());
        env
    }

    #[test]
    fn constants() {
        assert_eq!(eval("42", &env()), Ok(42));
        assert_eq!(eval("0x10", &env()), Ok(16));
        assert_eq!(eval("010", &env()), Ok(8));
        assert_eq!(eval("0", &env()), Ok(0));
    }

    #[test]
    fn precedence() {
        assert_eq!(eval("1 + 2 * 3", &env()), Ok(7));
        assert_eq!(eval("(1 + 2) * 3", &env()), Ok(9));
        assert_eq!(eval("10 - 4 - 3", &env()), Ok(3));
        assert_eq!(eval("100 / 10 / 5", &env()), Ok(2));
        assert_eq!(eval("17 % 5", &env()), Ok(2));
    }

    #[test]
    fn unary_operators() {
        assert_eq!(eval("-3", &env()), Ok(-3));
        assert_eq!(eval("+3", &env()), Ok(3));
        assert_eq!(eval("- -3", &env()), Ok(3));
        assert_eq!(eval("2 * -3", &env()), Ok(-6));
    }

    #[test]
    fn variables() {
        assert_eq!(eval("ten + 1", &env()), Ok(11));
        assert_eq!(eval("empty + 1", &env()), Ok(1));
        assert_eq!(eval("unset_name + 1", &env()), Ok(1));
        assert_matches!(
            eval("word", &env()),
            Err(Error {
                cause: ErrorCause::InvalidVariableValue(value),
                ..
            }) => assert_eq!(value, "hello")
        );
    }

    #[test]
    fn division_by_zero() {
        assert_matches!(
            eval("0/0", &env()),
            Err(Error {
                cause: ErrorCause::DivisionByZero,
                ..
            })
        );
        assert_matches!(
            eval("1 % (ten - 10)", &env()),
            Err(Error {
                cause: ErrorCause::DivisionByZero,
                ..
            })
        );
    }

    #[test]
    fn overflow() {
        assert_matches!(
            eval("9223372036854775807 + 1", &env()),
            Err(Error {
                cause: ErrorCause::Overflow,
                ..
            })
        );
        assert_matches!(
            eval("(0 - 9223372036854775807 - 1) / -1", &env()),
            Err(Error {
                cause: ErrorCause::Overflow,
                ..
            })
        );
    }

    #[test]
    fn syntax_errors() {
        assert_matches!(
            eval("1 +", &env()),
            Err(Error {
                cause: ErrorCause::MissingOperand,
                ..
            })
        );
        assert_matches!(
            eval("1 2", &env()),
            Err(Error {
                cause: ErrorCause::UnexpectedToken,
                ..
            })
        );
        assert_matches!(
            eval("(1", &env()),
            Err(Error {
                cause: ErrorCause::UnmatchedParenthesis,
                ..
            })
        );
        assert_matches!(
            eval("", &env()),
            Err(Error {
                cause: ErrorCause::MissingOperand,
                ..
            })
        );
    }

    #[test]
    fn error_location_points_at_offending_token() {
        let error = eval("1 + word", &env()).unwrap_err();
        assert_eq!(error.location, 4..8);
    }
}
