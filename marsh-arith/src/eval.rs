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

//! Recursive-descent evaluation of tokenized expressions

use crate::token::{Operator, Token, TokenValue, Tokens};
use crate::{Env, Error, ErrorCause};
use std::iter::Peekable;
use std::ops::Range;

impl From<crate::token::Error> for Error {
    fn from(error: crate::token::Error) -> Self {
        Error {
            cause: error.cause.into(),
            location: error.location,
        }
    }
}

struct Evaluator<'a, E> {
    tokens: Peekable<Tokens<'a>>,
    env: &'a E,
    /// Empty range just past the expression, for errors at end of input
    end: Range<usize>,
}

impl<'a, E: Env> Evaluator<'a, E> {
    /// Consumes the next token if it is one of the given operators.
    fn take_operator(&mut self, wanted: &[Operator]) -> Result<Option<Token<'a>>, Error> {
        match self.tokens.peek() {
            Some(Ok(token)) => match token.value {
                TokenValue::Operator(operator) if wanted.contains(&operator) => {
                    let token = token.clone();
                    self.tokens.next();
                    Ok(Some(token))
                }
                _ => Ok(None),
            },
            Some(Err(error)) => Err(error.clone().into()),
            None => Ok(None),
        }
    }

    /// Parses an operand: a constant, a variable, or `( expression )`.
    fn primary(&mut self) -> Result<i64, Error> {
        let Some(token) = self.tokens.next().transpose()? else {
            return Err(Error {
                cause: ErrorCause::MissingOperand,
                location: self.end.clone(),
            });
        };
        match token.value {
            TokenValue::Integer(value) => Ok(value),
            TokenValue::Name(name) => variable_value(self.env, name, token.location),
            TokenValue::Operator(Operator::OpenParen) => {
                let value = self.additive()?;
                if self.take_operator(&[Operator::CloseParen])?.is_none() {
                    return Err(Error {
                        cause: ErrorCause::UnmatchedParenthesis,
                        location: token.location,
                    });
                }
                Ok(value)
            }
            TokenValue::Operator(_) => Err(Error {
                cause: ErrorCause::MissingOperand,
                location: token.location,
            }),
        }
    }

    fn unary(&mut self) -> Result<i64, Error> {
        if let Some(token) = self.take_operator(&[Operator::Plus, Operator::Minus])? {
            let value = self.unary()?;
            return match token.value {
                TokenValue::Operator(Operator::Plus) => Ok(value),
                _ => value.checked_neg().ok_or(Error {
                    cause: ErrorCause::Overflow,
                    location: token.location,
                }),
            };
        }
        self.primary()
    }

    fn multiplicative(&mut self) -> Result<i64, Error> {
        let mut value = self.unary()?;
        while let Some(token) = self.take_operator(&[
            Operator::Asterisk,
            Operator::Slash,
            Operator::Percent,
        ])? {
            let rhs = self.unary()?;
            let divides = !matches!(token.value, TokenValue::Operator(Operator::Asterisk));
            if divides && rhs == 0 {
                return Err(Error {
                    cause: ErrorCause::DivisionByZero,
                    location: token.location,
                });
            }
            let result = match token.value {
                TokenValue::Operator(Operator::Asterisk) => value.checked_mul(rhs),
                TokenValue::Operator(Operator::Slash) => value.checked_div(rhs),
                _ => value.checked_rem(rhs),
            };
            value = result.ok_or(Error {
                cause: ErrorCause::Overflow,
                location: token.location,
            })?;
        }
        Ok(value)
    }

    fn additive(&mut self) -> Result<i64, Error> {
        let mut value = self.multiplicative()?;
        while let Some(token) = self.take_operator(&[Operator::Plus, Operator::Minus])? {
            let rhs = self.multiplicative()?;
            let result = match token.value {
                TokenValue::Operator(Operator::Plus) => value.checked_add(rhs),
                _ => value.checked_sub(rhs),
            };
            value = result.ok_or(Error {
                cause: ErrorCause::Overflow,
                location: token.location,
            })?;
        }
        Ok(value)
    }
}

/// Looks up a variable and interprets its value as an integer.
///
/// An unset or blank variable counts as zero.
fn variable_value<E: Env>(env: &E, name: &str, location: Range<usize>) -> Result<i64, Error> {
    let Some(value) = env.get_variable(name) else {
        return Ok(0);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse().map_err(|_| Error {
        cause: ErrorCause::InvalidVariableValue(value.to_owned()),
        location,
    })
}

/// Parses and evaluates a whole expression.
pub fn expression<E: Env>(source: &str, env: &E) -> Result<i64, Error> {
    let mut evaluator = Evaluator {
        tokens: Tokens::new(source).peekable(),
        env,
        end: source.len()..source.len(),
    };
    let value = evaluator.additive()?;
    match evaluator.tokens.next() {
        None => Ok(value),
        Some(Ok(token)) => Err(Error {
            cause: ErrorCause::UnexpectedToken,
            location: token.location,
        }),
        Some(Err(error)) => Err(error.into()),
    }
}
