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

//! Types and functions for parsing reserved words

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error value indicating that a string is not a keyword
#[derive(Clone, Copy, Debug, Eq, Error, Hash, PartialEq)]
#[error("not a keyword")]
pub struct ParseKeywordError;

/// Token identifier for reserved words
///
/// Keyword status is assigned when the token is read. The parser consumes
/// keywords only where the grammar expects them; anywhere else a keyword
/// token is demoted to an ordinary word.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Keyword {
    /// `!`
    Bang,
    Case,
    Do,
    Done,
    Elif,
    Else,
    Esac,
    Fi,
    For,
    /// `function`, accepted as a non-portable way to define a function
    Function,
    If,
    In,
    Then,
    Until,
    While,
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,
}

impl Keyword {
    /// Returns the literal string representation of the keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        use Keyword::*;
        match self {
            Bang => "!",
            Case => "case",
            Do => "do",
            Done => "done",
            Elif => "elif",
            Else => "else",
            Esac => "esac",
            Fi => "fi",
            For => "for",
            Function => "function",
            If => "if",
            In => "in",
            Then => "then",
            Until => "until",
            While => "while",
            OpenBrace => "{",
            CloseBrace => "}",
        }
    }

    /// Determines if this keyword closes or continues an open clause.
    ///
    /// A compound list ends (without consuming the keyword) when one of
    /// these is seen.
    #[must_use]
    pub const fn is_clause_delimiter(self) -> bool {
        use Keyword::*;
        matches!(self, Do | Done | Elif | Else | Esac | Fi | Then | CloseBrace)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Keyword {
    type Err = ParseKeywordError;

    fn from_str(s: &str) -> Result<Keyword, ParseKeywordError> {
        use Keyword::*;
        match s {
            "!" => Ok(Bang),
            "case" => Ok(Case),
            "do" => Ok(Do),
            "done" => Ok(Done),
            "elif" => Ok(Elif),
            "else" => Ok(Else),
            "esac" => Ok(Esac),
            "fi" => Ok(Fi),
            "for" => Ok(For),
            "function" => Ok(Function),
            "if" => Ok(If),
            "in" => Ok(In),
            "then" => Ok(Then),
            "until" => Ok(Until),
            "while" => Ok(While),
            "{" => Ok(OpenBrace),
            "}" => Ok(CloseBrace),
            _ => Err(ParseKeywordError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_string() {
        for keyword in [
            Keyword::Bang,
            Keyword::Case,
            Keyword::Do,
            Keyword::Done,
            Keyword::Elif,
            Keyword::Else,
            Keyword::Esac,
            Keyword::Fi,
            Keyword::For,
            Keyword::Function,
            Keyword::If,
            Keyword::In,
            Keyword::Then,
            Keyword::Until,
            Keyword::While,
            Keyword::OpenBrace,
            Keyword::CloseBrace,
        ] {
            assert_eq!(keyword.as_str().parse(), Ok(keyword));
        }
    }

    #[test]
    fn non_keywords() {
        assert_eq!("iff".parse::<Keyword>(), Err(ParseKeywordError));
        assert_eq!("IF".parse::<Keyword>(), Err(ParseKeywordError));
        assert_eq!("".parse::<Keyword>(), Err(ParseKeywordError));
    }
}
