// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parser error types

use thiserror::Error;

/// Result type for tokenizer and parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse error with location information
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A character that cannot start any token
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character
        character: char,
        /// Byte offset of the character
        position: usize,
    },

    /// String literal without a closing quote
    #[error("Unclosed string literal starting at position {position}")]
    UnterminatedString {
        /// Position where the string started
        position: usize,
    },

    /// Block comment without a closing `*/`
    #[error("Unclosed block comment starting at position {position}")]
    UnterminatedComment {
        /// Position where the comment started
        position: usize,
    },

    /// Malformed number or character literal
    #[error("Invalid {literal_type} literal at position {position}: {value}")]
    InvalidLiteral {
        /// Kind of literal that failed to lex
        literal_type: String,
        /// The invalid source text
        value: String,
        /// Position of the literal
        position: usize,
    },

    /// Token that is not valid at this point of the grammar
    #[error("Unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// Source text of the token
        token: String,
        /// Position where the token was found
        position: usize,
    },

    /// A specific token was required
    #[error("Expected {expected} at position {position}")]
    ExpectedToken {
        /// Description of what was expected
        expected: String,
        /// Position where it was expected
        position: usize,
    },

    /// Expressions, blocks or types nested beyond the parser's limit
    #[error("Nesting too deep at position {position}")]
    NestingTooDeep {
        /// Position of the construct that exceeded the limit
        position: usize,
    },

    /// Input ended in the middle of a construct
    #[error("Unexpected end of input")]
    UnexpectedEof,
}

impl ParseError {
    /// Byte offset the error points at, if it has one
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::UnexpectedCharacter { position, .. }
            | ParseError::UnterminatedString { position }
            | ParseError::UnterminatedComment { position }
            | ParseError::InvalidLiteral { position, .. }
            | ParseError::UnexpectedToken { position, .. }
            | ParseError::ExpectedToken { position, .. }
            | ParseError::NestingTooDeep { position } => Some(*position),
            ParseError::UnexpectedEof => None,
        }
    }
}
