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

//! Syntax tree and parser for a Kotlin subset
//!
//! This crate turns Kotlin source text into an arena-backed [`SyntaxTree`]
//! and exposes it through the [`TreeNavigator`] trait.
//!
//! ```rust
//! use lambda_hints_syntax::{parse, NodeKind, TreeNavigator};
//!
//! let tree = parse("val doubled = list.map { it * 2 }").unwrap();
//! let lambdas = tree
//!     .preorder()
//!     .into_iter()
//!     .filter(|id| matches!(tree.kind(*id), NodeKind::Lambda))
//!     .count();
//! assert_eq!(lambdas, 1);
//! ```

pub mod error;
pub mod navigator;
pub mod node;
pub mod parser;
pub mod span;
pub mod tokenizer;
pub mod tree;

// Re-export main types
pub use error::{ParseError, ParseResult};
pub use navigator::TreeNavigator;
pub use node::{
    BinaryOperator, LiteralKind, NodeId, NodeKind, PostfixOperator, PrefixOperator, SyntaxNode,
    WhenTest,
};
pub use parser::{MAX_NESTING_DEPTH, Parser};
pub use span::TextRange;
pub use tokenizer::{Token, TokenKind, Tokenizer};
pub use tree::{SyntaxTree, TreeBuilder, Trivia, TriviaKind};

/// Parse Kotlin source text into a syntax tree
pub fn parse(source: &str) -> ParseResult<SyntaxTree> {
    Parser::new(source)?.parse()
}
