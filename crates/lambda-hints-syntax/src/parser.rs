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

//! Recursive descent parser with precedence climbing for binary operators
//!
//! The grammar is a newline-sensitive Kotlin subset. Inside braces a line
//! break terminates a statement; inside parentheses and brackets it is
//! ordinary whitespace. A line break may still precede `.`, `?.`, `&&`, `||`,
//! `?:` and `else`. Call parentheses, index brackets and trailing lambdas
//! must start on the callee's line.

use crate::error::{ParseError, ParseResult};
use crate::node::{
    BinaryOperator, LiteralKind, NodeId, NodeKind, PostfixOperator, PrefixOperator, WhenTest,
};
use crate::span::TextRange;
use crate::tokenizer::{Token, TokenKind, Tokenizer};
use crate::tree::{SyntaxTree, TreeBuilder};

/// Binary operator precedence levels (higher = tighter binding)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// `||`
    Disjunction = 1,
    /// `&&`
    Conjunction = 2,
    /// `==`, `!=`, `===`, `!==`
    Equality = 3,
    /// `<`, `>`, `<=`, `>=`
    Comparison = 4,
    /// `in`, `!in`, `is`, `!is`
    NamedCheck = 5,
    /// `?:`
    Elvis = 6,
    /// `..`
    Range = 7,
    /// `+`, `-`
    Additive = 8,
    /// `*`, `/`, `%`
    Multiplicative = 9,
    /// `as`, `as?`
    Cast = 10,
}

impl Precedence {
    /// Next higher level, used for the right operand of left-associative operators
    #[inline]
    pub const fn next_level(self) -> Self {
        match self {
            Precedence::Disjunction => Precedence::Conjunction,
            Precedence::Conjunction => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::NamedCheck,
            Precedence::NamedCheck => Precedence::Elvis,
            Precedence::Elvis => Precedence::Range,
            Precedence::Range => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Cast,
            Precedence::Cast => Precedence::Cast,
        }
    }
}

#[inline]
fn get_precedence(kind: TokenKind) -> Option<Precedence> {
    let precedence = match kind {
        TokenKind::OrOr => Precedence::Disjunction,
        TokenKind::AndAnd => Precedence::Conjunction,
        TokenKind::EqEq | TokenKind::NotEq | TokenKind::EqEqEq | TokenKind::NotEqEq => {
            Precedence::Equality
        }
        TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => Precedence::Comparison,
        TokenKind::In | TokenKind::NotIn | TokenKind::Is | TokenKind::NotIs => {
            Precedence::NamedCheck
        }
        TokenKind::Elvis => Precedence::Elvis,
        TokenKind::RangeTo => Precedence::Range,
        TokenKind::Plus | TokenKind::Minus => Precedence::Additive,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Multiplicative,
        TokenKind::As | TokenKind::AsSafe => Precedence::Cast,
        _ => return None,
    };
    Some(precedence)
}

#[inline]
fn token_to_binary_op(kind: TokenKind) -> Option<BinaryOperator> {
    let op = match kind {
        TokenKind::OrOr => BinaryOperator::Or,
        TokenKind::AndAnd => BinaryOperator::And,
        TokenKind::EqEq => BinaryOperator::Equal,
        TokenKind::NotEq => BinaryOperator::NotEqual,
        TokenKind::EqEqEq => BinaryOperator::Identical,
        TokenKind::NotEqEq => BinaryOperator::NotIdentical,
        TokenKind::Lt => BinaryOperator::Less,
        TokenKind::Gt => BinaryOperator::Greater,
        TokenKind::LtEq => BinaryOperator::LessOrEqual,
        TokenKind::GtEq => BinaryOperator::GreaterOrEqual,
        TokenKind::In => BinaryOperator::In,
        TokenKind::NotIn => BinaryOperator::NotIn,
        TokenKind::Elvis => BinaryOperator::Elvis,
        TokenKind::RangeTo => BinaryOperator::Range,
        TokenKind::Plus => BinaryOperator::Plus,
        TokenKind::Minus => BinaryOperator::Minus,
        TokenKind::Star => BinaryOperator::Times,
        TokenKind::Slash => BinaryOperator::Div,
        TokenKind::Percent => BinaryOperator::Rem,
        _ => return None,
    };
    Some(op)
}

#[inline]
fn token_to_assignment_op(kind: TokenKind) -> Option<BinaryOperator> {
    let op = match kind {
        TokenKind::Assign => BinaryOperator::Assign,
        TokenKind::PlusAssign => BinaryOperator::PlusAssign,
        TokenKind::MinusAssign => BinaryOperator::MinusAssign,
        TokenKind::StarAssign => BinaryOperator::TimesAssign,
        TokenKind::SlashAssign => BinaryOperator::DivAssign,
        TokenKind::PercentAssign => BinaryOperator::RemAssign,
        _ => return None,
    };
    Some(op)
}

/// Operators allowed at the start of a continuation line
#[inline]
fn continues_across_newline(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::AndAnd | TokenKind::OrOr | TokenKind::Elvis
    )
}

fn identifier_name(text: &str) -> String {
    text.trim_matches('`').to_string()
}

fn label_definition_name(text: &str) -> String {
    identifier_name(text.trim_end_matches('@'))
}

fn label_reference_name(text: &str) -> String {
    identifier_name(text.trim_start_matches('@'))
}

/// Deepest expression, block or type nesting accepted before
/// [`ParseError::NestingTooDeep`]
pub const MAX_NESTING_DEPTH: usize = 80;

/// Parser over the significant tokens of one source file
pub struct Parser<'input> {
    source: &'input str,
    tokens: Vec<Token>,
    /// Whether a line break separates token `i` from the previous token
    newline_before: Vec<bool>,
    pos: usize,
    last_end: usize,
    /// Newline significance per nesting level, innermost last
    newline_modes: Vec<bool>,
    /// Guarded recursion levels currently open
    depth: usize,
    builder: TreeBuilder,
}

impl<'input> Parser<'input> {
    /// Tokenize `source` and prepare a parser
    pub fn new(source: &'input str) -> ParseResult<Self> {
        let all_tokens = Tokenizer::new(source).tokenize()?;
        let mut tokens = Vec::with_capacity(all_tokens.len());
        let mut newline_before = Vec::with_capacity(all_tokens.len());
        let mut pending_newline = false;
        for token in &all_tokens {
            if token.kind.is_trivia() {
                pending_newline |= token.text(source).contains('\n');
            } else {
                tokens.push(*token);
                newline_before.push(pending_newline);
                pending_newline = false;
            }
        }

        Ok(Self {
            source,
            tokens,
            newline_before,
            pos: 0,
            last_end: 0,
            newline_modes: vec![true],
            depth: 0,
            builder: TreeBuilder::new(source).with_tokens(all_tokens),
        })
    }

    /// Parse the whole file
    pub fn parse(mut self) -> ParseResult<SyntaxTree> {
        let root = self.parse_file()?;
        Ok(self.builder.finish(root))
    }

    // Cursor

    #[inline]
    fn peek(&self) -> Option<TokenKind> {
        self.kind_at(self.pos)
    }

    #[inline]
    fn peek_nth(&self, n: usize) -> Option<TokenKind> {
        self.kind_at(self.pos + n)
    }

    #[inline]
    fn kind_at(&self, index: usize) -> Option<TokenKind> {
        self.tokens.get(index).map(|t| t.kind)
    }

    #[inline]
    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn current_start(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |t| t.range.start)
    }

    /// A significant line break precedes the current token
    fn at_newline(&self) -> bool {
        let significant = self.newline_modes.last().copied().unwrap_or(true);
        significant && self.newline_before.get(self.pos).copied().unwrap_or(false)
    }

    fn bump(&mut self) -> ParseResult<Token> {
        let token = *self.tokens.get(self.pos).ok_or(ParseError::UnexpectedEof)?;
        self.pos += 1;
        self.last_end = token.range.end;
        Ok(token)
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) { self.bump().ok() } else { None }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == kind => self.bump(),
            Some(token) => Err(ParseError::ExpectedToken {
                expected: format!("{expected}, found '{}'", token.text(self.source)),
                position: token.range.start,
            }),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn unexpected(&self) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(token) => ParseError::UnexpectedToken {
                token: token.text(self.source).to_string(),
                position: token.range.start,
            },
            None => ParseError::UnexpectedEof,
        }
    }

    fn with_newlines<T>(
        &mut self,
        significant: bool,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        self.newline_modes.push(significant);
        let result = f(self);
        self.newline_modes.pop();
        result
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING_DEPTH`]
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                position: self.current_start(),
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn skip_semicolons(&mut self) {
        while self.eat(TokenKind::Semicolon).is_some() {}
    }

    /// Index just past the balanced group opened at `index`
    fn skip_balanced(&self, index: usize) -> usize {
        let mut depth = 0usize;
        let mut i = index;
        while let Some(kind) = self.kind_at(i) {
            match kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        i
    }

    /// Index just past the annotation entries starting at `index`
    fn skip_annotations_from(&self, mut index: usize) -> usize {
        while self.kind_at(index) == Some(TokenKind::AnnotationName) {
            index += 1;
            if self.kind_at(index) == Some(TokenKind::LParen)
                && !self.newline_before.get(index).copied().unwrap_or(false)
            {
                index = self.skip_balanced(index);
            }
        }
        index
    }

    fn range_of(&self, first: NodeId, last: NodeId) -> TextRange {
        TextRange::new(self.builder.range(first).start, self.builder.range(last).end)
    }

    fn range_from(&self, start: usize) -> TextRange {
        TextRange::new(start, self.last_end.max(start))
    }

    // File structure

    fn parse_file(&mut self) -> ParseResult<NodeId> {
        let mut children = Vec::new();

        self.skip_semicolons();
        if self.at(TokenKind::Package) {
            children.push(self.parse_directive()?);
            self.expect_statement_end(None)?;
        }
        loop {
            self.skip_semicolons();
            if !self.at(TokenKind::Import) {
                break;
            }
            children.push(self.parse_directive()?);
            self.expect_statement_end(None)?;
        }

        children.extend(self.parse_statements(None)?);
        if self.peek().is_some() {
            return Err(self.unexpected());
        }

        Ok(self
            .builder
            .node(NodeKind::File, TextRange::new(0, self.source.len()), children))
    }

    fn parse_directive(&mut self) -> ParseResult<NodeId> {
        let keyword = self.bump()?;
        let mut path = identifier_name(self.expect(TokenKind::Identifier, "name")?.text(self.source));
        while self.at(TokenKind::Dot) {
            self.bump()?;
            if self.eat(TokenKind::Star).is_some() {
                path.push_str(".*");
                break;
            }
            let segment = self.expect(TokenKind::Identifier, "name")?;
            path.push('.');
            path.push_str(&identifier_name(segment.text(self.source)));
        }

        let kind = if keyword.kind == TokenKind::Package {
            NodeKind::PackageDirective { path }
        } else {
            NodeKind::ImportDirective { path }
        };
        Ok(self.builder.leaf(kind, self.range_from(keyword.range.start)))
    }

    fn parse_statements(&mut self, closing: Option<TokenKind>) -> ParseResult<Vec<NodeId>> {
        let mut statements = Vec::new();
        loop {
            self.skip_semicolons();
            match self.peek() {
                None => break,
                Some(kind) if Some(kind) == closing => break,
                Some(_) => {}
            }
            statements.push(self.parse_statement()?);
            self.expect_statement_end(closing)?;
        }
        Ok(statements)
    }

    fn expect_statement_end(&self, closing: Option<TokenKind>) -> ParseResult<()> {
        match self.peek() {
            None | Some(TokenKind::Semicolon) => Ok(()),
            Some(kind) if Some(kind) == closing => Ok(()),
            Some(_) if self.at_newline() => Ok(()),
            Some(_) => Err(self.unexpected()),
        }
    }

    fn parse_statement(&mut self) -> ParseResult<NodeId> {
        match self.peek() {
            Some(TokenKind::Fun) => self.parse_function(),
            Some(TokenKind::Val | TokenKind::Var) => self.parse_property(),
            Some(TokenKind::AnnotationName) if self.annotated_declaration_ahead() => {
                let start = self.current_start();
                let mut children = self.parse_annotation_entries()?;
                let declaration = match self.peek() {
                    Some(TokenKind::Fun) => self.parse_function()?,
                    _ => self.parse_property()?,
                };
                children.push(declaration);
                Ok(self
                    .builder
                    .node(NodeKind::Annotated, self.range_from(start), children))
            }
            _ => self.parse_assignment(),
        }
    }

    fn annotated_declaration_ahead(&self) -> bool {
        let index = self.skip_annotations_from(self.pos);
        matches!(
            self.kind_at(index),
            Some(TokenKind::Fun | TokenKind::Val | TokenKind::Var)
        )
    }

    // Declarations

    fn parse_function(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(TokenKind::Fun, "'fun'")?.range.start;
        let mut name_token = self.expect(TokenKind::Identifier, "function name")?;
        // Extension receiver: keep the last segment
        while self.at(TokenKind::Dot) && self.peek_nth(1) == Some(TokenKind::Identifier) {
            self.bump()?;
            name_token = self.bump()?;
        }
        let name = identifier_name(name_token.text(self.source));

        self.expect(TokenKind::LParen, "'('")?;
        let mut children = self.with_newlines(false, |p| {
            let mut parameters = Vec::new();
            while !p.at(TokenKind::RParen) {
                parameters.push(p.parse_parameter(true)?);
                if p.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            p.expect(TokenKind::RParen, "')'")?;
            Ok(parameters)
        })?;

        if self.eat(TokenKind::Colon).is_some() {
            children.push(self.parse_type()?);
        }
        if self.at(TokenKind::LBrace) {
            children.push(self.parse_block()?);
        } else if self.eat(TokenKind::Assign).is_some() {
            children.push(self.parse_expression()?);
        }

        Ok(self
            .builder
            .node(NodeKind::Function { name }, self.range_from(start), children))
    }

    fn parse_property(&mut self) -> ParseResult<NodeId> {
        let keyword = self.bump()?;
        let mutable = keyword.kind == TokenKind::Var;
        let name_token = self.expect(TokenKind::Identifier, "property name")?;
        let name = identifier_name(name_token.text(self.source));

        let mut children = Vec::new();
        if self.eat(TokenKind::Colon).is_some() {
            children.push(self.parse_type()?);
        }
        if self.eat(TokenKind::Assign).is_some() {
            children.push(self.parse_expression()?);
        }

        Ok(self.builder.node(
            NodeKind::Property { name, mutable },
            self.range_from(keyword.range.start),
            children,
        ))
    }

    fn parse_parameter(&mut self, allow_default: bool) -> ParseResult<NodeId> {
        let name_token = self.expect(TokenKind::Identifier, "parameter name")?;
        let name = identifier_name(name_token.text(self.source));
        let mut children = Vec::new();
        if self.eat(TokenKind::Colon).is_some() {
            children.push(self.parse_type()?);
        }
        if allow_default && self.eat(TokenKind::Assign).is_some() {
            children.push(self.parse_expression()?);
        }
        Ok(self.builder.node(
            NodeKind::Parameter { name },
            self.range_from(name_token.range.start),
            children,
        ))
    }

    fn parse_type(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        self.skip_type()?;
        let range = self.range_from(start);
        let text = self.source[range.start..range.end].to_string();
        Ok(self.builder.leaf(NodeKind::TypeReference { text }, range))
    }

    fn skip_type(&mut self) -> ParseResult<()> {
        self.nested(Self::skip_type_level)
    }

    fn skip_type_level(&mut self) -> ParseResult<()> {
        if self.eat(TokenKind::LParen).is_some() {
            self.with_newlines(false, |p| {
                while !p.at(TokenKind::RParen) {
                    p.skip_type()?;
                    if p.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                p.expect(TokenKind::RParen, "')'")?;
                Ok(())
            })?;
            if self.eat(TokenKind::Arrow).is_some() {
                self.skip_type()?;
            }
        } else if self.eat(TokenKind::Star).is_some() {
            return Ok(());
        } else {
            self.expect(TokenKind::Identifier, "type")?;
            while self.at(TokenKind::Dot) && self.peek_nth(1) == Some(TokenKind::Identifier) {
                self.bump()?;
                self.bump()?;
            }
            if self.eat(TokenKind::Lt).is_some() {
                loop {
                    self.skip_type()?;
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                self.expect(TokenKind::Gt, "'>'")?;
            }
        }
        self.eat(TokenKind::Question);
        Ok(())
    }

    // Expressions

    fn parse_assignment(&mut self) -> ParseResult<NodeId> {
        let lhs = self.parse_expression()?;
        let Some(op) = self.peek().and_then(token_to_assignment_op) else {
            return Ok(lhs);
        };
        if self.at_newline() {
            return Ok(lhs);
        }
        self.bump()?;
        let rhs = self.parse_expression()?;
        let range = self.range_of(lhs, rhs);
        Ok(self.builder.node(NodeKind::Binary { op }, range, [lhs, rhs]))
    }

    /// Parse an expression (assignments excluded)
    pub fn parse_expression(&mut self) -> ParseResult<NodeId> {
        self.parse_binary(Precedence::Disjunction)
    }

    fn parse_binary(&mut self, min_precedence: Precedence) -> ParseResult<NodeId> {
        let mut lhs = self.parse_prefix()?;

        while let Some(kind) = self.peek() {
            let Some(precedence) = get_precedence(kind) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            if self.at_newline() && !continues_across_newline(kind) {
                break;
            }
            self.bump()?;

            lhs = match kind {
                TokenKind::Is | TokenKind::NotIs => {
                    let ty = self.parse_type()?;
                    let range = self.range_of(lhs, ty);
                    self.builder.node(
                        NodeKind::Is {
                            negated: kind == TokenKind::NotIs,
                        },
                        range,
                        [lhs, ty],
                    )
                }
                TokenKind::As | TokenKind::AsSafe => {
                    let ty = self.parse_type()?;
                    let range = self.range_of(lhs, ty);
                    self.builder.node(
                        NodeKind::Cast {
                            safe: kind == TokenKind::AsSafe,
                        },
                        range,
                        [lhs, ty],
                    )
                }
                _ => {
                    let op = token_to_binary_op(kind).ok_or_else(|| self.unexpected())?;
                    let rhs = self.parse_binary(precedence.next_level())?;
                    let range = self.range_of(lhs, rhs);
                    self.builder.node(NodeKind::Binary { op }, range, [lhs, rhs])
                }
            };
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> ParseResult<NodeId> {
        self.nested(Self::parse_prefix_level)
    }

    fn parse_prefix_level(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let op = match self.peek() {
            Some(TokenKind::Minus) => Some(PrefixOperator::Minus),
            Some(TokenKind::Plus) => Some(PrefixOperator::Plus),
            Some(TokenKind::Bang) => Some(PrefixOperator::Not),
            Some(TokenKind::PlusPlus) => Some(PrefixOperator::Increment),
            Some(TokenKind::MinusMinus) => Some(PrefixOperator::Decrement),
            _ => None,
        };
        if let Some(op) = op {
            self.bump()?;
            let operand = self.parse_prefix()?;
            return Ok(self
                .builder
                .node(NodeKind::Prefix { op }, self.range_from(start), [operand]));
        }

        match self.peek() {
            Some(TokenKind::LabelDefinition) => {
                let token = self.bump()?;
                let label = label_definition_name(token.text(self.source));
                let mut children = Vec::new();
                if !self.at_wrapper_end() {
                    children.push(self.parse_prefix()?);
                }
                Ok(self
                    .builder
                    .node(NodeKind::Labeled { label }, self.range_from(start), children))
            }
            Some(TokenKind::AnnotationName) => {
                let mut children = self.parse_annotation_entries()?;
                if !self.at_wrapper_end() {
                    children.push(self.parse_prefix()?);
                }
                Ok(self
                    .builder
                    .node(NodeKind::Annotated, self.range_from(start), children))
            }
            _ => self.parse_postfix(),
        }
    }

    /// Nothing follows a label or annotation inside the current construct
    fn at_wrapper_end(&self) -> bool {
        matches!(
            self.peek(),
            None | Some(
                TokenKind::RBrace
                    | TokenKind::RParen
                    | TokenKind::RBracket
                    | TokenKind::Semicolon
                    | TokenKind::Comma
            )
        )
    }

    /// Nothing follows `return` on its line
    fn at_expression_end(&self) -> bool {
        self.at_newline()
            || matches!(
                self.peek(),
                None | Some(
                    TokenKind::RBrace
                        | TokenKind::RParen
                        | TokenKind::RBracket
                        | TokenKind::Semicolon
                        | TokenKind::Comma
                        | TokenKind::Else
                        | TokenKind::Arrow
                )
            )
    }

    fn parse_annotation_entries(&mut self) -> ParseResult<Vec<NodeId>> {
        let mut entries = Vec::new();
        while self.at(TokenKind::AnnotationName) {
            let token = self.bump()?;
            let name = label_reference_name(token.text(self.source));
            let mut children = Vec::new();
            if self.at(TokenKind::LParen) && !self.at_newline() {
                children.push(self.parse_value_arguments()?);
            }
            entries.push(self.builder.node(
                NodeKind::AnnotationEntry { name },
                self.range_from(token.range.start),
                children,
            ));
        }
        Ok(entries)
    }

    fn parse_postfix(&mut self) -> ParseResult<NodeId> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek() {
                Some(kind @ (TokenKind::Dot | TokenKind::SafeAccess)) => {
                    self.bump()?;
                    let selector = self.parse_selector()?;
                    let range = self.range_of(expr, selector);
                    expr = self.builder.node(
                        NodeKind::DotQualified {
                            safe: kind == TokenKind::SafeAccess,
                        },
                        range,
                        [expr, selector],
                    );
                }
                Some(_) if self.at_newline() => break,
                Some(TokenKind::LBracket) => {
                    self.bump()?;
                    let mut children = vec![expr];
                    let indices = self.with_newlines(false, |p| {
                        let mut indices = Vec::new();
                        loop {
                            indices.push(p.parse_expression()?);
                            if p.eat(TokenKind::Comma).is_none() {
                                break;
                            }
                        }
                        p.expect(TokenKind::RBracket, "']'")?;
                        Ok(indices)
                    })?;
                    children.extend(indices);
                    let start = self.builder.range(expr).start;
                    expr = self
                        .builder
                        .node(NodeKind::ArrayAccess, self.range_from(start), children);
                }
                Some(kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus | TokenKind::BangBang)) => {
                    self.bump()?;
                    let op = match kind {
                        TokenKind::PlusPlus => PostfixOperator::Increment,
                        TokenKind::MinusMinus => PostfixOperator::Decrement,
                        _ => PostfixOperator::NotNull,
                    };
                    let start = self.builder.range(expr).start;
                    expr = self
                        .builder
                        .node(NodeKind::Postfix { op }, self.range_from(start), [expr]);
                }
                _ => match self.parse_call_suffix(expr)? {
                    Some(call) => expr = call,
                    None => break,
                },
            }
        }

        Ok(expr)
    }

    fn parse_selector(&mut self) -> ParseResult<NodeId> {
        let token = self.expect(TokenKind::Identifier, "member name")?;
        let name = identifier_name(token.text(self.source));
        let callee = self
            .builder
            .leaf(NodeKind::NameReference { name }, token.range);
        Ok(self.parse_call_suffix(callee)?.unwrap_or(callee))
    }

    /// Value arguments and/or one trailing lambda on the callee's line
    fn parse_call_suffix(&mut self, callee: NodeId) -> ParseResult<Option<NodeId>> {
        if self.at_newline() {
            return Ok(None);
        }
        let mut children = vec![callee];
        if self.at(TokenKind::LParen) {
            children.push(self.parse_value_arguments()?);
        }
        if !self.at_newline() && self.trailing_lambda_ahead() {
            children.push(self.parse_lambda_argument()?);
        }
        if children.len() == 1 {
            return Ok(None);
        }
        let start = self.builder.range(callee).start;
        Ok(Some(
            self.builder
                .node(NodeKind::Call, self.range_from(start), children),
        ))
    }

    fn trailing_lambda_ahead(&self) -> bool {
        let mut index = self.skip_annotations_from(self.pos);
        if self.kind_at(index) == Some(TokenKind::LabelDefinition) {
            index += 1;
        }
        self.kind_at(index) == Some(TokenKind::LBrace)
    }

    fn parse_value_arguments(&mut self) -> ParseResult<NodeId> {
        let open = self.expect(TokenKind::LParen, "'('")?;
        let arguments = self.with_newlines(false, |p| {
            let mut arguments = Vec::new();
            while !p.at(TokenKind::RParen) {
                arguments.push(p.parse_value_argument()?);
                if p.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            p.expect(TokenKind::RParen, "')'")?;
            Ok(arguments)
        })?;
        Ok(self.builder.node(
            NodeKind::ValueArgumentList,
            self.range_from(open.range.start),
            arguments,
        ))
    }

    fn parse_value_argument(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let name = if self.at(TokenKind::Identifier) && self.peek_nth(1) == Some(TokenKind::Assign)
        {
            let token = self.bump()?;
            self.bump()?;
            Some(identifier_name(token.text(self.source)))
        } else {
            None
        };
        let value = self.parse_expression()?;
        Ok(self
            .builder
            .node(NodeKind::ValueArgument { name }, self.range_from(start), [value]))
    }

    fn parse_lambda_argument(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let inner = self.parse_wrapped_lambda()?;
        Ok(self
            .builder
            .node(NodeKind::LambdaArgument, self.range_from(start), [inner]))
    }

    fn parse_wrapped_lambda(&mut self) -> ParseResult<NodeId> {
        self.nested(Self::parse_wrapped_lambda_level)
    }

    fn parse_wrapped_lambda_level(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        match self.peek() {
            Some(TokenKind::AnnotationName) => {
                let mut children = self.parse_annotation_entries()?;
                children.push(self.parse_wrapped_lambda()?);
                Ok(self
                    .builder
                    .node(NodeKind::Annotated, self.range_from(start), children))
            }
            Some(TokenKind::LabelDefinition) => {
                let token = self.bump()?;
                let label = label_definition_name(token.text(self.source));
                let base = self.parse_wrapped_lambda()?;
                Ok(self
                    .builder
                    .node(NodeKind::Labeled { label }, self.range_from(start), [base]))
            }
            _ => self.parse_lambda(),
        }
    }

    fn parse_primary(&mut self) -> ParseResult<NodeId> {
        let Some(token) = self.tokens.get(self.pos).copied() else {
            return Err(ParseError::UnexpectedEof);
        };
        let text = token.text(self.source);

        let literal = |kind| NodeKind::Literal { kind };
        match token.kind {
            TokenKind::Identifier => {
                self.bump()?;
                let name = identifier_name(text);
                Ok(self.builder.leaf(NodeKind::NameReference { name }, token.range))
            }
            TokenKind::IntegerLiteral => self.leaf_token(literal(LiteralKind::Integer)),
            TokenKind::FloatLiteral => self.leaf_token(literal(LiteralKind::Float)),
            TokenKind::StringLiteral => self.leaf_token(literal(LiteralKind::String)),
            TokenKind::CharLiteral => self.leaf_token(literal(LiteralKind::Char)),
            TokenKind::True | TokenKind::False => self.leaf_token(literal(LiteralKind::Boolean)),
            TokenKind::Null => self.leaf_token(literal(LiteralKind::Null)),
            TokenKind::This => {
                self.bump()?;
                let label = self.parse_label_reference();
                Ok(self
                    .builder
                    .leaf(NodeKind::This { label }, self.range_from(token.range.start)))
            }
            TokenKind::LParen => {
                self.bump()?;
                let inner = self.with_newlines(false, |p| {
                    let inner = p.parse_expression()?;
                    p.expect(TokenKind::RParen, "')'")?;
                    Ok(inner)
                })?;
                Ok(self.builder.node(
                    NodeKind::Parenthesized,
                    self.range_from(token.range.start),
                    [inner],
                ))
            }
            TokenKind::LBrace => self.parse_lambda(),
            TokenKind::If => self.parse_if(),
            TokenKind::When => self.parse_when(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Return => {
                self.bump()?;
                let label = self.parse_label_reference();
                let mut children = Vec::new();
                if !self.at_expression_end() {
                    children.push(self.parse_expression()?);
                }
                Ok(self.builder.node(
                    NodeKind::Return { label },
                    self.range_from(token.range.start),
                    children,
                ))
            }
            TokenKind::Throw => {
                self.bump()?;
                let value = self.parse_expression()?;
                Ok(self
                    .builder
                    .node(NodeKind::Throw, self.range_from(token.range.start), [value]))
            }
            TokenKind::Break | TokenKind::Continue => {
                self.bump()?;
                let label = self.parse_label_reference();
                let kind = if token.kind == TokenKind::Break {
                    NodeKind::Break { label }
                } else {
                    NodeKind::Continue { label }
                };
                Ok(self.builder.leaf(kind, self.range_from(token.range.start)))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn leaf_token(&mut self, kind: NodeKind) -> ParseResult<NodeId> {
        let token = self.bump()?;
        Ok(self.builder.leaf(kind, token.range))
    }

    fn parse_label_reference(&mut self) -> Option<String> {
        self.eat(TokenKind::LabelReference)
            .map(|token| label_reference_name(token.text(self.source)))
    }

    fn parse_lambda(&mut self) -> ParseResult<NodeId> {
        self.nested(Self::parse_lambda_level)
    }

    fn parse_lambda_level(&mut self) -> ParseResult<NodeId> {
        let open = self.expect(TokenKind::LBrace, "'{'")?;
        self.with_newlines(true, |p| {
            let mut children = Vec::new();
            if p.lambda_parameters_ahead() {
                while !p.at(TokenKind::Arrow) {
                    children.push(p.parse_parameter(false)?);
                    if p.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                p.expect(TokenKind::Arrow, "'->'")?;
            }

            let statements = p.parse_statements(Some(TokenKind::RBrace))?;
            let close = p.expect(TokenKind::RBrace, "'}'")?;
            let body_range = match (statements.first(), statements.last()) {
                (Some(first), Some(last)) => p.range_of(*first, *last),
                _ => TextRange::empty(close.range.start),
            };
            children.push(p.builder.node(NodeKind::Block, body_range, statements));

            let range = TextRange::new(open.range.start, close.range.end);
            let literal = p.builder.node(NodeKind::FunctionLiteral, range, children);
            Ok(p.builder.node(NodeKind::Lambda, range, [literal]))
        })
    }

    /// `a, b: T ->` right after the opening brace
    fn lambda_parameters_ahead(&self) -> bool {
        let mut index = self.pos;
        loop {
            match self.kind_at(index) {
                Some(TokenKind::Arrow) => return true,
                Some(
                    TokenKind::Identifier
                    | TokenKind::Comma
                    | TokenKind::Colon
                    | TokenKind::Dot
                    | TokenKind::Lt
                    | TokenKind::Gt
                    | TokenKind::Question
                    | TokenKind::Star,
                ) => index += 1,
                _ => return false,
            }
        }
    }

    fn parse_block(&mut self) -> ParseResult<NodeId> {
        self.nested(Self::parse_block_level)
    }

    fn parse_block_level(&mut self) -> ParseResult<NodeId> {
        let open = self.expect(TokenKind::LBrace, "'{'")?;
        self.with_newlines(true, |p| {
            let statements = p.parse_statements(Some(TokenKind::RBrace))?;
            let close = p.expect(TokenKind::RBrace, "'}'")?;
            Ok(p.builder.node(
                NodeKind::Block,
                TextRange::new(open.range.start, close.range.end),
                statements,
            ))
        })
    }

    /// Branch or loop body wrapped in its container node
    fn parse_control_body(&mut self, container: NodeKind) -> ParseResult<NodeId> {
        let body = if self.at(TokenKind::LBrace) {
            self.parse_block()?
        } else {
            self.parse_assignment()?
        };
        let range = self.builder.range(body);
        Ok(self.builder.node(container, range, [body]))
    }

    /// `( expression )` wrapped in `container`
    fn parse_parenthesized(&mut self, container: NodeKind) -> ParseResult<NodeId> {
        self.expect(TokenKind::LParen, "'('")?;
        let inner = self.with_newlines(false, |p| {
            let inner = p.parse_expression()?;
            p.expect(TokenKind::RParen, "')'")?;
            Ok(inner)
        })?;
        let range = self.builder.range(inner);
        Ok(self.builder.node(container, range, [inner]))
    }

    fn parse_if(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(TokenKind::If, "'if'")?.range.start;
        let condition = self.parse_parenthesized(NodeKind::Condition)?;
        let then_branch = self.parse_control_body(NodeKind::ThenBranch)?;
        let mut children = vec![condition, then_branch];

        let else_ahead = self.at(TokenKind::Else)
            || (self.at(TokenKind::Semicolon) && self.peek_nth(1) == Some(TokenKind::Else));
        if else_ahead {
            self.eat(TokenKind::Semicolon);
            self.expect(TokenKind::Else, "'else'")?;
            children.push(self.parse_control_body(NodeKind::ElseBranch)?);
        }

        Ok(self
            .builder
            .node(NodeKind::If, self.range_from(start), children))
    }

    fn parse_when(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(TokenKind::When, "'when'")?.range.start;
        let mut children = Vec::new();
        if self.at(TokenKind::LParen) {
            children.push(self.parse_parenthesized(NodeKind::WhenSubject)?);
        }

        self.expect(TokenKind::LBrace, "'{'")?;
        let entries = self.with_newlines(true, |p| {
            let mut entries = Vec::new();
            loop {
                p.skip_semicolons();
                if p.at(TokenKind::RBrace) {
                    break;
                }
                entries.push(p.parse_when_entry()?);
                p.expect_statement_end(Some(TokenKind::RBrace))?;
            }
            p.expect(TokenKind::RBrace, "'}'")?;
            Ok(entries)
        })?;
        children.extend(entries);

        Ok(self
            .builder
            .node(NodeKind::When, self.range_from(start), children))
    }

    fn parse_when_entry(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let mut children = Vec::new();
        let is_else = self.eat(TokenKind::Else).is_some();
        if !is_else {
            loop {
                children.push(self.parse_when_condition()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::Arrow, "'->'")?;

        let body = if self.at(TokenKind::LBrace) {
            self.parse_block()?
        } else {
            self.parse_assignment()?
        };
        children.push(body);

        Ok(self.builder.node(
            NodeKind::WhenEntry { is_else },
            self.range_from(start),
            children,
        ))
    }

    fn parse_when_condition(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let (test, child) = match self.peek() {
            Some(kind @ (TokenKind::Is | TokenKind::NotIs)) => {
                self.bump()?;
                let negated = kind == TokenKind::NotIs;
                (WhenTest::Is { negated }, self.parse_type()?)
            }
            Some(kind @ (TokenKind::In | TokenKind::NotIn)) => {
                self.bump()?;
                let negated = kind == TokenKind::NotIn;
                (WhenTest::In { negated }, self.parse_expression()?)
            }
            _ => (WhenTest::Expression, self.parse_expression()?),
        };
        Ok(self.builder.node(
            NodeKind::WhenCondition { test },
            self.range_from(start),
            [child],
        ))
    }

    fn parse_for(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(TokenKind::For, "'for'")?.range.start;
        self.expect(TokenKind::LParen, "'('")?;
        let (variable, loop_range) = self.with_newlines(false, |p| {
            let variable = p.expect(TokenKind::Identifier, "loop variable")?;
            p.expect(TokenKind::In, "'in'")?;
            let iterated = p.parse_expression()?;
            p.expect(TokenKind::RParen, "')'")?;
            let range = p.builder.range(iterated);
            let loop_range = p.builder.node(NodeKind::LoopRange, range, [iterated]);
            Ok((identifier_name(variable.text(p.source)), loop_range))
        })?;
        let body = self.parse_control_body(NodeKind::LoopBody)?;

        Ok(self.builder.node(
            NodeKind::For { variable },
            self.range_from(start),
            [loop_range, body],
        ))
    }

    fn parse_while(&mut self) -> ParseResult<NodeId> {
        let start = self.expect(TokenKind::While, "'while'")?.range.start;
        let condition = self.parse_parenthesized(NodeKind::Condition)?;
        let body = self.parse_control_body(NodeKind::LoopBody)?;
        Ok(self
            .builder
            .node(NodeKind::While, self.range_from(start), [condition, body]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::TreeNavigator;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(source: &str) -> SyntaxTree {
        Parser::new(source).unwrap().parse().unwrap()
    }

    fn nodes_of(tree: &SyntaxTree, predicate: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        tree.preorder()
            .into_iter()
            .filter(|id| predicate(tree.kind(*id)))
            .collect()
    }

    fn texts(tree: &SyntaxTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|id| tree.text(*id).to_string()).collect()
    }

    #[test]
    fn test_newline_terminates_statement() {
        let tree = parse("run {\n    foo()\n    -1\n    bar\n        .baz()\n}");
        let literal = nodes_of(&tree, |k| matches!(k, NodeKind::FunctionLiteral))[0];
        let body = tree.function_literal_body(literal).unwrap();
        assert_eq!(
            texts(&tree, tree.block_statements(body)),
            vec!["foo()", "-1", "bar\n        .baz()"]
        );
    }

    #[test]
    fn test_newlines_inside_parentheses() {
        let tree = parse("val x = foo(\n    1,\n    2\n) + (a\n - b)");
        let args = nodes_of(&tree, |k| matches!(k, NodeKind::ValueArgument { .. }));
        assert_eq!(texts(&tree, &args), vec!["1", "2"]);
        let sums = nodes_of(&tree, |k| {
            matches!(
                k,
                NodeKind::Binary {
                    op: BinaryOperator::Minus
                }
            )
        });
        assert_eq!(texts(&tree, &sums), vec!["a\n - b"]);
    }

    #[test]
    fn test_trailing_lambda_attaches_to_selector() {
        let tree = parse("list.map { it * 2 }.filter { it > 0 }");
        let calls = nodes_of(&tree, |k| matches!(k, NodeKind::Call));
        assert_eq!(calls.len(), 2);
        let callees: Vec<String> = calls
            .iter()
            .map(|c| tree.text(tree.call_callee(*c).unwrap()).to_string())
            .collect();
        assert_eq!(callees, vec!["map", "filter"]);
        for call in calls {
            assert_eq!(
                tree.kind(tree.parent(call).unwrap()),
                &NodeKind::DotQualified { safe: false }
            );
        }
    }

    #[test]
    fn test_trailing_lambda_requires_same_line() {
        let tree = parse("val f = foo\n{ 1 }");
        assert!(nodes_of(&tree, |k| matches!(k, NodeKind::Call)).is_empty());
        assert_eq!(nodes_of(&tree, |k| matches!(k, NodeKind::Lambda)).len(), 1);
    }

    #[test]
    fn test_lambda_parameters() {
        let tree = parse("fold(0) { acc, x: Int -> acc + x }");
        let params = nodes_of(&tree, |k| matches!(k, NodeKind::Parameter { .. }));
        assert_eq!(texts(&tree, &params), vec!["acc", "x: Int"]);
        let literal = nodes_of(&tree, |k| matches!(k, NodeKind::FunctionLiteral))[0];
        let body = tree.function_literal_body(literal).unwrap();
        assert_eq!(texts(&tree, tree.block_statements(body)), vec!["acc + x"]);
    }

    #[test]
    fn test_empty_lambda_body() {
        let tree = parse("run { }");
        let literal = nodes_of(&tree, |k| matches!(k, NodeKind::FunctionLiteral))[0];
        let body = tree.function_literal_body(literal).unwrap();
        assert!(tree.block_statements(body).is_empty());
        assert!(tree.text_range(body).is_empty());
    }

    #[test]
    fn test_labeled_split_form() {
        let tree = parse("run {\n    foo()\n    outer@\n    bar\n}");
        let labeled = nodes_of(&tree, |k| matches!(k, NodeKind::Labeled { .. }))[0];
        let base = tree.wrapped_base(labeled).unwrap();
        assert_eq!(tree.text(base), "bar");
        assert!(tree.preceding_trivia(base).unwrap().is_newline_whitespace());
    }

    #[test]
    fn test_annotated_same_line() {
        let tree = parse("run {\n    foo()\n    @Suppress(\"x\") bar\n}");
        let annotated = nodes_of(&tree, |k| matches!(k, NodeKind::Annotated))[0];
        let base = tree.wrapped_base(annotated).unwrap();
        assert_eq!(tree.text(base), "bar");
        assert!(!tree.preceding_trivia(base).unwrap().is_newline_whitespace());
        let entries = nodes_of(&tree, |k| matches!(k, NodeKind::AnnotationEntry { .. }));
        assert_eq!(texts(&tree, &entries), vec!["@Suppress(\"x\")"]);
    }

    #[test]
    fn test_annotated_declaration() {
        let tree = parse("@Suppress(\"unused\") val x = 1");
        let annotated = nodes_of(&tree, |k| matches!(k, NodeKind::Annotated))[0];
        let base = tree.wrapped_base(annotated).unwrap();
        assert_eq!(
            tree.kind(base),
            &NodeKind::Property {
                name: "x".to_string(),
                mutable: false
            }
        );
    }

    #[test]
    fn test_labeled_trailing_lambda() {
        let tree = parse("items.forEach outer@{ return@outer }");
        let argument = nodes_of(&tree, |k| matches!(k, NodeKind::LambdaArgument))[0];
        let wrapper = tree.children(argument)[0];
        assert_eq!(
            tree.kind(wrapper),
            &NodeKind::Labeled {
                label: "outer".to_string()
            }
        );
        let returns = nodes_of(&tree, |k| matches!(k, NodeKind::Return { .. }));
        assert_eq!(
            tree.kind(returns[0]),
            &NodeKind::Return {
                label: Some("outer".to_string())
            }
        );
    }

    #[test]
    fn test_if_structure() {
        let tree = parse("val v = if (a) 1\nelse if (b) { 2 } else 3");
        let ifs = nodes_of(&tree, |k| matches!(k, NodeKind::If));
        assert_eq!(ifs.len(), 2);
        let outer = tree.children(ifs[0]);
        let kinds: Vec<&NodeKind> = outer.iter().map(|c| tree.kind(*c)).collect();
        assert_eq!(
            kinds,
            vec![&NodeKind::Condition, &NodeKind::ThenBranch, &NodeKind::ElseBranch]
        );
        let inner_then = tree.children(ifs[1])[1];
        assert_eq!(tree.kind(tree.children(inner_then)[0]), &NodeKind::Block);
    }

    #[test]
    fn test_when_structure() {
        let source = "when (x) {\n    is String, !is Int -> 1\n    in 1..2 -> { 2 }\n    else -> 3\n}";
        let tree = parse(source);
        let entries = nodes_of(&tree, |k| matches!(k, NodeKind::WhenEntry { .. }));
        assert_eq!(entries.len(), 3);
        assert_eq!(
            tree.kind(entries[2]),
            &NodeKind::WhenEntry { is_else: true }
        );
        let conditions = nodes_of(&tree, |k| matches!(k, NodeKind::WhenCondition { .. }));
        let tests: Vec<&NodeKind> = conditions.iter().map(|c| tree.kind(*c)).collect();
        assert_eq!(
            tests,
            vec![
                &NodeKind::WhenCondition {
                    test: WhenTest::Is { negated: false }
                },
                &NodeKind::WhenCondition {
                    test: WhenTest::Is { negated: true }
                },
                &NodeKind::WhenCondition {
                    test: WhenTest::In { negated: false }
                },
            ]
        );
        assert_eq!(nodes_of(&tree, |k| matches!(k, NodeKind::WhenSubject)).len(), 1);
    }

    #[test]
    fn test_precedence() {
        let tree = parse("a || b && c == d + e * f as T");
        let root_stmt = tree.children(tree.root())[0];
        assert_eq!(
            tree.kind(root_stmt),
            &NodeKind::Binary {
                op: BinaryOperator::Or
            }
        );
        let casts = nodes_of(&tree, |k| matches!(k, NodeKind::Cast { .. }));
        assert_eq!(texts(&tree, &casts), vec!["f as T"]);
    }

    #[test]
    fn test_declarations_and_directives() {
        let tree = parse(
            "package a.b\nimport c.d.*\n\nfun String.twice(n: Int = 2): String {\n    return this\n}\nvar count: List<Int>? = null",
        );
        let kinds: Vec<&NodeKind> = tree
            .children(tree.root())
            .iter()
            .map(|c| tree.kind(*c))
            .collect();
        assert_eq!(
            kinds,
            vec![
                &NodeKind::PackageDirective {
                    path: "a.b".to_string()
                },
                &NodeKind::ImportDirective {
                    path: "c.d.*".to_string()
                },
                &NodeKind::Function {
                    name: "twice".to_string()
                },
                &NodeKind::Property {
                    name: "count".to_string(),
                    mutable: true
                },
            ]
        );
        let types = nodes_of(&tree, |k| matches!(k, NodeKind::TypeReference { .. }));
        assert_eq!(texts(&tree, &types), vec!["Int", "String", "List<Int>?"]);
    }

    #[rstest]
    #[case("val = 1", 4)]
    #[case("foo(1 2)", 6)]
    #[case("a b", 2)]
    fn test_parse_errors(#[case] source: &str, #[case] position: usize) {
        let error = Parser::new(source).unwrap().parse().unwrap_err();
        assert_eq!(error.position(), Some(position));
    }

    #[rstest]
    #[case::parentheses("(", ")")]
    #[case::lambdas("run { ", " }")]
    #[case::prefix_operators("- ", "")]
    fn test_nesting_too_deep(#[case] open: &str, #[case] close: &str) {
        let nested = |depth: usize| format!("val x = {}1{}", open.repeat(depth), close.repeat(depth));
        assert!(Parser::new(&nested(10)).unwrap().parse().is_ok());

        let error = Parser::new(&nested(300)).unwrap().parse().unwrap_err();
        assert!(matches!(error, ParseError::NestingTooDeep { .. }));
        assert!(error.position().is_some());
    }

    #[test]
    fn test_nested_types_too_deep() {
        let nested = |depth: usize| format!("val f: {}Int{} = g", "(".repeat(depth), ")".repeat(depth));
        assert!(Parser::new(&nested(10)).unwrap().parse().is_ok());

        let error = Parser::new(&nested(300)).unwrap().parse().unwrap_err();
        assert!(matches!(error, ParseError::NestingTooDeep { .. }));
    }

    #[test]
    fn test_nested_functions_too_deep() {
        let deep = 300;
        let source = format!("{}1{}", "fun f() {\n".repeat(deep), "\n}".repeat(deep));
        let error = Parser::new(&source).unwrap().parse().unwrap_err();
        assert!(matches!(error, ParseError::NestingTooDeep { .. }));
    }

    #[test]
    fn test_unexpected_eof() {
        let error = Parser::new("run { foo(").unwrap().parse().unwrap_err();
        assert_eq!(error, ParseError::UnexpectedEof);
    }

    #[test]
    fn test_parent_links_cover_all_nodes() {
        let tree = parse("val r = xs.map { x ->\n    if (x > 0) x else -x\n}");
        assert_eq!(tree.preorder().len(), tree.len());
        for id in tree.preorder() {
            if id != tree.root() {
                let parent = tree.parent(id).unwrap();
                assert!(tree.text_range(parent).contains_range(tree.text_range(id)));
            }
        }
    }
}
