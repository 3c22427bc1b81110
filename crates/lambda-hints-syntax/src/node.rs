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

//! Syntax node definitions

use crate::span::TextRange;
use smallvec::SmallVec;
use std::fmt;

/// Index of a node inside a [`SyntaxTree`](crate::SyntaxTree) arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u32);

impl NodeId {
    /// Create an id from a raw arena index
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Arena index of this node
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node in the arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    /// What the node is
    pub kind: NodeKind,
    /// Source range covered by the node
    pub range: TextRange,
    /// Parent node, `None` only for the root
    pub parent: Option<NodeId>,
    /// Child nodes in source order (SmallVec for the common case of 0-4 children)
    pub children: SmallVec<[NodeId; 4]>,
}

/// Closed set of syntax node kinds.
///
/// The child layout of every kind is fixed; accessors on
/// [`TreeNavigator`](crate::TreeNavigator) rely on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// Root of a parsed file: directives, declarations and statements
    File,
    /// `package a.b`
    PackageDirective {
        /// Dotted package path
        path: String,
    },
    /// `import a.b.C`
    ImportDirective {
        /// Dotted import path
        path: String,
    },

    /// `fun name(params): T = body` - children: `Parameter*`, `TypeReference?`, body
    Function {
        /// Function name
        name: String,
    },
    /// `val`/`var` declaration - children: `TypeReference?`, initializer?
    Property {
        /// Property name
        name: String,
        /// `var` rather than `val`
        mutable: bool,
    },
    /// Function or lambda parameter - children: `TypeReference?`, default value?
    Parameter {
        /// Parameter name
        name: String,
    },
    /// Type as written in source
    TypeReference {
        /// Source text of the type
        text: String,
    },

    /// `{ statements }` - children are the statements
    Block,
    /// Lambda expression - single child `FunctionLiteral`
    Lambda,
    /// The literal inside a lambda - children: `Parameter*`, body `Block?`
    FunctionLiteral,
    /// `label@ base` - optional single base child
    Labeled {
        /// Label name without `@`
        label: String,
    },
    /// `@Ann base` - children: `AnnotationEntry+`, optional base
    Annotated,
    /// `@Name(args)` - optional `ValueArgumentList` child
    AnnotationEntry {
        /// Annotation name without `@`
        name: String,
    },

    /// Call - children: callee, `ValueArgumentList?`, `LambdaArgument*`
    Call,
    /// `(args)` - children: `ValueArgument*`
    ValueArgumentList,
    /// Single argument inside parentheses - single expression child
    ValueArgument {
        /// Name for `name = value` arguments
        name: Option<String>,
    },
    /// Lambda passed after the call - a `Lambda`, possibly labeled or annotated
    LambdaArgument,
    /// Simple name
    NameReference {
        /// Referenced identifier
        name: String,
    },
    /// `receiver.selector` or `receiver?.selector`
    DotQualified {
        /// `?.` rather than `.`
        safe: bool,
    },
    /// `receiver[indices]` - children: receiver, indices
    ArrayAccess,

    /// `if` - children: `Condition`, `ThenBranch`, `ElseBranch?`
    If,
    /// `when` - children: `WhenSubject?`, `WhenEntry*`
    When,
    /// `when` branch - children: `WhenCondition*`, branch expression
    WhenEntry {
        /// `else ->` entry
        is_else: bool,
    },
    /// Single condition of a `when` branch - child: expression or `TypeReference`
    WhenCondition {
        /// Shape of the test
        test: WhenTest,
    },
    /// `when (subject)` - single expression child
    WhenSubject,
    /// Parenthesised condition of `if`/`while` - single expression child
    Condition,
    /// Body container of the `if` positive branch
    ThenBranch,
    /// Body container of `else`
    ElseBranch,
    /// `while (cond) body` - children: `Condition`, `LoopBody`
    While,
    /// `for (variable in range) body` - children: `LoopRange`, `LoopBody`
    For {
        /// Loop variable name
        variable: String,
    },
    /// Iterated expression of a `for` loop
    LoopRange,
    /// Body container of a loop
    LoopBody,

    /// Binary operation - children: lhs, rhs
    Binary {
        /// The operator
        op: BinaryOperator,
    },
    /// Prefix operation - single operand child
    Prefix {
        /// The operator
        op: PrefixOperator,
    },
    /// Postfix operation - single operand child
    Postfix {
        /// The operator
        op: PostfixOperator,
    },
    /// `expr is T` / `expr !is T` - children: expression, `TypeReference`
    Is {
        /// `!is`
        negated: bool,
    },
    /// `expr as T` / `expr as? T` - children: expression, `TypeReference`
    Cast {
        /// `as?`
        safe: bool,
    },
    /// `(inner)`
    Parenthesized,
    /// Constant literal
    Literal {
        /// Literal category
        kind: LiteralKind,
    },
    /// `this` or `this@label`
    This {
        /// Qualifying label
        label: Option<String>,
    },
    /// `return` / `return@label` - optional value child
    Return {
        /// Target label
        label: Option<String>,
    },
    /// `throw value`
    Throw,
    /// `break` / `break@label`
    Break {
        /// Target label
        label: Option<String>,
    },
    /// `continue` / `continue@label`
    Continue {
        /// Target label
        label: Option<String>,
    },
}

/// Test shape of a `when` condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WhenTest {
    /// Plain expression (compared with the subject, or a boolean without one)
    Expression,
    /// `is T` / `!is T`
    Is {
        /// `!is`
        negated: bool,
    },
    /// `in range` / `!in range`
    In {
        /// `!in`
        negated: bool,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOperator {
    /// `=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `*=`
    TimesAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    RemAssign,
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `===`
    Identical,
    /// `!==`
    NotIdentical,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
    /// `in`
    In,
    /// `!in`
    NotIn,
    /// `?:`
    Elvis,
    /// `..`
    Range,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Times,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl BinaryOperator {
    /// Assignment family (`=`, `+=`, ...)
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOperator::Assign
                | BinaryOperator::PlusAssign
                | BinaryOperator::MinusAssign
                | BinaryOperator::TimesAssign
                | BinaryOperator::DivAssign
                | BinaryOperator::RemAssign
        )
    }

    /// Source spelling
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Assign => "=",
            BinaryOperator::PlusAssign => "+=",
            BinaryOperator::MinusAssign => "-=",
            BinaryOperator::TimesAssign => "*=",
            BinaryOperator::DivAssign => "/=",
            BinaryOperator::RemAssign => "%=",
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Identical => "===",
            BinaryOperator::NotIdentical => "!==",
            BinaryOperator::Less => "<",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::In => "in",
            BinaryOperator::NotIn => "!in",
            BinaryOperator::Elvis => "?:",
            BinaryOperator::Range => "..",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Times => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Rem => "%",
        }
    }
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrefixOperator {
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `!`
    Not,
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

/// Postfix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PostfixOperator {
    /// `++`
    Increment,
    /// `--`
    Decrement,
    /// `!!`
    NotNull,
}

/// Literal categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LiteralKind {
    /// Integer literal, including hex/binary and `L`/`u` suffixes
    Integer,
    /// Floating point literal
    Float,
    /// String literal (templates are kept verbatim)
    String,
    /// Character literal
    Char,
    /// `true` / `false`
    Boolean,
    /// `null`
    Null,
}

impl NodeKind {
    /// Whether nodes of this kind are expressions (can produce a value).
    ///
    /// Declarations, containers, arguments and other structural nodes are not.
    pub fn is_expression(&self) -> bool {
        match self {
            NodeKind::Block
            | NodeKind::Lambda
            | NodeKind::Labeled { .. }
            | NodeKind::Annotated
            | NodeKind::Call
            | NodeKind::NameReference { .. }
            | NodeKind::DotQualified { .. }
            | NodeKind::ArrayAccess
            | NodeKind::If
            | NodeKind::When
            | NodeKind::While
            | NodeKind::For { .. }
            | NodeKind::Binary { .. }
            | NodeKind::Prefix { .. }
            | NodeKind::Postfix { .. }
            | NodeKind::Is { .. }
            | NodeKind::Cast { .. }
            | NodeKind::Parenthesized
            | NodeKind::Literal { .. }
            | NodeKind::This { .. }
            | NodeKind::Return { .. }
            | NodeKind::Throw
            | NodeKind::Break { .. }
            | NodeKind::Continue { .. } => true,
            NodeKind::File
            | NodeKind::PackageDirective { .. }
            | NodeKind::ImportDirective { .. }
            | NodeKind::Function { .. }
            | NodeKind::Property { .. }
            | NodeKind::Parameter { .. }
            | NodeKind::TypeReference { .. }
            | NodeKind::FunctionLiteral
            | NodeKind::AnnotationEntry { .. }
            | NodeKind::ValueArgumentList
            | NodeKind::ValueArgument { .. }
            | NodeKind::LambdaArgument
            | NodeKind::WhenEntry { .. }
            | NodeKind::WhenCondition { .. }
            | NodeKind::WhenSubject
            | NodeKind::Condition
            | NodeKind::ThenBranch
            | NodeKind::ElseBranch
            | NodeKind::LoopRange
            | NodeKind::LoopBody => false,
        }
    }

    /// Body container of a control structure (`if` branches, loop bodies)
    pub fn is_control_structure_body(&self) -> bool {
        matches!(
            self,
            NodeKind::ThenBranch | NodeKind::ElseBranch | NodeKind::LoopBody
        )
    }

    /// Parents of this kind hold their expression children as statements
    pub fn is_statement_container(&self) -> bool {
        matches!(self, NodeKind::Block | NodeKind::WhenEntry { .. })
            || self.is_control_structure_body()
    }

    /// Unconditional jumps: their evaluation never completes normally
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            NodeKind::Return { .. }
                | NodeKind::Throw
                | NodeKind::Break { .. }
                | NodeKind::Continue { .. }
        )
    }

    /// Short human readable name, used in logs and debug output
    pub fn describe(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::PackageDirective { .. } => "package directive",
            NodeKind::ImportDirective { .. } => "import directive",
            NodeKind::Function { .. } => "function",
            NodeKind::Property { .. } => "property",
            NodeKind::Parameter { .. } => "parameter",
            NodeKind::TypeReference { .. } => "type reference",
            NodeKind::Block => "block",
            NodeKind::Lambda => "lambda",
            NodeKind::FunctionLiteral => "function literal",
            NodeKind::Labeled { .. } => "labeled expression",
            NodeKind::Annotated => "annotated expression",
            NodeKind::AnnotationEntry { .. } => "annotation entry",
            NodeKind::Call => "call",
            NodeKind::ValueArgumentList => "value argument list",
            NodeKind::ValueArgument { .. } => "value argument",
            NodeKind::LambdaArgument => "lambda argument",
            NodeKind::NameReference { .. } => "name reference",
            NodeKind::DotQualified { .. } => "qualified expression",
            NodeKind::ArrayAccess => "array access",
            NodeKind::If => "if",
            NodeKind::When => "when",
            NodeKind::WhenEntry { .. } => "when entry",
            NodeKind::WhenCondition { .. } => "when condition",
            NodeKind::WhenSubject => "when subject",
            NodeKind::Condition => "condition",
            NodeKind::ThenBranch => "then branch",
            NodeKind::ElseBranch => "else branch",
            NodeKind::While => "while",
            NodeKind::For { .. } => "for",
            NodeKind::LoopRange => "loop range",
            NodeKind::LoopBody => "loop body",
            NodeKind::Binary { .. } => "binary expression",
            NodeKind::Prefix { .. } => "prefix expression",
            NodeKind::Postfix { .. } => "postfix expression",
            NodeKind::Is { .. } => "is expression",
            NodeKind::Cast { .. } => "cast",
            NodeKind::Parenthesized => "parenthesized expression",
            NodeKind::Literal { .. } => "literal",
            NodeKind::This { .. } => "this",
            NodeKind::Return { .. } => "return",
            NodeKind::Throw => "throw",
            NodeKind::Break { .. } => "break",
            NodeKind::Continue { .. } => "continue",
        }
    }
}
