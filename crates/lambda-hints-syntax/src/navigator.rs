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

//! Read-only navigation over a syntax tree
//!
//! [`TreeNavigator`] is the only view of the tree the hint annotator needs.
//! Implementors supply the six primitive queries; everything else is derived
//! from them and relies on the child layout documented on [`NodeKind`].

use crate::node::{NodeId, NodeKind};
use crate::span::TextRange;
use crate::tree::{SyntaxTree, Trivia};
use smallvec::SmallVec;

/// Navigation queries over a syntax tree
pub trait TreeNavigator {
    /// Kind of `node`
    fn kind(&self, node: NodeId) -> &NodeKind;

    /// Parent of `node`, `None` at the root
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children of `node` in source order
    fn children(&self, node: NodeId) -> &[NodeId];

    /// Source range of `node`
    fn text_range(&self, node: NodeId) -> TextRange;

    /// Whole source text
    fn source_text(&self) -> &str;

    /// Trivia token immediately before `node`, if the preceding token is trivia
    fn preceding_trivia(&self, node: NodeId) -> Option<Trivia<'_>>;

    /// End offset of `node`
    fn end_offset(&self, node: NodeId) -> usize {
        self.text_range(node).end
    }

    /// Source text of `node`
    fn text(&self, node: NodeId) -> &str {
        let range = self.text_range(node);
        &self.source_text()[range.start..range.end]
    }

    /// Nearest strict ancestor whose kind satisfies `predicate`
    fn strict_ancestor(&self, node: NodeId, predicate: &dyn Fn(&NodeKind) -> bool) -> Option<NodeId> {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if predicate(self.kind(id)) {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// Whether `node` is an expression
    fn is_expression(&self, node: NodeId) -> bool {
        self.kind(node).is_expression()
    }

    /// Used as a statement: the parent is a block, a control-structure body or a `when` entry
    fn is_statement(&self, node: NodeId) -> bool {
        self.parent(node)
            .is_some_and(|parent| self.kind(parent).is_statement_container())
    }

    /// No line break inside the node text
    fn is_one_liner(&self, node: NodeId) -> bool {
        !self.text(node).contains('\n')
    }

    /// Statements of a `Block`; empty for any other kind
    fn block_statements(&self, block: NodeId) -> &[NodeId] {
        match self.kind(block) {
            NodeKind::Block => self.children(block),
            _ => &[],
        }
    }

    /// Body block of a `FunctionLiteral`
    fn function_literal_body(&self, literal: NodeId) -> Option<NodeId> {
        if !matches!(self.kind(literal), NodeKind::FunctionLiteral) {
            return None;
        }
        self.children(literal)
            .iter()
            .copied()
            .find(|child| matches!(self.kind(*child), NodeKind::Block))
    }

    /// Base expression of a `Labeled` or `Annotated` node
    fn wrapped_base(&self, node: NodeId) -> Option<NodeId> {
        match self.kind(node) {
            NodeKind::Labeled { .. } => self.children(node).first().copied(),
            NodeKind::Annotated => self
                .children(node)
                .iter()
                .copied()
                .find(|child| !matches!(self.kind(*child), NodeKind::AnnotationEntry { .. })),
            _ => None,
        }
    }

    /// Callee of a `Call`
    fn call_callee(&self, call: NodeId) -> Option<NodeId> {
        match self.kind(call) {
            NodeKind::Call => self.children(call).first().copied(),
            _ => None,
        }
    }

    /// Trailing lambda arguments of a `Call`
    fn call_lambda_arguments(&self, call: NodeId) -> SmallVec<[NodeId; 2]> {
        if !matches!(self.kind(call), NodeKind::Call) {
            return SmallVec::new();
        }
        self.children(call)
            .iter()
            .copied()
            .filter(|child| matches!(self.kind(*child), NodeKind::LambdaArgument))
            .collect()
    }

    /// `Lambda` passed through a `LambdaArgument`, looking through labels and annotations
    fn lambda_argument_expression(&self, argument: NodeId) -> Option<NodeId> {
        if !matches!(self.kind(argument), NodeKind::LambdaArgument) {
            return None;
        }
        let mut current = self.children(argument).first().copied()?;
        loop {
            match self.kind(current) {
                NodeKind::Lambda => return Some(current),
                NodeKind::Labeled { .. } | NodeKind::Annotated => {
                    current = self.wrapped_base(current)?;
                }
                _ => return None,
            }
        }
    }
}

impl TreeNavigator for SyntaxTree {
    fn kind(&self, node: NodeId) -> &NodeKind {
        &self.node(node).kind
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    fn text_range(&self, node: NodeId) -> TextRange {
        self.node(node).range
    }

    fn source_text(&self) -> &str {
        self.source()
    }

    fn preceding_trivia(&self, node: NodeId) -> Option<Trivia<'_>> {
        self.trivia_before(self.node(node).range.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    fn find(tree: &SyntaxTree, predicate: impl Fn(&NodeKind) -> bool) -> NodeId {
        tree.preorder()
            .into_iter()
            .find(|id| predicate(tree.kind(*id)))
            .unwrap()
    }

    #[test]
    fn test_statement_detection() {
        let tree = parse("val r = run {\n    val a = 1\n    a + 1\n}").unwrap();
        let sum = find(&tree, |k| matches!(k, NodeKind::Binary { .. }));
        assert!(tree.is_statement(sum));
        let lhs = tree.children(sum)[0];
        assert!(!tree.is_statement(lhs));
        assert_eq!(tree.text(sum), "a + 1");
        assert!(tree.is_one_liner(sum));
    }

    #[test]
    fn test_lambda_argument_unwrapping() {
        let tree = parse("foo @Ann outer@{ 1 }").unwrap();
        let call = find(&tree, |k| matches!(k, NodeKind::Call));
        let args = tree.call_lambda_arguments(call);
        assert_eq!(args.len(), 1);
        let lambda = tree.lambda_argument_expression(args[0]).unwrap();
        assert_eq!(tree.kind(lambda), &NodeKind::Lambda);
        let labeled = tree.parent(lambda).unwrap();
        assert_eq!(
            tree.kind(labeled),
            &NodeKind::Labeled {
                label: "outer".to_string()
            }
        );
        let callee = tree.call_callee(call).unwrap();
        assert_eq!(tree.text(callee), "foo");
    }

    #[test]
    fn test_function_literal_body() {
        let tree = parse("run { x -> x }").unwrap();
        let literal = find(&tree, |k| matches!(k, NodeKind::FunctionLiteral));
        let body = tree.function_literal_body(literal).unwrap();
        assert_eq!(tree.block_statements(body).len(), 1);
        assert!(
            tree.strict_ancestor(body, &|k| matches!(k, NodeKind::Lambda))
                .is_some()
        );
        assert_eq!(tree.strict_ancestor(tree.root(), &|_| true), None);
    }
}
