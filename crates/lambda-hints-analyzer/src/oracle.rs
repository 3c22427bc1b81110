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

//! Semantic oracle interface and a syntactic control-flow implementation
//!
//! [`ResultPositionAnalyzer`] marks the expressions whose value becomes the
//! result of their function literal. It follows the value through blocks,
//! exhaustive `if`/`when`, parentheses, labels and annotations, and treats
//! statements after an unconditional jump as dead. It knows nothing about
//! types, so lambdas expecting `Unit` are marked like any other.

use crate::binding::{BindingContext, BindingSlice, BodyResolveMode};
use crate::cache::FactCache;
use crate::label;
use lambda_hints_syntax::{NodeId, NodeKind, SyntaxTree, TreeNavigator};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

/// Source of semantic facts about expressions
pub trait SemanticOracle {
    /// Analyze as much of the file around `expression` as `mode` requires
    fn analyze(&self, expression: NodeId, mode: BodyResolveMode) -> BindingContext;
}

/// Reference oracle computing `UsedAsResultOfLambda` from the syntax tree
pub struct ResultPositionAnalyzer<'t, N: ?Sized = SyntaxTree> {
    tree: &'t N,
    cache: FactCache,
}

impl<'t, N> ResultPositionAnalyzer<'t, N>
where
    N: TreeNavigator + ?Sized,
{
    /// Create an analyzer over `tree`
    pub fn new(tree: &'t N) -> Self {
        Self {
            tree,
            cache: FactCache::new(),
        }
    }

    /// Drop cached results
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached contexts
    pub fn cached_contexts(&self) -> usize {
        self.cache.len()
    }

    /// Function literals enclosing `expression`, innermost first
    fn enclosing_literals(&self, expression: NodeId) -> SmallVec<[NodeId; 4]> {
        let mut literals = SmallVec::new();
        let mut current = self.tree.parent(expression);
        while let Some(id) = current {
            if matches!(self.tree.kind(id), NodeKind::FunctionLiteral) {
                literals.push(id);
            }
            current = self.tree.parent(id);
        }
        literals
    }

    fn root_of(&self, node: NodeId) -> NodeId {
        let mut root = node;
        while let Some(parent) = self.tree.parent(root) {
            root = parent;
        }
        root
    }

    fn all_literals(&self, root: NodeId) -> Vec<NodeId> {
        let mut literals = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if matches!(self.tree.kind(id), NodeKind::FunctionLiteral) {
                literals.push(id);
            }
            stack.extend(self.tree.children(id).iter().rev().copied());
        }
        literals
    }

    fn compute(&self, literals: &[NodeId]) -> BindingContext {
        let mut context = BindingContext::empty();
        for literal in literals {
            let mut marked = FxHashSet::default();
            self.mark_literal_result(*literal, &mut marked);

            if let Some(lambda) = self.tree.parent(*literal) {
                tracing::debug!(
                    literal = %literal,
                    lambda = %label::display_name(self.tree, lambda),
                    marked = marked.len(),
                    "computed lambda result facts"
                );
            }
            for node in marked {
                context.record(BindingSlice::UsedAsResultOfLambda, node, true);
            }
        }
        context
    }

    fn mark_literal_result(&self, literal: NodeId, marked: &mut FxHashSet<NodeId>) {
        let Some(body) = self.tree.function_literal_body(literal) else {
            return;
        };
        if let Some(last) = self.live_last_statement(body) {
            self.mark(last, marked);
        }
    }

    /// Last statement of `block`, unless an earlier statement always jumps
    fn live_last_statement(&self, block: NodeId) -> Option<NodeId> {
        let (last, earlier) = self.tree.block_statements(block).split_last()?;
        if earlier.iter().any(|statement| self.always_jumps(*statement)) {
            return None;
        }
        Some(*last)
    }

    fn mark(&self, expression: NodeId, marked: &mut FxHashSet<NodeId>) {
        let tree = self.tree;
        let kind = tree.kind(expression);
        if !kind.is_expression() || kind.is_jump() {
            return;
        }

        match kind {
            NodeKind::Binary { op } if op.is_assignment() => {}
            NodeKind::While | NodeKind::For { .. } => {}
            NodeKind::Block => {
                marked.insert(expression);
                if let Some(last) = self.live_last_statement(expression) {
                    self.mark(last, marked);
                }
            }
            NodeKind::If => {
                let children = tree.children(expression);
                let [_, then_branch, else_branch] = children else {
                    return;
                };
                marked.insert(expression);
                for branch in [then_branch, else_branch] {
                    if let Some(content) = tree.children(*branch).first() {
                        self.mark(*content, marked);
                    }
                }
            }
            NodeKind::When => {
                let entries: SmallVec<[NodeId; 8]> = tree
                    .children(expression)
                    .iter()
                    .copied()
                    .filter(|child| matches!(tree.kind(*child), NodeKind::WhenEntry { .. }))
                    .collect();
                let exhaustive = entries
                    .iter()
                    .any(|entry| matches!(tree.kind(*entry), NodeKind::WhenEntry { is_else: true }));
                if !exhaustive {
                    return;
                }
                marked.insert(expression);
                for entry in entries {
                    if let Some(branch) = tree.children(entry).last() {
                        self.mark(*branch, marked);
                    }
                }
            }
            NodeKind::Labeled { .. } | NodeKind::Annotated => {
                let Some(base) = tree.wrapped_base(expression) else {
                    return;
                };
                if !tree.is_expression(base) {
                    return;
                }
                marked.insert(expression);
                self.mark(base, marked);
            }
            NodeKind::Parenthesized => {
                marked.insert(expression);
                if let Some(inner) = tree.children(expression).first() {
                    self.mark(*inner, marked);
                }
            }
            _ => {
                marked.insert(expression);
            }
        }
    }

    /// Evaluation of `node` never completes normally
    fn always_jumps(&self, node: NodeId) -> bool {
        let tree = self.tree;
        let kind = tree.kind(node);
        if kind.is_jump() {
            return true;
        }

        match kind {
            NodeKind::Block => tree
                .block_statements(node)
                .iter()
                .any(|statement| self.always_jumps(*statement)),
            NodeKind::If => match tree.children(node) {
                [_, then_branch, else_branch] => {
                    self.always_jumps(*then_branch) && self.always_jumps(*else_branch)
                }
                _ => false,
            },
            NodeKind::When => {
                let mut entries = tree
                    .children(node)
                    .iter()
                    .copied()
                    .filter(|child| matches!(tree.kind(*child), NodeKind::WhenEntry { .. }))
                    .peekable();
                let mut exhaustive = false;
                let mut every_branch_jumps = entries.peek().is_some();
                for entry in entries {
                    exhaustive |= matches!(tree.kind(entry), NodeKind::WhenEntry { is_else: true });
                    every_branch_jumps &= tree
                        .children(entry)
                        .last()
                        .is_some_and(|branch| self.always_jumps(*branch));
                }
                exhaustive && every_branch_jumps
            }
            NodeKind::ThenBranch
            | NodeKind::ElseBranch
            | NodeKind::Parenthesized
            | NodeKind::Labeled { .. } => tree
                .children(node)
                .first()
                .is_some_and(|child| self.always_jumps(*child)),
            NodeKind::Annotated => tree
                .wrapped_base(node)
                .is_some_and(|base| self.always_jumps(base)),
            _ => false,
        }
    }
}

impl<N> SemanticOracle for ResultPositionAnalyzer<'_, N>
where
    N: TreeNavigator + ?Sized,
{
    fn analyze(&self, expression: NodeId, mode: BodyResolveMode) -> BindingContext {
        match mode {
            BodyResolveMode::Partial => BindingContext::empty(),
            BodyResolveMode::PartialWithCfa => {
                let literals = self.enclosing_literals(expression);
                let Some(innermost) = literals.first().copied() else {
                    return BindingContext::empty();
                };
                self.cache
                    .get_or_compute((innermost, mode), || self.compute(&literals))
            }
            BodyResolveMode::Full => {
                let root = self.root_of(expression);
                self.cache
                    .get_or_compute((root, mode), || self.compute(&self.all_literals(root)))
            }
        }
    }
}
