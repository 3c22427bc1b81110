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

//! Arena-backed syntax tree
//!
//! Nodes are allocated bottom-up by [`TreeBuilder`]: children first, then the
//! parent, which patches the children's parent links. Ids are stable for the
//! lifetime of the tree.

use crate::node::{NodeId, NodeKind, SyntaxNode};
use crate::span::TextRange;
use crate::tokenizer::{Token, TokenKind};
use smallvec::SmallVec;

/// Category of a trivia token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriviaKind {
    /// Spaces, tabs, line breaks
    Whitespace,
    /// `// ...`
    LineComment,
    /// `/* ... */`
    BlockComment,
}

/// Trivia token borrowed from the tree source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trivia<'a> {
    /// Trivia category
    pub kind: TriviaKind,
    /// Source text of the trivia
    pub text: &'a str,
}

impl Trivia<'_> {
    /// Whether the trivia text spans a line break
    pub fn contains_line_break(&self) -> bool {
        self.text.contains('\n')
    }

    /// Whitespace that contains a line break
    pub fn is_newline_whitespace(&self) -> bool {
        self.kind == TriviaKind::Whitespace && self.contains_line_break()
    }
}

/// Parsed source file
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<SyntaxNode>,
    tokens: Vec<Token>,
    root: NodeId,
}

impl SyntaxTree {
    /// Root node (a `File`)
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Full source text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Node by id
    ///
    /// Panics on ids that do not belong to this tree.
    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    /// Node by id, `None` for foreign ids
    pub fn get(&self, id: NodeId) -> Option<&SyntaxNode> {
        self.nodes.get(id.index())
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All tokens, trivia included
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Node ids in document (pre-)order starting at the root
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        out
    }

    /// Descendants of `id`, `id` excluded, in document order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(id).children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.node(current).children.iter().rev().copied());
        }
        out
    }

    /// Trivia token ending exactly where `offset` starts
    pub fn trivia_before(&self, offset: usize) -> Option<Trivia<'_>> {
        let idx = self.tokens.partition_point(|t| t.range.end <= offset);
        let token = self.tokens.get(idx.checked_sub(1)?)?;
        if token.range.end != offset {
            return None;
        }
        let kind = match token.kind {
            TokenKind::Whitespace => TriviaKind::Whitespace,
            TokenKind::LineComment => TriviaKind::LineComment,
            TokenKind::BlockComment => TriviaKind::BlockComment,
            _ => return None,
        };
        Some(Trivia {
            kind,
            text: token.text(&self.source),
        })
    }

    /// Debug rendering, one node per line, indented by depth
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(&format!("{:?} {}\n", node.kind, node.range));
        for child in &node.children {
            self.dump_node(*child, depth + 1, out);
        }
    }
}

/// Bottom-up tree construction
#[derive(Debug)]
pub struct TreeBuilder {
    source: String,
    nodes: Vec<SyntaxNode>,
    tokens: Vec<Token>,
}

impl TreeBuilder {
    /// Start building a tree over `source`
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            nodes: Vec::new(),
            tokens: Vec::new(),
        }
    }

    /// Attach the token stream used for trivia queries
    pub fn with_tokens(mut self, tokens: Vec<Token>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Source the tree is built over
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Allocate a node. Children must already be allocated and parentless.
    pub fn node<I>(&mut self, kind: NodeKind, range: TextRange, children: I) -> NodeId
    where
        I: IntoIterator<Item = NodeId>,
    {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        let children: SmallVec<[NodeId; 4]> = children.into_iter().collect();
        for child in &children {
            let slot = &mut self.nodes[child.index()];
            debug_assert!(slot.parent.is_none(), "node {child} already has a parent");
            slot.parent = Some(id);
        }
        self.nodes.push(SyntaxNode {
            kind,
            range,
            parent: None,
            children,
        });
        id
    }

    /// Leaf node
    pub fn leaf(&mut self, kind: NodeKind, range: TextRange) -> NodeId {
        self.node(kind, range, std::iter::empty())
    }

    /// Range of an allocated node
    pub fn range(&self, id: NodeId) -> TextRange {
        self.nodes[id.index()].range
    }

    /// Kind of an allocated node
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    /// Finish with `root` as the tree root
    pub fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree {
            source: self.source,
            nodes: self.nodes,
            tokens: self.tokens,
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;
    use pretty_assertions::assert_eq;

    fn sample() -> SyntaxTree {
        let source = "a\n  b";
        let tokens = Tokenizer::new(source).tokenize().unwrap();
        let mut builder = TreeBuilder::new(source).with_tokens(tokens);
        let a = builder.leaf(NodeKind::NameReference { name: "a".into() }, TextRange::new(0, 1));
        let b = builder.leaf(NodeKind::NameReference { name: "b".into() }, TextRange::new(4, 5));
        let root = builder.node(NodeKind::File, TextRange::new(0, 5), [a, b]);
        builder.finish(root)
    }

    #[test]
    fn test_parent_links() {
        let tree = sample();
        let root = tree.root();
        assert_eq!(tree.node(root).parent, None);
        for child in &tree.node(root).children {
            assert_eq!(tree.node(*child).parent, Some(root));
        }
        assert_eq!(tree.preorder().len(), 3);
        assert_eq!(tree.descendants(root).len(), 2);
    }

    #[test]
    fn test_trivia_before() {
        let tree = sample();
        let trivia = tree.trivia_before(4).unwrap();
        assert_eq!(trivia.kind, TriviaKind::Whitespace);
        assert_eq!(trivia.text, "\n  ");
        assert!(trivia.is_newline_whitespace());
        // Offset 0 has nothing before it, offset 3 is inside whitespace
        assert_eq!(tree.trivia_before(0), None);
        assert_eq!(tree.trivia_before(3), None);
    }
}
