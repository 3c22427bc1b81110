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

//! Structural eligibility of an expression as a lambda return value hint target
//!
//! Rules run in a fixed order and stop at the first one that rejects:
//!
//! 1. `when` and block expressions are never targets.
//! 2. A multi-line `if` is not a target; its branches are.
//! 3. Nothing inside a one-line `if` is a target; the `if` itself is.
//! 4. A value-position expression must be the split part of its annotated or
//!    labeled parent. A statement must not have a split part of its own.
//! 5. The enclosing function literal must have a body that is not just the
//!    candidate.

use lambda_hints_syntax::{NodeId, NodeKind, TreeNavigator};
use std::fmt;

/// Why an expression is not a hint target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    /// The node is not an expression
    NotExpression,
    /// `when` or block expression
    CompoundExpression,
    /// `if` spanning several lines
    MultiLineIf,
    /// Nested in a one-line `if`
    InsideOneLinerIf,
    /// Value-position expression that is not the split part of its parent
    NotStatementPart,
    /// Statement whose hint belongs on its split part
    HintForcedOntoPart,
    /// No function literal encloses the expression
    NoFunctionLiteral,
    /// The enclosing function literal has no body
    MissingBody,
    /// The whole body is this single expression
    SingleStatementBody,
}

impl Ineligibility {
    /// Stable rule name used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            Ineligibility::NotExpression => "not_expression",
            Ineligibility::CompoundExpression => "compound_expression",
            Ineligibility::MultiLineIf => "multi_line_if",
            Ineligibility::InsideOneLinerIf => "inside_one_liner_if",
            Ineligibility::NotStatementPart => "not_statement_part",
            Ineligibility::HintForcedOntoPart => "hint_forced_onto_part",
            Ineligibility::NoFunctionLiteral => "no_function_literal",
            Ineligibility::MissingBody => "missing_body",
            Ineligibility::SingleStatementBody => "single_statement_body",
        }
    }
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run every eligibility rule against `expression`
pub fn check_eligibility<N>(tree: &N, expression: NodeId) -> Result<(), Ineligibility>
where
    N: TreeNavigator + ?Sized,
{
    let kind = tree.kind(expression);
    if !kind.is_expression() {
        return Err(Ineligibility::NotExpression);
    }

    match kind {
        NodeKind::When | NodeKind::Block => return Err(Ineligibility::CompoundExpression),
        NodeKind::If if !tree.is_one_liner(expression) => return Err(Ineligibility::MultiLineIf),
        _ => {}
    }

    if let Some(enclosing_if) = tree.strict_ancestor(expression, &|k| matches!(k, NodeKind::If))
        && tree.is_one_liner(enclosing_if)
    {
        return Err(Ineligibility::InsideOneLinerIf);
    }

    if !tree.is_statement(expression) {
        if !allows_hint_on_statement_part(tree, expression) {
            return Err(Ineligibility::NotStatementPart);
        }
    } else if expression_statement_part(tree, expression).is_some() {
        return Err(Ineligibility::HintForcedOntoPart);
    }

    let literal = tree
        .strict_ancestor(expression, &|k| matches!(k, NodeKind::FunctionLiteral))
        .ok_or(Ineligibility::NoFunctionLiteral)?;
    let body = tree
        .function_literal_body(literal)
        .ok_or(Ineligibility::MissingBody)?;
    if let [only] = tree.block_statements(body)
        && *only == expression
    {
        return Err(Ineligibility::SingleStatementBody);
    }

    Ok(())
}

/// Whether `expression` passes every eligibility rule
pub fn is_eligible<N>(tree: &N, expression: NodeId) -> bool
where
    N: TreeNavigator + ?Sized,
{
    check_eligibility(tree, expression).is_ok()
}

/// Split part of an annotated or labeled expression.
///
/// The base expression counts only when it starts on its own line: the
/// trivia right before it is whitespace containing a line break.
pub fn expression_statement_part<N>(tree: &N, expression: NodeId) -> Option<NodeId>
where
    N: TreeNavigator + ?Sized,
{
    let base = match tree.kind(expression) {
        NodeKind::Annotated | NodeKind::Labeled { .. } => tree.wrapped_base(expression)?,
        _ => return None,
    };
    is_new_line_before(tree, base).then_some(base)
}

fn allows_hint_on_statement_part<N>(tree: &N, expression: NodeId) -> bool
where
    N: TreeNavigator + ?Sized,
{
    let Some(parent) = tree.parent(expression) else {
        return false;
    };
    if !tree.is_expression(parent) {
        return false;
    }
    expression_statement_part(tree, parent) == Some(expression)
}

fn is_new_line_before<N>(tree: &N, expression: NodeId) -> bool
where
    N: TreeNavigator + ?Sized,
{
    tree.preceding_trivia(expression)
        .is_some_and(|trivia| trivia.is_newline_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_hints_syntax::{SyntaxTree, parse};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    /// Outermost non-block expression whose source text is `text`.
    ///
    /// A lambda body block shares its range with its statements.
    fn node_with_text(tree: &SyntaxTree, text: &str) -> NodeId {
        tree.preorder()
            .into_iter()
            .find(|id| {
                tree.is_expression(*id)
                    && !matches!(tree.kind(*id), NodeKind::Block)
                    && tree.text(*id) == text
            })
            .unwrap_or_else(|| panic!("no expression with text {text:?}"))
    }

    #[rstest]
    #[case("run {\n    foo()\n    when (x) { else -> 1 }\n}", "when (x) { else -> 1 }", Err(Ineligibility::CompoundExpression))]
    #[case("run {\n    foo()\n    if (a) {\n        1\n    } else 2\n}", "if (a) {\n        1\n    } else 2", Err(Ineligibility::MultiLineIf))]
    #[case("run {\n    foo()\n    if (a) 1 else 2\n}", "if (a) 1 else 2", Ok(()))]
    #[case("run {\n    foo()\n    if (a) 1 else 2\n}", "1", Err(Ineligibility::InsideOneLinerIf))]
    #[case("run {\n    foo()\n    if (a) if (b) 1 else 2 else 3\n}", "if (b) 1 else 2", Err(Ineligibility::InsideOneLinerIf))]
    #[case("run {\n    foo()\n    bar\n}", "bar", Ok(()))]
    #[case("run {\n    bar\n}", "bar", Err(Ineligibility::SingleStatementBody))]
    #[case("run {\n    foo()\n    a + b\n}", "a", Err(Ineligibility::NotStatementPart))]
    #[case("val x = a + b", "a + b", Err(Ineligibility::NotStatementPart))]
    #[case("fun f() {\n    a\n    b\n}", "b", Err(Ineligibility::NoFunctionLiteral))]
    fn test_rules(
        #[case] source: &str,
        #[case] target: &str,
        #[case] expected: Result<(), Ineligibility>,
    ) {
        let tree = parse(source).unwrap();
        let candidate = node_with_text(&tree, target);
        assert_eq!(check_eligibility(&tree, candidate), expected);
    }

    #[test]
    fn test_annotated_same_line() {
        let tree = parse("run {\n    foo()\n    @Suppress(\"X\") value\n}").unwrap();
        let value = node_with_text(&tree, "value");
        let annotated = tree.parent(value).unwrap();

        assert_eq!(expression_statement_part(&tree, annotated), None);
        assert_eq!(
            check_eligibility(&tree, value),
            Err(Ineligibility::NotStatementPart)
        );
        assert_eq!(check_eligibility(&tree, annotated), Ok(()));
    }

    #[test]
    fn test_annotated_split() {
        let tree = parse("run {\n    foo()\n    @Suppress(\"X\")\n    value\n}").unwrap();
        let value = node_with_text(&tree, "value");
        let annotated = tree.parent(value).unwrap();

        assert_eq!(expression_statement_part(&tree, annotated), Some(value));
        assert_eq!(check_eligibility(&tree, value), Ok(()));
        assert_eq!(
            check_eligibility(&tree, annotated),
            Err(Ineligibility::HintForcedOntoPart)
        );
    }

    #[test]
    fn test_labeled_split() {
        let tree = parse("run {\n    foo()\n    done@\n    42\n}").unwrap();
        let value = node_with_text(&tree, "42");
        assert!(is_eligible(&tree, value));
        let labeled = tree.parent(value).unwrap();
        assert!(!is_eligible(&tree, labeled));
    }

    #[test]
    fn test_comment_between_wrapper_and_base() {
        // The trivia right before the base is a space, not a line break
        let tree = parse("run {\n    foo()\n    @Ann\n    /* note */ value\n}").unwrap();
        let value = node_with_text(&tree, "value");
        let annotated = tree.parent(value).unwrap();
        assert_eq!(expression_statement_part(&tree, annotated), None);
    }

    #[test]
    fn test_line_comment_after_annotation() {
        // The comment ends before the line break, so the base still starts a line
        let tree = parse("run {\n    foo()\n    @Ann // note\n    value\n}").unwrap();
        let value = node_with_text(&tree, "value");
        let annotated = tree.parent(value).unwrap();

        assert_eq!(expression_statement_part(&tree, annotated), Some(value));
        assert_eq!(check_eligibility(&tree, value), Ok(()));
        assert_eq!(
            check_eligibility(&tree, annotated),
            Err(Ineligibility::HintForcedOntoPart)
        );
    }

    #[test]
    fn test_non_expression_rejected() {
        let tree = parse("run {\n    foo()\n    val x = 1\n}").unwrap();
        let property = tree
            .preorder()
            .into_iter()
            .find(|id| matches!(tree.kind(*id), NodeKind::Property { .. }))
            .unwrap();
        assert_eq!(
            check_eligibility(&tree, property),
            Err(Ineligibility::NotExpression)
        );
    }
}
