//! Whole-tree and range-restricted hint collection

use crate::annotator::LambdaResultAnnotator;
use crate::hint::LambdaReturnHint;
use crate::oracle::SemanticOracle;
use lambda_hints_syntax::{SyntaxTree, TextRange, TreeNavigator};

/// Collect hints for every expression of `tree`, ordered by anchor offset.
///
/// With a `range`, subtrees that do not overlap it are skipped. Touching
/// ranges do not overlap.
pub fn collect_lambda_return_hints(
    tree: &SyntaxTree,
    oracle: &dyn SemanticOracle,
    annotator: &LambdaResultAnnotator,
    range: Option<TextRange>,
) -> Vec<LambdaReturnHint> {
    let mut hints = Vec::new();
    let mut stack = vec![tree.root()];

    while let Some(node) = stack.pop() {
        if let Some(range) = range
            && !tree.text_range(node).overlaps(range)
        {
            continue;
        }
        if tree.is_expression(node) {
            hints.extend(annotator.annotate(tree, oracle, node));
        }
        stack.extend(tree.children(node).iter().rev().copied());
    }

    hints.sort_by_key(|hint| hint.anchor_offset);
    tracing::debug!(count = hints.len(), nodes = tree.len(), "collected lambda return hints");
    hints
}
