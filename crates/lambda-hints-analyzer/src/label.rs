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

//! Label derivation for lambdas passed as trailing arguments

use lambda_hints_syntax::{NodeId, NodeKind, TreeNavigator};

/// Name used for a lambda without a resolvable label, in logs only
pub const FALLBACK_LAMBDA_NAME: &str = "lambda";

/// Name of the function that takes `lambda` as a trailing argument.
///
/// The lambda's own label wins over the callee name. Returns `None` when the
/// nearest enclosing call does not receive the lambda as a trailing argument
/// or when its callee is not a simple name.
pub fn function_name_taking_lambda<N>(tree: &N, lambda: NodeId) -> Option<String>
where
    N: TreeNavigator + ?Sized,
{
    let call = tree.strict_ancestor(lambda, &|kind| matches!(kind, NodeKind::Call))?;
    let is_trailing = tree
        .call_lambda_arguments(call)
        .iter()
        .any(|argument| tree.lambda_argument_expression(*argument) == Some(lambda));
    if !is_trailing {
        return None;
    }

    if let Some(parent) = tree.parent(lambda)
        && let NodeKind::Labeled { label } = tree.kind(parent)
    {
        return Some(label.clone());
    }

    let callee = tree.call_callee(call)?;
    match tree.kind(callee) {
        NodeKind::NameReference { name } => Some(name.clone()),
        _ => None,
    }
}

/// Human readable lambda name for diagnostics
pub fn display_name<N>(tree: &N, lambda: NodeId) -> String
where
    N: TreeNavigator + ?Sized,
{
    function_name_taking_lambda(tree, lambda).unwrap_or_else(|| FALLBACK_LAMBDA_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_hints_syntax::{SyntaxTree, parse};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn first_lambda(tree: &SyntaxTree) -> NodeId {
        tree.preorder()
            .into_iter()
            .find(|id| matches!(tree.kind(*id), NodeKind::Lambda))
            .unwrap()
    }

    #[rstest]
    #[case("list.map { it }", Some("map"))]
    #[case("list.map outer@{ it }", Some("outer"))]
    #[case("run @Ann { 1 }", Some("run"))]
    #[case("foo(1) { 2 }", Some("foo"))]
    #[case("foo({ 1 })", None)]
    #[case("val f = { 1 }", None)]
    #[case("factory()() { 1 }", None)]
    fn test_function_name_taking_lambda(#[case] source: &str, #[case] expected: Option<&str>) {
        let tree = parse(source).unwrap();
        let lambda = first_lambda(&tree);
        assert_eq!(
            function_name_taking_lambda(&tree, lambda).as_deref(),
            expected
        );
    }

    #[test]
    fn test_display_name_falls_back() {
        let tree = parse("val f = { 1 }").unwrap();
        let lambda = first_lambda(&tree);
        assert_eq!(display_name(&tree, lambda), FALLBACK_LAMBDA_NAME);
    }
}
