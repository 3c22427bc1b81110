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

//! Per-expression hint production

use crate::binding::{BindingSlice, BodyResolveMode};
use crate::eligibility::check_eligibility;
use crate::hint::LambdaReturnHint;
use crate::label::function_name_taking_lambda;
use crate::oracle::SemanticOracle;
use lambda_hints_syntax::{NodeId, NodeKind, TreeNavigator};

/// Decides whether an expression gets a `^label` hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LambdaResultAnnotator {
    resolve_mode: BodyResolveMode,
}

impl Default for LambdaResultAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl LambdaResultAnnotator {
    /// Annotator querying the oracle with [`BodyResolveMode::PartialWithCfa`]
    pub fn new() -> Self {
        Self {
            resolve_mode: BodyResolveMode::PartialWithCfa,
        }
    }

    /// Use a different resolve mode for oracle queries
    pub fn with_resolve_mode(mut self, mode: BodyResolveMode) -> Self {
        self.resolve_mode = mode;
        self
    }

    /// Mode passed to the oracle
    pub fn resolve_mode(&self) -> BodyResolveMode {
        self.resolve_mode
    }

    /// Hints for `expression`: empty, or a single hint anchored at its end.
    ///
    /// Structural rules run first so the oracle is only consulted for
    /// plausible candidates.
    pub fn annotate<N>(
        &self,
        tree: &N,
        oracle: &dyn SemanticOracle,
        expression: NodeId,
    ) -> Vec<LambdaReturnHint>
    where
        N: TreeNavigator + ?Sized,
    {
        if let Err(reason) = check_eligibility(tree, expression) {
            tracing::trace!(
                target: "lambda_hints::eligibility",
                rule = %reason,
                node = %expression,
                kind = tree.kind(expression).describe(),
                "expression is not a hint target"
            );
            return Vec::new();
        }

        let context = oracle.analyze(expression, self.resolve_mode);
        if context.get(BindingSlice::UsedAsResultOfLambda, expression) != Some(true) {
            return Vec::new();
        }

        let Some(lambda) = tree.strict_ancestor(expression, &|k| matches!(k, NodeKind::Lambda))
        else {
            return Vec::new();
        };
        let Some(label) = function_name_taking_lambda(tree, lambda) else {
            tracing::trace!(
                target: "lambda_hints::eligibility",
                node = %expression,
                lambda = %lambda,
                "lambda has no derivable label"
            );
            return Vec::new();
        };

        let hint = LambdaReturnHint::new(&label, tree.end_offset(expression), lambda);
        tracing::debug!(
            text = %hint.display_text,
            offset = hint.anchor_offset,
            "lambda return hint"
        );
        vec![hint]
    }
}
