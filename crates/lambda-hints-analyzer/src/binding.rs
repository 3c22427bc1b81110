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

//! Binding facts produced by semantic analysis

use lambda_hints_syntax::NodeId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How much of a body the analysis resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BodyResolveMode {
    /// Declarations and calls only, no control-flow facts
    Partial,
    /// Partial resolution plus control-flow analysis of the enclosing lambdas
    #[default]
    PartialWithCfa,
    /// Whole file
    Full,
}

impl BodyResolveMode {
    /// Whether results in this mode carry control-flow facts
    pub fn includes_control_flow(self) -> bool {
        !matches!(self, BodyResolveMode::Partial)
    }
}

/// Fact categories stored in a [`BindingContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingSlice {
    /// The expression is the implicit result of its enclosing lambda
    UsedAsResultOfLambda,
}

/// Immutable-by-default set of facts keyed by (slice, node)
///
/// Cloning shares the underlying storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingContext {
    facts: Arc<FxHashMap<(BindingSlice, NodeId), bool>>,
}

impl BindingContext {
    /// Context without any facts
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a fact, `None` when it was never recorded
    pub fn get(&self, slice: BindingSlice, node: NodeId) -> Option<bool> {
        self.facts.get(&(slice, node)).copied()
    }

    /// Record a fact, copying the storage if it is shared
    pub fn record(&mut self, slice: BindingSlice, node: NodeId, value: bool) {
        Arc::make_mut(&mut self.facts).insert((slice, node), value);
    }

    /// Number of recorded facts
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether no fact was recorded
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Nodes for which `slice` is recorded as true, unordered
    pub fn nodes_with(&self, slice: BindingSlice) -> impl Iterator<Item = NodeId> + '_ {
        self.facts
            .iter()
            .filter(move |((s, _), value)| *s == slice && **value)
            .map(|((_, node), _)| *node)
    }

    /// Whether both contexts share the same storage
    pub fn ptr_eq(&self, other: &BindingContext) -> bool {
        Arc::ptr_eq(&self.facts, &other.facts)
    }
}
