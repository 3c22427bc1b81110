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

//! # Lambda Return Value Hint Analysis
//!
//! Decides which expressions inside a lambda body are its implicit result
//! and labels them `^name`, where `name` is the lambda's label or the
//! function taking it as a trailing argument.
//!
//! ## Core Components
//!
//! - [`LambdaResultAnnotator`] - per-expression hint decision
//! - [`SemanticOracle`] - source of `UsedAsResultOfLambda` facts
//! - [`ResultPositionAnalyzer`] - syntactic control-flow oracle with a fact cache
//! - [`collect_lambda_return_hints`] - hints for a whole tree or a range
//! - [`HintConfig`] - TOML configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use lambda_hints_analyzer::{LambdaResultAnnotator, ResultPositionAnalyzer, collect_lambda_return_hints};
//!
//! let tree = lambda_hints_syntax::parse("list.map {\n    println(it)\n    it * 2\n}").unwrap();
//! let oracle = ResultPositionAnalyzer::new(&tree);
//! let hints = collect_lambda_return_hints(&tree, &oracle, &LambdaResultAnnotator::new(), None);
//! assert_eq!(hints[0].display_text, "^map");
//! ```

pub mod annotator;
pub mod binding;
pub mod cache;
pub mod collect;
pub mod config;
pub mod eligibility;
pub mod hint;
pub mod label;
pub mod oracle;

pub use annotator::LambdaResultAnnotator;
pub use binding::{BindingContext, BindingSlice, BodyResolveMode};
pub use cache::FactCache;
pub use collect::collect_lambda_return_hints;
pub use config::HintConfig;
pub use eligibility::{Ineligibility, check_eligibility, expression_statement_part, is_eligible};
pub use hint::{HINT_PREFIX, LambdaReturnHint};
pub use label::{FALLBACK_LAMBDA_NAME, function_name_taking_lambda};
pub use oracle::{ResultPositionAnalyzer, SemanticOracle};
