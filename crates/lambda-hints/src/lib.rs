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

//! # Lambda Return Value Hints
//!
//! Marks the expressions whose value a Kotlin lambda returns implicitly with
//! an inlay hint `^label`.
//!
//! ```rust
//! use lambda_hints::{HintConfig, analyze_source};
//!
//! let source = "list.map {\n    println(it)\n    it * 2\n}";
//! let hints = analyze_source(source, &HintConfig::default()).unwrap();
//! assert_eq!(hints.len(), 1);
//! assert_eq!(hints[0].display_text, "^map");
//! assert_eq!(hints[0].anchor_offset, source.find("it * 2").unwrap() + 6);
//! ```

use thiserror::Error;

pub use lambda_hints_analyzer::{
    BindingContext, BindingSlice, BodyResolveMode, HINT_PREFIX, HintConfig, Ineligibility,
    LambdaResultAnnotator, LambdaReturnHint, ResultPositionAnalyzer, SemanticOracle,
    check_eligibility, collect_lambda_return_hints, function_name_taking_lambda,
};
pub use lambda_hints_syntax::{
    NodeId, NodeKind, ParseError, SyntaxTree, TextRange, TreeNavigator, parse,
};

/// Errors raised while producing hints for source text
#[derive(Error, Debug)]
pub enum HintError {
    /// The source could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The configuration was rejected
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for hint production
pub type Result<T> = std::result::Result<T, HintError>;

/// Parse `source` and collect every lambda return value hint in it
pub fn analyze_source(source: &str, config: &HintConfig) -> Result<Vec<LambdaReturnHint>> {
    analyze_source_in_range(source, config, None)
}

/// Like [`analyze_source`], restricted to nodes overlapping `range`
pub fn analyze_source_in_range(
    source: &str,
    config: &HintConfig,
    range: Option<TextRange>,
) -> Result<Vec<LambdaReturnHint>> {
    if !config.enabled {
        tracing::debug!("lambda return hints disabled");
        return Ok(Vec::new());
    }
    config
        .validate()
        .map_err(|err| HintError::Config(format!("{err:#}")))?;

    let tree = parse(source)?;
    let oracle = ResultPositionAnalyzer::new(&tree);
    let hints = collect_lambda_return_hints(&tree, &oracle, &config.annotator(), range);

    tracing::debug!(count = hints.len(), bytes = source.len(), "produced lambda return hints");
    Ok(hints)
}
