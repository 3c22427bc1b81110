//! Integration tests for lambda return value hints

use lambda_hints::{
    BindingContext, BindingSlice, BodyResolveMode, HintConfig, LambdaResultAnnotator,
    LambdaReturnHint, NodeId, NodeKind, ResultPositionAnalyzer, SemanticOracle, TextRange,
    TreeNavigator, analyze_source, analyze_source_in_range, collect_lambda_return_hints, parse,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// `(text, offset)` pairs of the produced hints
fn hints_of(source: &str) -> Vec<(String, usize)> {
    analyze_source(source, &HintConfig::default())
        .unwrap()
        .into_iter()
        .map(|hint| (hint.display_text, hint.anchor_offset))
        .collect()
}

/// Offset right after the first occurrence of `snippet`
fn end_of(source: &str, snippet: &str) -> usize {
    let start = source
        .find(snippet)
        .unwrap_or_else(|| panic!("{snippet:?} not in source"));
    start + snippet.len()
}

fn expected(source: &str, hints: &[(&str, &str)]) -> Vec<(String, usize)> {
    hints
        .iter()
        .map(|(text, snippet)| (text.to_string(), end_of(source, snippet)))
        .collect()
}

#[rstest]
#[case::trailing_lambda(
    "val doubled = list.map {\n    println(it)\n    it * 2\n}",
    &[("^map", "it * 2")]
)]
#[case::own_label_wins(
    "list.forEach outer@{\n    log(it)\n    it.size\n}",
    &[("^outer", "it.size")]
)]
#[case::call_with_arguments(
    "foo(1) {\n    prepare()\n    result()\n}",
    &[("^foo", "result()")]
)]
#[case::annotated_same_line(
    "run {\n    prepare()\n    @Suppress(\"X\") value\n}",
    &[("^run", "value")]
)]
#[case::annotated_split(
    "run {\n    prepare()\n    @Suppress(\"X\")\n    value\n}",
    &[("^run", "value")]
)]
#[case::annotated_line_comment_then_base(
    "run {\n    prepare()\n    @Ann // keep\n    value\n}",
    &[("^run", "value")]
)]
#[case::annotated_block_comment_then_base(
    "run {\n    prepare()\n    @Ann\n    /* keep */ value\n}",
    &[("^run", "value")]
)]
#[case::labeled_split(
    "run {\n    prepare()\n    done@\n    42\n}",
    &[("^run", "42")]
)]
#[case::multi_line_if(
    "val r = run {\n    prepare()\n    if (flag) {\n        \"yes\"\n    } else {\n        \"no\"\n    }\n}",
    &[("^run", "\"yes\""), ("^run", "\"no\"")]
)]
#[case::one_liner_if(
    "val r = run {\n    prepare()\n    if (flag) \"yes\" else \"no\"\n}",
    &[("^run", "if (flag) \"yes\" else \"no\"")]
)]
#[case::when_branches(
    "run {\n    prepare()\n    when (x) {\n        1 -> \"one\"\n        else -> \"many\"\n    }\n}",
    &[("^run", "\"one\""), ("^run", "\"many\"")]
)]
#[case::parenthesized(
    "run {\n    prepare()\n    (a + b)\n}",
    &[("^run", "(a + b)")]
)]
fn test_hint_produced(#[case] source: &str, #[case] hints: &[(&str, &str)]) {
    assert_eq!(hints_of(source), expected(source, hints));
}

#[rstest]
#[case::single_statement_body("list.map { it * 2 }")]
#[case::single_statement_multi_line("list.map {\n    it * 2\n}")]
#[case::empty_body("list.forEach { }")]
#[case::dead_code_after_return("run {\n    return@run\n    unreachable()\n}")]
#[case::dead_code_after_throw("run {\n    throw IllegalStateException()\n    unreachable()\n}")]
#[case::if_without_else("run {\n    prepare()\n    if (c) {\n        b()\n    }\n}")]
#[case::when_without_else("run {\n    prepare()\n    when (x) {\n        1 -> a()\n    }\n}")]
#[case::loop_result("run {\n    prepare()\n    for (x in xs) {\n        log(x)\n    }\n}")]
#[case::assignment_result("run {\n    prepare()\n    total = 1\n}")]
#[case::declaration_result("run {\n    prepare()\n    val x = 1\n}")]
#[case::lambda_in_parentheses("foo({\n    prepare()\n    result()\n})")]
#[case::lambda_in_property("val f = {\n    prepare()\n    result()\n}")]
#[case::function_body("fun f(): Int {\n    prepare()\n    1\n}")]
fn test_no_hint(#[case] source: &str) {
    assert_eq!(hints_of(source), vec![]);
}

#[test]
fn test_nested_lambdas_labeled_separately() {
    let source = "outer.forEach {\n    log(it)\n    it.items.map {\n        log(it)\n        it.name\n    }\n}";
    let inner_close = source.rfind("    }").unwrap() + "    }".len();

    assert_eq!(
        hints_of(source),
        vec![
            ("^map".to_string(), end_of(source, "it.name")),
            ("^forEach".to_string(), inner_close),
        ]
    );
}

#[test]
fn test_deep_nesting_is_a_parse_error() {
    let depth = 300;
    let source = format!("val x = {}1{}", "(".repeat(depth), ")".repeat(depth));
    let err = analyze_source(&source, &HintConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        lambda_hints::HintError::Parse(lambda_hints::ParseError::NestingTooDeep { .. })
    ));

    let depth = 30;
    let source = format!("val x = {}1{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(hints_of(&source), vec![]);
}

#[test]
fn test_one_liner_if_branches_get_no_hint() {
    let source = "run {\n    prepare()\n    if (a) if (b) 1 else 2 else 3\n}";
    assert_eq!(
        hints_of(source),
        expected(source, &[("^run", "if (a) if (b) 1 else 2 else 3")])
    );
}

#[test]
fn test_hints_are_ordered_by_offset() {
    let source = "val a = first {\n    x()\n    y()\n}\nval b = second {\n    z()\n    w()\n}";
    let hints = analyze_source(source, &HintConfig::default()).unwrap();
    let texts: Vec<&str> = hints.iter().map(|hint| hint.display_text.as_str()).collect();
    assert_eq!(texts, vec!["^first", "^second"]);
    assert!(hints.windows(2).all(|pair| pair[0].anchor_offset <= pair[1].anchor_offset));
}

#[test]
fn test_range_restricts_hints() {
    let source = "val a = first {\n    x()\n    y()\n}\nval b = second {\n    z()\n    w()\n}";
    let start = source.find("val b").unwrap();
    let range = TextRange::new(start, source.len());

    let hints = analyze_source_in_range(source, &HintConfig::default(), Some(range)).unwrap();
    assert_eq!(hints.len(), 1);
    assert_eq!(hints[0].display_text, "^second");

    // A range ending where the first statement ends only touches it
    let first_end = source.find("\nval b").unwrap();
    let touching = TextRange::new(first_end, first_end);
    let hints = analyze_source_in_range(source, &HintConfig::default(), Some(touching)).unwrap();
    assert!(hints.is_empty());
}

#[test]
fn test_repeated_analysis_is_stable() {
    let source = "list.map {\n    println(it)\n    it * 2\n}";
    let tree = parse(source).unwrap();
    let oracle = ResultPositionAnalyzer::new(&tree);
    let annotator = LambdaResultAnnotator::new();

    let first = collect_lambda_return_hints(&tree, &oracle, &annotator, None);
    let second = collect_lambda_return_hints(&tree, &oracle, &annotator, None);
    assert_eq!(first, second);
    assert_eq!(hints_of(source), hints_of(source));
}

#[test]
fn test_full_resolve_mode_matches_default() {
    let source = "val r = run {\n    prepare()\n    if (flag) {\n        \"yes\"\n    } else {\n        \"no\"\n    }\n}";
    let full = HintConfig {
        resolve_mode: BodyResolveMode::Full,
        ..HintConfig::default()
    };
    assert_eq!(
        analyze_source(source, &full).unwrap(),
        analyze_source(source, &HintConfig::default()).unwrap()
    );
}

#[test]
fn test_config_from_toml_disables_hints() {
    let config = HintConfig::from_toml_str("enabled = false").unwrap();
    let hints = analyze_source("list.map {\n    println(it)\n    it * 2\n}", &config).unwrap();
    assert!(hints.is_empty());
}

/// Oracle answering from a fixed verdict
struct FixedOracle {
    verdict: Option<bool>,
}

impl SemanticOracle for FixedOracle {
    fn analyze(&self, expression: NodeId, _mode: BodyResolveMode) -> BindingContext {
        let mut context = BindingContext::empty();
        if let Some(value) = self.verdict {
            context.record(BindingSlice::UsedAsResultOfLambda, expression, value);
        }
        context
    }
}

fn collect_with(source: &str, oracle: &dyn SemanticOracle) -> Vec<LambdaReturnHint> {
    let tree = parse(source).unwrap();
    collect_lambda_return_hints(&tree, oracle, &LambdaResultAnnotator::new(), None)
}

#[rstest]
#[case::absent(None, 0)]
#[case::negative(Some(false), 0)]
#[case::positive(Some(true), 2)]
fn test_custom_oracle(#[case] verdict: Option<bool>, #[case] count: usize) {
    // Both statements pass the structural filter; the oracle decides
    let source = "run {\n    a()\n    b()\n}";
    let hints = collect_with(source, &FixedOracle { verdict });
    assert_eq!(hints.len(), count);
    assert!(hints.iter().all(|hint| hint.display_text == "^run"));
}

#[test]
fn test_hint_scope_is_lambda() {
    let source = "list.map {\n    println(it)\n    it * 2\n}";
    let tree = parse(source).unwrap();
    let oracle = ResultPositionAnalyzer::new(&tree);
    let hints = collect_lambda_return_hints(&tree, &oracle, &LambdaResultAnnotator::new(), None);

    assert_eq!(hints.len(), 1);
    assert_eq!(tree.kind(hints[0].scope), &NodeKind::Lambda);
    assert_eq!(tree.text(hints[0].scope), "{\n    println(it)\n    it * 2\n}");
}

#[test]
fn test_hint_serializes() {
    let hints = analyze_source("run {\n    a()\n    b()\n}", &HintConfig::default()).unwrap();
    let json = serde_json::to_value(&hints).unwrap();
    assert_eq!(json[0]["display_text"], "^run");
    assert_eq!(json[0]["anchor_offset"], 21);
}
