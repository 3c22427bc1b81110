use criterion::{Criterion, criterion_group, criterion_main};
use lambda_hints::{
    HintConfig, LambdaResultAnnotator, ResultPositionAnalyzer, analyze_source,
    collect_lambda_return_hints, parse,
};
use std::hint::black_box;

fn sample_source(lambdas: usize) -> String {
    let mut source = String::new();
    for i in 0..lambdas {
        source.push_str(&format!(
            "val r{i} = items.map {{\n    log(it)\n    if (it > {i}) {{\n        it * 2\n    }} else {{\n        it\n    }}\n}}\n"
        ));
    }
    source
}

fn benchmark_analyze_source(c: &mut Criterion) {
    let source = sample_source(50);
    let config = HintConfig::default();

    c.bench_function("analyze_source", |b| {
        b.iter(|| black_box(analyze_source(black_box(&source), &config)))
    });
}

fn benchmark_collect_only(c: &mut Criterion) {
    let source = sample_source(50);
    let tree = parse(&source).unwrap();
    let annotator = LambdaResultAnnotator::new();

    c.bench_function("collect_cold_cache", |b| {
        b.iter(|| {
            let oracle = ResultPositionAnalyzer::new(&tree);
            black_box(collect_lambda_return_hints(&tree, &oracle, &annotator, None))
        })
    });

    let oracle = ResultPositionAnalyzer::new(&tree);
    c.bench_function("collect_warm_cache", |b| {
        b.iter(|| black_box(collect_lambda_return_hints(&tree, &oracle, &annotator, None)))
    });
}

fn benchmark_parse_only(c: &mut Criterion) {
    let source = sample_source(50);

    c.bench_function("parse_only", |b| b.iter(|| black_box(parse(black_box(&source)))));
}

criterion_group!(
    benches,
    benchmark_analyze_source,
    benchmark_collect_only,
    benchmark_parse_only
);
criterion_main!(benches);
