use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use mailrule_compiler::compiler::{CompilerConfig, RuleCompiler};
use mailrule_compiler::config::{Config, FilterNode};
use mailrule_compiler::parser::parse_criteria;
use mailrule_compiler::simplify::{DefaultSimplifier, Simplifier};

// 测试用的过滤条件
fn test_cases() -> Vec<(&'static str, &'static str)> {
    vec![
        ("simple", r#"{"from": "alice@example.com"}"#),
        (
            "or_and_not",
            r#"{"and": [{"or": [{"from": "a"}, {"from": "b"}, {"from": "c"}]}, {"not": {"subject": "x"}}]}"#,
        ),
        (
            "nested",
            r#"{"and": [{"and": [{"to": "me"}, {"or": [{"list": "dev"}, {"list": "ops"}]}]}, {"not": {"not": {"has": "attachment"}}}]}"#,
        ),
    ]
}

fn config_with_rules(count: usize) -> Config {
    let rules: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"filter": {{"and": [{{"or": [{{"list": "l{i}a"}}, {{"list": "l{i}b"}}]}}, {{"not": {{"from": "bot{i}"}}}}]}}, "actions": {{"labels": ["l{i}"]}}}}"#
            )
        })
        .collect();
    Config::from_json_str(&format!(r#"{{"version": "v1alpha3", "rules": [{}]}}"#, rules.join(",")))
        .expect("基准配置应该合法")
}

// 基准测试：条件树构建
fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_criteria");

    for (name, json) in test_cases() {
        let filter: FilterNode = serde_json::from_str(json).expect("过滤条件应该合法");
        group.bench_with_input(BenchmarkId::new("parse", name), &filter, |b, filter| {
            b.iter(|| black_box(parse_criteria(black_box(filter)).expect("解析应该成功")))
        });
    }

    group.finish();
}

// 基准测试：化简
fn benchmark_simplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("simplify");

    for (name, json) in test_cases() {
        let filter: FilterNode = serde_json::from_str(json).expect("过滤条件应该合法");
        let tree = parse_criteria(&filter).expect("解析应该成功");

        for (mode, simplifier) in [
            ("default", DefaultSimplifier::new()),
            ("grouping", DefaultSimplifier::with_grouping()),
        ] {
            group.bench_with_input(BenchmarkId::new(mode, name), &tree, |b, tree| {
                b.iter(|| black_box(simplifier.simplify(black_box(tree.clone())).expect("化简应该成功")))
            });
        }
    }

    group.finish();
}

// 基准测试：完整的规则编译
fn benchmark_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_rules");

    for count in [1usize, 50, 500] {
        let config = config_with_rules(count);
        for (mode, compiler) in [
            ("default", RuleCompiler::new()),
            (
                "grouping",
                RuleCompiler::from_config(CompilerConfig {
                    simplifier: DefaultSimplifier::with_grouping(),
                    ..Default::default()
                }),
            ),
        ] {
            group.bench_with_input(BenchmarkId::new(mode, count), &config, |b, config| {
                b.iter(|| black_box(compiler.compile(black_box(config)).expect("编译应该成功")))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_parse, benchmark_simplify, benchmark_compile);
criterion_main!(benches);
