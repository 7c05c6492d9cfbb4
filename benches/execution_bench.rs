use criterion::{black_box, criterion_group, criterion_main, Criterion};
use itrex::{Evaluator, ExpressionParser, Scanner};

const PROGRAM: &str = r#"
    [let
        [set total 0]
        [for i [range 100]
            [update total [add [get total] [get i]]]]
        [get total]]
"#;

fn lexer_benchmark(c: &mut Criterion) {
    c.bench_function("tokenize program", |b| {
        b.iter(|| Scanner::new(black_box(PROGRAM)).scan_tokens().unwrap())
    });
}

fn parser_benchmark(c: &mut Criterion) {
    c.bench_function("parse program", |b| {
        b.iter(|| {
            ExpressionParser::from_source(black_box(PROGRAM))
                .unwrap()
                .parse_all()
                .unwrap()
        })
    });
}

fn evaluator_benchmark(c: &mut Criterion) {
    let evaluator = Evaluator::new();

    c.bench_function("evaluate loop", |b| {
        b.iter(|| evaluator.evaluate_str(black_box(PROGRAM)).unwrap())
    });

    c.bench_function("fold over lazy range", |b| {
        b.iter(|| {
            evaluator
                .evaluate_str(black_box("[fold add 0 [map [curry mul 2] [range 1000]]]"))
                .unwrap()
        })
    });

    evaluator
        .evaluate_str("[fn square [let [set x [arg]] [mul [get x] [get x]]]]")
        .unwrap();
    c.bench_function("user function calls", |b| {
        b.iter(|| {
            evaluator
                .evaluate_str(black_box("[fold add 0 [map square [range 200]]]"))
                .unwrap()
        })
    });
}

criterion_group!(benches, lexer_benchmark, parser_benchmark, evaluator_benchmark);
criterion_main!(benches);
