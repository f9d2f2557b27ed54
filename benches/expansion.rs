use criterion::{Criterion, black_box, criterion_group, criterion_main};
use template_gen::{Evaluator, Grammar};

const TEMPLATE: &str = r#"
quad_equation: "$coef x^2 $sign $coef x $sign $coef = 0"
coef:
  "$digit": 70%
  "$digit $digit": auto
digit: { "1-9": auto }
sign: ["+", "-"]
"#;

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile template", |b| {
        b.iter(|| Grammar::from_yaml_str(black_box(TEMPLATE), None).unwrap())
    });
}

fn bench_expand(c: &mut Criterion) {
    let grammar = Grammar::from_yaml_str(TEMPLATE, None).unwrap();
    let mut evaluator = Evaluator::from_seed(&grammar, 42);
    c.bench_function("expand quad_equation", |b| {
        b.iter(|| evaluator.eval_class(black_box("quad_equation")).unwrap())
    });
}

criterion_group!(benches, bench_compile, bench_expand);
criterion_main!(benches);
