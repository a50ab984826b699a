//! Lexer throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rsonnet_lex::Lexer;

const SMALL: &str = r#"{ a: 1, b: "two", c: [1, 2, 3] }"#;

const MEDIUM: &str = r#"
local utils = {
  double(x):: x * 2,
  triple(x):: x * 3,
};
{
  numbers: [utils.double(i) for i in [1, 2, 3, 4, 5] if i != 3],
  text: "hello" + ' ' + @"world",
  nested: { deep: { deeper: { value: 1.5e-3 } } },
  flags: { visible: 1, hidden:: 2, forced::: 3 },
}
"#;

fn bench_lexer(c: &mut Criterion) {
    c.bench_function("lex_small_object", |b| {
        b.iter(|| {
            let lexer = Lexer::new(black_box(SMALL));
            lexer.tokenize().unwrap()
        })
    });

    c.bench_function("lex_medium_config", |b| {
        b.iter(|| {
            let lexer = Lexer::new(black_box(MEDIUM));
            lexer.tokenize().unwrap()
        })
    });
}

criterion_group!(benches, bench_lexer);
criterion_main!(benches);
