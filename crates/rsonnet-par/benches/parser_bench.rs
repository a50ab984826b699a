//! Parser throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rsonnet_lex::Lexer;
use rsonnet_par::Parser;

const EXPRESSION: &str = "1 + 2 * 3 - 4 / 5 % 6 < 7 << 8 && true || false";

const CONFIG: &str = r#"
local mkPort(n) = { port: 8000 + n, proto: 'tcp' };
{
  name: 'service',
  ports: [mkPort(i) for i in [0, 1, 2] if i != 1],
  env: { [k]: 'on' for k in ['debug', 'trace'] },
  base:: { replicas: 1 },
  prod: self.base { replicas: 3 },
}
"#;

fn bench_parser(c: &mut Criterion) {
    c.bench_function("parse_expression", |b| {
        b.iter(|| {
            let mut parser = Parser::new(Lexer::new(black_box(EXPRESSION)));
            parser.parse().unwrap()
        })
    });

    c.bench_function("parse_config", |b| {
        b.iter(|| {
            let mut parser = Parser::new(Lexer::new(black_box(CONFIG)));
            parser.parse().unwrap()
        })
    });
}

criterion_group!(benches, bench_parser);
criterion_main!(benches);
