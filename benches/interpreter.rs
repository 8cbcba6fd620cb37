use std::fmt::Write;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sable::interpreter::Interpreter;
use sable::{lexer, parser};

/// Generates a flat workload: one arrow function, one lazy binding, and
/// one print per round.
fn workload(rounds: usize) -> String {
    let mut source = String::from("module bench;\n");
    for i in 0..rounds {
        writeln!(source, "sub f{i}(a, b) -> (a + b) * {i};").expect("write to string");
        writeln!(source, "let r{i} = f{i}({i}, {});", i + 1).expect("write to string");
        writeln!(source, "@println(r{i});").expect("write to string");
    }
    source
}

fn bench_lex(c: &mut Criterion) {
    let source = workload(100);
    c.bench_function("lex_workload_100", |b| {
        b.iter(|| black_box(lexer::lex(black_box(&source))))
    });
}

fn bench_parse(c: &mut Criterion) {
    let source = workload(100);
    let tokens = lexer::lex(&source);
    c.bench_function("parse_workload_100", |b| {
        b.iter(|| parser::parse(black_box(tokens.clone())).expect("parse"))
    });
}

fn bench_run(c: &mut Criterion) {
    let source = workload(100);
    let program = parser::parse(lexer::lex(&source)).expect("parse");
    c.bench_function("run_workload_100", |b| {
        let mut interpreter = Interpreter::new();
        b.iter(|| {
            let output = interpreter.run(black_box(&program)).expect("run");
            black_box(output);
        })
    });
}

criterion_group!(benches, bench_lex, bench_parse, bench_run);
criterion_main!(benches);
