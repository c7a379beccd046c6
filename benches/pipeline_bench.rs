use criterion::{black_box, criterion_group, criterion_main, Criterion};
use camscript::{parse_program, run_source, tokenize};

const SAMPLE: &str = "DECLARE total : INTEGER\n\
                      DECLARE i : INTEGER\n\
                      total <- 0\n\
                      FOR i <- 1 TO 100\n\
                          IF i / 2 = 0.0 THEN\n\
                              total <- total + i\n\
                          ELSE\n\
                              total <- total + i * 2\n\
                          ENDIF\n\
                      NEXT i\n\
                      OUTPUT total";

fn lexer_benchmark(c: &mut Criterion) {
    c.bench_function("tokenize sample program", |b| {
        b.iter(|| tokenize(black_box(SAMPLE)).unwrap())
    });
}

fn parser_benchmark(c: &mut Criterion) {
    let tokens = tokenize(SAMPLE).unwrap();
    c.bench_function("parse sample program", |b| {
        b.iter(|| parse_program(black_box(tokens.clone())).unwrap())
    });
}

fn interpreter_benchmark(c: &mut Criterion) {
    c.bench_function("run sample program", |b| {
        b.iter(|| run_source(black_box(SAMPLE), "").unwrap())
    });
}

criterion_group!(
    benches,
    lexer_benchmark,
    parser_benchmark,
    interpreter_benchmark
);
criterion_main!(benches);
