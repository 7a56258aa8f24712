use criterion::{criterion_group, criterion_main, Criterion};
use elpar::{GrammarDef, GrammarDefError, GrammarSet, LLParser, LRTable};
use elpar_tests::grammars;
use std::hint::black_box;

criterion_main!(benches);
criterion_group!(benches, bench_simple, bench_min_caml);

type Fixture = fn(&mut GrammarDef) -> Result<(), GrammarDefError>;

fn bench_simple(c: &mut Criterion) {
    bench_tables(c, "g_simple2", grammars::g_simple2);
    bench_tables(c, "g4", grammars::g4);
    bench_tables(c, "statements", grammars::statements);
}

fn bench_min_caml(c: &mut Criterion) {
    bench_tables(c, "min_caml", grammars::min_caml);
}

fn bench_tables(c: &mut Criterion, name: &str, f: Fixture) {
    let grammars = GrammarSet::define(f).unwrap();
    c.bench_function(&format!("{}/ll1", name), |b| {
        b.iter(|| {
            let _parser = black_box(LLParser::new(grammars.clone()));
        });
    });
    c.bench_function(&format!("{}/lr0", name), |b| {
        b.iter(|| {
            let _table = black_box(LRTable::new(&grammars));
        });
    });
}
