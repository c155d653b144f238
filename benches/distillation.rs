//! Benchmarks for the distillation engine.
//!
//! These measure the cost of one full distillation run and of the per-path
//! matrix kernel, establishing a baseline for the O(L²) connection-matrix
//! work that dominates a sweep.

use adios::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Synthetic corpus: `count` sentences sharing a three-token core inside
/// varied two-token contexts.
fn synthetic_corpus(count: usize) -> Vec<Vec<String>> {
    (0..count)
        .map(|i| {
            vec![
                format!("l{i}"),
                "p".to_string(),
                if i % 2 == 0 { "u" } else { "v" }.to_string(),
                "q".to_string(),
                format!("r{i}"),
            ]
        })
        .collect()
}

/// Benchmarks a full distillation run with generalisation enabled.
fn bench_distill_generalised(c: &mut Criterion) {
    let corpus = synthetic_corpus(32);
    let params = DistillParams::new(0.9, 0.01, 3, 0.65).unwrap();

    c.bench_function("distill_generalised_32_sentences", |b| {
        b.iter(|| {
            let mut graph = RdsGraph::from_corpus(black_box(&corpus)).unwrap();
            graph.distill(black_box(&params));
            black_box(graph.pattern_count())
        });
    });
}

/// Benchmarks a plain (window-disabled) distillation run.
fn bench_distill_plain(c: &mut Criterion) {
    let corpus = synthetic_corpus(32);
    let params = DistillParams::new(0.9, 0.01, 2, 0.65).unwrap();

    c.bench_function("distill_plain_32_sentences", |b| {
        b.iter(|| {
            let mut graph = RdsGraph::from_corpus(black_box(&corpus)).unwrap();
            graph.distill(black_box(&params));
            black_box(graph.rewiring_count())
        });
    });
}

/// Benchmarks graph construction and index rebuild alone.
fn bench_build_graph(c: &mut Criterion) {
    let corpus = synthetic_corpus(256);

    c.bench_function("build_graph_256_sentences", |b| {
        b.iter(|| {
            let graph = RdsGraph::from_corpus(black_box(&corpus)).unwrap();
            black_box(graph.corpus_size())
        });
    });
}

criterion_group!(
    benches,
    bench_distill_generalised,
    bench_distill_plain,
    bench_build_graph
);
criterion_main!(benches);
