//! Criterion benchmarks for flattening and aggregating documents.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use serde_json::{json, Value};

use rust_data_qc::aggregation::{Aggregator, FlatRecord};
use rust_data_qc::config::HeuristicConfig;
use rust_data_qc::execution::{ExecutionEngine, ExecutionOptions};

fn document(i: usize) -> Value {
    json!({
        "fastq": {
            "reads": 1_000 + (i % 17),
            "encoding": "phred33",
            "quality": [[30.0, 31.5, 29.0], [28.0, 30.0, 32.5]],
            "tags": ["lane1", "lane2", "paired"],
        },
        "bam": {
            "contigs": [{"name": "chr1", "len": 248_956_422}, {"name": "chr2", "len": 242_193_529}],
            "mapped": 0.97,
        },
    })
}

fn corpus(n: usize) -> Vec<(String, Value)> {
    (0..n).map(|i| (format!("sample{i:05}"), document(i))).collect()
}

fn bench_flatten(c: &mut Criterion) {
    let config = HeuristicConfig::default();
    let doc = document(0);
    c.bench_function("flatten_one_document", |b| {
        b.iter(|| FlatRecord::from_document(black_box(&doc), &config))
    });
}

fn bench_aggregate(c: &mut Criterion) {
    let docs = corpus(2_000);
    let mut group = c.benchmark_group("aggregate_2000");

    group.bench_function("sequential", |b| {
        b.iter_batched(
            || Aggregator::new(HeuristicConfig::default()),
            |mut table| {
                for (name, doc) in &docs {
                    let _ = table.add_file(name.as_str(), doc);
                }
                table.analyze()
            },
            BatchSize::LargeInput,
        )
    });

    let engine = ExecutionEngine::new(ExecutionOptions::default());
    group.bench_function("parallel_flatten", |b| {
        b.iter_batched(
            || Aggregator::new(HeuristicConfig::default()),
            |mut table| {
                let _ = engine.aggregate_documents(&docs, &mut table);
                table.analyze()
            },
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_flatten, bench_aggregate);
criterion_main!(benches);
