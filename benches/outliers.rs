//! Criterion benchmarks for the robust outlier rule.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rust_data_qc::aggregation::{median, OutlierRule};

fn sample(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let base = 100.0 + ((i * 7919) % 13) as f64;
            if i % 997 == 0 { base * 50.0 } else { base }
        })
        .collect()
}

fn bench_outliers(c: &mut Criterion) {
    let rule = OutlierRule::default();
    let mut group = c.benchmark_group("outliers");
    for n in [100usize, 10_000, 100_000] {
        let values = sample(n);
        group.bench_with_input(BenchmarkId::new("median", n), &values, |b, v| {
            b.iter(|| median(black_box(v)))
        });
        group.bench_with_input(BenchmarkId::new("outlier_positions", n), &values, |b, v| {
            b.iter(|| rule.outlier_positions(black_box(v)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_outliers);
criterion_main!(benches);
