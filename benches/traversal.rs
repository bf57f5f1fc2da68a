//! Full-walk benchmark over a synthetic benchmark result dataset
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench traversal
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pagestat::dataset::{Dataset, MetricSet, MetricValue, TestRecord, VariationRecord};
use pagestat::reduce::{Delta, OutlierFilter, ReprStat};
use pagestat::visitors::{
    representative_pool, BasicStatVisitor, FlatRecordVisitor, SignificanceVisitor,
    ViewDataVisitor,
};
use pagestat::walker::Walker;

const METRICS: [&str; 6] = ["load", "ttfb", "render", "bytes", "requests", "dom"];
const VARIATIONS: [&str; 3] = ["control", "rewrite", "gzip"];

/// Deterministic dataset: `tests` tests, three variations, `runs` runs per metric
fn synthetic_dataset(tests: usize, runs: usize) -> Dataset {
    (0..tests)
        .map(|t| {
            let record: TestRecord = VARIATIONS
                .iter()
                .enumerate()
                .map(|(v, name)| {
                    let view = |offset: usize| -> MetricSet {
                        METRICS
                            .iter()
                            .enumerate()
                            .map(|(m, metric)| {
                                let values: Vec<f64> = (0..runs)
                                    .map(|r| ((t * 31 + v * 17 + m * 7 + r * 13 + offset) % 997) as f64)
                                    .collect();
                                (metric.to_string(), MetricValue::from(values))
                            })
                            .collect()
                    };
                    (name.to_string(), VariationRecord::new(view(0), view(5)))
                })
                .collect();
            (format!("http://site{}.example.com", t), record)
        })
        .collect()
}

fn bench_walks(c: &mut Criterion) {
    let mut group = c.benchmark_group("walk");

    for tests in [10usize, 100] {
        let data = synthetic_dataset(tests, 9);

        group.bench_with_input(BenchmarkId::new("flat", tests), &data, |b, data| {
            b.iter(|| {
                let records = Walker::new(data).walk(FlatRecordVisitor::new()).unwrap();
                black_box(records)
            });
        });

        group.bench_with_input(BenchmarkId::new("view_data", tests), &data, |b, data| {
            b.iter(|| {
                let tables = Walker::new(data)
                    .walk(ViewDataVisitor::new(ReprStat::median()))
                    .unwrap();
                black_box(tables)
            });
        });

        group.bench_with_input(BenchmarkId::new("basic_percent", tests), &data, |b, data| {
            b.iter(|| {
                let delta = Delta::percent(None, "control", ReprStat::median());
                let report = Walker::new(data)
                    .metrics(["load"])
                    .walk(BasicStatVisitor::new(delta))
                    .unwrap();
                black_box(report)
            });
        });

        group.bench_with_input(BenchmarkId::new("significance", tests), &data, |b, data| {
            b.iter(|| {
                let report = Walker::new(data)
                    .variations(["rewrite"])
                    .walk(SignificanceVisitor::new("control", OutlierFilter::basic()))
                    .unwrap();
                black_box(report)
            });
        });

        group.bench_with_input(BenchmarkId::new("aggregate_pool", tests), &data, |b, data| {
            b.iter(|| {
                let pooled = Walker::new(data)
                    .walk(representative_pool(ReprStat::median()))
                    .unwrap();
                black_box(pooled)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_walks);
criterion_main!(benches);
