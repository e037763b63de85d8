//! Benchmarks for the table pipeline.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flextable::preferences::MemoryPreferences;
use flextable::{AppController, SummaryData};

const REGIONS: [&str; 5] = ["East", "West", "North", "South", "Central"];

/// Synthetic payload: region, rep and `measures` numeric columns.
fn payload(rows: usize, measures: usize) -> SummaryData {
    let mut columns = vec!["Region".to_string(), "Rep".to_string()];
    columns.extend((0..measures).map(|m| format!("Measure {m}")));
    let rows = (0..rows)
        .map(|i| {
            let mut row = vec![
                REGIONS[i % REGIONS.len()].to_string(),
                format!("Rep {}", i % 97),
            ];
            row.extend((0..measures).map(|m| format!("{:.2}", (i * (m + 1)) as f64 * 1.25)));
            row
        })
        .collect();
    SummaryData {
        worksheet_name: "Bench".to_string(),
        columns,
        rows,
        column_types: Vec::new(),
    }
}

fn loaded(data: SummaryData) -> AppController<MemoryPreferences> {
    let mut app = AppController::new(MemoryPreferences::new());
    app.on_data_changed(data);
    app
}

/// Full pipeline from payload to HTML
fn bench_full_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_render");
    for rows in [100usize, 1_000, 5_000] {
        let data = payload(rows, 8);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            b.iter(|| {
                let app = loaded(black_box(data.clone()));
                app.html()
            })
        });
    }
    group.finish();
}

/// Expanding every group re-renders the detail level
fn bench_expand_all(c: &mut Criterion) {
    let mut app = loaded(payload(5_000, 8));
    c.bench_function("expand_collapse_5000", |b| {
        b.iter(|| {
            app.expand_all().expect("expand");
            app.collapse_all().expect("collapse");
        })
    });
}

/// Search only recomputes visibility
fn bench_search(c: &mut Criterion) {
    let mut app = loaded(payload(5_000, 8));
    app.expand_all().expect("expand");
    let terms = ["east", "rep 4", "12", ""];
    c.bench_function("search_5000", |b| {
        b.iter(|| {
            for term in terms {
                app.set_search(black_box(term));
            }
        })
    });
}

fn bench_csv_export(c: &mut Criterion) {
    let mut app = loaded(payload(5_000, 8));
    app.expand_all().expect("expand");
    c.bench_function("visible_csv_5000", |b| {
        b.iter(|| app.export_visible_csv().unwrap())
    });
}

criterion_group!(
    benches,
    bench_full_render,
    bench_expand_all,
    bench_search,
    bench_csv_export
);
criterion_main!(benches);
