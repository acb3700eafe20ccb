//! Criterion benchmarks for SignalLab hot paths.
//!
//! Benchmarks:
//! 1. Validation (raw rows → BarSeries)
//! 2. Full indicator battery on one series
//! 3. End-to-end analysis (validate + battery + scoring)

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use signallab_core::config::IndicatorWindows;
use signallab_core::data::{validate_bars, RawBar};
use signallab_core::{EngineConfig, IndicatorBattery, SignalEngine};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_raw_bars(n: usize) -> Vec<RawBar> {
    let base = NaiveDate::from_ymd_opt(2020, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            RawBar::numeric(
                base + Duration::hours(i as i64),
                close - 0.3,
                close + 1.5,
                close - 1.5,
                close,
                Some(1_000_000.0 + (i % 500) as f64),
            )
        })
        .collect()
}

// ── 1. Validation ────────────────────────────────────────────────────

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    for &n in &[100, 500, 2000] {
        let raw = make_raw_bars(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &raw, |b, raw| {
            b.iter(|| validate_bars("BENCH", black_box(raw), 50))
        });
    }
    group.finish();
}

// ── 2. Indicator battery ─────────────────────────────────────────────

fn bench_battery(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_battery");
    let battery = IndicatorBattery::new(IndicatorWindows::default());
    for &n in &[100, 500, 2000] {
        let (series, _) = validate_bars("BENCH", &make_raw_bars(n), 50).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &series, |b, series| {
            b.iter(|| battery.compute(black_box(series)))
        });
    }
    group.finish();
}

// ── 3. End-to-end ────────────────────────────────────────────────────

fn bench_analyze(c: &mut Criterion) {
    let engine = SignalEngine::new(EngineConfig::default()).unwrap();
    let raw = make_raw_bars(500);
    c.bench_function("analyze_500", |b| {
        b.iter(|| engine.analyze("BENCH", black_box(&raw)))
    });
}

criterion_group!(benches, bench_validate, bench_battery, bench_analyze);
criterion_main!(benches);
