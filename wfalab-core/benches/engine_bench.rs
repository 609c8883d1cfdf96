//! Criterion benchmarks for WFALab core hot paths.
//!
//! Benchmarks:
//! 1. Indicator computation (SMA, RSI)
//! 2. Strategy signal generation
//! 3. Backtest engine over a precomputed signal list

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use wfalab_core::indicators::{rsi, sma};
use wfalab_core::{
    run_backtest, strategy_by_name, synthetic_bars, BacktestSettings, PriceSeries, Strategy,
};

// ── 1. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");

    for &bar_count in &[252, 1260, 2520] {
        let closes: Vec<f64> = synthetic_bars(bar_count, 1).iter().map(|b| b.close).collect();

        group.bench_with_input(BenchmarkId::new("sma_20", bar_count), &closes, |b, closes| {
            b.iter(|| sma(black_box(closes), 20))
        });
        group.bench_with_input(BenchmarkId::new("rsi_14", bar_count), &closes, |b, closes| {
            b.iter(|| rsi(black_box(closes), 14))
        });
    }

    group.finish();
}

// ── 2. Signal Generation ─────────────────────────────────────────────

fn bench_signals(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_generation");
    let bars = synthetic_bars(1260, 2);
    let series = PriceSeries::new(&bars);

    for name in ["sma_cross", "price_sma", "rsi_reversion"] {
        let Some(strategy) = strategy_by_name(name) else {
            continue;
        };
        let params = strategy.default_params();
        group.bench_function(name, |b| {
            b.iter(|| strategy.execute(black_box(&series), black_box(&params)))
        });
    }

    group.finish();
}

// ── 3. Backtest Engine ───────────────────────────────────────────────

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("backtest_engine");
    let settings = BacktestSettings::default();

    for &bar_count in &[252, 1260, 2520] {
        let bars = synthetic_bars(bar_count, 3);
        let series = PriceSeries::new(&bars);
        let Some(strategy) = strategy_by_name("price_sma") else {
            continue;
        };
        let signals = strategy
            .execute(&series, &strategy.default_params())
            .unwrap_or_default();

        group.bench_with_input(BenchmarkId::new("price_sma", bar_count), &bars, |b, bars| {
            b.iter(|| run_backtest(black_box(bars), black_box(&signals), &settings))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_indicators, bench_signals, bench_engine);
criterion_main!(benches);
