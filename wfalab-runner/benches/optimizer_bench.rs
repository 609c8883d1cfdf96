//! Criterion benchmarks for the walk-forward hot paths.
//!
//! Run with: `cargo bench -p wfalab-runner`
//!
//! - grid expansion
//! - one window's optimization, sequential vs parallel
//! - a full walk-forward run on synthetic bars

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use wfalab_core::domain::ParameterSet;
use wfalab_core::engine::BacktestSettings;
use wfalab_core::series::PriceSeries;
use wfalab_core::strategy::strategy_by_name;
use wfalab_core::synthetic::synthetic_bars;
use wfalab_runner::{
    generate_grid, run_walk_forward, CancellationToken, OptimizerConfig, ParameterRange,
    ScoringWeights, WalkForwardConfig, WindowOptimizer,
};

fn bench_grid_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_generation");

    for per_param in [10usize, 30, 60] {
        let ranges: Vec<ParameterRange> = ["a", "b", "c"]
            .iter()
            .map(|name| ParameterRange::new(*name, 1.0, per_param as f64, 1.0))
            .collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(per_param.pow(3)),
            &ranges,
            |b, ranges| b.iter(|| generate_grid(black_box(ranges))),
        );
    }

    group.finish();
}

fn bench_window_optimization(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_optimization");
    group.sample_size(10);

    let bars = synthetic_bars(1000, 42);
    let series = PriceSeries::new(&bars);
    let strategy = match strategy_by_name("sma_cross") {
        Some(s) => s,
        None => return,
    };
    let base: ParameterSet = strategy.default_params();
    let grid = generate_grid(&[
        ParameterRange::new("fast_period", 5.0, 25.0, 5.0),
        ParameterRange::new("slow_period", 30.0, 80.0, 10.0),
    ]);
    let settings = BacktestSettings::default();
    let weights = ScoringWeights::default();
    let cancel = CancellationToken::new();

    for parallel in [false, true] {
        let config = OptimizerConfig {
            parallel,
            ..OptimizerConfig::default()
        };
        let optimizer = WindowOptimizer {
            strategy: strategy.as_ref(),
            base_params: &base,
            settings: &settings,
            weights: &weights,
            config: &config,
            lookback: 250,
            min_trades: 3,
            top_n: 5,
            cancel: &cancel,
        };
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_function(label, |b| {
            b.iter(|| optimizer.optimize(black_box(&series), 500, 900, &grid))
        });
    }

    group.finish();
}

fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("walk_forward");
    group.sample_size(10);

    let bars = synthetic_bars(1500, 7);
    let strategy = match strategy_by_name("price_sma") {
        Some(s) => s,
        None => return,
    };
    let ranges = vec![ParameterRange::new("period", 5.0, 50.0, 5.0)];
    let config = WalkForwardConfig {
        optimization_window: 400,
        test_window: 100,
        step_size: 100,
        ..WalkForwardConfig::default()
    };

    group.bench_function("price_sma_1500_bars", |b| {
        b.iter(|| run_walk_forward(black_box(&bars), strategy.as_ref(), &ranges, config.clone()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_grid_generation,
    bench_window_optimization,
    bench_full_run
);
criterion_main!(benches);
