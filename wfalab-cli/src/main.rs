//! WFALab CLI — walk-forward analysis from the command line.
//!
//! Commands:
//! - `run` — walk-forward run described by a TOML run file
//! - `quick` — walk-forward run with ranges and windows derived automatically
//! - `strategies` — list built-in strategies and their default parameters

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wfalab_core::strategy::{strategy_by_name, STRATEGY_NAMES};
use wfalab_core::synthetic::synthetic_bars;
use wfalab_core::Bar;
use wfalab_runner::{load_bars_csv, RunFile, WalkForward, WalkForwardConfig, WalkForwardResult};

#[derive(Parser)]
#[command(
    name = "wfalab",
    about = "WFALab CLI — walk-forward analysis for trading strategies"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a walk-forward analysis described by a TOML run file.
    Run {
        /// Path to the run file.
        #[arg(long)]
        config: PathBuf,

        #[command(flatten)]
        data: DataArgs,

        /// Write the full JSON report here.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Walk-forward with ranges and window sizes derived from strategy defaults.
    Quick {
        /// Strategy name: sma_cross, price_sma, rsi_reversion.
        #[arg(long)]
        strategy: String,

        #[command(flatten)]
        data: DataArgs,

        /// Starting capital.
        #[arg(long, default_value_t = 10_000.0)]
        capital: f64,

        /// Write the full JSON report here.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List built-in strategies and their default parameters.
    Strategies,
}

#[derive(clap::Args)]
struct DataArgs {
    /// CSV bar file (overrides the run file's `data`).
    #[arg(long, conflicts_with = "synthetic")]
    data: Option<PathBuf>,

    /// Use this many synthetic bars instead of a file.
    #[arg(long)]
    synthetic: Option<usize>,

    /// Seed for synthetic bars.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

impl DataArgs {
    fn load(&self, fallback: Option<&Path>) -> Result<Vec<Bar>> {
        if let Some(count) = self.synthetic {
            tracing::info!(count, seed = self.seed, "using synthetic bars");
            return Ok(synthetic_bars(count, self.seed));
        }
        let Some(path) = self.data.as_deref().or(fallback) else {
            bail!("no data source: pass --data <csv> or --synthetic <bars>");
        };
        load_bars_csv(path).with_context(|| format!("loading bars from {}", path.display()))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data,
            output,
        } => run_cmd(&config, &data, output.as_deref()),
        Commands::Quick {
            strategy,
            data,
            capital,
            output,
        } => quick_cmd(&strategy, &data, capital, output.as_deref()),
        Commands::Strategies => {
            list_strategies();
            Ok(())
        }
    }
}

fn run_cmd(config_path: &Path, data: &DataArgs, output: Option<&Path>) -> Result<()> {
    let run = RunFile::load(config_path)?;
    let strategy = run.strategy()?;
    let bars = data.load(run.data.as_deref())?;

    let result = WalkForward::new(strategy.as_ref(), run.walk_forward.clone())
        .with_params(run.params.clone())
        .run(&bars, &run.ranges)?;

    report(&result, output)
}

fn quick_cmd(name: &str, data: &DataArgs, capital: f64, output: Option<&Path>) -> Result<()> {
    let Some(strategy) = strategy_by_name(name) else {
        bail!(
            "unknown strategy '{name}'. Valid: {}",
            STRATEGY_NAMES.join(", ")
        );
    };
    let bars = data.load(None)?;

    let mut config = WalkForwardConfig::default();
    config.backtest.initial_capital = capital;
    let result = WalkForward::new(strategy.as_ref(), config).run_quick(&bars)?;

    report(&result, output)
}

fn report(result: &WalkForwardResult, output: Option<&Path>) -> Result<()> {
    print_summary(result);
    if let Some(path) = output {
        let json = serde_json::to_string_pretty(result)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

fn list_strategies() {
    for name in STRATEGY_NAMES {
        if let Some(strategy) = strategy_by_name(name) {
            let params: Vec<String> = strategy
                .default_params()
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            println!("{name:<16}{}", params.join(" "));
        }
    }
}

fn print_summary(result: &WalkForwardResult) {
    let oos = &result.combined_oos;
    println!();
    println!("=== Walk-Forward Result ===");
    println!("Strategy:       {}", result.strategy);
    println!("Series:         {}", result.series_id);
    println!(
        "Windows:        {} (grid {} per window)",
        result.window_count, result.grid_size
    );
    println!("Elapsed:        {} ms", result.optimization_time_ms);
    println!();
    println!("--- Windows ---");
    for w in &result.windows {
        let params: Vec<String> = w
            .optimized_params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        println!(
            "#{:<3} {} .. {}  IS {:>8.2}%  OOS {:>8.2}%  {}{}",
            w.index + 1,
            w.test_start_time,
            w.test_end_time,
            w.in_sample.net_profit_percent,
            w.out_of_sample.net_profit_percent,
            params.join(" "),
            if w.diagnostics.used_fallback { "  (fallback)" } else { "" },
        );
    }
    println!();
    println!("--- Out-of-Sample ---");
    println!("Net Profit:     {:.2} ({:.2}%)", oos.net_profit, oos.net_profit_percent);
    println!("Trades:         {}", oos.total_trades);
    println!("Win Rate:       {:.1}%", oos.win_rate);
    println!("Profit Factor:  {:.2}", oos.profit_factor);
    println!("Max Drawdown:   {:.2}%", oos.max_drawdown_percent);
    println!("Sharpe:         {:.3}", oos.sharpe_ratio);
    println!();
    println!("--- Robustness ---");
    println!("Avg IS Sharpe:  {:.3}", result.avg_in_sample_sharpe);
    println!("Avg OOS Sharpe: {:.3}", result.avg_out_of_sample_sharpe);
    println!("WF Efficiency:  {:.3}", result.walk_forward_efficiency);
    println!("Param Stability:{:.1}", result.parameter_stability);
    println!("Robustness:     {}/100", result.robustness_score);
    println!();
}
