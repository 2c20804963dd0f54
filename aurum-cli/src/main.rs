//! Aurum CLI: H4 trend signals for gold and silver futures.
//!
//! Commands:
//! - `signal`: fetch and evaluate every configured instrument once
//! - `watch`: evaluate on a timer and send crossover alerts
//! - `macro`: dollar index, yields and equities over the macro window
//! - `evaluate`: offline evaluation from CSV files
//! - `size`: position size for a fixed-percentage risk
//! - `simulate`: expectancy, Kelly, ruin and Monte Carlo equity paths

mod logging;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use aurum_core::config::Config;
use aurum_core::data::{
    read_bars_csv_path, CircuitBreaker, CsvProvider, DataProvider, YahooProvider,
};
use aurum_core::engine::{run_cycle, Evaluation, SignalEngine};
use aurum_core::export::{evaluation_json, evaluations_json, macro_json, write_chart_csv_path};
use aurum_core::macro_context::{macro_snapshot, MacroQuote};
use aurum_core::notify::{dispatch, LogNotifier, Notifier, TelegramNotifier};
use aurum_core::risk::{self, SimulationParams};
use aurum_core::signal::CrossoverBook;

#[derive(Parser)]
#[command(name = "aurum", about = "Aurum CLI: EMA crossover signals for precious metals")]
struct Cli {
    /// Emit logs as JSON.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and evaluate every configured instrument once.
    Signal {
        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print evaluations as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Read `<SYMBOL>_<interval>.csv` files from this directory instead
        /// of Yahoo Finance.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Evaluate every `refresh_secs` and send crossover alerts.
    Watch {
        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop after this many cycles. Runs until interrupted when omitted.
        #[arg(long)]
        cycles: Option<u64>,

        /// Read `<SYMBOL>_<interval>.csv` files from this directory instead
        /// of Yahoo Finance.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Last close and change over the window for the macro symbols.
    Macro {
        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print quotes as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Read `<SYMBOL>_1d.csv` files from this directory instead of
        /// Yahoo Finance.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Evaluate one symbol from CSV files (no network).
    Evaluate {
        /// Symbol the bars belong to.
        #[arg(long)]
        symbol: String,

        /// Intraday bars CSV.
        #[arg(long)]
        intraday: PathBuf,

        /// Daily bars CSV for the ADR.
        #[arg(long)]
        daily: PathBuf,

        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the resampled chart with EMA columns to this CSV.
        #[arg(long)]
        export: Option<PathBuf>,

        /// Print the evaluation as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Position size for a fixed-percentage risk.
    Size {
        /// Account capital.
        #[arg(long)]
        capital: f64,

        /// Risk per trade in percent of capital (1.0 = 1%).
        #[arg(long, default_value_t = 1.0)]
        risk_pct: f64,

        /// Stop loss distance in pips.
        #[arg(long)]
        stop_pips: f64,

        /// Value of one pip per standard lot.
        #[arg(long, default_value_t = 10.0)]
        pip_value: f64,
    },
    /// Expectancy, Kelly, ruin probability and Monte Carlo equity paths.
    Simulate {
        /// Probability of a winning trade (0.55 = 55%).
        #[arg(long)]
        win_rate: f64,

        /// Reward-to-risk ratio of a winning trade.
        #[arg(long)]
        reward_risk: f64,

        /// Trades per path.
        #[arg(long, default_value_t = 300)]
        trades: usize,

        /// Number of simulated paths.
        #[arg(long, default_value_t = 50)]
        paths: usize,

        /// RNG seed for reproducible paths.
        #[arg(long)]
        seed: Option<u64>,

        /// Starting capital.
        #[arg(long, default_value_t = 10_000.0)]
        capital: f64,

        /// Risk per trade in percent of the starting capital.
        #[arg(long, default_value_t = 1.0)]
        risk_pct: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_json);

    match cli.command {
        Commands::Signal {
            config,
            json,
            data_dir,
        } => run_signal(config.as_deref(), data_dir.as_deref(), json),
        Commands::Watch {
            config,
            cycles,
            data_dir,
        } => run_watch(config.as_deref(), data_dir.as_deref(), cycles),
        Commands::Macro {
            config,
            json,
            data_dir,
        } => run_macro(config.as_deref(), data_dir.as_deref(), json),
        Commands::Evaluate {
            symbol,
            intraday,
            daily,
            config,
            export,
            json,
        } => run_evaluate(
            &symbol,
            &intraday,
            &daily,
            config.as_deref(),
            export.as_deref(),
            json,
        ),
        Commands::Size {
            capital,
            risk_pct,
            stop_pips,
            pip_value,
        } => run_size(capital, risk_pct, stop_pips, pip_value),
        Commands::Simulate {
            win_rate,
            reward_risk,
            trades,
            paths,
            seed,
            capital,
            risk_pct,
        } => run_simulate(
            SimulationParams {
                capital,
                risk_pct,
                win_rate,
                reward_risk,
                trades,
                paths,
            },
            seed,
        ),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// CSV files when `data_dir` is given, otherwise Yahoo Finance behind a
/// circuit breaker.
fn build_provider(data_dir: Option<&Path>) -> Result<Box<dyn DataProvider>> {
    match data_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "reading bars from CSV files");
            Ok(Box::new(CsvProvider::new(dir)))
        }
        None => Ok(Box::new(YahooProvider::new(Arc::new(
            CircuitBreaker::default_provider(),
        ))?)),
    }
}

fn run_signal(config_path: Option<&Path>, data_dir: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = SignalEngine::from_config(&config)?;
    let provider = build_provider(data_dir)?;

    let mut book = CrossoverBook::new();
    let report = run_cycle(&engine, provider.as_ref(), &config, &mut book);

    if json {
        println!("{}", evaluations_json(&report.evaluations)?);
    } else {
        for evaluation in &report.evaluations {
            print_evaluation(evaluation, config.instruments.label_for(&evaluation.symbol));
        }
    }

    if report.provider_blocked {
        bail!("{} provider is refusing requests, try again later", provider.name());
    }
    if report.evaluations.is_empty() {
        bail!("no instrument could be evaluated");
    }
    Ok(())
}

fn run_watch(
    config_path: Option<&Path>,
    data_dir: Option<&Path>,
    cycles: Option<u64>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = SignalEngine::from_config(&config)?;
    let provider = build_provider(data_dir)?;

    let mut notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(LogNotifier)];
    if let Some(telegram) = TelegramNotifier::from_config(&config.telegram)? {
        notifiers.push(Box::new(telegram));
    }

    let refresh = Duration::from_secs(config.monitor.refresh_secs);
    let timeframe = format!("H{}", config.market.bucket_hours);
    let mut book = CrossoverBook::new();

    tracing::info!(
        instruments = config.instruments.0.len(),
        refresh_secs = config.monitor.refresh_secs,
        notifiers = notifiers.len(),
        "watching"
    );

    let mut cycle = 0u64;
    loop {
        cycle += 1;
        let report = run_cycle(&engine, provider.as_ref(), &config, &mut book);
        if report.provider_blocked {
            tracing::warn!(
                cycle,
                provider = provider.name(),
                "provider blocked, retrying next tick"
            );
        }

        for evaluation in &report.evaluations {
            let label = config.instruments.label_for(&evaluation.symbol);
            tracing::info!(
                symbol = %evaluation.symbol,
                action = %evaluation.classification.action,
                close = evaluation.snapshot.last_close,
                "signal"
            );
            if let Some(event) = &evaluation.crossover {
                dispatch(&notifiers, event, &format!("{label} ({timeframe})"));
            }
        }

        if cycles.is_some_and(|n| cycle >= n) {
            break;
        }
        std::thread::sleep(refresh);
    }

    Ok(())
}

fn run_macro(config_path: Option<&Path>, data_dir: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let provider = build_provider(data_dir)?;
    let quotes = macro_snapshot(provider.as_ref(), &config.macro_context);

    if json {
        println!("{}", macro_json(&quotes)?);
    } else {
        print_macro(&quotes, config.macro_context.lookback_days);
    }

    if quotes.is_empty() {
        bail!("no macro symbol could be loaded");
    }
    Ok(())
}

fn run_evaluate(
    symbol: &str,
    intraday_path: &Path,
    daily_path: &Path,
    config_path: Option<&Path>,
    export: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = SignalEngine::from_config(&config)?;

    let intraday = read_bars_csv_path(intraday_path)
        .with_context(|| format!("reading {}", intraday_path.display()))?;
    let daily = read_bars_csv_path(daily_path)
        .with_context(|| format!("reading {}", daily_path.display()))?;

    let mut book = CrossoverBook::new();
    let evaluation = engine.evaluate(symbol, &intraday, &daily, &mut book)?;

    if let Some(path) = export {
        write_chart_csv_path(&evaluation.chart, path)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), bars = evaluation.chart.len(), "chart exported");
    }

    if json {
        println!("{}", evaluation_json(&evaluation)?);
    } else {
        print_evaluation(&evaluation, config.instruments.label_for(symbol));
    }
    Ok(())
}

fn run_size(capital: f64, risk_pct: f64, stop_pips: f64, pip_value: f64) -> Result<()> {
    let size = risk::position_size(capital, risk_pct, stop_pips, pip_value)?;
    println!("Risk amount:  {:.2}", size.risk_amount);
    println!("Lots:         {:.2}", size.lots);
    Ok(())
}

fn run_simulate(params: SimulationParams, seed: Option<u64>) -> Result<()> {
    let risk_amount = params.capital * params.risk_pct / 100.0;
    let expectancy = risk::expectancy(params.win_rate, params.reward_risk, risk_amount)?;
    let breakeven = risk::breakeven_win_rate(params.reward_risk)?;
    let kelly = risk::kelly_fraction(params.win_rate, params.reward_risk)?;
    let ruin = risk::risk_of_ruin(params.win_rate, params.capital / risk_amount)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let result = risk::simulate_equity(&params, &mut rng)?;
    let mean_final = result.mean_curve.last().copied().unwrap_or(params.capital);

    println!("=== Risk profile ===");
    println!("Expectancy/trade:   {expectancy:.2}");
    println!("Breakeven win rate: {:.1}%", breakeven * 100.0);
    println!("Full Kelly:         {:.1}%", kelly * 100.0);
    println!("Risk of ruin:       {ruin:.3e}");
    println!();
    println!(
        "=== Monte Carlo ({} paths x {} trades) ===",
        params.paths, params.trades
    );
    println!("Mean final capital:   {mean_final:.2}");
    println!("Median final capital: {:.2}", result.median_final());
    println!(
        "Ruined paths:         {} ({:.1}%)",
        result.ruined,
        result.ruin_rate() * 100.0
    );
    Ok(())
}

fn print_evaluation(evaluation: &Evaluation, label: &str) {
    let snap = &evaluation.snapshot;
    let c = &evaluation.classification;

    println!("=== {label} ({}) ===", evaluation.symbol);
    println!("Bar:          {}", snap.timestamp.format("%Y-%m-%d %H:%M UTC"));
    println!("Close:        {:.2}", snap.last_close);
    println!(
        "EMA fast/slow: {:.2} / {:.2}",
        snap.fast_ema, snap.slow_ema
    );
    println!("Distance:     {:.3}%", c.ema_distance_pct);
    println!("Slope:        {:.3}%", c.ema_slope_pct);
    match (snap.adr, c.adr_consumption, c.exhaustion) {
        (Some(adr), Some(used), Some(state)) => {
            println!("ADR:          {adr:.2} ({:.0}% used, {state})", used * 100.0)
        }
        _ => println!("ADR:          unavailable"),
    }
    println!("Action:       {}", c.action);
    if let Some(event) = evaluation.crossover.as_ref().filter(|e| e.is_cross()) {
        println!("Crossover:    {}", event.kind);
    }
    println!();
}

fn print_macro(quotes: &[MacroQuote], lookback_days: u32) {
    println!("=== Macro context ({lookback_days} days) ===");
    for q in quotes {
        println!(
            "{:<10} {:>10.2} {:>+10.2} ({:+.2}%)  as of {}",
            q.label,
            q.last_close,
            q.change,
            q.change_pct,
            q.as_of.format("%Y-%m-%d")
        );
    }
}
