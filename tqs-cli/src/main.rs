//! TQS CLI: backtest, walk-forward, replay and debug commands over CSV inputs.
//!
//! Commands:
//! - `backtest`: scan, simulate and report sequence risk for one bar file
//! - `walk-forward`: tune the entry threshold on rolling train/test windows
//! - `replay`: run the streaming evaluator over a finished bar file
//! - `debug-tqs`: per-bar pattern / confirmation / sentiment split
//! - `correlate`: sentiment vs next-bar return correlation
//! - `config`: print the effective configuration and its hash
//!
//! Set `RUST_LOG` to control log verbosity (default `info`).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tqs_core::clean::VolumeFill;
use tqs_core::domain::{PriceBar, SentimentPoint};
use tqs_core::scanner::Scanner;
use tqs_core::scoring::ConfirmationInputs;
use tqs_core::stream::{replay_bars, SignalTier};
use tqs_runner::export::{
    export_json, export_signals_csv, export_trace_csv, export_trades_csv, export_windows_csv,
    write_file,
};
use tqs_runner::{
    correlate_sentiment_with_price, load_bars, load_sentiment, run_backtest, run_walk_forward,
    BacktestResult, TqsConfig,
};

#[derive(Parser)]
#[command(name = "tqs", about = "TQS CLI: Trade Quality Score engine")]
struct Cli {
    /// Path to a TOML config file. Defaults apply to anything it omits.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the master RNG seed.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Technical-only mode: ignore sentiment when scoring.
    #[arg(long, global = true, default_value_t = false)]
    no_sentiment: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Inputs {
    /// Bar CSV (timestamp, open, high, low, close[, volume]).
    #[arg(long)]
    bars: PathBuf,

    /// Sentiment CSV (timestamp, sentiment_score).
    #[arg(long)]
    sentiment: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan, simulate outcomes and report sequence risk.
    Backtest {
        #[command(flatten)]
        inputs: Inputs,

        /// Write the trade log here.
        #[arg(long)]
        trades_out: Option<PathBuf>,

        /// Write the full result as JSON here.
        #[arg(long)]
        json_out: Option<PathBuf>,
    },
    /// Tune the entry threshold on rolling train/test windows.
    WalkForward {
        #[command(flatten)]
        inputs: Inputs,

        /// Write the window table here.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Evaluate windows one after another instead of in parallel.
        #[arg(long, default_value_t = false)]
        serial: bool,
    },
    /// Run the streaming evaluator over a finished bar file.
    Replay {
        /// Bar CSV to replay in order.
        #[arg(long)]
        bars: PathBuf,

        /// JSON file with the externally computed confirmation inputs.
        #[arg(long)]
        inputs: Option<PathBuf>,

        /// Write the signal log here.
        #[arg(long)]
        signals_out: Option<PathBuf>,
    },
    /// Per-bar TQS breakdown for every scored bar.
    DebugTqs {
        #[command(flatten)]
        inputs: Inputs,

        /// Write the trace here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Correlate sentiment with the next bar's return.
    Correlate {
        #[arg(long)]
        bars: PathBuf,

        #[arg(long)]
        sentiment: PathBuf,
    },
    /// Print the effective configuration and its hash.
    Config,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = effective_config(&cli)?;

    match cli.command {
        Commands::Backtest {
            inputs,
            trades_out,
            json_out,
        } => run_backtest_cmd(&config, &inputs, trades_out, json_out),
        Commands::WalkForward { inputs, out, serial } => {
            let mut config = config;
            if serial {
                config.walk_forward.parallel = false;
                config.monte_carlo.parallel = false;
            }
            run_walk_forward_cmd(&config, &inputs, out)
        }
        Commands::Replay {
            bars,
            inputs,
            signals_out,
        } => run_replay_cmd(&config, &bars, inputs.as_deref(), signals_out),
        Commands::DebugTqs { inputs, out } => run_debug_cmd(&config, &inputs, out),
        Commands::Correlate { bars, sentiment } => run_correlate_cmd(&config, &bars, &sentiment),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            println!("# hash: {}", config.config_hash()?);
            Ok(())
        }
    }
}

fn effective_config(cli: &Cli) -> Result<TqsConfig> {
    let mut config = match &cli.config {
        Some(path) => TqsConfig::from_file(path)?,
        None => TqsConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if cli.no_sentiment {
        config.scanner.use_sentiment = false;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

struct Loaded {
    bars: Vec<PriceBar>,
    volume_fill: VolumeFill,
    sentiment: Vec<SentimentPoint>,
}

fn load_inputs(inputs: &Inputs, config: &TqsConfig) -> Result<Loaded> {
    let cleaned = load_bars(&inputs.bars)?;
    if cleaned.is_empty() {
        bail!("no usable bars in {}", inputs.bars.display());
    }
    if cleaned.volume_fill == VolumeFill::Substituted {
        log::warn!(
            "{} has no usable volume; RVOL runs on dummy volume",
            inputs.bars.display()
        );
    }
    let sentiment = match (&inputs.sentiment, config.scanner.use_sentiment) {
        (Some(path), true) => load_sentiment(path)?,
        (Some(_), false) => {
            log::info!("--no-sentiment set; ignoring the sentiment file");
            Vec::new()
        }
        (None, true) => {
            log::warn!("no sentiment file; every bar joins as neutral");
            Vec::new()
        }
        (None, false) => Vec::new(),
    };
    Ok(Loaded {
        bars: cleaned.bars,
        volume_fill: cleaned.volume_fill,
        sentiment,
    })
}

fn write_output(path: Option<&Path>, contents: &str, label: &str) -> Result<()> {
    match path {
        Some(path) => {
            write_file(path, contents)?;
            println!("{label} saved to: {}", path.display());
        }
        None => print!("{contents}"),
    }
    Ok(())
}

fn run_backtest_cmd(
    config: &TqsConfig,
    inputs: &Inputs,
    trades_out: Option<PathBuf>,
    json_out: Option<PathBuf>,
) -> Result<()> {
    let loaded = load_inputs(inputs, config)?;
    let result = run_backtest(&loaded.bars, &loaded.sentiment, config)?;
    print_summary(&result, loaded.volume_fill, config)?;

    if let Some(path) = trades_out {
        write_output(Some(&path), &export_trades_csv(&result.trades)?, "Trade log")?;
    }
    if let Some(path) = json_out {
        write_output(Some(&path), &export_json(&result)?, "Result")?;
    }
    Ok(())
}

fn run_walk_forward_cmd(config: &TqsConfig, inputs: &Inputs, out: Option<PathBuf>) -> Result<()> {
    let loaded = load_inputs(inputs, config)?;
    let report = run_walk_forward(&loaded.bars, &loaded.sentiment, config)?;
    if report.is_empty() {
        bail!("data too short for a single train + test window");
    }

    for w in &report.windows {
        println!(
            "Window {:>2}: {} → {}  threshold {:.1}  train {:.1}%  test {} trade(s) {:.1}%  ${:.2}",
            w.window.index,
            w.window.test_start.date(),
            w.window.test_end.date(),
            w.tuned_threshold,
            w.train_win_rate * 100.0,
            w.test.trade_count(),
            w.test.win_rate * 100.0,
            w.test.final_balance
        );
    }
    println!(
        "Pooled out-of-sample win rate: {:.2}%",
        report.pooled_test_win_rate() * 100.0
    );

    if let Some(path) = out {
        write_output(Some(&path), &export_windows_csv(&report.windows)?, "Window table")?;
    }
    Ok(())
}

fn run_replay_cmd(
    config: &TqsConfig,
    bars_path: &Path,
    inputs_path: Option<&Path>,
    signals_out: Option<PathBuf>,
) -> Result<()> {
    let inputs = match inputs_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<ConfirmationInputs>(&text)
                .with_context(|| format!("invalid confirmation inputs in {}", path.display()))?
        }
        None => ConfirmationInputs::default(),
    };

    let bars = load_bars(bars_path)?.bars;
    let records = replay_bars(&bars, &config.stream, inputs)?;

    let count = |tier: SignalTier| records.iter().filter(|r| r.tier == tier).count();
    println!("Evaluations: {}", records.len());
    println!("  {}: {}", SignalTier::TradeSignal, count(SignalTier::TradeSignal));
    println!("  {}: {}", SignalTier::WatchList, count(SignalTier::WatchList));
    println!("  {}: {}", SignalTier::Informational, count(SignalTier::Informational));

    if let Some(path) = signals_out {
        write_output(Some(&path), &export_signals_csv(&records)?, "Signal log")?;
    }
    Ok(())
}

fn run_debug_cmd(config: &TqsConfig, inputs: &Inputs, out: Option<PathBuf>) -> Result<()> {
    let loaded = load_inputs(inputs, config)?;
    let trace = Scanner::new(config.scanner.clone()).score_bars(&loaded.bars, &loaded.sentiment);
    log::info!("scored {} bar(s)", trace.len());
    write_output(out.as_deref(), &export_trace_csv(&trace)?, "TQS trace")
}

fn run_correlate_cmd(config: &TqsConfig, bars_path: &Path, sentiment_path: &Path) -> Result<()> {
    let bars = load_bars(bars_path)?.bars;
    let sentiment = load_sentiment(sentiment_path)?;
    let (r, merged) =
        correlate_sentiment_with_price(&sentiment, &bars, config.scanner.sentiment_tolerance());
    println!("Matched points: {}", merged.len());
    println!("Correlation:    {r:.4}");
    Ok(())
}

fn print_summary(
    result: &BacktestResult,
    volume_fill: VolumeFill,
    config: &TqsConfig,
) -> Result<()> {
    println!("Config hash:    {}", config.config_hash()?);
    println!("Bars scanned:   {}", result.bars_scanned);
    println!(
        "Volume:         {:?} (file: {:?})",
        result.volume_regime, volume_fill
    );
    println!("Trades taken:   {}", result.trade_count());
    println!("Watch list:     {}", result.watchlist.len());
    println!("Final balance:  ${:.2}", result.final_balance);
    println!("Win rate:       {:.2}%", result.win_rate * 100.0);
    println!("Expected value: {:.2}R", result.expected_value);
    println!(
        "Sequence risk:  5% ${:.2} / 50% ${:.2} / 95% ${:.2}",
        result.sequence_risk.p5, result.sequence_risk.p50, result.sequence_risk.p95
    );
    println!("Worst path p5:  ${:.2}", result.worst_balance_p5);
    if let Some(r) = result.sentiment_correlation {
        println!("Sentiment corr: {r:.4}");
    }
    Ok(())
}
