//! Backtest orchestration: scan → simulate → sequence risk.
//!
//! One run takes cleaned bars and sentiment, scans them for candidates,
//! resolves each candidate with the probabilistic outcome model, and bounds
//! the ordering risk of the realized outcomes with the Monte Carlo
//! reshuffle. Randomness comes only from the `RngHierarchy`:
//! `("outcomes", 0)` drives the Bernoulli draws and the `("sequence_risk", 0)`
//! child drives the reshuffles.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tqs_core::domain::{PriceBar, SentimentPoint, TradeCandidate, TradeRecord};
use tqs_core::indicators::VolumeRegime;
use tqs_core::rng::RngHierarchy;
use tqs_core::scanner::{simulate_outcomes, Scanner, ScannerConfig, SimulationConfig};

use crate::config::{ConfigError, TqsConfig};
use crate::correlation::correlate_sentiment_with_price;
use crate::monte_carlo::{MonteCarloConfig, SequenceRiskPercentiles, SequenceRiskSimulator};

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("bars out of order at index {index}: {timestamp} precedes {previous}")]
    UnorderedBars {
        index: usize,
        timestamp: NaiveDateTime,
        previous: NaiveDateTime,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub trades: Vec<TradeRecord>,
    pub final_balance: f64,
    pub win_rate: f64,
    /// Expected value in R-multiples at the realized win rate.
    pub expected_value: f64,
    pub sequence_risk: SequenceRiskPercentiles,
    pub worst_balance_p5: f64,
    /// Bars below entry but at or above the watch-list threshold.
    pub watchlist: Vec<TradeCandidate>,
    pub volume_regime: VolumeRegime,
    pub bars_scanned: usize,
    /// Pearson r of sentiment against the next bar's return; `None` when
    /// the run was technical-only or had no sentiment.
    pub sentiment_correlation: Option<f64>,
}

impl BacktestResult {
    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn wins(&self) -> usize {
        self.trades.iter().filter(|t| t.is_win()).count()
    }
}

/// Everything a single run needs besides the data.
#[derive(Debug, Clone, Copy)]
pub struct BacktestSettings<'a> {
    pub scanner: &'a ScannerConfig,
    pub simulation: &'a SimulationConfig,
    pub monte_carlo: &'a MonteCarloConfig,
}

impl<'a> From<&'a TqsConfig> for BacktestSettings<'a> {
    fn from(config: &'a TqsConfig) -> Self {
        Self {
            scanner: &config.scanner,
            simulation: &config.simulation,
            monte_carlo: &config.monte_carlo,
        }
    }
}

/// Validate `config` and run one backtest seeded from `config.seed`.
pub fn run_backtest(
    bars: &[PriceBar],
    sentiment: &[SentimentPoint],
    config: &TqsConfig,
) -> Result<BacktestResult, BacktestError> {
    config.validate()?;
    let result = run_backtest_with(
        bars,
        sentiment,
        BacktestSettings::from(config),
        &RngHierarchy::new(config.seed),
    )?;

    log::info!("Trades taken: {}", result.trade_count());
    log::info!("Final balance: ${:.2}", result.final_balance);
    log::info!("Win rate: {:.2}%", result.win_rate * 100.0);
    log::info!("Expected value: {:.2}R", result.expected_value);
    log::info!(
        "Sequence risk (5% / 50% / 95%): {:.2} / {:.2} / {:.2}",
        result.sequence_risk.p5,
        result.sequence_risk.p50,
        result.sequence_risk.p95
    );
    if let Some(r) = result.sentiment_correlation {
        log::info!("Sentiment-price correlation: {r:.4}");
    }
    Ok(result)
}

/// Run one backtest with explicit settings and RNG. Does not validate.
pub fn run_backtest_with(
    bars: &[PriceBar],
    sentiment: &[SentimentPoint],
    settings: BacktestSettings<'_>,
    rng: &RngHierarchy,
) -> Result<BacktestResult, BacktestError> {
    check_order(bars)?;

    let scan = Scanner::new(settings.scanner.clone()).scan(bars, sentiment);
    if scan.volume_regime == VolumeRegime::Dummy {
        log::warn!("backtest ran on dummy volume; RVOL confirmations are meaningless");
    }

    let simulation = simulate_outcomes(
        &scan.candidates,
        settings.simulation,
        &mut rng.rng_for("outcomes", 0),
    );
    let risk = SequenceRiskSimulator::new(*settings.monte_carlo, *settings.simulation)
        .run(&simulation.outcomes(), &rng.child("sequence_risk", 0));

    let sentiment_correlation = (settings.scanner.use_sentiment && !sentiment.is_empty())
        .then(|| {
            correlate_sentiment_with_price(sentiment, bars, settings.scanner.sentiment_tolerance())
                .0
        });

    Ok(BacktestResult {
        final_balance: simulation.final_balance,
        win_rate: simulation.win_rate,
        expected_value: simulation.expected_value,
        trades: simulation.trades,
        sequence_risk: risk.percentiles,
        worst_balance_p5: risk.worst_balance_p5,
        watchlist: scan.watchlist,
        volume_regime: scan.volume_regime,
        bars_scanned: scan.bars_scanned,
        sentiment_correlation,
    })
}

fn check_order(bars: &[PriceBar]) -> Result<(), BacktestError> {
    match bars
        .windows(2)
        .position(|w| w[1].timestamp < w[0].timestamp)
    {
        Some(i) => Err(BacktestError::UnorderedBars {
            index: i + 1,
            timestamp: bars[i + 1].timestamp,
            previous: bars[i].timestamp,
        }),
        None => Ok(()),
    }
}
