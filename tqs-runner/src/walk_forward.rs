//! Walk-forward threshold tuning: rolling train windows, adjacent test windows.
//!
//! Window `k` trains on `[origin + k·test, origin + k·test + train)` and tests
//! on the following `test` span, so train windows overlap and test windows
//! tile the data exactly. Each train window sweeps the threshold grid through
//! the full backtest pipeline and keeps the candidate with the highest win
//! rate (the first one on ties). That threshold is then applied unmodified
//! to the test window. Windows stop once a test window would end past the
//! last bar.

use chrono::{Duration, Months, NaiveDateTime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tqs_core::domain::{PriceBar, SentimentPoint};
use tqs_core::rng::RngHierarchy;

use crate::backtest::{run_backtest_with, BacktestError, BacktestResult, BacktestSettings};
use crate::config::{ConfigError, TqsConfig};

// ─── Configuration ───────────────────────────────────────────────────

/// A window length in calendar months or days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSpan {
    Months(u32),
    Days(u32),
}

impl WindowSpan {
    pub fn is_empty(&self) -> bool {
        matches!(self, WindowSpan::Months(0) | WindowSpan::Days(0))
    }
}

/// Accumulated calendar offset from the origin. Months apply before days,
/// so boundaries reached by different window sums coincide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Offset {
    months: u32,
    days: u64,
}

impl Offset {
    fn add(mut self, span: WindowSpan, times: u32) -> Self {
        match span {
            WindowSpan::Months(m) => self.months += m * times,
            WindowSpan::Days(d) => self.days += u64::from(d) * u64::from(times),
        }
        self
    }

    fn from_origin(self, origin: NaiveDateTime) -> Option<NaiveDateTime> {
        let days = i64::try_from(self.days).ok()?;
        origin
            .checked_add_months(Months::new(self.months))?
            .checked_add_signed(Duration::days(days))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    /// Entry-threshold candidates, swept in order.
    pub threshold_grid: Vec<f64>,
    /// Evaluate (window, candidate) runs on the rayon pool.
    pub parallel: bool,
    pub train: WindowSpan,
    pub test: WindowSpan,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            threshold_grid: (0..8).map(|i| 3.0 + 0.5 * i as f64).collect(),
            parallel: true,
            train: WindowSpan::Months(12),
            test: WindowSpan::Months(3),
        }
    }
}

// ─── Result types ────────────────────────────────────────────────────

/// Boundaries of one (train, test) pair; both ranges are half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub index: usize,
    pub train_start: NaiveDateTime,
    pub train_end: NaiveDateTime,
    pub test_start: NaiveDateTime,
    pub test_end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowResult {
    pub window: WindowSpec,
    pub tuned_threshold: f64,
    /// Win rate the tuned threshold achieved on the train window.
    pub train_win_rate: f64,
    pub test: BacktestResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardReport {
    pub windows: Vec<WindowResult>,
}

impl WalkForwardReport {
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Trade-weighted out-of-sample win rate across all test windows.
    pub fn pooled_test_win_rate(&self) -> f64 {
        let (wins, trades) = self.windows.iter().fold((0, 0), |(w, t), r| {
            (w + r.test.wins(), t + r.test.trade_count())
        });
        wins as f64 / trades.max(1) as f64
    }
}

#[derive(Debug, Error)]
pub enum WalkForwardError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("backtest failed on window {window} at threshold {threshold}: {source}")]
    BacktestFailed {
        window: usize,
        threshold: f64,
        #[source]
        source: BacktestError,
    },
}

// ─── Window creation ─────────────────────────────────────────────────

/// Windows over `[first, last]`, keeping those whose test end is ≤ `last`.
pub fn create_windows(
    first: NaiveDateTime,
    last: NaiveDateTime,
    config: &WalkForwardConfig,
) -> Vec<WindowSpec> {
    if config.train.is_empty() || config.test.is_empty() {
        return Vec::new();
    }

    let mut windows = Vec::new();
    for k in 0u32.. {
        let start = Offset::default().add(config.test, k);
        let train_end = start.add(config.train, 1);
        let test_end = train_end.add(config.test, 1);

        let (Some(train_start), Some(train_end), Some(test_end)) = (
            start.from_origin(first),
            train_end.from_origin(first),
            test_end.from_origin(first),
        ) else {
            break;
        };
        if test_end > last {
            break;
        }
        windows.push(WindowSpec {
            index: k as usize,
            train_start,
            train_end,
            test_start: train_end,
            test_end,
        });
    }
    windows
}

/// Bars with `start <= timestamp < end`, for sorted input.
pub fn slice_bars(bars: &[PriceBar], start: NaiveDateTime, end: NaiveDateTime) -> &[PriceBar] {
    let lo = bars.partition_point(|b| b.timestamp < start);
    let hi = bars.partition_point(|b| b.timestamp < end);
    &bars[lo..hi.max(lo)]
}

/// Sentiment points with `start <= timestamp < end`, in any order.
pub fn slice_sentiment(
    points: &[SentimentPoint],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<SentimentPoint> {
    points
        .iter()
        .filter(|p| p.timestamp >= start && p.timestamp < end)
        .copied()
        .collect()
}

// ─── Walk-forward orchestration ──────────────────────────────────────

/// Tune and validate the entry threshold window by window.
///
/// The `(window k, candidate j)` train run is seeded from the sub-hierarchy
/// `("train", k) → ("candidate", j)` and the test run from `("test", k)`, so
/// the report is identical with or without parallelism.
pub fn run_walk_forward(
    bars: &[PriceBar],
    sentiment: &[SentimentPoint],
    config: &TqsConfig,
) -> Result<WalkForwardReport, WalkForwardError> {
    config.validate()?;
    let wf = &config.walk_forward;

    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        log::warn!("walk-forward: no bars, no windows");
        return Ok(WalkForwardReport {
            windows: Vec::new(),
        });
    };
    let windows = create_windows(first.timestamp, last.timestamp, wf);
    if windows.is_empty() {
        log::warn!(
            "walk-forward: data from {} to {} is too short for one train + test window",
            first.timestamp,
            last.timestamp
        );
    }

    let root = RngHierarchy::new(config.seed);
    let results: Result<Vec<WindowResult>, WalkForwardError> = if wf.parallel {
        windows
            .par_iter()
            .map(|w| run_window(w, bars, sentiment, config, &root))
            .collect()
    } else {
        windows
            .iter()
            .map(|w| run_window(w, bars, sentiment, config, &root))
            .collect()
    };

    Ok(WalkForwardReport { windows: results? })
}

fn run_window(
    window: &WindowSpec,
    bars: &[PriceBar],
    sentiment: &[SentimentPoint],
    config: &TqsConfig,
    root: &RngHierarchy,
) -> Result<WindowResult, WalkForwardError> {
    let wf = &config.walk_forward;
    let train_bars = slice_bars(bars, window.train_start, window.train_end);
    let train_sentiment = slice_sentiment(sentiment, window.train_start, window.train_end);
    let train_rng = root.child("train", window.index as u64);

    let evaluate = |(j, &threshold): (usize, &f64)| -> Result<f64, WalkForwardError> {
        let scanner = config.scanner.with_entry_threshold(threshold);
        let settings = BacktestSettings {
            scanner: &scanner,
            ..BacktestSettings::from(config)
        };
        run_backtest_with(
            train_bars,
            &train_sentiment,
            settings,
            &train_rng.child("candidate", j as u64),
        )
        .map(|r| r.win_rate)
        .map_err(|source| WalkForwardError::BacktestFailed {
            window: window.index,
            threshold,
            source,
        })
    };

    let win_rates: Vec<f64> = if wf.parallel {
        wf.threshold_grid
            .par_iter()
            .enumerate()
            .map(evaluate)
            .collect::<Result<Vec<f64>, WalkForwardError>>()?
    } else {
        wf.threshold_grid
            .iter()
            .enumerate()
            .map(evaluate)
            .collect::<Result<Vec<f64>, WalkForwardError>>()?
    };

    let (best, train_win_rate) = select_threshold(&wf.threshold_grid, &win_rates);
    log::info!(
        "window {}: best threshold {best} with train win rate {:.2}% ({} to {})",
        window.index,
        train_win_rate * 100.0,
        window.train_start,
        window.train_end
    );

    let scanner = config.scanner.with_entry_threshold(best);
    let settings = BacktestSettings {
        scanner: &scanner,
        ..BacktestSettings::from(config)
    };
    let test = run_backtest_with(
        slice_bars(bars, window.test_start, window.test_end),
        &slice_sentiment(sentiment, window.test_start, window.test_end),
        settings,
        &root.child("test", window.index as u64),
    )
    .map_err(|source| WalkForwardError::BacktestFailed {
        window: window.index,
        threshold: best,
        source,
    })?;

    log::info!(
        "window {}: test {} to {} → {} trade(s), win rate {:.2}%, final ${:.2}",
        window.index,
        window.test_start,
        window.test_end,
        test.trade_count(),
        test.win_rate * 100.0,
        test.final_balance
    );

    Ok(WindowResult {
        window: *window,
        tuned_threshold: best,
        train_win_rate,
        test,
    })
}

/// First candidate with the strictly highest win rate. The grid must be
/// non-empty (checked by config validation).
fn select_threshold(grid: &[f64], win_rates: &[f64]) -> (f64, f64) {
    let mut best = (grid.first().copied().unwrap_or_default(), f64::NEG_INFINITY);
    for (&threshold, &rate) in grid.iter().zip(win_rates) {
        if rate > best.1 {
            best = (threshold, rate);
        }
    }
    if best.1 == f64::NEG_INFINITY {
        best.1 = 0.0;
    }
    best
}
