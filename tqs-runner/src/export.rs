//! CSV and JSON sinks for run records.
//!
//! Four CSV tables:
//! - **trades**: simulated trade log with running balance
//! - **windows**: walk-forward table, one row per (train, test) pair
//! - **signals**: streaming signal log with the `"pts: reason; …"` breakdown
//! - **trace**: per-bar TQS debug split (pattern / confirmation / sentiment)
//!
//! The core only hands out structured records; formatting happens here.

use std::path::Path;

use anyhow::{Context, Result};
use tqs_core::domain::TradeRecord;
use tqs_core::scanner::ScoredBar;
use tqs_core::stream::SignalRecord;

use crate::backtest::BacktestResult;
use crate::walk_forward::WindowResult;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: timestamp, direction, sentiment, score, outcome, balance_after
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "direction",
        "sentiment",
        "score",
        "outcome",
        "balance_after",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.candidate.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            &t.candidate.direction.to_string(),
            &t.candidate.sentiment.value().to_string(),
            &format!("{:.2}", t.candidate.score),
            &t.outcome.to_string(),
            &format!("{:.2}", t.balance_after),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: window, train_start, train_end, test_start, test_end,
/// tuned_threshold, train_win_rate, test_trades, test_win_rate,
/// test_final_balance, test_expected_value
pub fn export_windows_csv(windows: &[WindowResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "window",
        "train_start",
        "train_end",
        "test_start",
        "test_end",
        "tuned_threshold",
        "train_win_rate",
        "test_trades",
        "test_win_rate",
        "test_final_balance",
        "test_expected_value",
    ])?;

    for w in windows {
        let spec = &w.window;
        wtr.write_record([
            &spec.index.to_string(),
            &spec.train_start.format(TIMESTAMP_FORMAT).to_string(),
            &spec.train_end.format(TIMESTAMP_FORMAT).to_string(),
            &spec.test_start.format(TIMESTAMP_FORMAT).to_string(),
            &spec.test_end.format(TIMESTAMP_FORMAT).to_string(),
            &format!("{:.2}", w.tuned_threshold),
            &format!("{:.4}", w.train_win_rate),
            &w.test.trade_count().to_string(),
            &format!("{:.4}", w.test.win_rate),
            &format!("{:.2}", w.test.final_balance),
            &format!("{:.4}", w.test.expected_value),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: timestamp, tier, score, price_used, breakdown
pub fn export_signals_csv(signals: &[SignalRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "tier", "score", "price_used", "breakdown"])?;

    for s in signals {
        wtr.write_record([
            &s.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            &s.tier.to_string(),
            &format!("{:.2}", s.score),
            &format!("{:.6}", s.price_used),
            &s.breakdown.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: index, timestamp, close, sentiment, direction, pattern_score,
/// confirmation_score, sentiment_adjustment, tqs, breakdown
pub fn export_trace_csv(trace: &[ScoredBar]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "index",
        "timestamp",
        "close",
        "sentiment",
        "direction",
        "pattern_score",
        "confirmation_score",
        "sentiment_adjustment",
        "tqs",
        "breakdown",
    ])?;

    for b in trace {
        wtr.write_record([
            &b.index.to_string(),
            &b.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            &format!("{:.6}", b.close),
            &b.sentiment.value().to_string(),
            &b.direction.to_string(),
            &format!("{:.2}", b.pattern_score),
            &format!("{:.2}", b.confirmation_score),
            &format!("{:.2}", b.sentiment_adjustment),
            &format!("{:.2}", b.tqs),
            &b.breakdown.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Files ──────────────────────────────────────────────────────────

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
