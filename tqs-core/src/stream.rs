//! Incremental scoring over a live or replayed feed.
//!
//! Each update goes into the symbol's `PriceBuffer`; zones and the Donchian
//! range are then recomputed from the buffer and the snapshot is scored.
//! Session zones come from the bars before the current one, so the current
//! bar's extreme can probe them; the Donchian range includes it.

use crate::buffer::{BufferError, PriceBuffer};
use crate::domain::{PriceBar, Symbol, Tick};
use crate::scoring::{ConfirmationInputs, MarketState, ScoreBreakdown, SignalEvaluator};
use crate::zones::{DonchianChannel, SessionZones, SweepTolerance, ZoneName, ZoneSide};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("symbol '{0}' is not registered with the signal runner")]
    UnknownSymbol(Symbol),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub capacity: usize,
    pub bar_interval_secs: u32,
    /// Buffered bars required before anything is scored.
    pub min_history: usize,
    pub trade_threshold: f64,
    pub watchlist_threshold: f64,
    pub sweep_zone: ZoneName,
    pub tick_size: f64,
    pub tolerance_ticks: u32,
    pub donchian_period: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            capacity: 500,
            bar_interval_secs: 60,
            min_history: 100,
            trade_threshold: 5.0,
            watchlist_threshold: 3.5,
            sweep_zone: ZoneName::LondonLow,
            tick_size: 0.25,
            tolerance_ticks: 4,
            donchian_period: 20,
        }
    }
}

impl StreamConfig {
    pub fn sweep_tolerance(&self) -> SweepTolerance {
        SweepTolerance {
            tick_size: self.tick_size,
            ticks: self.tolerance_ticks,
        }
    }

    pub fn tier(&self, score: f64) -> SignalTier {
        if score >= self.trade_threshold {
            SignalTier::TradeSignal
        } else if score >= self.watchlist_threshold {
            SignalTier::WatchList
        } else {
            SignalTier::Informational
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalTier {
    TradeSignal,
    WatchList,
    Informational,
}

impl fmt::Display for SignalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalTier::TradeSignal => write!(f, "TRADE SIGNAL"),
            SignalTier::WatchList => write!(f, "WATCHLIST"),
            SignalTier::Informational => write!(f, "INFO"),
        }
    }
}

/// One scored update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub timestamp: NaiveDateTime,
    pub score: f64,
    pub price_used: f64,
    pub breakdown: ScoreBreakdown,
    pub tier: SignalTier,
}

#[derive(Debug, Clone)]
pub struct StreamingEvaluator {
    config: StreamConfig,
    buffer: PriceBuffer,
    evaluator: SignalEvaluator,
    donchian: DonchianChannel,
}

impl StreamingEvaluator {
    pub fn new(config: StreamConfig, inputs: ConfirmationInputs) -> Self {
        Self {
            buffer: PriceBuffer::new(config.capacity, config.bar_interval_secs),
            evaluator: SignalEvaluator::new(inputs),
            donchian: DonchianChannel::new(config.donchian_period),
            config,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn buffer(&self) -> &PriceBuffer {
        &self.buffer
    }

    /// Replace the externally computed confirmations.
    pub fn set_inputs(&mut self, inputs: ConfirmationInputs) {
        self.evaluator = SignalEvaluator::new(inputs);
    }

    /// Ingest a finished bar and score it at its close.
    pub fn on_bar(&mut self, bar: PriceBar) -> Result<Option<SignalRecord>, StreamError> {
        let (price, anchor) = (bar.close, bar.timestamp);
        self.buffer.push_bar(bar)?;
        Ok(self.evaluate(price, anchor))
    }

    /// Ingest a tick and score it at its reference price.
    pub fn on_tick(&mut self, tick: &Tick) -> Result<Option<SignalRecord>, StreamError> {
        if !self.buffer.update_from_tick(tick)? {
            return Ok(None);
        }
        match tick.reference_price() {
            Some(price) => Ok(self.evaluate(price, tick.timestamp)),
            None => Ok(None),
        }
    }

    /// Session zones exclude the current bar, the Donchian range does not.
    /// On `on_bar` the price is the bar's own close, which never lies outside
    /// a range containing that bar, so Donchian points only come from ticks
    /// whose reference price leaves the working bar's range.
    fn evaluate(&self, price: f64, anchor: NaiveDateTime) -> Option<SignalRecord> {
        if self.buffer.len() < self.config.min_history.max(1) || !price.is_finite() {
            return None;
        }
        let bars = self.buffer.bars();
        let (current, prior) = bars.split_last()?;

        let zone = self.config.sweep_zone;
        let zones = SessionZones::compute(prior, anchor);
        let probe = match zone.side() {
            ZoneSide::Low => current.low,
            ZoneSide::High => current.high,
        };
        let swept = zones.detect_sweep(probe, zone, self.config.sweep_tolerance());
        let sweep_confirmed = swept && zones.is_sweep_confirmed(price, zone);

        let evaluation = self.evaluator.evaluate(&MarketState {
            price,
            donchian: self.donchian.range(&bars),
            swept,
            sweep_confirmed,
        });
        let tier = self.config.tier(evaluation.score);

        match tier {
            SignalTier::Informational => log::debug!(
                "TQS {:.2} | price {price} | {}",
                evaluation.score,
                evaluation.breakdown
            ),
            _ => log::info!(
                "{tier} TQS {:.2} | price {price} | {}",
                evaluation.score,
                evaluation.breakdown
            ),
        }

        Some(SignalRecord {
            timestamp: anchor,
            score: evaluation.score,
            price_used: evaluation.price_used,
            breakdown: evaluation.breakdown,
            tier,
        })
    }
}

/// Run the evaluator over a finished series, one record per bar once
/// `min_history` bars are buffered.
pub fn replay_bars(
    bars: &[PriceBar],
    config: &StreamConfig,
    inputs: ConfirmationInputs,
) -> Result<Vec<SignalRecord>, StreamError> {
    let mut evaluator = StreamingEvaluator::new(config.clone(), inputs);
    let mut records = Vec::with_capacity(bars.len().saturating_sub(config.min_history));
    for bar in bars {
        if let Some(record) = evaluator.on_bar(bar.clone())? {
            records.push(record);
        }
    }
    Ok(records)
}

/// One evaluator per symbol; feeds never share a buffer.
#[derive(Debug, Clone, Default)]
pub struct SignalRunner {
    config: StreamConfig,
    evaluators: HashMap<Symbol, StreamingEvaluator>,
}

impl SignalRunner {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            evaluators: HashMap::new(),
        }
    }

    /// Register a symbol; re-registering replaces its inputs but keeps its
    /// buffered history.
    pub fn register(&mut self, symbol: impl Into<Symbol>, inputs: ConfirmationInputs) {
        let config = &self.config;
        self.evaluators
            .entry(symbol.into())
            .and_modify(|e| e.set_inputs(inputs))
            .or_insert_with(|| StreamingEvaluator::new(config.clone(), inputs));
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.evaluators.keys()
    }

    fn evaluator_mut(&mut self, symbol: &str) -> Result<&mut StreamingEvaluator, StreamError> {
        self.evaluators
            .get_mut(symbol)
            .ok_or_else(|| StreamError::UnknownSymbol(symbol.to_string()))
    }

    pub fn on_tick(&mut self, symbol: &str, tick: &Tick) -> Result<Option<SignalRecord>, StreamError> {
        self.evaluator_mut(symbol)?.on_tick(tick)
    }

    pub fn on_bar(&mut self, symbol: &str, bar: PriceBar) -> Result<Option<SignalRecord>, StreamError> {
        self.evaluator_mut(symbol)?.on_bar(bar)
    }
}

impl Default for StreamingEvaluator {
    fn default() -> Self {
        Self::new(StreamConfig::default(), ConfirmationInputs::default())
    }
}
