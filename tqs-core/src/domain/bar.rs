//! PriceBar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV bar at a naive (timezone-free, UTC by convention) timestamp.
///
/// A price field the source did not deliver is `f64::NAN` ("void"), never
/// zero. Volume is always a number: the cleaning step fills it with the
/// dummy constant when it is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Single-price bar (open = high = low = close). Used to seed a working
    /// bar from the first tick of a bucket.
    pub fn flat(timestamp: NaiveDateTime, price: f64, volume: f64) -> Self {
        Self::new(timestamp, price, price, price, price, volume)
    }

    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// Fold a new trade price into the bar: running extremes, latest close.
    pub fn absorb(&mut self, price: f64) {
        if self.open.is_nan() {
            self.open = price;
        }
        self.high = if self.high.is_nan() { price } else { self.high.max(price) };
        self.low = if self.low.is_nan() { price } else { self.low.min(price) };
        self.close = price;
    }
}

/// Pre-cleaning bar record as delivered by an external source.
///
/// Every field is optional; `crate::clean::clean_bars` applies the fill
/// policy and produces `PriceBar`s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub timestamp: Option<NaiveDateTime>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}
