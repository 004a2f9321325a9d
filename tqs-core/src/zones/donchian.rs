//! Donchian channel: highest high / lowest low over the trailing bars.
//!
//! Unlike a precomputed indicator series, the range is taken on demand over
//! whatever history exists: fewer than `period` bars means all of them.

use crate::domain::PriceBar;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DonchianRange {
    pub high: f64,
    pub low: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonchianChannel {
    period: usize,
}

impl Default for DonchianChannel {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl DonchianChannel {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Range over the last `period` bars of `bars`.
    ///
    /// `None` when there are no bars or every bar in the window is void.
    pub fn range(&self, bars: &[PriceBar]) -> Option<DonchianRange> {
        let start = bars.len().saturating_sub(self.period);
        extremes(&bars[start..])
    }

    /// Range over the `period` bars ending at `index` (inclusive).
    pub fn range_at(&self, bars: &[PriceBar], index: usize) -> Option<DonchianRange> {
        if index >= bars.len() {
            return None;
        }
        self.range(&bars[..=index])
    }
}

fn extremes(window: &[PriceBar]) -> Option<DonchianRange> {
    let high = window
        .iter()
        .map(|b| b.high)
        .filter(|h| !h.is_nan())
        .fold(None, |acc: Option<f64>, h| Some(acc.map_or(h, |a| a.max(h))))?;
    let low = window
        .iter()
        .map(|b| b.low)
        .filter(|l| !l.is_nan())
        .fold(None, |acc: Option<f64>, l| Some(acc.map_or(l, |a| a.min(l))))?;
    Some(DonchianRange { high, low })
}
