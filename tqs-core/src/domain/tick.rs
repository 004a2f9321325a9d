//! Quote tick from a live feed.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub timestamp: NaiveDateTime,
    pub last: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
}

impl Tick {
    pub fn last(timestamp: NaiveDateTime, price: f64) -> Self {
        Self {
            timestamp,
            last: Some(price),
            bid: None,
            ask: None,
        }
    }

    /// Price used for scoring: bid/ask midpoint when both sides are quoted,
    /// otherwise the last trade.
    pub fn reference_price(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) if bid.is_finite() && ask.is_finite() => Some((bid + ask) / 2.0),
            _ => self.last.filter(|p| p.is_finite()),
        }
    }

    /// Price folded into the working bar: the last trade, falling back to the
    /// quote midpoint for quote-only ticks.
    pub fn trade_price(&self) -> Option<f64> {
        self.last
            .filter(|p| p.is_finite())
            .or_else(|| self.reference_price())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    #[test]
    fn reference_prefers_midpoint() {
        let tick = Tick {
            timestamp: ts(),
            last: Some(100.0),
            bid: Some(99.5),
            ask: Some(100.5),
        };
        assert_eq!(tick.reference_price(), Some(100.0));
        let tick = Tick {
            bid: Some(99.0),
            ask: Some(100.0),
            ..tick
        };
        assert_eq!(tick.reference_price(), Some(99.5));
        assert_eq!(tick.trade_price(), Some(100.0));
    }

    #[test]
    fn reference_falls_back_to_last() {
        let tick = Tick {
            timestamp: ts(),
            last: Some(101.25),
            bid: Some(101.0),
            ask: None,
        };
        assert_eq!(tick.reference_price(), Some(101.25));
    }

    #[test]
    fn empty_tick_has_no_price() {
        let tick = Tick {
            timestamp: ts(),
            last: None,
            bid: None,
            ask: Some(5.0),
        };
        assert_eq!(tick.reference_price(), None);
        assert_eq!(tick.trade_price(), None);
    }
}
