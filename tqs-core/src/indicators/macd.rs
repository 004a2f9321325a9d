//! Moving Average Convergence Divergence.
//!
//! line   = EMA(close, fast) - EMA(close, slow)
//! signal = EMA(line, signal)
//!
//! Both EMAs run from the first bar; exposure starts at `slow - 1` for the
//! line and `slow + signal - 2` for the signal. Exposed as two instances,
//! one per band.

use super::ema::ema_of_series;
use super::{mask_warmup, Indicator};
use crate::domain::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdBand {
    Line,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    band: MacdBand,
    name: String,
}

impl Macd {
    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::build(fast, slow, signal, MacdBand::Line, format!("macd_line_{fast}_{slow}"))
    }

    pub fn signal(fast: usize, slow: usize, signal: usize) -> Self {
        Self::build(
            fast,
            slow,
            signal,
            MacdBand::Signal,
            format!("macd_signal_{fast}_{slow}_{signal}"),
        )
    }

    fn build(fast: usize, slow: usize, signal: usize, band: MacdBand, name: String) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD spans must be >= 1");
        assert!(fast < slow, "MACD fast span must be below the slow span");
        Self {
            fast,
            slow,
            signal,
            band,
            name,
        }
    }

    fn raw_line(&self, bars: &[PriceBar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);
        fast.iter().zip(&slow).map(|(f, s)| f - s).collect()
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.band {
            MacdBand::Line => self.slow - 1,
            MacdBand::Signal => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let line = self.raw_line(bars);
        let mut result = match self.band {
            MacdBand::Line => line,
            MacdBand::Signal => ema_of_series(&line, self.signal),
        };
        mask_warmup(&mut result, self.lookback());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn flat_series_has_zero_macd() {
        let bars = make_bars(&[50.0; 40]);
        let line = Macd::line(12, 26, 9).compute(&bars);
        let signal = Macd::signal(12, 26, 9).compute(&bars);
        assert!(line[24].is_nan());
        assert_approx(line[25], 0.0, DEFAULT_EPSILON);
        assert!(signal[32].is_nan());
        assert_approx(signal[33], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rising_series_has_positive_line() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let line = Macd::line(12, 26, 9).compute(&bars);
        let signal = Macd::signal(12, 26, 9).compute(&bars);
        assert!(line[39] > 0.0);
        // The signal lags a steadily widening line.
        assert!(line[39] > signal[39]);
    }

    #[test]
    fn small_spans_known_values() {
        // fast=1 tracks close exactly; slow=3 (alpha 0.5) seeded by 10.
        // slow ema: 10, 11, 12.5, 14.25; line: 0, 1, 1.5, 1.75
        let bars = make_bars(&[10.0, 12.0, 14.0, 16.0]);
        let line = Macd::line(1, 3, 2).compute(&bars);
        assert!(line[1].is_nan());
        assert_approx(line[2], 1.5, DEFAULT_EPSILON);
        assert_approx(line[3], 1.75, DEFAULT_EPSILON);

        // signal span 2 (alpha 2/3): 0, 2/3, 11/9, 85/54
        let signal = Macd::signal(1, 3, 2).compute(&bars);
        assert!(signal[2].is_nan());
        assert_approx(signal[3], 85.0 / 54.0, DEFAULT_EPSILON);
    }

    #[test]
    fn macd_lookbacks() {
        assert_eq!(Macd::line(12, 26, 9).lookback(), 25);
        assert_eq!(Macd::signal(12, 26, 9).lookback(), 33);
    }
}
