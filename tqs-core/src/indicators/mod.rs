//! Indicator implementations and the per-bar snapshot pipeline.
//!
//! Every indicator is a pure function from a bar series to a numeric series
//! of the same length. Values before an indicator's window is filled are
//! `f64::NAN`; the pipeline turns them (and any other non-finite value) into
//! `None` so nothing downstream can mistake "not enough history" for zero.

pub mod ema;
pub mod macd;
pub mod pipeline;
pub mod rsi;
pub mod rvol;
pub mod sma;

pub use ema::Ema;
pub use macd::{Macd, MacdBand};
pub use pipeline::{IndicatorConfig, IndicatorFrame, IndicatorSnapshot, VolumeRegime};
pub use rsi::Rsi;
pub use rvol::{AverageVolume, RelativeVolume};
pub use sma::Sma;

use crate::domain::PriceBar;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_5", "rsi_14").
    fn name(&self) -> &str;

    /// Index of the first bar at which the output is exposed.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`; the first
    /// `lookback()` values are `f64::NAN`.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Blank out everything before `lookback`.
pub(crate) fn mask_warmup(values: &mut [f64], lookback: usize) {
    for v in values.iter_mut().take(lookback) {
        *v = f64::NAN;
    }
}

/// Create synthetic one-minute bars from close prices for testing.
///
/// open = prev_close (or close for first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar::new(
                base + chrono::Duration::minutes(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    /// Truncated-vs-full test: the value at bar t is the same whether or not
    /// bars after t exist.
    #[test]
    fn no_indicator_looks_ahead() {
        let closes: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
            .collect();
        let mut bars = make_bars(&closes);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.volume = 1000.0 + (i % 7) as f64 * 150.0;
        }

        for indicator in IndicatorConfig::default().indicators() {
            let full = indicator.compute(&bars);
            for cut in [10usize, 30, 45, 79] {
                let truncated = indicator.compute(&bars[..cut]);
                for t in 0..cut {
                    let (a, b) = (full[t], truncated[t]);
                    assert!(
                        (a.is_nan() && b.is_nan()) || (a - b).abs() < DEFAULT_EPSILON,
                        "{} differs at bar {t} when truncated at {cut}: {a} vs {b}",
                        indicator.name()
                    );
                }
            }
        }
    }

    #[test]
    fn mask_warmup_blanks_prefix() {
        let mut values = vec![1.0, 2.0, 3.0];
        mask_warmup(&mut values, 2);
        assert!(values[0].is_nan() && values[1].is_nan());
        assert_eq!(values[2], 3.0);
    }
}
