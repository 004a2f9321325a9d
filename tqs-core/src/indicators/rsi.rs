//! Relative Strength Index (RSI) over a simple rolling window.
//!
//! avg_gain = mean(max(delta, 0)) and avg_loss = mean(max(-delta, 0)) over
//! the trailing `period` deltas; RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Lookback: period (the first bar has no delta).
//!
//! avg_loss == 0 with gains makes the ratio infinite and RSI saturates to
//! 100. A window with no movement at all is 0/0 and stays `NaN`.

use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period + 1 {
            return result;
        }

        // deltas[i] is close[i] - close[i-1]; deltas[0] has no predecessor.
        let mut deltas = vec![f64::NAN; n];
        for i in 1..n {
            deltas[i] = bars[i].close - bars[i - 1].close;
        }

        for i in self.period..n {
            let window = &deltas[(i + 1 - self.period)..=i];
            if window.iter().any(|d| d.is_nan()) {
                continue;
            }
            let gain: f64 = window.iter().map(|d| d.max(0.0)).sum::<f64>() / self.period as f64;
            let loss: f64 = window.iter().map(|d| (-d).max(0.0)).sum::<f64>() / self.period as f64;
            result[i] = 100.0 - 100.0 / (1.0 + gain / loss);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn rsi_all_gains_saturates() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = Rsi::new(3).compute(&bars);
        assert!(result[2].is_nan());
        for v in &result[3..] {
            assert_approx(*v, 100.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rsi_all_losses() {
        let bars = make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_rolling_known_value() {
        // Changes: +0.34, -0.25, -0.48, +0.72
        // Window at 3: gains 0.34, losses 0.73 → 100 - 100 / (1 + 0.34/0.73)
        // Window at 4: gains 0.72, losses 0.73 (the +0.34 rolled out)
        let bars = make_bars(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        let result = Rsi::new(3).compute(&bars);

        assert!(result[2].is_nan());
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);
        assert_approx(result[4], 100.0 - 100.0 / (1.0 + 0.72 / 0.73), 1e-9);
    }

    #[test]
    fn rsi_flat_window_is_unavailable() {
        let bars = make_bars(&[100.0; 6]);
        let result = Rsi::new(3).compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_bounds() {
        let bars = make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let result = Rsi::new(3).compute(&bars);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!(
                    (0.0..=100.0).contains(&v),
                    "RSI out of bounds at bar {i}: {v}"
                );
            }
        }
    }

    #[test]
    fn rsi_void_close_blanks_its_windows() {
        let mut bars = make_bars(&[100.0, 101.0, 99.0, 103.0, 102.0, 104.0, 103.0, 105.0]);
        bars[2].close = f64::NAN;
        let result = Rsi::new(3).compute(&bars);
        // Deltas 2 and 3 are NaN; windows ending at 3, 4, 5 include one.
        assert!(result[3].is_nan());
        assert!(result[5].is_nan());
        assert!(!result[6].is_nan());
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
