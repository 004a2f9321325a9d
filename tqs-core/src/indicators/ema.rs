//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (span + 1)
//! Seed: EMA[0] = x[0] (the recursion starts at the first value).
//! Lookback: span - 1. Earlier values are computed but not exposed.

use super::{mask_warmup, Indicator};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            name: format!("ema_{span}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.span.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let mut result = ema_of_series(&closes, self.span);
        mask_warmup(&mut result, self.lookback());
        result
    }
}

/// Unmasked EMA of an arbitrary series, seeded by its first finite value.
///
/// A non-finite input yields `NaN` at that position and leaves the running
/// average untouched, so the recursion resumes on the next finite value.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;

    for (out, &v) in result.iter_mut().zip(values) {
        if !v.is_finite() {
            continue;
        }
        let ema = match prev {
            None => v,
            Some(p) => alpha * v + (1.0 - alpha) * p,
        };
        *out = ema;
        prev = Some(ema);
    }

    result
}
