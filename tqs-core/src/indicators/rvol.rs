//! Relative volume.
//!
//! avg_vol[t] = mean(volume[t-period+1..=t])
//! rvol[t]    = volume[t] / avg_vol[t]
//! Lookback: period - 1. A zero average gives a non-finite ratio, which the
//! pipeline reports as unavailable.

use super::sma::sma_of_series;
use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct AverageVolume {
    period: usize,
    name: String,
}

impl AverageVolume {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume period must be >= 1");
        Self {
            period,
            name: format!("avg_vol_{period}"),
        }
    }
}

impl Indicator for AverageVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        sma_of_series(&volumes, self.period)
    }
}

#[derive(Debug, Clone)]
pub struct RelativeVolume {
    average: AverageVolume,
    name: String,
}

impl RelativeVolume {
    pub fn new(period: usize) -> Self {
        Self {
            average: AverageVolume::new(period),
            name: format!("rvol_{period}"),
        }
    }
}

impl Indicator for RelativeVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.average.lookback()
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        self.average
            .compute(bars)
            .into_iter()
            .zip(bars)
            .map(|(avg, bar)| bar.volume / avg)
            .collect()
    }
}
