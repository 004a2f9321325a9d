//! Indicator precomputation: one snapshot per bar.
//!
//! All indicators are computed once over the whole series before any bar is
//! scored. A field is `Some` only from the bar at which its rolling window
//! is filled; non-finite results are `None` as well.

use super::{AverageVolume, Indicator, Macd, RelativeVolume, Rsi, Sma};
use crate::clean::DUMMY_VOLUME;
use crate::domain::{Direction, PriceBar};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rvol_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub sma_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rvol_period: 20,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            sma_period: 5,
        }
    }
}

impl IndicatorConfig {
    /// The full indicator set, in snapshot field order.
    pub fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(AverageVolume::new(self.rvol_period)),
            Box::new(RelativeVolume::new(self.rvol_period)),
            Box::new(Macd::line(self.macd_fast, self.macd_slow, self.macd_signal)),
            Box::new(Macd::signal(self.macd_fast, self.macd_slow, self.macd_signal)),
            Box::new(Rsi::new(self.rsi_period)),
            Box::new(Sma::new(self.sma_period)),
        ]
    }

    /// Number of bars after which every snapshot field can be available.
    ///
    /// With the defaults this is 34, set by the MACD signal line.
    pub fn warmup_bars(&self) -> usize {
        self.indicators()
            .iter()
            .map(|i| i.lookback() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Whether the volume feeding RVOL is real.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeRegime {
    Observed,
    /// No bar carried usable volume; RVOL was computed over the dummy
    /// constant and means "no market data", not "quiet market".
    Dummy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub avg_vol: Option<f64>,
    pub rvol: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub rsi: Option<f64>,
    pub sma: Option<f64>,
}

impl IndicatorSnapshot {
    /// MACD line on the trade's side of its signal line.
    pub fn macd_aligned(&self, direction: Direction) -> bool {
        match (self.macd_line, self.macd_signal) {
            (Some(line), Some(signal)) => match direction {
                Direction::Long => line > signal,
                Direction::Short => line < signal,
            },
            _ => false,
        }
    }

    /// RSI above 50 for longs, below 50 for shorts.
    pub fn rsi_aligned(&self, direction: Direction) -> bool {
        match self.rsi {
            Some(rsi) => match direction {
                Direction::Long => rsi > 50.0,
                Direction::Short => rsi < 50.0,
            },
            None => false,
        }
    }

    pub fn rvol_at_least(&self, threshold: f64) -> bool {
        self.rvol.is_some_and(|r| r >= threshold)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    snapshots: Vec<IndicatorSnapshot>,
    volume_regime: VolumeRegime,
}

impl IndicatorFrame {
    pub fn compute(bars: &[PriceBar], config: &IndicatorConfig) -> Self {
        let volume_regime = detect_volume_regime(bars);

        let dummy_bars: Vec<PriceBar>;
        let volume_bars = match volume_regime {
            VolumeRegime::Observed => bars,
            VolumeRegime::Dummy => {
                log::warn!(
                    "volume absent or zero across {} bar(s); RVOL runs on dummy volume",
                    bars.len()
                );
                dummy_bars = bars
                    .iter()
                    .map(|b| PriceBar {
                        volume: DUMMY_VOLUME,
                        ..b.clone()
                    })
                    .collect();
                &dummy_bars
            }
        };

        let avg_vol = AverageVolume::new(config.rvol_period).compute(volume_bars);
        let rvol = RelativeVolume::new(config.rvol_period).compute(volume_bars);
        let macd_line =
            Macd::line(config.macd_fast, config.macd_slow, config.macd_signal).compute(bars);
        let macd_signal =
            Macd::signal(config.macd_fast, config.macd_slow, config.macd_signal).compute(bars);
        let rsi = Rsi::new(config.rsi_period).compute(bars);
        let sma = Sma::new(config.sma_period).compute(bars);

        let snapshots = (0..bars.len())
            .map(|i| IndicatorSnapshot {
                avg_vol: finite(avg_vol[i]),
                rvol: finite(rvol[i]),
                macd_line: finite(macd_line[i]),
                macd_signal: finite(macd_signal[i]),
                rsi: finite(rsi[i]),
                sma: finite(sma[i]),
            })
            .collect();

        Self {
            snapshots,
            volume_regime,
        }
    }

    pub fn get(&self, index: usize) -> Option<&IndicatorSnapshot> {
        self.snapshots.get(index)
    }

    pub fn snapshots(&self) -> &[IndicatorSnapshot] {
        &self.snapshots
    }

    pub fn volume_regime(&self) -> VolumeRegime {
        self.volume_regime
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

fn finite(v: f64) -> Option<f64> {
    Some(v).filter(|v| v.is_finite())
}

/// A series is on dummy volume when no bar carries a finite volume other than
/// zero or the cleaning substitute.
fn detect_volume_regime(bars: &[PriceBar]) -> VolumeRegime {
    let observed = |v: f64| v.is_finite() && v != 0.0 && v != DUMMY_VOLUME;
    if bars.is_empty() || bars.iter().any(|b| observed(b.volume)) {
        VolumeRegime::Observed
    } else {
        VolumeRegime::Dummy
    }
}
