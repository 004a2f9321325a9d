//! Per-session liquidity zones and sweep tests.
//!
//! Sessions are UTC buckets on the anchor's calendar day:
//! - Asian  `[00:00, 08:00)`
//! - London `[08:00, 12:00)`
//! - NY     `[12:00, 18:30)`
//!
//! plus a rolling weekly window `[anchor - 5 days, anchor]`. The anchor is
//! the timestamp of the bar or tick under evaluation; bars after it are never
//! included.

use crate::domain::PriceBar;
use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZoneError {
    #[error("unknown zone '{0}' (expected one of asianLow, asianHigh, londonLow, londonHigh, nyLow, nyHigh, weeklyLow, weeklyHigh)")]
    UnknownZone(String),
}

/// Which extreme of a zone a sweep probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSide {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ZoneName {
    AsianLow,
    AsianHigh,
    LondonLow,
    LondonHigh,
    NyLow,
    NyHigh,
    WeeklyLow,
    WeeklyHigh,
}

impl ZoneName {
    pub const ALL: [ZoneName; 8] = [
        ZoneName::AsianLow,
        ZoneName::AsianHigh,
        ZoneName::LondonLow,
        ZoneName::LondonHigh,
        ZoneName::NyLow,
        ZoneName::NyHigh,
        ZoneName::WeeklyLow,
        ZoneName::WeeklyHigh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneName::AsianLow => "asianLow",
            ZoneName::AsianHigh => "asianHigh",
            ZoneName::LondonLow => "londonLow",
            ZoneName::LondonHigh => "londonHigh",
            ZoneName::NyLow => "nyLow",
            ZoneName::NyHigh => "nyHigh",
            ZoneName::WeeklyLow => "weeklyLow",
            ZoneName::WeeklyHigh => "weeklyHigh",
        }
    }

    pub fn side(&self) -> ZoneSide {
        match self {
            ZoneName::AsianLow | ZoneName::LondonLow | ZoneName::NyLow | ZoneName::WeeklyLow => {
                ZoneSide::Low
            }
            _ => ZoneSide::High,
        }
    }
}

impl fmt::Display for ZoneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneName {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ZoneName::ALL
            .into_iter()
            .find(|z| z.as_str() == s)
            .ok_or_else(|| ZoneError::UnknownZone(s.to_string()))
    }
}

impl TryFrom<String> for ZoneName {
    type Error = ZoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ZoneName> for String {
    fn from(zone: ZoneName) -> Self {
        zone.as_str().to_string()
    }
}

/// How far past a level a price may go and still count as a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepTolerance {
    pub tick_size: f64,
    pub ticks: u32,
}

impl Default for SweepTolerance {
    fn default() -> Self {
        Self {
            tick_size: 0.25,
            ticks: 4,
        }
    }
}

impl SweepTolerance {
    pub fn distance(&self) -> f64 {
        self.tick_size * self.ticks as f64
    }
}

/// Session extremes; `None` where no bar fell into the bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionZones {
    pub asian_low: Option<f64>,
    pub asian_high: Option<f64>,
    pub london_low: Option<f64>,
    pub london_high: Option<f64>,
    pub ny_low: Option<f64>,
    pub ny_high: Option<f64>,
    pub weekly_low: Option<f64>,
    pub weekly_high: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Extremes {
    low: Option<f64>,
    high: Option<f64>,
}

impl Extremes {
    fn absorb(&mut self, bar: &PriceBar) {
        if !bar.low.is_nan() {
            self.low = Some(self.low.map_or(bar.low, |l| l.min(bar.low)));
        }
        if !bar.high.is_nan() {
            self.high = Some(self.high.map_or(bar.high, |h| h.max(bar.high)));
        }
    }
}

impl SessionZones {
    /// Compute zones from `bars` relative to `anchor`.
    pub fn compute(bars: &[PriceBar], anchor: NaiveDateTime) -> Self {
        let day = anchor.date();
        let at = |h: u32, m: u32| {
            NaiveTime::from_hms_opt(h, m, 0).map(|t| day.and_time(t))
        };
        let (Some(asian_start), Some(london_start), Some(ny_start), Some(ny_end)) =
            (at(0, 0), at(8, 0), at(12, 0), at(18, 30))
        else {
            return Self::default();
        };
        let week_start = anchor - Duration::days(5);

        let mut asian = Extremes::default();
        let mut london = Extremes::default();
        let mut ny = Extremes::default();
        let mut weekly = Extremes::default();

        for bar in bars.iter().filter(|b| b.timestamp <= anchor) {
            let ts = bar.timestamp;
            if ts >= week_start {
                weekly.absorb(bar);
            }
            if ts >= asian_start && ts < london_start {
                asian.absorb(bar);
            } else if ts >= london_start && ts < ny_start {
                london.absorb(bar);
            } else if ts >= ny_start && ts < ny_end {
                ny.absorb(bar);
            }
        }

        Self {
            asian_low: asian.low,
            asian_high: asian.high,
            london_low: london.low,
            london_high: london.high,
            ny_low: ny.low,
            ny_high: ny.high,
            weekly_low: weekly.low,
            weekly_high: weekly.high,
        }
    }

    pub fn level(&self, zone: ZoneName) -> Option<f64> {
        match zone {
            ZoneName::AsianLow => self.asian_low,
            ZoneName::AsianHigh => self.asian_high,
            ZoneName::LondonLow => self.london_low,
            ZoneName::LondonHigh => self.london_high,
            ZoneName::NyLow => self.ny_low,
            ZoneName::NyHigh => self.ny_high,
            ZoneName::WeeklyLow => self.weekly_low,
            ZoneName::WeeklyHigh => self.weekly_high,
        }
    }

    /// Price breached the level in the sweep direction, by at most the
    /// tolerance distance. False when the zone is unavailable.
    pub fn detect_sweep(&self, price: f64, zone: ZoneName, tolerance: SweepTolerance) -> bool {
        let Some(level) = self.level(zone) else {
            return false;
        };
        let breached = match zone.side() {
            ZoneSide::Low => price < level,
            ZoneSide::High => price > level,
        };
        breached && (price - level).abs() <= tolerance.distance()
    }

    /// Price is back on the far side of the level: above a Low zone, below a
    /// High zone. Independent of tolerance.
    pub fn is_sweep_confirmed(&self, price: f64, zone: ZoneName) -> bool {
        let Some(level) = self.level(zone) else {
            return false;
        };
        match zone.side() {
            ZoneSide::Low => price > level,
            ZoneSide::High => price < level,
        }
    }
}
