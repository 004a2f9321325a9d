//! Weighted evidence accumulation.
//!
//! Every award is a `ScoreReason` with a fixed weight. The score is always
//! the sum of the recorded items, so the breakdown can never disagree with
//! the total.

use serde::{Deserialize, Serialize};
use std::fmt;

/// RVOL at or above this counts as high participation.
pub const RVOL_THRESHOLD: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreReason {
    // Streaming evaluator
    SweepConfirmed,
    SweepUnconfirmed,
    DonchianBreakout,
    DonchianBreakdown,
    PositiveExpectedValue,
    HighRelativeVolume,
    MacdAligned,
    RsiAligned,
    BiasAligned,
    VolatilityRegime,
    // Historical pattern rules
    PriorBarBreakout,
    LevelBounce,
    BreakOfStructure,
    Fakeout,
    // Sentiment adjustment
    SentimentBullish,
    SentimentBearish,
}

impl ScoreReason {
    pub fn points(&self) -> f64 {
        match self {
            ScoreReason::SweepConfirmed => 1.5,
            ScoreReason::SweepUnconfirmed => 0.5,
            ScoreReason::DonchianBreakout | ScoreReason::DonchianBreakdown => 1.0,
            ScoreReason::PositiveExpectedValue => 1.0,
            ScoreReason::HighRelativeVolume => 1.0,
            ScoreReason::MacdAligned => 0.5,
            ScoreReason::RsiAligned => 0.5,
            ScoreReason::BiasAligned => 1.0,
            ScoreReason::VolatilityRegime => 1.0,
            ScoreReason::PriorBarBreakout => 1.0,
            ScoreReason::LevelBounce => 1.0,
            ScoreReason::BreakOfStructure => 2.0,
            ScoreReason::Fakeout => 1.5,
            ScoreReason::SentimentBullish => 1.0,
            ScoreReason::SentimentBearish => -1.0,
        }
    }
}

impl fmt::Display for ScoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ScoreReason::SweepConfirmed => "Liquidity sweep confirmed",
            ScoreReason::SweepUnconfirmed => "Potential sweep (unconfirmed)",
            ScoreReason::DonchianBreakout => "Breakout above Donchian high",
            ScoreReason::DonchianBreakdown => "Breakdown below Donchian low",
            ScoreReason::PositiveExpectedValue => "Expected value > 0",
            ScoreReason::HighRelativeVolume => "RVOL >= 1.5",
            ScoreReason::MacdAligned => "MACD aligned",
            ScoreReason::RsiAligned => "RSI aligned",
            ScoreReason::BiasAligned => "Directional bias aligned",
            ScoreReason::VolatilityRegime => "Correct VIX regime",
            ScoreReason::PriorBarBreakout => "Close beyond prior bar range",
            ScoreReason::LevelBounce => "Bounce off 5-bar extreme",
            ScoreReason::BreakOfStructure => "Break of structure",
            ScoreReason::Fakeout => "Sweep/fakeout pattern",
            ScoreReason::SentimentBullish => "Bullish sentiment",
            ScoreReason::SentimentBearish => "Bearish sentiment",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreItem {
    pub points: f64,
    pub reason: ScoreReason,
}

impl fmt::Display for ScoreItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}: {}", self.points, self.reason)
    }
}

/// Ordered list of awarded items.
///
/// Displays as `"1.5: Liquidity sweep confirmed; 1.0: RVOL >= 1.5"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreBreakdown {
    items: Vec<ScoreItem>,
}

impl ScoreBreakdown {
    pub fn score(&self) -> f64 {
        self.items.iter().map(|i| i.points).sum()
    }

    pub fn items(&self) -> &[ScoreItem] {
        &self.items
    }

    pub fn contains(&self, reason: ScoreReason) -> bool {
        self.items.iter().any(|i| i.reason == reason)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for ScoreBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoreAccumulator {
    breakdown: ScoreBreakdown,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn award(&mut self, reason: ScoreReason) {
        self.breakdown.items.push(ScoreItem {
            points: reason.points(),
            reason,
        });
    }

    pub fn award_if(&mut self, condition: bool, reason: ScoreReason) {
        if condition {
            self.award(reason);
        }
    }

    pub fn score(&self) -> f64 {
        self.breakdown.score()
    }

    pub fn finish(self) -> ScoreBreakdown {
        self.breakdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_sum_of_items() {
        let mut acc = ScoreAccumulator::new();
        acc.award(ScoreReason::SweepConfirmed);
        acc.award(ScoreReason::MacdAligned);
        acc.award(ScoreReason::SentimentBearish);
        acc.award_if(false, ScoreReason::BiasAligned);
        assert_eq!(acc.score(), 1.0);
        let breakdown = acc.finish();
        assert_eq!(breakdown.len(), 3);
        assert!(!breakdown.contains(ScoreReason::BiasAligned));
    }

    #[test]
    fn breakdown_display() {
        let mut acc = ScoreAccumulator::new();
        acc.award(ScoreReason::SweepConfirmed);
        acc.award(ScoreReason::HighRelativeVolume);
        assert_eq!(
            acc.finish().to_string(),
            "1.5: Liquidity sweep confirmed; 1.0: RVOL >= 1.5"
        );
        assert_eq!(ScoreBreakdown::default().to_string(), "");
    }

    #[test]
    fn breakdown_serializes_as_list() {
        let mut acc = ScoreAccumulator::new();
        acc.award(ScoreReason::Fakeout);
        let json = serde_json::to_value(acc.finish()).unwrap();
        assert_eq!(json[0]["points"], 1.5);
        assert_eq!(json[0]["reason"], "fakeout");
    }
}
