//! Discrete sentiment readings on the price timeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Discrete headline sentiment: -1 bearish, 0 neutral, +1 bullish.
///
/// Serialized as the bare integer so sentiment files stay `{-1, 0, 1}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum SentimentScore {
    Bearish,
    #[default]
    Neutral,
    Bullish,
}

impl SentimentScore {
    /// Sign of a numeric reading (0 for zero and NaN).
    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            SentimentScore::Bullish
        } else if value < 0.0 {
            SentimentScore::Bearish
        } else {
            SentimentScore::Neutral
        }
    }

    pub fn value(self) -> i8 {
        match self {
            SentimentScore::Bearish => -1,
            SentimentScore::Neutral => 0,
            SentimentScore::Bullish => 1,
        }
    }

    pub fn is_bullish(self) -> bool {
        self == SentimentScore::Bullish
    }
}

impl From<SentimentScore> for i8 {
    fn from(score: SentimentScore) -> Self {
        score.value()
    }
}

impl TryFrom<i8> for SentimentScore {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(SentimentScore::Bearish),
            0 => Ok(SentimentScore::Neutral),
            1 => Ok(SentimentScore::Bullish),
            other => Err(format!("sentiment score must be -1, 0 or 1, got {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentPoint {
    pub timestamp: NaiveDateTime,
    pub score: SentimentScore,
}
