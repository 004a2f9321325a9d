//! Headline sentiment: polarity classification, the nearest-timestamp join
//! onto the price timeline, and directional bias.

use crate::domain::{Direction, SentimentPoint, SentimentScore};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Polarity above this is bullish, below its negation bearish.
pub const POLARITY_THRESHOLD: f64 = 0.05;

/// Maps headline text to a polarity in roughly `[-1, 1]`.
///
/// Implemented for any `Fn(&str) -> f64`, so a closure or a lexicon lookup
/// can stand in for an NLP model.
pub trait PolarityClassifier {
    fn polarity(&self, text: &str) -> f64;
}

impl<F> PolarityClassifier for F
where
    F: Fn(&str) -> f64,
{
    fn polarity(&self, text: &str) -> f64 {
        self(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub timestamp: NaiveDateTime,
    pub title: String,
}

pub fn classify_polarity(polarity: f64) -> SentimentScore {
    if polarity > POLARITY_THRESHOLD {
        SentimentScore::Bullish
    } else if polarity < -POLARITY_THRESHOLD {
        SentimentScore::Bearish
    } else {
        SentimentScore::Neutral
    }
}

/// Discrete sentiment per headline. Blank titles are neutral and never
/// reach the classifier.
pub fn score_headlines<C>(headlines: &[Headline], classifier: &C) -> Vec<SentimentPoint>
where
    C: PolarityClassifier + ?Sized,
{
    if headlines.is_empty() {
        log::warn!("no headlines provided for sentiment scoring");
        return Vec::new();
    }

    let points: Vec<SentimentPoint> = headlines
        .iter()
        .map(|h| {
            let title = h.title.trim();
            let score = if title.is_empty() {
                SentimentScore::Neutral
            } else {
                classify_polarity(classifier.polarity(title))
            };
            SentimentPoint {
                timestamp: h.timestamp,
                score,
            }
        })
        .collect();

    log::info!("scored sentiment for {} headline(s)", points.len());
    points
}

/// Sentiment points sorted by time, queried by nearest timestamp.
#[derive(Debug, Clone, Default)]
pub struct SentimentTimeline {
    points: Vec<SentimentPoint>,
}

impl SentimentTimeline {
    pub fn new(points: &[SentimentPoint]) -> Self {
        let mut points = points.to_vec();
        points.sort_by_key(|p| p.timestamp);
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Point closest to `at` within `tolerance`; on a tie the earlier point.
    pub fn nearest(&self, at: NaiveDateTime, tolerance: Duration) -> Option<&SentimentPoint> {
        let split = self.points.partition_point(|p| p.timestamp < at);
        let before = split.checked_sub(1).and_then(|i| self.points.get(i));
        let after = self.points.get(split);

        let best = match (before, after) {
            (Some(b), Some(a)) => match (at - b.timestamp).cmp(&(a.timestamp - at)) {
                Ordering::Greater => a,
                _ => b,
            },
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => return None,
        };

        let distance = if best.timestamp >= at {
            best.timestamp - at
        } else {
            at - best.timestamp
        };
        (distance <= tolerance).then_some(best)
    }

    /// Joined score at `at`; neutral when nothing is within tolerance.
    pub fn score_at(&self, at: NaiveDateTime, tolerance: Duration) -> SentimentScore {
        self.nearest(at, tolerance)
            .map_or(SentimentScore::Neutral, |p| p.score)
    }

    pub fn points(&self) -> &[SentimentPoint] {
        &self.points
    }
}

/// Net bias of a set of readings: the majority of bullish vs. bearish,
/// `None` when they balance.
pub fn bias_direction(points: &[SentimentPoint]) -> Option<Direction> {
    let bullish = points.iter().filter(|p| p.score == SentimentScore::Bullish).count();
    let bearish = points.iter().filter(|p| p.score == SentimentScore::Bearish).count();
    match bullish.cmp(&bearish) {
        Ordering::Greater => Some(Direction::Long),
        Ordering::Less => Some(Direction::Short),
        Ordering::Equal => None,
    }
}

/// Bias confirmation input: the headlines lean the same way as the trade.
pub fn bias_aligned(direction: Direction, points: &[SentimentPoint]) -> bool {
    bias_direction(points) == Some(direction)
}
