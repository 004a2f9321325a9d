//! Historical scan: score every bar past warm-up and emit trade candidates.
//!
//! Per bar:
//! 1. join sentiment (nearest point within tolerance, else neutral)
//! 2. pick a direction (sentiment sign, or close vs. SMA when technical-only)
//! 3. TQS = pattern items + indicator confirmations + sentiment adjustment
//! 4. TQS >= entry threshold → candidate; watch ≤ TQS < entry → watch list

pub mod simulate;

pub use simulate::{simulate_outcomes, SimulationConfig, SimulationOutcome};

use crate::domain::{Direction, PriceBar, SentimentPoint, SentimentScore, TradeCandidate};
use crate::indicators::{IndicatorConfig, IndicatorFrame, IndicatorSnapshot, VolumeRegime};
use crate::scoring::{
    score_confirmation, score_patterns, score_sentiment, ScoreAccumulator, ScoreBreakdown,
};
use crate::sentiment::SentimentTimeline;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub use_sentiment: bool,
    pub entry_threshold: f64,
    pub watchlist_threshold: f64,
    pub sentiment_tolerance_minutes: i64,
    pub indicators: IndicatorConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            use_sentiment: true,
            entry_threshold: 5.0,
            watchlist_threshold: 3.5,
            sentiment_tolerance_minutes: 30,
            indicators: IndicatorConfig::default(),
        }
    }
}

impl ScannerConfig {
    pub fn sentiment_tolerance(&self) -> Duration {
        Duration::minutes(self.sentiment_tolerance_minutes)
    }

    /// Copy with a different entry threshold (walk-forward candidates).
    pub fn with_entry_threshold(&self, threshold: f64) -> Self {
        Self {
            entry_threshold: threshold,
            ..self.clone()
        }
    }
}

/// Per-bar score trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredBar {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub sentiment: SentimentScore,
    pub direction: Direction,
    pub pattern_score: f64,
    pub confirmation_score: f64,
    pub sentiment_adjustment: f64,
    pub tqs: f64,
    pub breakdown: ScoreBreakdown,
}

impl ScoredBar {
    pub fn to_candidate(&self) -> TradeCandidate {
        TradeCandidate {
            timestamp: self.timestamp,
            score: self.tqs,
            sentiment: self.sentiment,
            direction: self.direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutput {
    pub candidates: Vec<TradeCandidate>,
    pub watchlist: Vec<TradeCandidate>,
    pub volume_regime: VolumeRegime,
    pub bars_scanned: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScannerConfig,
}

impl Scanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Index of the first scored bar: every indicator is available there.
    pub fn first_scored_index(&self) -> usize {
        self.config.indicators.warmup_bars().saturating_sub(1)
    }

    /// Score trace for every bar past warm-up.
    pub fn score_bars(&self, bars: &[PriceBar], sentiment: &[SentimentPoint]) -> Vec<ScoredBar> {
        self.run(bars, sentiment).0
    }

    pub fn scan(&self, bars: &[PriceBar], sentiment: &[SentimentPoint]) -> ScanOutput {
        let (scored, volume_regime) = self.run(bars, sentiment);
        let bars_scanned = scored.len();

        let mut candidates = Vec::new();
        let mut watchlist = Vec::new();
        for bar in &scored {
            if bar.tqs >= self.config.entry_threshold {
                candidates.push(bar.to_candidate());
            } else if bar.tqs >= self.config.watchlist_threshold {
                watchlist.push(bar.to_candidate());
            }
        }

        log::debug!(
            "scanned {bars_scanned} bar(s): {} candidate(s), {} on watch list (entry {:.2})",
            candidates.len(),
            watchlist.len(),
            self.config.entry_threshold
        );

        ScanOutput {
            candidates,
            watchlist,
            volume_regime,
            bars_scanned,
        }
    }

    fn run(&self, bars: &[PriceBar], sentiment: &[SentimentPoint]) -> (Vec<ScoredBar>, VolumeRegime) {
        let frame = IndicatorFrame::compute(bars, &self.config.indicators);

        let timeline = if self.config.use_sentiment {
            if sentiment.is_empty() && !bars.is_empty() {
                log::warn!("sentiment enabled but no sentiment points given; all bars neutral");
            }
            SentimentTimeline::new(sentiment)
        } else {
            SentimentTimeline::default()
        };
        let tolerance = self.config.sentiment_tolerance();

        let scored = frame
            .snapshots()
            .iter()
            .enumerate()
            .skip(self.first_scored_index())
            .map(|(i, snapshot)| {
                let bar = &bars[i];
                let sentiment = timeline.score_at(bar.timestamp, tolerance);
                self.score_bar(&bars[..=i], snapshot, sentiment)
            })
            .collect();

        (scored, frame.volume_regime())
    }

    fn direction(&self, bar: &PriceBar, snapshot: &IndicatorSnapshot, sentiment: SentimentScore) -> Direction {
        let long = if self.config.use_sentiment {
            sentiment.is_bullish()
        } else {
            snapshot.sma.is_some_and(|sma| bar.close > sma)
        };
        if long {
            Direction::Long
        } else {
            Direction::Short
        }
    }

    /// Score the last bar of `history`.
    fn score_bar(
        &self,
        history: &[PriceBar],
        snapshot: &IndicatorSnapshot,
        sentiment: SentimentScore,
    ) -> ScoredBar {
        let index = history.len() - 1;
        let bar = &history[index];
        let direction = self.direction(bar, snapshot, sentiment);

        let mut acc = ScoreAccumulator::new();
        score_patterns(history, &mut acc);
        let pattern_score = acc.score();

        score_confirmation(snapshot, direction, &mut acc);
        let confirmation_score = acc.score() - pattern_score;

        if self.config.use_sentiment {
            score_sentiment(sentiment, &mut acc);
        }
        let breakdown = acc.finish();
        let tqs = breakdown.score();

        ScoredBar {
            index,
            timestamp: bar.timestamp,
            close: bar.close,
            sentiment,
            direction,
            pattern_score,
            confirmation_score,
            sentiment_adjustment: tqs - pattern_score - confirmation_score,
            tqs,
            breakdown,
        }
    }
}
