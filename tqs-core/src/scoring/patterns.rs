//! Raw-price pattern rules and confirmations for the historical scan.
//!
//! Every rule looks at an explicit trailing slice ending at the bar under
//! evaluation: `history[i]` is that bar, `history[i - k]` the bar k steps
//! back. Nothing after `i` is visible.

use super::accumulator::{ScoreAccumulator, ScoreReason, RVOL_THRESHOLD};
use crate::domain::{Direction, PriceBar, SentimentScore};
use crate::indicators::IndicatorSnapshot;

/// Bounce tolerance as a fraction of the close.
const BOUNCE_TOLERANCE: f64 = 0.002;
/// Bars in the bounce extreme window, the current bar included.
const BOUNCE_WINDOW: usize = 6;

/// Award the price-pattern items for the last bar of `history`.
pub fn score_patterns(history: &[PriceBar], acc: &mut ScoreAccumulator) {
    let Some(i) = history.len().checked_sub(1) else {
        return;
    };
    let bar = &history[i];

    if i >= 2 {
        let prev = &history[i - 1];
        acc.award_if(
            bar.close > prev.high || bar.close < prev.low,
            ScoreReason::PriorBarBreakout,
        );
    }

    if i >= BOUNCE_WINDOW {
        let window = &history[i + 1 - BOUNCE_WINDOW..=i];
        let recent_low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let recent_high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let tolerance = bar.close * BOUNCE_TOLERANCE;
        acc.award_if(
            (bar.low - recent_low).abs() < tolerance || (bar.high - recent_high).abs() < tolerance,
            ScoreReason::LevelBounce,
        );
    }

    if i >= 4 {
        let (prev, prev2) = (&history[i - 1], &history[i - 2]);
        let bullish = bar.high > prev.high && prev.low > prev2.low;
        let bearish = bar.low < prev.low && prev.high < prev2.high;
        acc.award_if(bullish || bearish, ScoreReason::BreakOfStructure);
    }

    if i >= 3 {
        let prev = &history[i - 1];
        let bull_trap = bar.high > prev.high && bar.close < prev.close;
        let bear_trap = bar.low < prev.low && bar.close > prev.close;
        acc.award_if(bull_trap || bear_trap, ScoreReason::Fakeout);
    }
}

/// Indicator confirmations relative to the trade direction. Unavailable
/// fields award nothing.
pub fn score_confirmation(
    snapshot: &IndicatorSnapshot,
    direction: Direction,
    acc: &mut ScoreAccumulator,
) {
    acc.award_if(snapshot.rvol_at_least(RVOL_THRESHOLD), ScoreReason::HighRelativeVolume);
    acc.award_if(snapshot.macd_aligned(direction), ScoreReason::MacdAligned);
    acc.award_if(snapshot.rsi_aligned(direction), ScoreReason::RsiAligned);
}

/// +1 for bullish, -1 for bearish, nothing for neutral.
pub fn score_sentiment(sentiment: SentimentScore, acc: &mut ScoreAccumulator) {
    match sentiment {
        SentimentScore::Bullish => acc.award(ScoreReason::SentimentBullish),
        SentimentScore::Bearish => acc.award(ScoreReason::SentimentBearish),
        SentimentScore::Neutral => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars(data: &[(f64, f64, f64)]) -> Vec<PriceBar> {
        let base = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| {
                PriceBar::new(
                    base + chrono::Duration::minutes(i as i64),
                    close,
                    high,
                    low,
                    close,
                    1.0,
                )
            })
            .collect()
    }

    fn patterns(history: &[PriceBar]) -> Vec<ScoreReason> {
        let mut acc = ScoreAccumulator::new();
        score_patterns(history, &mut acc);
        acc.finish().items().iter().map(|i| i.reason).collect()
    }

    #[test]
    fn too_short_history_scores_nothing() {
        assert!(patterns(&[]).is_empty());
        let h = bars(&[(10.0, 9.0, 9.5), (20.0, 1.0, 30.0)]);
        assert!(patterns(&h).is_empty());
    }

    #[test]
    fn breakout_needs_two_prior_bars() {
        let h = bars(&[(10.0, 9.0, 9.5), (10.0, 9.0, 9.5), (12.0, 9.5, 11.0)]);
        assert_eq!(patterns(&h), vec![ScoreReason::PriorBarBreakout]);
    }

    #[test]
    fn fakeout_after_three_bars() {
        // Higher high but a lower close than the prior bar.
        let h = bars(&[
            (10.0, 9.0, 9.5),
            (10.0, 9.0, 9.5),
            (10.0, 9.0, 9.8),
            (10.5, 9.2, 9.6),
        ]);
        assert_eq!(patterns(&h), vec![ScoreReason::Fakeout]);
    }

    #[test]
    fn break_of_structure_and_breakout() {
        // Rising lows then a higher high closing above the prior high.
        let h = bars(&[
            (10.0, 8.0, 9.0),
            (10.0, 8.0, 9.0),
            (10.0, 8.0, 9.0),
            (10.0, 8.5, 9.0),
            (11.0, 9.0, 10.9),
        ]);
        let reasons = patterns(&h);
        assert!(reasons.contains(&ScoreReason::PriorBarBreakout));
        assert!(reasons.contains(&ScoreReason::BreakOfStructure));
        assert!(!reasons.contains(&ScoreReason::Fakeout));
    }

    #[test]
    fn bounce_off_recent_low() {
        let mut data = vec![(101.0, 100.0, 100.5); 6];
        data.push((100.6, 99.0, 100.4));
        // The current bar makes the window low itself.
        let reasons = patterns(&bars(&data));
        assert!(reasons.contains(&ScoreReason::LevelBounce));
    }

    #[test]
    fn void_bar_scores_nothing() {
        let mut h = bars(&[(10.0, 9.0, 9.5); 8]);
        let last = h.len() - 1;
        h[last].high = f64::NAN;
        h[last].low = f64::NAN;
        h[last].close = f64::NAN;
        assert!(patterns(&h).is_empty());
    }

    #[test]
    fn sentiment_adjustment() {
        let mut acc = ScoreAccumulator::new();
        score_sentiment(SentimentScore::Bearish, &mut acc);
        score_sentiment(SentimentScore::Neutral, &mut acc);
        assert_eq!(acc.score(), -1.0);
    }

    #[test]
    fn confirmation_respects_direction() {
        let snap = IndicatorSnapshot {
            rvol: Some(2.0),
            macd_line: Some(-1.0),
            macd_signal: Some(0.0),
            rsi: Some(40.0),
            ..IndicatorSnapshot::default()
        };
        let mut long = ScoreAccumulator::new();
        score_confirmation(&snap, Direction::Long, &mut long);
        assert_eq!(long.score(), 1.0);
        let mut short = ScoreAccumulator::new();
        score_confirmation(&snap, Direction::Short, &mut short);
        assert_eq!(short.score(), 2.0);
    }
}
