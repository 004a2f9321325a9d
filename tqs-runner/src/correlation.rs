//! Sentiment–price correlation.
//!
//! Each sentiment point is matched to the nearest bar within the tolerance;
//! its paired return is that bar's close to the next bar's close. The
//! correlation is Pearson's r between the scores and those returns. Every
//! failure mode (no sentiment, no matches, fewer than two pairs, zero
//! variance) yields `0.0` with a warning rather than an error.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use tqs_core::domain::{PriceBar, SentimentPoint};

/// One sentiment point joined to the price timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergedPoint {
    pub sentiment: SentimentPoint,
    pub bar_index: usize,
    pub close: f64,
    /// Close-to-close return into the next bar.
    pub next_return: f64,
}

/// Join sentiment points to `bars` (sorted) by nearest timestamp.
///
/// Points with no bar within `tolerance`, or whose bar has no successor
/// or a void close, are left out.
pub fn merge_nearest(
    sentiment: &[SentimentPoint],
    bars: &[PriceBar],
    tolerance: Duration,
) -> Vec<MergedPoint> {
    let mut sorted = sentiment.to_vec();
    sorted.sort_by_key(|p| p.timestamp);

    sorted
        .into_iter()
        .filter_map(|point| {
            let index = nearest_bar(bars, point, tolerance)?;
            let close = bars[index].close;
            let next = bars.get(index + 1)?.close;
            let next_return = next / close - 1.0;
            next_return.is_finite().then_some(MergedPoint {
                sentiment: point,
                bar_index: index,
                close,
                next_return,
            })
        })
        .collect()
}

fn nearest_bar(bars: &[PriceBar], point: SentimentPoint, tolerance: Duration) -> Option<usize> {
    let at = point.timestamp;
    let split = bars.partition_point(|b| b.timestamp < at);
    let before = split.checked_sub(1).map(|i| (i, at - bars[i].timestamp));
    let after = bars.get(split).map(|b| (split, b.timestamp - at));

    let best = match (before, after) {
        (Some(b), Some(a)) => {
            if a.1 < b.1 {
                a
            } else {
                b
            }
        }
        (Some(b), None) => b,
        (None, Some(a)) => a,
        (None, None) => return None,
    };
    (best.1 <= tolerance).then_some(best.0)
}

/// Pearson correlation between sentiment score and next-bar return, plus
/// the merged rows it was computed from.
pub fn correlate_sentiment_with_price(
    sentiment: &[SentimentPoint],
    bars: &[PriceBar],
    tolerance: Duration,
) -> (f64, Vec<MergedPoint>) {
    if sentiment.is_empty() {
        log::warn!("no sentiment data provided for correlation");
        return (0.0, Vec::new());
    }

    let merged = merge_nearest(sentiment, bars, tolerance);
    if merged.is_empty() {
        log::warn!(
            "no sentiment-price matches within {} minute(s)",
            tolerance.num_minutes()
        );
        return (0.0, merged);
    }
    if merged.len() < 2 {
        log::warn!("only one sentiment-price match; correlation undefined");
        return (0.0, merged);
    }

    let scores: Vec<f64> = merged
        .iter()
        .map(|m| f64::from(m.sentiment.score.value()))
        .collect();
    let returns: Vec<f64> = merged.iter().map(|m| m.next_return).collect();

    let covariance = scores.iter().covariance(returns.iter());
    let denominator = scores.iter().std_dev() * returns.iter().std_dev();
    let r = covariance / denominator;

    if r.is_finite() {
        log::info!("Sentiment-price correlation: {r:.4}");
        (r, merged)
    } else {
        log::warn!("sentiment or returns have zero variance; correlation undefined");
        (0.0, merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use tqs_core::domain::SentimentScore;

    fn at(m: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + Duration::minutes(m)
    }

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(at(i as i64 * 10), c, c, c, c, 1.0))
            .collect()
    }

    fn point(m: i64, score: SentimentScore) -> SentimentPoint {
        SentimentPoint {
            timestamp: at(m),
            score,
        }
    }

    #[test]
    fn empty_sentiment_is_zero() {
        let (r, merged) = correlate_sentiment_with_price(&[], &bars(&[1.0, 2.0]), Duration::minutes(30));
        assert_eq!(r, 0.0);
        assert!(merged.is_empty());
    }

    #[test]
    fn no_match_within_tolerance_is_zero() {
        let sentiment = [point(500, SentimentScore::Bullish)];
        let (r, merged) =
            correlate_sentiment_with_price(&sentiment, &bars(&[1.0, 2.0]), Duration::minutes(30));
        assert_eq!(r, 0.0);
        assert!(merged.is_empty());
    }

    #[test]
    fn merge_picks_nearest_bar() {
        let data = bars(&[100.0, 110.0, 99.0, 120.0]);
        let merged = merge_nearest(
            &[point(12, SentimentScore::Bullish), point(18, SentimentScore::Bearish)],
            &data,
            Duration::minutes(30),
        );
        assert_eq!(merged[0].bar_index, 1);
        assert_eq!(merged[1].bar_index, 2);
        assert!((merged[0].next_return - (99.0 / 110.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn last_bar_has_no_next_return() {
        let data = bars(&[100.0, 101.0]);
        let merged = merge_nearest(&[point(10, SentimentScore::Bullish)], &data, Duration::minutes(5));
        assert!(merged.is_empty());
    }

    #[test]
    fn perfect_alignment_correlates_positively() {
        // Bullish before every rise, bearish before every fall.
        let data = bars(&[100.0, 102.0, 100.0, 102.0, 100.0, 102.0]);
        let sentiment: Vec<SentimentPoint> = (0..5)
            .map(|i| {
                let score = if i % 2 == 0 {
                    SentimentScore::Bullish
                } else {
                    SentimentScore::Bearish
                };
                point(i * 10, score)
            })
            .collect();
        let (r, merged) = correlate_sentiment_with_price(&sentiment, &data, Duration::minutes(2));
        assert_eq!(merged.len(), 5);
        assert!(r > 0.99, "r = {r}");
    }

    #[test]
    fn constant_sentiment_is_zero() {
        let data = bars(&[100.0, 101.0, 99.0, 103.0]);
        let sentiment: Vec<SentimentPoint> =
            (0..3).map(|i| point(i * 10, SentimentScore::Bullish)).collect();
        let (r, merged) = correlate_sentiment_with_price(&sentiment, &data, Duration::minutes(2));
        assert_eq!(merged.len(), 3);
        assert_eq!(r, 0.0);
    }
}
