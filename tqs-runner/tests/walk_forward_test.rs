//! Walk-forward integration tests.
//!
//! 1. Test windows tile the range without overlap or gap
//! 2. Trailing partial window is dropped
//! 3. Serial and parallel runs give identical reports
//! 4. The tuned threshold always comes from the grid
//! 5. A test window reuses the tuned threshold unmodified

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tqs_core::domain::{PriceBar, SentimentPoint, SentimentScore};
use tqs_runner::{create_windows, run_walk_forward, TqsConfig, WindowSpan};

fn origin() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Half-hourly bars over `days` days from a deterministic LCG walk.
fn bars(days: i64) -> Vec<PriceBar> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5
    };
    let mut close = 100.0;
    (0..days * 48)
        .map(|i| {
            let open = close;
            close = (close + next() * 2.0).max(1.0);
            let high = open.max(close) + next().abs();
            let low = open.min(close) - next().abs();
            let volume = 1_000.0 + (next() + 0.5) * 2_000.0;
            PriceBar::new(origin() + Duration::minutes(30 * i), open, high, low, close, volume)
        })
        .collect()
}

fn sentiment(days: i64) -> Vec<SentimentPoint> {
    (0..days * 8)
        .map(|i| SentimentPoint {
            timestamp: origin() + Duration::hours(3 * i),
            score: match i % 3 {
                0 => SentimentScore::Bullish,
                1 => SentimentScore::Bearish,
                _ => SentimentScore::Neutral,
            },
        })
        .collect()
}

fn config(parallel: bool) -> TqsConfig {
    let mut config = TqsConfig::default();
    config.scanner.entry_threshold = 2.0;
    config.scanner.watchlist_threshold = 1.0;
    config.monte_carlo.trials = 50;
    config.walk_forward.threshold_grid = vec![1.0, 2.0, 3.0];
    config.walk_forward.train = WindowSpan::Days(10);
    config.walk_forward.test = WindowSpan::Days(5);
    config.walk_forward.parallel = parallel;
    config
}

#[test]
fn test_windows_tile_the_range() {
    let data = bars(40);
    let last = data.last().unwrap().timestamp;
    let windows = create_windows(data[0].timestamp, last, &config(false).walk_forward);

    // 40 days minus one half-hour: test ends at day 15, 20, ..., 35.
    assert_eq!(windows.len(), 5);
    for pair in windows.windows(2) {
        assert_eq!(pair[1].test_start, pair[0].test_end);
        assert_eq!(pair[1].train_start - pair[0].train_start, Duration::days(5));
    }
    for w in &windows {
        assert_eq!(w.test_start, w.train_end);
        assert_eq!(w.train_end - w.train_start, Duration::days(10));
        assert_eq!(w.test_end - w.test_start, Duration::days(5));
        assert!(w.test_end <= last);
    }
    // The remainder after the last full test window is shorter than one test span.
    assert!(last - windows[4].test_end < Duration::days(5));
}

#[test]
fn too_little_data_gives_empty_report() {
    let report = run_walk_forward(&bars(12), &[], &config(false)).unwrap();
    assert!(report.is_empty());
    assert_eq!(report.pooled_test_win_rate(), 0.0);
}

#[test]
fn parallel_and_serial_reports_match() {
    let data = bars(30);
    let points = sentiment(30);
    let serial = run_walk_forward(&data, &points, &config(false)).unwrap();
    let parallel = run_walk_forward(&data, &points, &config(true)).unwrap();
    assert!(!serial.is_empty());
    assert_eq!(serial, parallel);
}

#[test]
fn tuned_threshold_comes_from_grid_and_gates_test_trades() {
    let config = config(true);
    let report = run_walk_forward(&bars(30), &sentiment(30), &config).unwrap();
    for w in &report.windows {
        assert!(config.walk_forward.threshold_grid.contains(&w.tuned_threshold));
        assert!((0.0..=1.0).contains(&w.train_win_rate));
        for trade in &w.test.trades {
            assert!(trade.candidate.score >= w.tuned_threshold);
            assert!(trade.candidate.timestamp >= w.window.test_start);
            assert!(trade.candidate.timestamp < w.window.test_end);
        }
    }
}

#[test]
fn seed_changes_outcomes_not_windows() {
    let data = bars(30);
    let mut a = config(false);
    a.seed = 1;
    let mut b = config(false);
    b.seed = 2;
    let ra = run_walk_forward(&data, &[], &a).unwrap();
    let rb = run_walk_forward(&data, &[], &b).unwrap();
    let spans = |r: &tqs_runner::WalkForwardReport| -> Vec<_> {
        r.windows.iter().map(|w| w.window).collect()
    };
    assert_eq!(spans(&ra), spans(&rb));
}
