//! Criterion benchmarks for the scoring hot paths.
//!
//! Benchmarks:
//! 1. Indicator precompute (full snapshot frame)
//! 2. Historical scan (patterns, confirmations, sentiment join)
//! 3. Streaming replay (buffer, zones, Donchian, snapshot score)
//! 4. Outcome simulation over a candidate list

use chrono::{Duration, NaiveDate, NaiveDateTime};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use tqs_core::domain::{PriceBar, SentimentPoint, SentimentScore};
use tqs_core::indicators::{IndicatorConfig, IndicatorFrame};
use tqs_core::scanner::{simulate_outcomes, Scanner, ScannerConfig, SimulationConfig};
use tqs_core::scoring::ConfirmationInputs;
use tqs_core::stream::{replay_bars, StreamConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn make_bars(n: usize) -> Vec<PriceBar> {
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0 + (i as f64 * 0.037).cos() * 3.0;
            let open = close - 0.3;
            PriceBar::new(
                base() + Duration::minutes(i as i64),
                open,
                close + 1.5,
                close - 1.5,
                close,
                1_000.0 + (i % 500) as f64 * 7.0,
            )
        })
        .collect()
}

fn make_sentiment(n: usize) -> Vec<SentimentPoint> {
    (0..n / 15)
        .map(|k| SentimentPoint {
            timestamp: base() + Duration::minutes(15 * k as i64),
            score: if k % 2 == 0 {
                SentimentScore::Bullish
            } else {
                SentimentScore::Bearish
            },
        })
        .collect()
}

// ── 1. Indicator Precompute ──────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_frame");
    let config = IndicatorConfig::default();
    for n in [1_000usize, 10_000] {
        let bars = make_bars(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &bars, |b, bars| {
            b.iter(|| IndicatorFrame::compute(black_box(bars), &config))
        });
    }
    group.finish();
}

// ── 2. Historical Scan ───────────────────────────────────────────────

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    for n in [1_000usize, 10_000] {
        let bars = make_bars(n);
        let sentiment = make_sentiment(n);
        let with_sentiment = Scanner::default();
        let technical = Scanner::new(ScannerConfig {
            use_sentiment: false,
            ..ScannerConfig::default()
        });

        group.bench_with_input(BenchmarkId::new("sentiment", n), &bars, |b, bars| {
            b.iter(|| with_sentiment.scan(black_box(bars), black_box(&sentiment)))
        });
        group.bench_with_input(BenchmarkId::new("technical", n), &bars, |b, bars| {
            b.iter(|| technical.scan(black_box(bars), &[]))
        });
    }
    group.finish();
}

// ── 3. Streaming Replay ──────────────────────────────────────────────

fn bench_replay(c: &mut Criterion) {
    let bars = make_bars(2_000);
    let config = StreamConfig::default();
    let inputs = ConfirmationInputs {
        expected_value: 1.0,
        rvol: Some(1.7),
        ..ConfirmationInputs::default()
    };
    c.bench_function("replay_2000_bars", |b| {
        b.iter(|| replay_bars(black_box(&bars), &config, inputs))
    });
}

// ── 4. Outcome Simulation ────────────────────────────────────────────

fn bench_simulation(c: &mut Criterion) {
    let bars = make_bars(10_000);
    // A low entry threshold keeps the candidate list non-trivial.
    let candidates = Scanner::new(ScannerConfig::default().with_entry_threshold(1.0))
        .scan(&bars, &make_sentiment(10_000))
        .candidates;
    let config = SimulationConfig::default();
    c.bench_function("simulate_outcomes", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(42);
            simulate_outcomes(black_box(&candidates), &config, &mut rng)
        })
    });
}

criterion_group!(
    benches,
    bench_indicators,
    bench_scan,
    bench_replay,
    bench_simulation
);
criterion_main!(benches);
