//! TQS Runner: orchestration around the scoring core.
//!
//! This crate builds on `tqs-core` to provide:
//! - TOML run configuration with validation and a content hash
//! - CSV loading of bars and sentiment into the core's input contracts
//! - Single backtest runs (scan → simulate → sequence risk)
//! - Sequence-risk Monte Carlo over reshuffled outcomes
//! - Walk-forward threshold tuning over rolling train/test windows
//! - Sentiment–price correlation
//! - CSV/JSON export of trade logs, window tables, signal logs and traces

pub mod backtest;
pub mod config;
pub mod correlation;
pub mod data_loader;
pub mod export;
pub mod monte_carlo;
pub mod walk_forward;

pub use backtest::{run_backtest, run_backtest_with, BacktestError, BacktestResult, BacktestSettings};
pub use config::{ConfigError, TqsConfig};
pub use correlation::{correlate_sentiment_with_price, merge_nearest, MergedPoint};
pub use data_loader::{load_bars, load_sentiment, read_bars, read_sentiment, LoadError};
pub use monte_carlo::{
    MonteCarloConfig, SequenceRiskPercentiles, SequenceRiskReport, SequenceRiskSimulator,
};
pub use walk_forward::{
    create_windows, run_walk_forward, WalkForwardConfig, WalkForwardError, WalkForwardReport,
    WindowResult, WindowSpan, WindowSpec,
};
