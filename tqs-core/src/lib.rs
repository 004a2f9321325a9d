//! TQS Core: Trade Quality Score engine.
//!
//! This crate contains the scoring pipeline:
//! - Domain types (bars, ticks, sentiment, trade candidates and records)
//! - Bar cleaning with an observable volume fill policy
//! - Indicators (RVOL, MACD, RSI, SMA) with explicit availability
//! - Zones (Donchian range, session extremes, sweep tests)
//! - The TQS accumulator and its two variants (streaming, historical)
//! - Historical scanner and probabilistic outcome simulator
//! - Bounded price buffer and streaming evaluator
//! - Sentiment join and directional bias
//! - Deterministic RNG hierarchy

pub mod buffer;
pub mod clean;
pub mod domain;
pub mod indicators;
pub mod rng;
pub mod scanner;
pub mod scoring;
pub mod sentiment;
pub mod stream;
pub mod zones;
