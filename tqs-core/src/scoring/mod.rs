//! Trade Quality Score: weighted evidence into a score plus breakdown.
//!
//! Two variants share the accumulator:
//! - `SignalEvaluator` scores a live snapshot (sweep, Donchian break and
//!   externally supplied confirmations).
//! - `patterns` scores a historical bar (price patterns, indicator
//!   confirmations and the sentiment adjustment).

pub mod accumulator;
pub mod evaluator;
pub mod patterns;

pub use accumulator::{ScoreAccumulator, ScoreBreakdown, ScoreItem, ScoreReason, RVOL_THRESHOLD};
pub use evaluator::{ConfirmationInputs, Evaluation, MarketState, SignalEvaluator};
pub use patterns::{score_confirmation, score_patterns, score_sentiment};
