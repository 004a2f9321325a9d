//! Snapshot scorer used by the streaming evaluator.
//!
//! Price structure (sweep, Donchian break) is measured here; the remaining
//! confirmations arrive precomputed from outside.

use super::accumulator::{ScoreAccumulator, ScoreBreakdown, ScoreReason, RVOL_THRESHOLD};
use crate::zones::DonchianRange;
use serde::{Deserialize, Serialize};

/// Confirmation inputs supplied by external collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationInputs {
    pub expected_value: f64,
    pub rvol: Option<f64>,
    pub macd_aligned: bool,
    pub rsi_aligned: bool,
    pub bias_aligned: bool,
    pub volatility_in_range: bool,
}

/// Price structure at the moment of evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketState {
    pub price: f64,
    pub donchian: Option<DonchianRange>,
    pub swept: bool,
    pub sweep_confirmed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub price_used: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SignalEvaluator {
    inputs: ConfirmationInputs,
}

impl SignalEvaluator {
    pub fn new(inputs: ConfirmationInputs) -> Self {
        Self { inputs }
    }

    pub fn inputs(&self) -> &ConfirmationInputs {
        &self.inputs
    }

    pub fn evaluate(&self, state: &MarketState) -> Evaluation {
        let mut acc = ScoreAccumulator::new();

        if state.swept && state.sweep_confirmed {
            acc.award(ScoreReason::SweepConfirmed);
        } else if state.swept {
            acc.award(ScoreReason::SweepUnconfirmed);
        }

        if let Some(range) = state.donchian {
            if state.price > range.high {
                acc.award(ScoreReason::DonchianBreakout);
            } else if state.price < range.low {
                acc.award(ScoreReason::DonchianBreakdown);
            }
        }

        let inputs = &self.inputs;
        acc.award_if(inputs.expected_value > 0.0, ScoreReason::PositiveExpectedValue);
        acc.award_if(
            inputs.rvol.is_some_and(|r| r >= RVOL_THRESHOLD),
            ScoreReason::HighRelativeVolume,
        );
        acc.award_if(inputs.macd_aligned, ScoreReason::MacdAligned);
        acc.award_if(inputs.rsi_aligned, ScoreReason::RsiAligned);
        acc.award_if(inputs.bias_aligned, ScoreReason::BiasAligned);
        acc.award_if(inputs.volatility_in_range, ScoreReason::VolatilityRegime);

        let breakdown = acc.finish();
        Evaluation {
            score: breakdown.score(),
            breakdown,
            price_used: state.price,
        }
    }
}
