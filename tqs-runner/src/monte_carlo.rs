//! Sequence-risk Monte Carlo: reshuffle a fixed outcome multiset.
//!
//! Every trial replays a uniformly random permutation of the same realized
//! WIN/LOSS outcomes from the starting balance. The win rate never changes,
//! so the spread of the results is attributable to ordering alone. Terminal
//! balances are order-independent by construction (addition commutes); the
//! worst balance reached along the path is not.

use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use tqs_core::domain::Outcome;
use tqs_core::rng::RngHierarchy;
use tqs_core::scanner::SimulationConfig;

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Number of reshuffle trials (default 1000).
    pub trials: usize,
    /// Run trials on the rayon pool.
    pub parallel: bool,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            trials: 1000,
            parallel: true,
        }
    }
}

// ─── Result types ────────────────────────────────────────────────────

/// 5th/50th/95th percentiles of the terminal balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequenceRiskPercentiles {
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
}

impl SequenceRiskPercentiles {
    /// All three percentiles at one value (no trades, or no trials).
    pub fn flat(balance: f64) -> Self {
        Self {
            p5: balance,
            p50: balance,
            p95: balance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceRiskReport {
    pub trials: usize,
    pub percentiles: SequenceRiskPercentiles,
    /// 5th percentile of the lowest balance reached along each path.
    pub worst_balance_p5: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TrialResult {
    terminal: f64,
    worst: f64,
}

// ─── Simulator ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceRiskSimulator {
    config: MonteCarloConfig,
    simulation: SimulationConfig,
}

impl SequenceRiskSimulator {
    pub fn new(config: MonteCarloConfig, simulation: SimulationConfig) -> Self {
        Self { config, simulation }
    }

    /// Run all trials. Trial `i` shuffles with the sub-seed `("trial", i)`
    /// of `rng`, so the report is identical with or without parallelism.
    pub fn run(&self, outcomes: &[Outcome], rng: &RngHierarchy) -> SequenceRiskReport {
        let trials = self.config.trials;
        if trials == 0 {
            log::warn!("sequence-risk simulator configured with zero trials");
            return SequenceRiskReport {
                trials,
                percentiles: SequenceRiskPercentiles::flat(self.simulation.start_balance),
                worst_balance_p5: self.simulation.start_balance,
            };
        }

        let results: Vec<TrialResult> = if self.config.parallel {
            (0..trials)
                .into_par_iter()
                .map(|i| self.trial(outcomes, rng, i as u64))
                .collect()
        } else {
            (0..trials)
                .map(|i| self.trial(outcomes, rng, i as u64))
                .collect()
        };

        let mut terminals: Vec<f64> = results.iter().map(|r| r.terminal).collect();
        let mut worsts: Vec<f64> = results.iter().map(|r| r.worst).collect();
        terminals.sort_by(f64::total_cmp);
        worsts.sort_by(f64::total_cmp);

        let percentiles = SequenceRiskPercentiles {
            p5: percentile_sorted(&terminals, 5.0),
            p50: percentile_sorted(&terminals, 50.0),
            p95: percentile_sorted(&terminals, 95.0),
        };
        log::debug!(
            "sequence risk over {trials} trial(s) of {} trade(s): p5 {:.2} / p50 {:.2} / p95 {:.2}",
            outcomes.len(),
            percentiles.p5,
            percentiles.p50,
            percentiles.p95
        );

        SequenceRiskReport {
            trials,
            percentiles,
            worst_balance_p5: percentile_sorted(&worsts, 5.0),
        }
    }

    fn trial(&self, outcomes: &[Outcome], rng: &RngHierarchy, index: u64) -> TrialResult {
        let mut shuffled = outcomes.to_vec();
        shuffled.shuffle(&mut rng.rng_for("trial", index));

        let mut balance = self.simulation.start_balance;
        let mut worst = balance;
        for outcome in shuffled {
            balance += self.simulation.pnl(outcome);
            worst = worst.min(balance);
        }
        TrialResult {
            terminal: balance,
            worst,
        }
    }
}

/// Linear-interpolated percentile of an ascending slice, `p` in `[0, 100]`.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}
