//! Probabilistic outcome resolution.
//!
//! Each candidate wins with a fixed probability, drawn independently; there
//! is no price path. A win adds `r_win × risk_per_trade`, a loss subtracts
//! `r_loss × risk_per_trade`.

use crate::domain::{Outcome, TradeCandidate, TradeRecord};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub start_balance: f64,
    pub risk_per_trade: f64,
    pub r_win: f64,
    pub r_loss: f64,
    pub win_probability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_balance: 5000.0,
            risk_per_trade: 25.0,
            r_win: 1.8,
            r_loss: 1.0,
            win_probability: 0.53,
        }
    }
}

impl SimulationConfig {
    /// Balance change for one resolved trade.
    pub fn pnl(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Win => self.r_win * self.risk_per_trade,
            Outcome::Loss => -self.r_loss * self.risk_per_trade,
        }
    }

    /// Expected value in R-multiples at the given win rate.
    pub fn expected_value(&self, win_rate: f64) -> f64 {
        win_rate * self.r_win - (1.0 - win_rate) * self.r_loss
    }

    /// Replay a fixed outcome sequence from the start balance.
    pub fn terminal_balance<'a>(&self, outcomes: impl IntoIterator<Item = &'a Outcome>) -> f64 {
        outcomes
            .into_iter()
            .fold(self.start_balance, |balance, &o| balance + self.pnl(o))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub trades: Vec<TradeRecord>,
    pub final_balance: f64,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub expected_value: f64,
}

impl SimulationOutcome {
    pub fn outcomes(&self) -> Vec<Outcome> {
        self.trades.iter().map(|t| t.outcome).collect()
    }
}

/// Resolve each candidate with an independent Bernoulli draw from `rng`.
pub fn simulate_outcomes<R: Rng + ?Sized>(
    candidates: &[TradeCandidate],
    config: &SimulationConfig,
    rng: &mut R,
) -> SimulationOutcome {
    let mut balance = config.start_balance;
    let mut wins = 0usize;
    let mut losses = 0usize;
    let mut trades = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let outcome = if rng.gen::<f64>() < config.win_probability {
            wins += 1;
            Outcome::Win
        } else {
            losses += 1;
            Outcome::Loss
        };
        balance += config.pnl(outcome);
        trades.push(TradeRecord {
            candidate: candidate.clone(),
            outcome,
            balance_after: balance,
        });
    }

    let win_rate = wins as f64 / (wins + losses).max(1) as f64;

    SimulationOutcome {
        trades,
        final_balance: balance,
        wins,
        losses,
        win_rate,
        expected_value: config.expected_value(win_rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, SentimentScore};
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn candidates(n: usize) -> Vec<TradeCandidate> {
        let base = NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| TradeCandidate {
                timestamp: base + chrono::Duration::minutes(i as i64),
                score: 5.5,
                sentiment: SentimentScore::Bullish,
                direction: Direction::Long,
            })
            .collect()
    }

    #[test]
    fn no_trades_keeps_balance_and_zero_win_rate() {
        let config = SimulationConfig::default();
        let result = simulate_outcomes(&[], &config, &mut StdRng::seed_from_u64(1));
        assert_eq!(result.final_balance, 5000.0);
        assert_eq!(result.win_rate, 0.0);
        assert_eq!(result.expected_value, -1.0);
    }

    #[test]
    fn certain_win_and_certain_loss() {
        let always = SimulationConfig {
            win_probability: 1.0,
            ..SimulationConfig::default()
        };
        let result = simulate_outcomes(&candidates(4), &always, &mut StdRng::seed_from_u64(7));
        assert_eq!(result.wins, 4);
        assert!((result.final_balance - (5000.0 + 4.0 * 45.0)).abs() < 1e-9);
        assert!((result.expected_value - 1.8).abs() < 1e-12);

        let never = SimulationConfig {
            win_probability: 0.0,
            ..SimulationConfig::default()
        };
        let result = simulate_outcomes(&candidates(3), &never, &mut StdRng::seed_from_u64(7));
        assert_eq!(result.losses, 3);
        assert_eq!(result.final_balance, 4925.0);
        assert_eq!(result.trades[2].balance_after, 4925.0);
    }

    #[test]
    fn same_seed_same_outcomes() {
        let config = SimulationConfig::default();
        let a = simulate_outcomes(&candidates(50), &config, &mut StdRng::seed_from_u64(42));
        let b = simulate_outcomes(&candidates(50), &config, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        assert_eq!(a.wins + a.losses, 50);
    }

    #[test]
    fn running_balance_matches_terminal_replay() {
        let config = SimulationConfig::default();
        let result = simulate_outcomes(&candidates(20), &config, &mut StdRng::seed_from_u64(3));
        let replayed = config.terminal_balance(&result.outcomes());
        assert!((replayed - result.final_balance).abs() < 1e-9);
    }
}
