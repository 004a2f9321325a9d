//! Sequence-risk Monte Carlo invariants.
//!
//! 1. Scenario C: [WIN, WIN, LOSS] always ends at 5065
//! 2. Reshuffling preserves the multiset, so every trial ends at the same balance
//! 3. Percentiles are ordered and the worst path never beats the start
//! 4. Serial and parallel trials agree

use proptest::prelude::*;
use tqs_core::domain::Outcome;
use tqs_core::rng::RngHierarchy;
use tqs_core::scanner::SimulationConfig;
use tqs_runner::{MonteCarloConfig, SequenceRiskPercentiles, SequenceRiskSimulator};

fn arb_outcomes() -> impl Strategy<Value = Vec<Outcome>> {
    prop::collection::vec(prop_oneof![Just(Outcome::Win), Just(Outcome::Loss)], 0..60)
}

fn simulator(trials: usize, parallel: bool) -> SequenceRiskSimulator {
    SequenceRiskSimulator::new(MonteCarloConfig { trials, parallel }, SimulationConfig::default())
}

#[test]
fn scenario_c_win_win_loss() {
    let report = simulator(1000, true).run(
        &[Outcome::Win, Outcome::Win, Outcome::Loss],
        &RngHierarchy::new(42),
    );
    assert_eq!(report.trials, 1000);
    assert_eq!(report.percentiles.p5, 5065.0);
    assert_eq!(report.percentiles.p50, 5065.0);
    assert_eq!(report.percentiles.p95, 5065.0);
}

#[test]
fn losing_streak_first_bounds_the_worst_path() {
    let mut outcomes = vec![Outcome::Loss; 10];
    outcomes.extend(vec![Outcome::Win; 10]);
    let report = simulator(500, true).run(&outcomes, &RngHierarchy::new(3));
    // No path can dip below ten straight losses.
    assert!(report.worst_balance_p5 >= 5000.0 - 10.0 * 25.0);
    assert!(report.worst_balance_p5 < 5000.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn reshuffle_preserves_terminal_balance(outcomes in arb_outcomes(), seed in any::<u64>()) {
        let report = simulator(64, false).run(&outcomes, &RngHierarchy::new(seed));
        let expected = SimulationConfig::default().terminal_balance(outcomes.iter());
        prop_assert_eq!(report.percentiles, SequenceRiskPercentiles::flat(expected));
    }

    #[test]
    fn percentiles_are_ordered(outcomes in arb_outcomes(), seed in any::<u64>()) {
        let report = simulator(64, false).run(&outcomes, &RngHierarchy::new(seed));
        let p = report.percentiles;
        prop_assert!(p.p5 <= p.p50 && p.p50 <= p.p95);
        prop_assert!(report.worst_balance_p5 <= 5000.0);
        prop_assert!(report.worst_balance_p5 <= p.p5);
    }

    #[test]
    fn parallel_matches_serial(outcomes in arb_outcomes(), seed in any::<u64>()) {
        let rng = RngHierarchy::new(seed);
        let serial = simulator(50, false).run(&outcomes, &rng);
        let parallel = simulator(50, true).run(&outcomes, &rng);
        prop_assert_eq!(serial, parallel);
    }
}
