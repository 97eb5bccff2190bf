//! Consistency validation between sequential and parallel trials.
//!
//! A mismatch is a finding about the tested suite (shared mutable state
//! or an ordering dependency), never a planner error, never retried, and
//! never remediated here.

use parabench_core::TrialResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Outcome of comparing one parallel trial against the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyVerdict {
    /// Label of the baseline trial.
    pub baseline_label: String,
    /// Label of the parallel trial under comparison.
    pub trial_label: String,
    /// Both trials agree on overall pass/fail. A timed-out trial has no
    /// exit status and never matches.
    pub exit_status_match: bool,
    /// Per-unit outcome maps are equal as sets; execution order is
    /// explicitly irrelevant.
    pub outcome_set_match: bool,
    /// Units behind the disagreement: present on one side only, or with a
    /// different outcome. Sorted; empty when consistent.
    pub mismatched: BTreeSet<String>,
}

impl ConsistencyVerdict {
    /// Both checks must hold.
    pub fn is_consistent(&self) -> bool {
        self.exit_status_match && self.outcome_set_match
    }
}

/// Compare a parallel trial against the baseline over the same subset.
pub fn validate(baseline: &TrialResult, parallel: &TrialResult) -> ConsistencyVerdict {
    let exit_status_match = match (baseline.succeeded(), parallel.succeeded()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };

    let mut mismatched = BTreeSet::new();
    for (unit, outcome) in &baseline.outcomes {
        match parallel.outcomes.get(unit) {
            Some(parallel_outcome) if parallel_outcome == outcome => {}
            _ => {
                mismatched.insert(unit.clone());
            }
        }
    }
    for unit in parallel.outcomes.keys() {
        if !baseline.outcomes.contains_key(unit) {
            mismatched.insert(unit.clone());
        }
    }

    let outcome_set_match = mismatched.is_empty();

    ConsistencyVerdict {
        baseline_label: baseline.config.label.clone(),
        trial_label: parallel.config.label.clone(),
        exit_status_match,
        outcome_set_match,
        mismatched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parabench_core::{TrialConfig, TrialStatus, UnitOutcome};
    use std::collections::BTreeMap;

    fn trial(label: &str, exit_code: i32, outcomes: &[(&str, UnitOutcome)]) -> TrialResult {
        TrialResult::new(
            TrialConfig::new(if label == "baseline" { 1 } else { 4 }, Vec::new(), label),
            TrialStatus::Completed { exit_code },
            1.0,
            outcomes
                .iter()
                .map(|(name, outcome)| (name.to_string(), *outcome))
                .collect(),
        )
    }

    #[test]
    fn identical_outcomes_are_consistent() {
        let outcomes = [
            ("t::a", UnitOutcome::Passed),
            ("t::b", UnitOutcome::Failed),
        ];
        let verdict = validate(
            &trial("baseline", 1, &outcomes),
            &trial("workers-4", 1, &outcomes),
        );
        assert!(verdict.is_consistent());
        assert!(verdict.mismatched.is_empty());
    }

    #[test]
    fn outcome_match_ignores_insertion_order() {
        // Same pairs, reversed insertion order; BTreeMap semantics make
        // this a set comparison, which is the contract.
        let forward = [("t::a", UnitOutcome::Passed), ("t::b", UnitOutcome::Passed)];
        let reversed = [("t::b", UnitOutcome::Passed), ("t::a", UnitOutcome::Passed)];
        let verdict = validate(
            &trial("baseline", 0, &forward),
            &trial("workers-4", 0, &reversed),
        );
        assert!(verdict.outcome_set_match);
    }

    #[test]
    fn missing_unit_is_surfaced_by_name() {
        let verdict = validate(
            &trial(
                "baseline",
                0,
                &[("t::a", UnitOutcome::Passed), ("t::b", UnitOutcome::Passed)],
            ),
            &trial("workers-4", 0, &[("t::a", UnitOutcome::Passed)]),
        );
        assert!(!verdict.outcome_set_match);
        assert_eq!(
            verdict.mismatched.iter().cloned().collect::<Vec<_>>(),
            vec!["t::b".to_string()]
        );
    }

    #[test]
    fn flipped_outcome_is_surfaced_by_name() {
        let verdict = validate(
            &trial("baseline", 0, &[("t::a", UnitOutcome::Passed)]),
            &trial("workers-4", 1, &[("t::a", UnitOutcome::Failed)]),
        );
        assert!(!verdict.is_consistent());
        assert!(verdict.mismatched.contains("t::a"));
        assert!(!verdict.exit_status_match);
    }

    #[test]
    fn extra_unit_on_parallel_side_counts_too() {
        let verdict = validate(
            &trial("baseline", 0, &[("t::a", UnitOutcome::Passed)]),
            &trial(
                "workers-4",
                0,
                &[("t::a", UnitOutcome::Passed), ("t::x", UnitOutcome::Passed)],
            ),
        );
        assert!(verdict.mismatched.contains("t::x"));
    }

    #[test]
    fn nonzero_exits_on_both_sides_still_match() {
        // "Same overall pass/fail" is a boolean, not exit-code equality.
        let verdict = validate(
            &trial("baseline", 1, &[("t::a", UnitOutcome::Failed)]),
            &trial("workers-4", 2, &[("t::a", UnitOutcome::Failed)]),
        );
        assert!(verdict.exit_status_match);
        assert!(verdict.is_consistent());
    }

    #[test]
    fn timed_out_trial_never_matches() {
        let baseline = trial("baseline", 0, &[("t::a", UnitOutcome::Passed)]);
        let timed_out = TrialResult::new(
            TrialConfig::new(8, Vec::new(), "workers-8"),
            TrialStatus::TimedOut,
            300.0,
            BTreeMap::new(),
        );
        let verdict = validate(&baseline, &timed_out);
        assert!(!verdict.exit_status_match);
        assert!(!verdict.is_consistent());
    }
}
