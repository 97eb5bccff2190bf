//! Worker-count optimization.
//!
//! Selection rule, per scope: among the baseline and every completed,
//! fully consistent parallel trial, pick the lowest mean duration; on a
//! duration tie the lower worker count wins. The baseline is always a
//! candidate, so when nothing parallel is both consistent and faster the
//! recommendation degrades to one worker instead of an inconsistent-but-
//! fast configuration. Correctness dominates speed, unconditionally.

use crate::consistency::{validate, ConsistencyVerdict};
use parabench_core::Category;
use parabench_report::{
    BenchmarkArtifact, BenchmarkReport, OptimizationPlan, Recommendation, ReportMeta, ScopePlan,
    FULL_SUITE_SCOPE,
};
use std::collections::BTreeMap;
use tracing::info;

/// Invocation shape used to render recommended commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    /// Engine program (e.g. `pytest`).
    pub program: String,
    /// Worker-count flag (e.g. `-n`).
    pub workers_flag: String,
    /// Category-selector flag (e.g. `-m`).
    pub selector_flag: String,
}

impl Default for CommandTemplate {
    fn default() -> Self {
        Self {
            program: "pytest".to_string(),
            workers_flag: "-n".to_string(),
            selector_flag: "-m".to_string(),
        }
    }
}

impl CommandTemplate {
    /// Render the recommended invocation for a scope.
    ///
    /// Category scopes select by marker name; the full suite runs bare.
    /// A one-worker recommendation renders without the workers flag,
    /// since sequential is the engine's bare invocation.
    pub fn render(&self, scope: &str, workers: u32) -> String {
        let mut command = self.program.clone();
        if let Ok(category) = scope.parse::<Category>() {
            command.push_str(&format!(" {} {}", self.selector_flag, category.marker()));
        }
        if workers > 1 {
            command.push_str(&format!(" {} {}", self.workers_flag, workers));
        }
        command
    }
}

/// The winning configuration for one scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeChoice {
    /// Chosen worker count.
    pub workers: u32,
    /// Mean duration of the winning configuration, in seconds.
    pub seconds: f64,
}

/// Validate every parallel trial in a report against its baseline.
pub fn verdicts_for(report: &BenchmarkReport) -> BTreeMap<String, ConsistencyVerdict> {
    report
        .trials
        .iter()
        .map(|(label, trial)| (label.clone(), validate(&report.baseline, trial)))
        .collect()
}

/// Pick the best worker count for one scope.
pub fn select_best(
    report: &BenchmarkReport,
    verdicts: &BTreeMap<String, ConsistencyVerdict>,
) -> ScopeChoice {
    let baseline_label = report.baseline.config.label.clone();
    let baseline_seconds = report
        .mean_seconds(&baseline_label)
        .unwrap_or(report.baseline.wall_seconds);

    let mut best = ScopeChoice {
        workers: report.baseline.config.workers.max(1),
        seconds: baseline_seconds,
    };

    for (label, trial) in &report.trials {
        if !trial.completed() {
            continue;
        }
        let consistent = verdicts.get(label).is_some_and(|v| v.is_consistent());
        if !consistent {
            continue;
        }
        let seconds = report.mean_seconds(label).unwrap_or(trial.wall_seconds);
        let faster = seconds < best.seconds;
        let tie_with_fewer_workers = seconds == best.seconds && trial.config.workers < best.workers;
        if faster || tie_with_fewer_workers {
            best = ScopeChoice {
                workers: trial.config.workers,
                seconds,
            };
        }
    }

    best
}

/// Build the optimization plan from a persisted benchmark artifact.
pub fn build_plan(
    artifact: &BenchmarkArtifact,
    template: &CommandTemplate,
    meta: ReportMeta,
) -> OptimizationPlan {
    let mut per_category = BTreeMap::new();

    for (scope, report) in &artifact.reports {
        let verdicts = verdicts_for(report);
        let choice = select_best(report, &verdicts);
        info!(scope = %scope, workers = choice.workers, seconds = choice.seconds, "selected configuration");
        per_category.insert(
            scope.clone(),
            ScopePlan {
                workers: choice.workers,
                seconds: choice.seconds,
                command: template.render(scope, choice.workers),
            },
        );
    }

    let recommendations = build_recommendations(&per_category, template);

    OptimizationPlan {
        meta,
        per_category,
        recommendations,
    }
}

fn build_recommendations(
    per_category: &BTreeMap<String, ScopePlan>,
    template: &CommandTemplate,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if let Some(full) = per_category.get(FULL_SUITE_SCOPE) {
        recommendations.push(Recommendation {
            purpose: "full suite".to_string(),
            command: full.command.clone(),
        });
    }

    // Fast feedback loop: the fast-isolated subset at its best worker
    // count, falling back to the full-suite choice when that scope was
    // not benchmarked separately.
    let fast_scope = Category::FastIsolated.name();
    let fast_feedback = per_category
        .get(fast_scope)
        .map(|p| p.command.clone())
        .or_else(|| {
            per_category
                .get(FULL_SUITE_SCOPE)
                .map(|p| template.render(fast_scope, p.workers))
        });
    if let Some(command) = fast_feedback {
        recommendations.push(Recommendation {
            purpose: "fast feedback".to_string(),
            command,
        });
    }

    for (scope, plan) in per_category {
        if scope != FULL_SUITE_SCOPE {
            recommendations.push(Recommendation {
                purpose: scope.clone(),
                command: plan.command.clone(),
            });
        }
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use parabench_core::{TrialConfig, TrialResult, TrialStatus, UnitOutcome};
    use std::collections::BTreeMap;

    fn trial(
        label: &str,
        workers: u32,
        seconds: f64,
        outcomes: &[(&str, UnitOutcome)],
    ) -> TrialResult {
        TrialResult::new(
            TrialConfig::new(workers, Vec::new(), label),
            TrialStatus::Completed { exit_code: 0 },
            seconds,
            outcomes
                .iter()
                .map(|(n, o)| (n.to_string(), *o))
                .collect(),
        )
    }

    fn report_with(trials: Vec<TrialResult>, baseline_seconds: f64) -> BenchmarkReport {
        let outcomes = [("t::a", UnitOutcome::Passed)];
        let baseline = trial("baseline", 1, baseline_seconds, &outcomes);
        let trial_map: BTreeMap<String, TrialResult> = trials
            .into_iter()
            .map(|t| (t.config.label.clone(), t))
            .collect();
        BenchmarkReport::new(FULL_SUITE_SCOPE, baseline, trial_map, BTreeMap::new())
    }

    #[test]
    fn fastest_consistent_trial_wins() {
        let outcomes = [("t::a", UnitOutcome::Passed)];
        let report = report_with(
            vec![
                trial("workers-2", 2, 6.0, &outcomes),
                trial("workers-4", 4, 4.0, &outcomes),
            ],
            10.0,
        );
        let choice = select_best(&report, &verdicts_for(&report));
        assert_eq!(choice.workers, 4);
        assert!((choice.seconds - 4.0).abs() < 1e-9);
    }

    #[test]
    fn consistency_beats_speed() {
        // Fastest trial drops a unit (inconsistent); second-fastest agrees.
        let good = [("t::a", UnitOutcome::Passed)];
        let fast_but_wrong = trial("workers-8", 8, 2.0, &[]);
        let report = report_with(
            vec![fast_but_wrong, trial("workers-4", 4, 4.0, &good)],
            10.0,
        );
        let choice = select_best(&report, &verdicts_for(&report));
        assert_eq!(choice.workers, 4);
    }

    #[test]
    fn no_consistent_parallel_trial_falls_back_to_one_worker() {
        let report = report_with(
            vec![
                trial("workers-2", 2, 3.0, &[("t::a", UnitOutcome::Failed)]),
                trial("workers-4", 4, 2.0, &[]),
            ],
            10.0,
        );
        let choice = select_best(&report, &verdicts_for(&report));
        assert_eq!(choice.workers, 1);
        assert!((choice.seconds - 10.0).abs() < 1e-9);
    }

    #[test]
    fn slower_parallel_trials_lose_to_baseline() {
        let outcomes = [("t::a", UnitOutcome::Passed)];
        let report = report_with(vec![trial("workers-2", 2, 15.0, &outcomes)], 10.0);
        let choice = select_best(&report, &verdicts_for(&report));
        assert_eq!(choice.workers, 1);
    }

    #[test]
    fn timed_out_trial_is_never_a_candidate() {
        let timed_out = TrialResult::new(
            TrialConfig::new(8, Vec::new(), "workers-8"),
            TrialStatus::TimedOut,
            0.5, // absurdly "fast" because it was killed; must not win
            BTreeMap::new(),
        );
        let report = report_with(vec![timed_out], 10.0);
        let choice = select_best(&report, &verdicts_for(&report));
        assert_eq!(choice.workers, 1);
    }

    #[test]
    fn duration_tie_prefers_fewer_workers() {
        let outcomes = [("t::a", UnitOutcome::Passed)];
        let report = report_with(
            vec![
                trial("workers-4", 4, 5.0, &outcomes),
                trial("workers-2", 2, 5.0, &outcomes),
            ],
            10.0,
        );
        let choice = select_best(&report, &verdicts_for(&report));
        assert_eq!(choice.workers, 2);
    }

    #[test]
    fn render_full_suite_and_category_commands() {
        let template = CommandTemplate::default();
        assert_eq!(template.render(FULL_SUITE_SCOPE, 4), "pytest -n 4");
        assert_eq!(
            template.render("fast-isolated", 4),
            "pytest -m fast_isolated -n 4"
        );
        // Sequential recommendation renders bare.
        assert_eq!(template.render("heavy", 1), "pytest -m heavy");
    }

    #[test]
    fn plan_contains_full_suite_and_fast_feedback() {
        let outcomes = [("t::a", UnitOutcome::Passed)];
        let mut reports = BTreeMap::new();
        reports.insert(
            FULL_SUITE_SCOPE.to_string(),
            report_with(vec![trial("workers-4", 4, 4.0, &outcomes)], 10.0),
        );
        let artifact = BenchmarkArtifact {
            meta: parabench_report::build_report_meta(),
            reports,
        };

        let plan = build_plan(
            &artifact,
            &CommandTemplate::default(),
            parabench_report::build_report_meta(),
        );
        assert_eq!(plan.per_category[FULL_SUITE_SCOPE].workers, 4);
        let purposes: Vec<_> = plan
            .recommendations
            .iter()
            .map(|r| r.purpose.as_str())
            .collect();
        assert!(purposes.contains(&"full suite"));
        assert!(purposes.contains(&"fast feedback"));
    }
}
