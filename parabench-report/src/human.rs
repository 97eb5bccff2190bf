//! Human-readable terminal output.

use crate::report::{BenchmarkArtifact, OptimizationPlan};
use parabench_core::TrialStatus;

/// Format a benchmark artifact for terminal display.
pub fn format_benchmark_human(artifact: &BenchmarkArtifact) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("Parabench Benchmark Results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    for (scope, report) in &artifact.reports {
        output.push_str(&format!("Scope: {}\n", scope));
        output.push_str(&"-".repeat(60));
        output.push('\n');

        let baseline_label = report.baseline.config.label.clone();
        let baseline_mean = report.mean_seconds(&baseline_label).unwrap_or(0.0);
        output.push_str(&format!(
            "  baseline (1 worker): {:>7.2}s  units: {}  {}\n",
            baseline_mean,
            report.baseline.total_units,
            exit_summary(&report.baseline.status),
        ));

        for (label, trial) in &report.trials {
            match trial.status {
                TrialStatus::Completed { .. } => {
                    let mean = report.mean_seconds(label).unwrap_or(trial.wall_seconds);
                    let pct = report.improvement.get(label).copied().unwrap_or(0.0);
                    let speedup = if mean > 0.0 { baseline_mean / mean } else { 0.0 };
                    output.push_str(&format!(
                        "  {:>4} workers: {:>7.2}s  ({:>5.1}% faster, {:.1}x speedup)  {}\n",
                        trial.config.workers,
                        mean,
                        pct,
                        speedup,
                        exit_summary(&trial.status),
                    ));
                }
                TrialStatus::TimedOut => {
                    output.push_str(&format!(
                        "  {:>4} workers: TIMED OUT after {:.2}s (nonviable)\n",
                        trial.config.workers, trial.wall_seconds,
                    ));
                }
            }
        }
        output.push('\n');
    }

    output
}

/// Format an optimization plan for terminal display.
pub fn format_plan_human(plan: &OptimizationPlan) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("Optimal Configurations\n");
    output.push_str(&"=".repeat(60));
    output.push('\n');

    for (scope, entry) in &plan.per_category {
        output.push_str(&format!(
            "  {:>14}: {:>3} workers ({:.2}s)\n",
            scope, entry.workers, entry.seconds
        ));
    }

    output.push_str("\nRecommended Commands\n");
    output.push_str(&"=".repeat(60));
    output.push('\n');

    let width = plan
        .recommendations
        .iter()
        .map(|r| r.purpose.len())
        .max()
        .unwrap_or(12);
    for rec in &plan.recommendations {
        output.push_str(&format!(
            "  {:>w$}: {}\n",
            rec.purpose,
            rec.command,
            w = width
        ));
    }

    output
}

fn exit_summary(status: &TrialStatus) -> &'static str {
    match status {
        TrialStatus::Completed { exit_code: 0 } => "✓",
        TrialStatus::Completed { .. } => "✗ (nonzero exit)",
        TrialStatus::TimedOut => "⏱",
    }
}
