//! Report data structures and improvement arithmetic.

use chrono::{DateTime, Utc};
use parabench_core::TrialResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scope key for the whole-suite report and plan entries.
pub const FULL_SUITE_SCOPE: &str = "all";

/// Report metadata: when, where, and which planner version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Planner version that produced the artifact.
    pub version: String,
    /// UTC generation time.
    pub timestamp: DateTime<Utc>,
    /// Current git commit, if the run happened inside a repository.
    pub git_commit: Option<String>,
    /// Current git branch, if available.
    pub git_branch: Option<String>,
    /// Host the measurements were taken on.
    pub system: SystemInfo,
}

/// Host information; parallel-speedup numbers are meaningless without
/// knowing how many cores they were measured on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name.
    pub os: String,
    /// CPU architecture.
    pub arch: String,
    /// Available logical cores.
    pub cpu_cores: u32,
}

/// Measurements for one unit subset: a sequential baseline and N parallel
/// trials, with derived improvement percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Subset this report covers: a category name or [`FULL_SUITE_SCOPE`].
    pub scope: String,
    /// The sequential reference trial (workers = 1).
    pub baseline: TrialResult,
    /// Parallel trials keyed by label; worker counts are already resolved.
    pub trials: BTreeMap<String, TrialResult>,
    /// Label → improvement percentage over baseline, clamped at 0.
    ///
    /// Only completed trials get an entry; timed-out trials are nonviable
    /// and carry no improvement number.
    pub improvement: BTreeMap<String, f64>,
    /// Label → raw per-repeat durations in seconds, baseline included.
    /// Unclamped and unaveraged; kept for diagnostics.
    pub samples: BTreeMap<String, Vec<f64>>,
}

impl BenchmarkReport {
    /// Assemble a report, deriving improvement percentages from the mean
    /// duration per label.
    pub fn new(
        scope: impl Into<String>,
        baseline: TrialResult,
        trials: BTreeMap<String, TrialResult>,
        samples: BTreeMap<String, Vec<f64>>,
    ) -> Self {
        let baseline_mean = samples
            .get(&baseline.config.label)
            .map(|s| mean(s))
            .unwrap_or(baseline.wall_seconds);

        let mut improvement = BTreeMap::new();
        for (label, trial) in &trials {
            if !trial.completed() {
                continue;
            }
            let trial_mean = samples
                .get(label)
                .map(|s| mean(s))
                .unwrap_or(trial.wall_seconds);
            improvement.insert(
                label.clone(),
                improvement_percentage(baseline_mean, trial_mean),
            );
        }

        Self {
            scope: scope.into(),
            baseline,
            trials,
            improvement,
            samples,
        }
    }

    /// Mean duration for a label, falling back to the stored trial result.
    pub fn mean_seconds(&self, label: &str) -> Option<f64> {
        if let Some(samples) = self.samples.get(label) {
            if !samples.is_empty() {
                return Some(mean(samples));
            }
        }
        if label == self.baseline.config.label {
            return Some(self.baseline.wall_seconds);
        }
        self.trials.get(label).map(|t| t.wall_seconds)
    }
}

/// The benchmark phase's terminal artifact: one report per scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkArtifact {
    /// Generation metadata.
    pub meta: ReportMeta,
    /// Reports keyed by scope (`all` plus each benchmarked category).
    pub reports: BTreeMap<String, BenchmarkReport>,
}

/// Chosen configuration for one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopePlan {
    /// Recommended worker count (1 when nothing consistent was faster).
    pub workers: u32,
    /// Measured duration of the winning configuration, in seconds.
    pub seconds: f64,
    /// Rendered engine invocation for this scope.
    pub command: String,
}

/// A labeled invocation recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// What the command is for (e.g. `fast feedback`).
    pub purpose: String,
    /// The command line to run.
    pub command: String,
}

/// The optimizer's terminal artifact. Write-once, read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationPlan {
    /// Generation metadata.
    pub meta: ReportMeta,
    /// Chosen configuration per category, plus the full-suite entry.
    pub per_category: BTreeMap<String, ScopePlan>,
    /// Rendered invocation recommendations for humans and CI.
    pub recommendations: Vec<Recommendation>,
}

/// Improvement of `trial` over `baseline`, in percent, clamped at 0.
///
/// A slower parallel run is "no improvement", not a negative number. The
/// clamp keeps downstream comparisons monotonic. Raw durations stay
/// available unclamped in [`BenchmarkReport::samples`].
pub fn improvement_percentage(baseline_seconds: f64, trial_seconds: f64) -> f64 {
    if baseline_seconds <= 0.0 {
        return 0.0;
    }
    let pct = (baseline_seconds - trial_seconds) / baseline_seconds * 100.0;
    pct.max(0.0)
}

/// Whether an improvement percentage satisfies a whole-percent gate.
///
/// The fractional part is truncated, not rounded, so a 49.6% improvement
/// never satisfies a 50% gate; boundary results must not flap between
/// runs.
pub fn meets_gate(improvement: f64, gate_percent: u32) -> bool {
    (improvement.trunc() as i64) >= gate_percent as i64
}

fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    }
}
