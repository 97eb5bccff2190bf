//! Trial configuration and results.
//!
//! A trial is one full execution of (a subset of) the suite under a fixed
//! concurrency configuration. Results are owned by the harness that
//! requested them and never mutated after construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved worker count meaning "engine default/auto".
///
/// Must be resolved to a concrete count before any comparison logic runs.
pub const WORKERS_AUTO: u32 = 0;

/// Immutable description of one trial: worker count, unit subset, label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialConfig {
    /// Worker count; `1` is sequential, [`WORKERS_AUTO`] is engine default.
    pub workers: u32,
    /// Unit node ids to run; empty means the full suite.
    pub units: Vec<String>,
    /// Human-readable label (e.g. `baseline`, `workers-4`).
    pub label: String,
}

impl TrialConfig {
    /// Create a config for the given worker count and subset.
    pub fn new(workers: u32, units: Vec<String>, label: impl Into<String>) -> Self {
        Self {
            workers,
            units,
            label: label.into(),
        }
    }

    /// Sequential baseline over the given subset.
    pub fn baseline(units: Vec<String>) -> Self {
        Self::new(1, units, "baseline")
    }

    /// Whether this config requests the engine's default worker count.
    pub fn is_auto(&self) -> bool {
        self.workers == WORKERS_AUTO
    }

    /// Resolve `auto` to a concrete worker count.
    pub fn resolve(mut self, auto_workers: u32) -> Self {
        if self.is_auto() {
            self.workers = auto_workers.max(1);
        }
        self
    }
}

/// Final outcome of a single test unit within a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitOutcome {
    /// Unit passed.
    Passed,
    /// Unit failed an assertion.
    Failed,
    /// Unit errored outside its assertions (collection error, fixture error).
    Error,
}

/// How a trial ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TrialStatus {
    /// The engine process ran to completion with this exit code.
    Completed {
        /// Raw process exit code; `0` means the engine considered the run green.
        exit_code: i32,
    },
    /// The trial exceeded its wall-clock ceiling and was terminated.
    ///
    /// Timed-out trials are nonviable: excluded from optimization, never
    /// treated as a crash of the planner itself.
    TimedOut,
}

/// Result of one engine invocation.
///
/// The outcome map is keyed by unit node id; execution order is
/// deliberately not represented; only the final outcome per unit matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    /// The configuration this trial ran under (workers already resolved).
    pub config: TrialConfig,
    /// Completion status.
    pub status: TrialStatus,
    /// Wall-clock duration in fractional seconds, measured by the harness.
    pub wall_seconds: f64,
    /// Final outcome per unit node id.
    pub outcomes: BTreeMap<String, UnitOutcome>,
    /// Total units observed; always equals `outcomes.len()`.
    pub total_units: usize,
}

impl TrialResult {
    /// Construct a result; `total_units` is derived from the outcome map.
    pub fn new(
        config: TrialConfig,
        status: TrialStatus,
        wall_seconds: f64,
        outcomes: BTreeMap<String, UnitOutcome>,
    ) -> Self {
        let total_units = outcomes.len();
        Self {
            config,
            status,
            wall_seconds,
            outcomes,
            total_units,
        }
    }

    /// Overall pass/fail, or `None` for a timed-out trial.
    pub fn succeeded(&self) -> Option<bool> {
        match self.status {
            TrialStatus::Completed { exit_code } => Some(exit_code == 0),
            TrialStatus::TimedOut => None,
        }
    }

    /// Whether the trial ran to completion (regardless of exit code).
    pub fn completed(&self) -> bool {
        matches!(self.status, TrialStatus::Completed { .. })
    }
}
