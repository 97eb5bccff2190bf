//! Benchmark Harness
//!
//! Runs the benchmark protocol for one unit subset: a sequential baseline
//! first, then each candidate worker count, strictly one trial at a time
//! so wall-clock measurements never contend with each other for cores.
//!
//! A baseline that cannot complete aborts the whole benchmark; without
//! it no improvement percentage is computable. Candidate trials that time
//! out are recorded as nonviable data points, not failures.

use indicatif::{ProgressBar, ProgressStyle};
use parabench_core::{TrialConfig, TrialResult};
use parabench_engine::{Engine, EngineError};
use parabench_report::BenchmarkReport;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Fatal harness errors. Everything else is data in the report.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The engine could not run a trial at all (launch failure).
    #[error("benchmark aborted: {0}")]
    Engine(#[from] EngineError),

    /// The sequential baseline did not complete.
    #[error("baseline for scope `{scope}` did not complete: {reason}")]
    Baseline {
        /// Scope whose baseline failed.
        scope: String,
        /// Why it is unusable.
        reason: String,
    },
}

/// Benchmark harness over a single engine.
pub struct Harness<'a> {
    engine: &'a dyn Engine,
    repeats: usize,
    auto_workers: u32,
}

impl<'a> Harness<'a> {
    /// Create a harness. `auto_workers` is the concrete count that
    /// `workers = 0` candidates resolve to.
    pub fn new(engine: &'a dyn Engine, repeats: usize, auto_workers: u32) -> Self {
        Self {
            engine,
            repeats: repeats.max(1),
            auto_workers: auto_workers.max(1),
        }
    }

    /// Resolve, dedupe and order the candidate worker counts.
    ///
    /// `0` becomes the auto count; `1` is dropped (the baseline already
    /// covers sequential); duplicates collapse after resolution.
    pub fn candidate_counts(&self, requested: &[u32]) -> Vec<u32> {
        let mut resolved: Vec<u32> = requested
            .iter()
            .map(|&w| if w == 0 { self.auto_workers } else { w })
            .filter(|&w| w > 1)
            .collect();
        resolved.sort_unstable();
        resolved.dedup();
        resolved
    }

    /// Run the full protocol for one scope and assemble its report.
    pub fn run_scope(
        &self,
        scope: &str,
        units: Vec<String>,
        requested_workers: &[u32],
    ) -> Result<BenchmarkReport, HarnessError> {
        let candidates = self.candidate_counts(requested_workers);
        let total_trials = (1 + candidates.len()) * self.repeats;

        let pb = ProgressBar::new(total_trials as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        // Baseline first; nothing parallel runs until it completes.
        let baseline_config = TrialConfig::baseline(units.clone());
        let (baseline, baseline_samples) = self.run_repeated(&baseline_config, &pb)?;
        if !baseline.completed() {
            pb.abandon_with_message("baseline failed");
            return Err(HarnessError::Baseline {
                scope: scope.to_string(),
                reason: format!("timed out after {:.2}s", baseline.wall_seconds),
            });
        }
        info!(
            scope,
            seconds = baseline.wall_seconds,
            units = baseline.total_units,
            "baseline complete"
        );

        let mut trials = BTreeMap::new();
        let mut samples = BTreeMap::new();
        samples.insert(baseline_config.label.clone(), baseline_samples);

        for workers in candidates {
            let label = format!("workers-{}", workers);
            let config = TrialConfig::new(workers, units.clone(), label.clone());
            let (trial, durations) = self.run_repeated(&config, &pb)?;
            if !trial.completed() {
                warn!(scope, %label, "trial timed out; recorded as nonviable");
            }
            samples.insert(label.clone(), durations);
            trials.insert(label, trial);
        }

        pb.finish_with_message(format!("scope {} complete", scope));
        Ok(BenchmarkReport::new(scope, baseline, trials, samples))
    }

    /// Run one configuration `repeats` times, sequentially.
    ///
    /// Returns the representative result (the run closest to the mean
    /// duration) plus every raw duration. Stops early on a timeout, since a
    /// nonviable configuration is not worth further samples.
    fn run_repeated(
        &self,
        config: &TrialConfig,
        pb: &ProgressBar,
    ) -> Result<(TrialResult, Vec<f64>), HarnessError> {
        let mut runs: Vec<TrialResult> = Vec::with_capacity(self.repeats);

        for repeat in 0..self.repeats {
            pb.set_message(format!("{} ({}/{})", config.label, repeat + 1, self.repeats));
            let result = self.engine.run(config)?;
            pb.inc(1);
            let timed_out = !result.completed();
            debug!(label = %config.label, seconds = result.wall_seconds, timed_out, "trial run");
            runs.push(result);
            if timed_out {
                // Skip the remaining repeats the progress bar promised.
                pb.inc((self.repeats - repeat - 1) as u64);
                break;
            }
        }

        let durations: Vec<f64> = runs.iter().map(|r| r.wall_seconds).collect();
        let mean = durations.iter().sum::<f64>() / durations.len() as f64;

        // Timed-out run (always the last) is representative by definition;
        // otherwise take the run closest to the mean. `runs` is non-empty:
        // repeats >= 1 and the loop pushes before any break.
        let rep_idx = if !runs[runs.len() - 1].completed() {
            runs.len() - 1
        } else {
            let mut best_idx = 0;
            let mut best_distance = f64::INFINITY;
            for (idx, duration) in durations.iter().enumerate() {
                let distance = (duration - mean).abs();
                if distance < best_distance {
                    best_distance = distance;
                    best_idx = idx;
                }
            }
            best_idx
        };

        Ok((runs.swap_remove(rep_idx), durations))
    }
}
