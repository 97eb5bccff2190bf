#![warn(missing_docs)]
//! # Parabench
//!
//! Test-parallelization planner: decide how parallel a test suite can
//! safely run, and with how many workers.
//!
//! The pipeline:
//! - **Classify**: parse the test sources and assign each unit a
//!   parallel-safety category (`fast-isolated`, `workflow`, `heavy`)
//!   from static signals: mock interaction density, lifecycle
//!   sequencing, performance sensitivity.
//! - **Benchmark**: run the external test engine sequentially as a
//!   baseline, then under candidate worker counts, measuring wall-clock
//!   time from the outside. Trials never overlap.
//! - **Validate**: compare parallel per-unit outcomes against the
//!   baseline; disagreements are suspected shared-state defects in the
//!   suite, surfaced by unit name.
//! - **Optimize**: recommend the fastest worker count per category among
//!   configurations that agree with the baseline; consistency dominates
//!   speed, unconditionally.
//!
//! The engine integration is a typed boundary ([`Engine`]); anything
//! that can run a named subset of tests with a worker count and report
//! per-unit outcomes can sit behind it.

// Re-export the data model
pub use parabench_core::{
    Category, ClassifierPolicy, Signals, TestUnit, TrialConfig, TrialResult, TrialStatus,
    UnitOutcome, WORKERS_AUTO,
};

// Classifier
pub use parabench_classify::{classify_tree, Classification, ClassifyError, SourceScanner};

// Trial runner
pub use parabench_engine::{CommandEngine, Engine, EngineCommand, EngineError};

// Validation and optimization
pub use parabench_logic::{
    build_plan, select_best, validate, verdicts_for, CommandTemplate, ConsistencyVerdict,
};

// Artifacts
pub use parabench_report::{
    build_report_meta, improvement_percentage, meets_gate, BenchmarkArtifact, BenchmarkReport,
    OptimizationPlan, Recommendation, ReportError, ScopePlan,
};

// Harness and configuration
pub use parabench_cli::{Harness, HarnessError, ParabenchConfig};

/// Run the Parabench CLI.
///
/// Call this from a binary's `main()`:
/// ```ignore
/// fn main() {
///     if let Err(e) = parabench::run() {
///         eprintln!("error: {e:#}");
///         std::process::exit(1);
///     }
/// }
/// ```
pub use parabench_cli::run;
