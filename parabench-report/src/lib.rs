#![warn(missing_docs)]
//! Parabench Report - Persisted Artifacts
//!
//! The two documents a run leaves behind:
//! - `BenchmarkArtifact`: baseline + parallel trial measurements per scope
//! - `OptimizationPlan`: recommended worker count per scope plus rendered
//!   invocation commands
//!
//! Both are written as JSON to well-known paths (atomically; a crashed
//! run never leaves a half-written artifact) and rendered for terminals.

mod human;
mod json;
mod meta;
mod report;

pub use human::{format_benchmark_human, format_plan_human};
pub use json::{generate_json, load_artifact, write_report};
pub use meta::{available_cores, build_report_meta};
pub use report::{
    improvement_percentage, meets_gate, BenchmarkArtifact, BenchmarkReport, OptimizationPlan,
    Recommendation, ReportMeta, ScopePlan, SystemInfo, FULL_SUITE_SCOPE,
};

use thiserror::Error;

/// Errors while producing or loading report artifacts.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization failure.
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),

    /// Filesystem failure while persisting or loading.
    #[error("report I/O error at {path}: {source}")]
    Io {
        /// Path involved.
        path: std::path::PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}
