#![warn(missing_docs)]
//! Parabench Engine - Trial Runner
//!
//! Invokes the external test-execution engine as a subprocess and turns
//! one invocation into one [`TrialResult`]. The integration is a typed
//! boundary; anything implementing [`Engine`] can stand in for the real
//! runner, so the harness, validator and optimizer never touch process
//! plumbing.
//!
//! Wall-clock timing is measured here, around the whole child lifetime;
//! the engine's self-reported timing is not trusted (it tends to exclude
//! startup and teardown).

mod command;
mod stream;

pub use command::{CommandEngine, EngineCommand};
pub use stream::parse_outcome_line;

use parabench_core::{TrialConfig, TrialResult};
use thiserror::Error;

/// Errors from running a trial.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine process could not be started. Fatal configuration error:
    /// aborts the whole benchmark run.
    #[error("failed to launch engine `{program}`: {source}")]
    Launch {
        /// The program we tried to execute.
        program: String,
        /// Underlying spawn error (missing executable, permissions).
        source: std::io::Error,
    },

    /// The trial config still carries the `auto` worker count.
    ///
    /// Worker counts must be resolved to concrete integers before a trial
    /// runs; reaching this point is a harness bug, not an engine problem.
    #[error("trial `{label}` has an unresolved auto worker count")]
    UnresolvedWorkers {
        /// Label of the offending config.
        label: String,
    },

    /// I/O error while capturing engine output.
    #[error("engine output error: {0}")]
    Output(#[from] std::io::Error),
}

/// The boundary to the external test-execution engine.
///
/// One call is one trial: spawn, wait, collect per-unit outcomes.
/// Implementations must not retry and must not mutate the source tree.
pub trait Engine {
    /// Run one trial under the given (resolved) configuration.
    fn run(&self, config: &TrialConfig) -> Result<TrialResult, EngineError>;
}

/// Any closure with the right shape is an engine; keeps the harness
/// testable without a subprocess.
impl<F> Engine for F
where
    F: Fn(&TrialConfig) -> Result<TrialResult, EngineError>,
{
    fn run(&self, config: &TrialConfig) -> Result<TrialResult, EngineError> {
        self(config)
    }
}
