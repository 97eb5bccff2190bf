#![warn(missing_docs)]
//! Parabench Logic - Consistency Validation and Optimization
//!
//! Pure decision logic over measured trials:
//! - the Consistency Validator compares a parallel trial against the
//!   sequential baseline and reports disagreements as suspected
//!   shared-state defects in the tested suite;
//! - the Optimizer picks the best worker count per scope under the
//!   unconditional rule that consistency dominates speed.
//!
//! No I/O happens here; the CLI feeds artifacts in and writes plans out.

mod consistency;
mod optimize;

pub use consistency::{validate, ConsistencyVerdict};
pub use optimize::{build_plan, select_best, verdicts_for, CommandTemplate, ScopeChoice};
