//! Report metadata collection.
//!
//! Git information degrades gracefully outside a repository; core count
//! falls back to 1 when parallelism cannot be queried.

use crate::report::{ReportMeta, SystemInfo};
use chrono::Utc;

/// Build metadata for a report generated now, on this host.
pub fn build_report_meta() -> ReportMeta {
    let git_commit = git_output(&["rev-parse", "HEAD"]);
    let git_branch = git_output(&["rev-parse", "--abbrev-ref", "HEAD"]);

    ReportMeta {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        git_commit,
        git_branch,
        system: SystemInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpu_cores: available_cores(),
        },
    }
}

/// Available logical cores; also the resolution target for `auto` workers.
pub fn available_cores() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = std::process::Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
