//! JSON output and artifact persistence.

use crate::report::BenchmarkArtifact;
use crate::ReportError;
use serde::Serialize;
use std::path::Path;

/// Generate prettified JSON for any report artifact.
pub fn generate_json<T: Serialize>(artifact: &T) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(artifact)?)
}

/// Persist an artifact to `path`, atomically.
///
/// The document is written to a sibling temp file and renamed into place,
/// so an interrupted run leaves either the previous artifact or the new
/// one, never a truncated file.
pub fn write_report<T: Serialize>(path: &Path, artifact: &T) -> Result<(), ReportError> {
    let json = generate_json(artifact)?;

    let io_err = |source: std::io::Error| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

/// Load a previously persisted benchmark artifact.
pub fn load_artifact(path: &Path) -> Result<BenchmarkArtifact, ReportError> {
    let content = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{BenchmarkReport, FULL_SUITE_SCOPE};
    use parabench_core::{TrialConfig, TrialResult, TrialStatus};
    use std::collections::BTreeMap;

    fn artifact() -> BenchmarkArtifact {
        let baseline = TrialResult::new(
            TrialConfig::baseline(Vec::new()),
            TrialStatus::Completed { exit_code: 0 },
            10.0,
            BTreeMap::new(),
        );
        let report = BenchmarkReport::new(
            FULL_SUITE_SCOPE,
            baseline,
            BTreeMap::new(),
            BTreeMap::new(),
        );
        let mut reports = BTreeMap::new();
        reports.insert(FULL_SUITE_SCOPE.to_string(), report);
        BenchmarkArtifact {
            meta: crate::build_report_meta(),
            reports,
        }
    }

    #[test]
    fn artifact_roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/benchmark.json");

        write_report(&path, &artifact()).unwrap();
        let loaded = load_artifact(&path).unwrap();
        assert!(loaded.reports.contains_key(FULL_SUITE_SCOPE));
        // No temp file left behind
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn load_missing_artifact_is_io_error() {
        let err = load_artifact(Path::new("/nonexistent/benchmark.json")).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }
}
