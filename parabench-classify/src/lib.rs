#![warn(missing_docs)]
//! Parabench Classify - Static Test Classifier
//!
//! Scans a test source tree, enumerates test units from parse trees, and
//! assigns each a parallel-safety category (`fast-isolated`, `workflow`,
//! `heavy`) from static signals in the unit body.
//!
//! Parse failures fail closed: every unit in an unparseable file is
//! excluded from classification and reported, while sibling files proceed.
//! Classification is deterministic: re-running on unchanged sources
//! yields identical assignments.

mod scanner;

pub use scanner::SourceScanner;

use parabench_core::{Category, ClassifierPolicy, TestUnit};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the classification phase.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The source tree root cannot be read at all. Fatal.
    #[error("cannot read test source tree {path}: {source}")]
    SourceTree {
        /// Root that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A policy pattern is not a valid regex. Fatal (configuration error).
    #[error("invalid classifier pattern `{pattern}`: {message}")]
    Policy {
        /// The offending pattern.
        pattern: String,
        /// Regex compiler diagnostic.
        message: String,
    },

    /// The grammar could not be loaded into the parser.
    #[error("failed to initialize source parser: {0}")]
    Parser(String),
}

/// A file excluded from classification, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileError {
    /// File path relative to the scanned root.
    pub file: String,
    /// What went wrong (syntax error, unreadable file).
    pub message: String,
}

/// Output of one classifier run: classified units plus per-file errors.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Classification {
    /// Every discovered unit, each with `category` set.
    pub units: Vec<TestUnit>,
    /// Files excluded from classification.
    pub errors: Vec<FileError>,
}

impl Classification {
    /// Group unit references by category.
    pub fn by_category(&self) -> BTreeMap<Category, Vec<&TestUnit>> {
        let mut groups: BTreeMap<Category, Vec<&TestUnit>> = BTreeMap::new();
        for unit in &self.units {
            if let Some(category) = unit.category {
                groups.entry(category).or_default().push(unit);
            }
        }
        groups
    }

    /// Node ids of all units in one category, in discovery order.
    pub fn unit_names(&self, category: Category) -> Vec<String> {
        self.units
            .iter()
            .filter(|u| u.category == Some(category))
            .map(|u| u.name.clone())
            .collect()
    }

    /// Node ids of every classified unit.
    pub fn all_unit_names(&self) -> Vec<String> {
        self.units.iter().map(|u| u.name.clone()).collect()
    }
}

/// Classify every test unit under `root` using `policy`.
///
/// Files are visited in sorted order so two runs over unchanged sources
/// produce identical output.
pub fn classify_tree(
    root: &Path,
    policy: &ClassifierPolicy,
) -> Result<Classification, ClassifyError> {
    let mut scanner = SourceScanner::new(policy)?;
    let files = collect_test_files(root)?;
    debug!(count = files.len(), "discovered test source files");

    let mut classification = Classification::default();
    for file in files {
        let rel = file
            .strip_prefix(root)
            .unwrap_or(&file)
            .to_string_lossy()
            .replace('\\', "/");

        let source = match std::fs::read_to_string(&file) {
            Ok(source) => source,
            Err(e) => {
                warn!(file = %rel, error = %e, "skipping unreadable test file");
                classification.errors.push(FileError {
                    file: rel,
                    message: format!("unreadable: {}", e),
                });
                continue;
            }
        };

        match scanner.scan_source(&rel, &source) {
            Ok(mut units) => classification.units.append(&mut units),
            Err(message) => {
                warn!(file = %rel, %message, "excluding file from classification");
                classification.errors.push(FileError { file: rel, message });
            }
        }
    }

    Ok(classification)
}

/// Collect `test_*.py` files under `root`, depth-first, sorted at each level.
fn collect_test_files(root: &Path) -> Result<Vec<PathBuf>, ClassifyError> {
    fn visit(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|e| e.path())
            .collect();
        entries.sort();

        for path in entries {
            if path.is_dir() {
                visit(&path, files)?;
            } else if is_test_file(&path) {
                files.push(path);
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    visit(root, &mut files).map_err(|source| ClassifyError::SourceTree {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(files)
}

fn is_test_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py")
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("test_"))
}
