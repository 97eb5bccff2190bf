//! Test units and their classification categories.

use serde::{Deserialize, Serialize};

/// Parallel-safety tier assigned by the classifier.
///
/// Ordering is from least to most conservative; ties in classification
/// always resolve toward the more conservative tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// No cross-component interaction detected; safe at high worker counts.
    FastIsolated,
    /// Multi-step sequencing or heavy mock interaction; bounded concurrency.
    Workflow,
    /// Performance-sensitive, timeout-driven or monitoring tests; run alone.
    Heavy,
}

impl Category {
    /// All categories, in classification order.
    pub const ALL: [Category; 3] = [Category::FastIsolated, Category::Workflow, Category::Heavy];

    /// Marker name used when rendering engine invocations (e.g. `-m fast_isolated`).
    pub fn marker(self) -> &'static str {
        match self {
            Category::FastIsolated => "fast_isolated",
            Category::Workflow => "workflow",
            Category::Heavy => "heavy",
        }
    }

    /// Kebab-case display name matching the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            Category::FastIsolated => "fast-isolated",
            Category::Workflow => "workflow",
            Category::Heavy => "heavy",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fast-isolated" | "fast_isolated" => Ok(Category::FastIsolated),
            "workflow" => Ok(Category::Workflow),
            "heavy" => Ok(Category::Heavy),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Static signals computed from a test unit's body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    /// Occurrences of assertion-on-mock / cross-component-call patterns.
    pub interaction_count: u32,
    /// Multi-step sequencing detected (lifecycle, create→start→stop, ...).
    pub workflow: bool,
    /// Performance sensitivity detected (timeouts, monitoring loops, ...).
    pub slow: bool,
}

/// A single named, independently executable test case.
///
/// Identity is the `name` string, a node id of the form
/// `path/to/test_file.py::TestClass::test_name`. Units are re-discovered
/// fresh on every classifier run; nothing persists across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestUnit {
    /// Stable unique node id.
    pub name: String,
    /// Source file, relative to the scanned tree.
    pub file: String,
    /// 1-indexed line of the definition.
    pub line: u32,
    /// Enclosing test class, if any.
    pub class_name: Option<String>,
    /// Classification signals computed from the body.
    pub signals: Signals,
    /// Category assigned by the classifier; written exactly once.
    pub category: Option<Category>,
}

impl TestUnit {
    /// Build the node id for a unit.
    pub fn node_id(file: &str, class_name: Option<&str>, name: &str) -> String {
        match class_name {
            Some(class) => format!("{}::{}::{}", file, class, name),
            None => format!("{}::{}", file, name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_roundtrip() {
        for cat in Category::ALL {
            let parsed: Category = cat.name().parse().unwrap();
            assert_eq!(parsed, cat);
        }
    }

    #[test]
    fn category_serializes_kebab_case() {
        let json = serde_json::to_string(&Category::FastIsolated).unwrap();
        assert_eq!(json, "\"fast-isolated\"");
    }

    #[test]
    fn node_id_with_and_without_class() {
        assert_eq!(
            TestUnit::node_id("tests/test_vm.py", Some("TestStartVm"), "test_ok"),
            "tests/test_vm.py::TestStartVm::test_ok"
        );
        assert_eq!(
            TestUnit::node_id("tests/test_vm.py", None, "test_ok"),
            "tests/test_vm.py::test_ok"
        );
    }
}
