//! Classification policy constants.
//!
//! The thresholds and keyword lists driving classification are named,
//! overridable configuration rather than inline magic numbers, so the
//! policy can be tuned per project without code changes.

use crate::{Category, Signals};
use serde::{Deserialize, Serialize};

/// Tunable classification policy.
///
/// The defaults are deliberately conservative: a false positive toward
/// `workflow`/`heavy` merely costs parallelism, while a false negative
/// toward `fast-isolated` risks racing an unsafe test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierPolicy {
    /// Interaction count above which a unit is promoted to `workflow`.
    #[serde(default = "default_interaction_threshold")]
    pub interaction_threshold: u32,
    /// Regex patterns counted as cross-component interactions.
    #[serde(default = "default_interaction_patterns")]
    pub interaction_patterns: Vec<String>,
    /// Case-insensitive regex patterns marking multi-step sequencing.
    #[serde(default = "default_workflow_patterns")]
    pub workflow_patterns: Vec<String>,
    /// Lowercase substrings marking performance-sensitive units.
    #[serde(default = "default_slow_keywords")]
    pub slow_keywords: Vec<String>,
}

fn default_interaction_threshold() -> u32 {
    3
}

fn default_interaction_patterns() -> Vec<String> {
    vec![
        r"\.assert_called".to_string(),
        r"await \w+\.".to_string(),
        r"mock_\w+\.".to_string(),
    ]
}

fn default_workflow_patterns() -> Vec<String> {
    vec![
        r"create.*start.*stop".to_string(),
        r"lifecycle".to_string(),
        r"complete.*workflow".to_string(),
    ]
}

fn default_slow_keywords() -> Vec<String> {
    vec![
        "task_monitoring".to_string(),
        "performance".to_string(),
        "benchmark".to_string(),
        "timeout".to_string(),
    ]
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            interaction_threshold: default_interaction_threshold(),
            interaction_patterns: default_interaction_patterns(),
            workflow_patterns: default_workflow_patterns(),
            slow_keywords: default_slow_keywords(),
        }
    }
}

impl ClassifierPolicy {
    /// Apply the decision policy to a unit's signals.
    ///
    /// Priority order: slow beats workflow beats fast-isolated.
    pub fn decide(&self, signals: &Signals) -> Category {
        if signals.slow {
            Category::Heavy
        } else if signals.workflow || signals.interaction_count > self.interaction_threshold {
            Category::Workflow
        } else {
            Category::FastIsolated
        }
    }
}
