//! Configuration loading from parabench.toml
//!
//! Planner configuration can be specified in a `parabench.toml` file in
//! the project root, discovered by walking up from the current directory.
//! CLI flags override file values; every section has workable defaults.

use parabench_core::ClassifierPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Planner configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParabenchConfig {
    /// External test-execution engine invocation.
    #[serde(default)]
    pub engine: EngineSection,
    /// Classification policy overrides.
    #[serde(default)]
    pub classifier: ClassifierPolicy,
    /// Benchmark protocol settings.
    #[serde(default)]
    pub benchmark: BenchmarkSection,
    /// Artifact locations.
    #[serde(default)]
    pub output: OutputSection,
}

/// How to invoke the external test runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSection {
    /// Engine program.
    #[serde(default = "default_command")]
    pub command: String,
    /// Base arguments passed on every invocation.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Flag carrying the worker count.
    #[serde(default = "default_workers_flag")]
    pub workers_flag: String,
    /// Flag used when rendering category-scoped recommendations.
    #[serde(default = "default_selector_flag")]
    pub selector_flag: String,
    /// Test source tree, also handed to the engine for full-suite runs.
    #[serde(default = "default_tests")]
    pub tests: String,
    /// Wall-clock ceiling for one trial (e.g. "300s", "5m").
    #[serde(default = "default_trial_timeout")]
    pub timeout: String,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            workers_flag: default_workers_flag(),
            selector_flag: default_selector_flag(),
            tests: default_tests(),
            timeout: default_trial_timeout(),
        }
    }
}

fn default_command() -> String {
    "pytest".to_string()
}
fn default_args() -> Vec<String> {
    vec!["--tb=no".to_string(), "-q".to_string()]
}
fn default_workers_flag() -> String {
    "-n".to_string()
}
fn default_selector_flag() -> String {
    "-m".to_string()
}
fn default_tests() -> String {
    "tests".to_string()
}
fn default_trial_timeout() -> String {
    "300s".to_string()
}

/// Benchmark protocol settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSection {
    /// Candidate worker counts; `0` means "engine default/auto" and is
    /// resolved to the available core count before any trial runs.
    #[serde(default = "default_worker_counts")]
    pub workers: Vec<u32>,
    /// Trials per configuration; durations are averaged across repeats.
    #[serde(default = "default_repeats")]
    pub repeats: usize,
    /// Whole-percent improvement gate used in the benchmark summary.
    /// Compared against the truncated improvement percentage.
    #[serde(default = "default_min_improvement")]
    pub min_improvement: u32,
}

impl Default for BenchmarkSection {
    fn default() -> Self {
        Self {
            workers: default_worker_counts(),
            repeats: default_repeats(),
            min_improvement: default_min_improvement(),
        }
    }
}

fn default_worker_counts() -> Vec<u32> {
    vec![2, 4, 0]
}
fn default_repeats() -> usize {
    1
}
fn default_min_improvement() -> u32 {
    25
}

/// Where artifacts are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    /// Directory for report artifacts.
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Benchmark artifact file name.
    #[serde(default = "default_benchmark_file")]
    pub benchmark_file: String,
    /// Optimization plan file name.
    #[serde(default = "default_plan_file")]
    pub plan_file: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            benchmark_file: default_benchmark_file(),
            plan_file: default_plan_file(),
        }
    }
}

fn default_output_dir() -> String {
    "target/parabench".to_string()
}
fn default_benchmark_file() -> String {
    "benchmark.json".to_string()
}
fn default_plan_file() -> String {
    "plan.json".to_string()
}

impl ParabenchConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Discover and load configuration by walking up from the current directory.
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("parabench.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Benchmark artifact path.
    pub fn benchmark_path(&self) -> std::path::PathBuf {
        Path::new(&self.output.directory).join(&self.output.benchmark_file)
    }

    /// Optimization plan path.
    pub fn plan_path(&self) -> std::path::PathBuf {
        Path::new(&self.output.directory).join(&self.output.plan_file)
    }

    /// Parse a duration string (e.g. "3s", "500ms", "2m") to nanoseconds.
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("empty duration string"));
        }

        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid duration number: {}", num_part))?;

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }

    /// Trial timeout as a `Duration`.
    pub fn trial_timeout(&self) -> anyhow::Result<std::time::Duration> {
        let nanos = Self::parse_duration(&self.engine.timeout)?;
        Ok(std::time::Duration::from_nanos(nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_usable() {
        let config = ParabenchConfig::default();
        assert_eq!(config.engine.command, "pytest");
        assert_eq!(config.benchmark.workers, vec![2, 4, 0]);
        assert_eq!(config.benchmark.repeats, 1);
        assert_eq!(config.classifier.interaction_threshold, 3);
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(ParabenchConfig::parse_duration("3s").unwrap(), 3_000_000_000);
        assert_eq!(ParabenchConfig::parse_duration("500ms").unwrap(), 500_000_000);
        assert_eq!(ParabenchConfig::parse_duration("2m").unwrap(), 120_000_000_000);
        assert_eq!(ParabenchConfig::parse_duration("1.5s").unwrap(), 1_500_000_000);
        assert!(ParabenchConfig::parse_duration("").is_err());
        assert!(ParabenchConfig::parse_duration("5 fortnights").is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml_str = r#"
            [engine]
            command = "pytest"
            timeout = "60s"

            [benchmark]
            workers = [2, 8]
            repeats = 3
        "#;
        let config: ParabenchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.timeout, "60s");
        assert_eq!(config.benchmark.workers, vec![2, 8]);
        assert_eq!(config.benchmark.repeats, 3);
        // Untouched sections keep defaults
        assert_eq!(config.output.directory, "target/parabench");
        assert_eq!(config.engine.workers_flag, "-n");
    }

    #[test]
    fn classifier_policy_is_overridable() {
        let toml_str = r#"
            [classifier]
            interaction_threshold = 5
            slow_keywords = ["perf_probe"]
        "#;
        let config: ParabenchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.classifier.interaction_threshold, 5);
        assert_eq!(config.classifier.slow_keywords, vec!["perf_probe"]);
        // Unset lists keep their defaults
        assert!(!config.classifier.workflow_patterns.is_empty());
    }
}
