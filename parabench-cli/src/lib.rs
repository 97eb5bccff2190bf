#![warn(missing_docs)]
//! Parabench CLI
//!
//! Command surface of the planner:
//! - `classify`: assign a parallel-safety category to every test unit
//! - `benchmark`: measure sequential vs parallel execution per scope
//! - `validate-consistency`: compare parallel outcomes to the baseline
//! - `optimize`: derive the recommended worker configuration
//!
//! Every subcommand exits 0 on success and nonzero on a fatal condition;
//! consistency mismatches and non-improvements are findings in the
//! artifacts, not process failures.

mod config;
mod harness;

pub use config::*;
pub use harness::{Harness, HarnessError};

use anyhow::Context;
use clap::{Parser, Subcommand};
use parabench_classify::{classify_tree, Classification};
use parabench_core::Category;
use parabench_engine::{CommandEngine, EngineCommand};
use parabench_logic::{build_plan, verdicts_for, CommandTemplate};
use parabench_report::{
    available_cores, build_report_meta, format_benchmark_human, format_plan_human, load_artifact,
    meets_gate, write_report, BenchmarkArtifact,
};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Parabench CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "parabench")]
#[command(author, version, about = "Parabench - test parallelization planner")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify test units by parallel-safety category.
    Classify {
        /// Test source tree (overrides parabench.toml).
        #[arg(long)]
        tests: Option<PathBuf>,
        /// Output format: human, json.
        #[arg(long, default_value = "human")]
        format: String,
        /// Output file (stdout if not specified).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Benchmark sequential vs parallel execution and persist the report.
    Benchmark {
        /// Restrict per-category scopes to these categories.
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
        /// Candidate worker counts; 0 means engine default/auto.
        #[arg(long, value_delimiter = ',')]
        workers: Vec<i64>,
        /// Test source tree (overrides parabench.toml).
        #[arg(long)]
        tests: Option<PathBuf>,
        /// Artifact path (defaults to target/parabench/benchmark.json).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare parallel trial outcomes against the sequential baseline.
    ValidateConsistency {
        /// Benchmark artifact to validate.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Derive the recommended worker configuration from a benchmark artifact.
    Optimize {
        /// Benchmark artifact to optimize from.
        #[arg(long)]
        report: Option<PathBuf>,
        /// Plan path (defaults to target/parabench/plan.json).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run the CLI with arguments from the process environment.
pub fn run() -> anyhow::Result<()> {
    run_with_cli(Cli::parse())
}

/// Run the CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("parabench=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("parabench=info")
            .init();
    }

    let config = ParabenchConfig::discover().unwrap_or_default();

    match cli.command {
        Commands::Classify {
            tests,
            format,
            output,
        } => run_classify(&config, tests, &format, output),
        Commands::Benchmark {
            categories,
            workers,
            tests,
            output,
        } => run_benchmark(&config, &categories, &workers, tests, output),
        Commands::ValidateConsistency { report } => run_validate(&config, report),
        Commands::Optimize { report, output } => run_optimize(&config, report, output),
    }
}

fn run_classify(
    config: &ParabenchConfig,
    tests: Option<PathBuf>,
    format: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let root = tests.unwrap_or_else(|| PathBuf::from(&config.engine.tests));
    let classification = classify_tree(&root, &config.classifier)
        .context("classification phase failed")?;

    let text = match format {
        "json" => serde_json::to_string_pretty(&classification)
            .context("classification phase failed to encode output")?,
        _ => format_classification(&classification),
    };

    emit(output.as_deref(), &text)?;
    Ok(())
}

fn run_benchmark(
    config: &ParabenchConfig,
    categories: &[String],
    workers: &[i64],
    tests: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let root = tests.unwrap_or_else(|| PathBuf::from(&config.engine.tests));

    let classification = classify_tree(&root, &config.classifier)
        .context("benchmark aborted in classification phase")?;
    anyhow::ensure!(
        !classification.units.is_empty(),
        "benchmark aborted: no test units discovered under {}",
        root.display()
    );
    for error in &classification.errors {
        warn!(file = %error.file, message = %error.message, "file excluded from classification");
    }

    let worker_counts = if workers.is_empty() {
        config.benchmark.workers.clone()
    } else {
        parse_worker_counts(workers)?
    };
    let selected = selected_categories(categories, &classification)?;

    let engine = CommandEngine::new(engine_command(config, &root)?);
    let harness = Harness::new(&engine, config.benchmark.repeats, available_cores());

    let mut reports = BTreeMap::new();
    // Full suite first; the engine gets the bare tree rather than an
    // explicit node-id list.
    let all = harness
        .run_scope(parabench_report::FULL_SUITE_SCOPE, Vec::new(), &worker_counts)
        .context("benchmark aborted in harness phase (scope: all)")?;
    reports.insert(parabench_report::FULL_SUITE_SCOPE.to_string(), all);

    for category in selected {
        let units = classification.unit_names(category);
        if units.is_empty() {
            info!(category = %category, "no units in category, skipping scope");
            continue;
        }
        let report = harness
            .run_scope(category.name(), units, &worker_counts)
            .with_context(|| format!("benchmark aborted in harness phase (scope: {})", category))?;
        reports.insert(category.name().to_string(), report);
    }

    let artifact = BenchmarkArtifact {
        meta: build_report_meta(),
        reports,
    };
    let path = output.unwrap_or_else(|| config.benchmark_path());
    write_report(&path, &artifact).context("benchmark report could not be persisted")?;

    print!("{}", format_benchmark_human(&artifact));
    println!("Report written to: {}", path.display());

    for (scope, report) in &artifact.reports {
        let best = report
            .improvement
            .values()
            .fold(0.0_f64, |acc, &pct| acc.max(pct));
        if meets_gate(best, config.benchmark.min_improvement) {
            info!(scope = %scope, best = best.trunc(), "improvement gate satisfied");
        } else {
            warn!(
                scope = %scope,
                best = best.trunc(),
                gate = config.benchmark.min_improvement,
                "no configuration met the improvement gate"
            );
        }
    }

    Ok(())
}

fn run_validate(config: &ParabenchConfig, report: Option<PathBuf>) -> anyhow::Result<()> {
    let path = report.unwrap_or_else(|| config.benchmark_path());
    let artifact = load_artifact(&path)
        .with_context(|| format!("validation aborted: cannot load {}", path.display()))?;

    let mut mismatched_trials = 0usize;
    println!("\nConsistency Validation");
    println!("{}", "=".repeat(60));

    for (scope, report) in &artifact.reports {
        println!("Scope: {}", scope);
        for (label, verdict) in verdicts_for(report) {
            if verdict.is_consistent() {
                println!("  ✓ {}", label);
            } else {
                mismatched_trials += 1;
                println!(
                    "  ✗ {} (exit match: {}, outcomes match: {})",
                    label, verdict.exit_status_match, verdict.outcome_set_match
                );
                for unit in &verdict.mismatched {
                    println!("      mismatched unit: {}", unit);
                }
            }
        }
    }

    if mismatched_trials == 0 {
        println!("\nNo consistency mismatches detected.");
    } else {
        // A finding about the tested suite, not a planner failure: the
        // listed units are suspected of shared mutable state or ordering
        // dependencies. Exit code stays 0.
        println!(
            "\n{} trial(s) disagree with the baseline; the listed units are suspected shared-state defects.",
            mismatched_trials
        );
    }

    Ok(())
}

fn run_optimize(
    config: &ParabenchConfig,
    report: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let path = report.unwrap_or_else(|| config.benchmark_path());
    let artifact = load_artifact(&path)
        .with_context(|| format!("optimization aborted: cannot load {}", path.display()))?;

    let template = CommandTemplate {
        program: config.engine.command.clone(),
        workers_flag: config.engine.workers_flag.clone(),
        selector_flag: config.engine.selector_flag.clone(),
    };
    let plan = build_plan(&artifact, &template, build_report_meta());

    let out = output.unwrap_or_else(|| config.plan_path());
    write_report(&out, &plan).context("optimization plan could not be persisted")?;

    print!("{}", format_plan_human(&plan));
    println!("Plan written to: {}", out.display());
    Ok(())
}

/// Build the engine invocation template from configuration.
fn engine_command(config: &ParabenchConfig, tests_root: &Path) -> anyhow::Result<EngineCommand> {
    Ok(EngineCommand {
        program: config.engine.command.clone(),
        args: config.engine.args.clone(),
        workers_flag: config.engine.workers_flag.clone(),
        tests_path: tests_root.to_string_lossy().into_owned(),
        timeout: config.trial_timeout()?,
    })
}

/// Validate CLI worker counts. Negative counts are malformed configs and
/// fatal; 0 stays as the auto sentinel for the harness to resolve.
fn parse_worker_counts(workers: &[i64]) -> anyhow::Result<Vec<u32>> {
    workers
        .iter()
        .map(|&w| {
            if w < 0 {
                Err(anyhow::anyhow!("invalid worker count: {}", w))
            } else {
                Ok(w as u32)
            }
        })
        .collect()
}

/// Resolve requested category names, defaulting to every category present.
fn selected_categories(
    requested: &[String],
    classification: &Classification,
) -> anyhow::Result<Vec<Category>> {
    if requested.is_empty() {
        let present: Vec<Category> = Category::ALL
            .into_iter()
            .filter(|c| classification.units.iter().any(|u| u.category == Some(*c)))
            .collect();
        return Ok(present);
    }

    requested
        .iter()
        .map(|name| {
            name.parse::<Category>()
                .map_err(|e| anyhow::anyhow!("invalid --categories value: {}", e))
        })
        .collect()
}

/// Human-readable classification listing.
fn format_classification(classification: &Classification) -> String {
    let mut output = String::new();
    output.push_str("Parabench Classification:\n");

    for (category, units) in classification.by_category() {
        output.push_str(&format!("├── {} ({})\n", category, units.len()));
        for unit in units {
            output.push_str(&format!("│   ├── {} ({}:{})\n", unit.name, unit.file, unit.line));
        }
    }
    output.push_str(&format!("{} units classified.\n", classification.units.len()));

    if !classification.errors.is_empty() {
        output.push_str(&format!(
            "{} file(s) excluded from classification:\n",
            classification.errors.len()
        ));
        for error in &classification.errors {
            output.push_str(&format!("  {}: {}\n", error.file, error.message));
        }
    }

    output
}

fn emit(output: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("cannot write output to {}", path.display()))?;
            file.write_all(text.as_bytes())?;
            println!("Output written to: {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}
