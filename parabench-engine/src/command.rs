//! Subprocess-backed engine.
//!
//! Spawns the configured test runner, brackets its whole lifetime with an
//! `Instant`, and decodes the outcome stream from captured stdout. A trial
//! that exceeds its ceiling is shut down the graceful way: SIGTERM, a
//! bounded drain window, then SIGKILL.

use crate::stream::parse_outcome_line;
use crate::{Engine, EngineError};
use parabench_core::{TrialConfig, TrialResult, TrialStatus, UnitOutcome};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long to wait for the child to exit after SIGTERM before SIGKILL.
const DRAIN_WINDOW: Duration = Duration::from_millis(500);

/// Poll interval while waiting for the child.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Invocation template for the external test runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// Program to execute (e.g. `pytest`).
    pub program: String,
    /// Base arguments passed on every invocation.
    pub args: Vec<String>,
    /// Flag carrying the worker count (passed only when workers > 1;
    /// sequential runs are the bare invocation).
    pub workers_flag: String,
    /// Path handed to the engine when no unit subset is given.
    pub tests_path: String,
    /// Wall-clock ceiling for one trial.
    pub timeout: Duration,
}

impl Default for EngineCommand {
    fn default() -> Self {
        Self {
            program: "pytest".to_string(),
            args: vec!["--tb=no".to_string(), "-q".to_string()],
            workers_flag: "-n".to_string(),
            tests_path: "tests".to_string(),
            timeout: Duration::from_secs(300),
        }
    }
}

/// [`Engine`] implementation that shells out to the configured runner.
pub struct CommandEngine {
    command: EngineCommand,
}

impl CommandEngine {
    /// Create an engine from an invocation template.
    pub fn new(command: EngineCommand) -> Self {
        Self { command }
    }

    /// Arguments for one trial, without the program itself.
    fn argv(&self, config: &TrialConfig) -> Vec<String> {
        let mut argv = self.command.args.clone();
        if config.workers > 1 {
            argv.push(self.command.workers_flag.clone());
            argv.push(config.workers.to_string());
        }
        if config.units.is_empty() {
            argv.push(self.command.tests_path.clone());
        } else {
            argv.extend(config.units.iter().cloned());
        }
        argv
    }
}

impl Engine for CommandEngine {
    fn run(&self, config: &TrialConfig) -> Result<TrialResult, EngineError> {
        if config.is_auto() {
            return Err(EngineError::UnresolvedWorkers {
                label: config.label.clone(),
            });
        }

        let argv = self.argv(config);
        debug!(label = %config.label, program = %self.command.program, ?argv, "starting trial");

        let start = Instant::now();
        let mut child = Command::new(&self.command.program)
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Launch {
                program: self.command.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            EngineError::Output(std::io::Error::other("engine stdout not captured"))
        })?;

        // Drain stdout on a side thread so the child never blocks on a full
        // pipe while we poll for exit.
        let reader = std::thread::spawn(move || {
            let mut outcomes: BTreeMap<String, UnitOutcome> = BTreeMap::new();
            for line in std::io::BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if let Some((unit, outcome)) = parse_outcome_line(&line) {
                    // Last write wins: an engine-side rerun reports the final outcome.
                    outcomes.insert(unit, outcome);
                }
            }
            outcomes
        });

        let status = loop {
            if let Some(exit) = child.try_wait()? {
                break TrialStatus::Completed {
                    exit_code: exit.code().unwrap_or(-1),
                };
            }
            if start.elapsed() >= self.command.timeout {
                warn!(label = %config.label, "trial exceeded ceiling, terminating engine");
                break self.shut_down(&mut child);
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let wall_seconds = start.elapsed().as_secs_f64();
        let outcomes = reader.join().unwrap_or_default();

        debug!(
            label = %config.label,
            units = outcomes.len(),
            wall_seconds,
            "trial finished"
        );
        Ok(TrialResult::new(config.clone(), status, wall_seconds, outcomes))
    }
}

impl CommandEngine {
    /// SIGTERM, drain window, SIGKILL. Always reaps the child.
    fn shut_down(&self, child: &mut std::process::Child) -> TrialStatus {
        let _ = send_sigterm(child.id());

        let drain_deadline = Instant::now() + DRAIN_WINDOW;
        while Instant::now() < drain_deadline {
            if matches!(child.try_wait(), Ok(Some(_))) {
                return TrialStatus::TimedOut;
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        let _ = child.kill();
        let _ = child.wait();
        TrialStatus::TimedOut
    }
}

/// Send SIGTERM to a process. `Err` if the signal could not be delivered.
fn send_sigterm(pid: u32) -> Result<(), std::io::Error> {
    let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if ret == -1 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}
