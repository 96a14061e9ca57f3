//! Regression-test-runner collaborator

use crate::config::RegressionConfig;
use crate::core::{RegressionStatus, RegressionTestReport};
use lazy_static::lazy_static;
use regex::Regex;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

lazy_static! {
    static ref FAILED_CASE: Regex = Regex::new(r"(?m)^(?:FAILED|FAIL|not ok)\s+(\S+)").unwrap();
}

const OUTPUT_TAIL_LINES: usize = 20;

/// External regression-test collaborator
///
/// Failures, crashes, and timeouts are all encoded in the report; the
/// contract is infallible from the engine's point of view.
pub trait TestRunner: Send + Sync {
    fn run(&self, scope: &[String]) -> RegressionTestReport;
}

/// Runs a configured command as a subprocess, scoped to the changed files
pub struct CommandTestRunner {
    command: Vec<String>,
    timeout: Duration,
    workdir: PathBuf,
}

impl CommandTestRunner {
    pub fn new(config: &RegressionConfig, workdir: PathBuf) -> Self {
        Self {
            command: config.command.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            workdir,
        }
    }

    fn spawn(&self) -> std::io::Result<Child> {
        Command::new(&self.command[0])
            .args(&self.command[1..])
            .current_dir(&self.workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .spawn()
    }
}

impl TestRunner for CommandTestRunner {
    fn run(&self, scope: &[String]) -> RegressionTestReport {
        if self.command.is_empty() {
            return RegressionTestReport::skipped("no regression command configured");
        }
        if scope.is_empty() {
            return RegressionTestReport::skipped("no changed files in scope");
        }
        let command_line = self.command.join(" ");

        let start = Instant::now();
        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(e) => {
                log::warn!("Regression runner failed to start: {e}");
                return RegressionTestReport {
                    status: RegressionStatus::Failed,
                    failed_cases: Vec::new(),
                    duration_ms: 0,
                    command: command_line,
                    output_tail: format!("failed to start: {e}"),
                };
            }
        };

        // Drain pipes on reader threads so a chatty test suite cannot
        // deadlock against a full pipe buffer.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_handle = std::thread::spawn(move || read_all(stdout));
        let err_handle = std::thread::spawn(move || read_all(stderr));

        let (status, timed_out) = wait_with_timeout(&mut child, self.timeout);
        let duration_ms = start.elapsed().as_millis() as u64;

        let mut output = out_handle.join().unwrap_or_default();
        let err_output = err_handle.join().unwrap_or_default();
        if !err_output.is_empty() {
            output.push('\n');
            output.push_str(&err_output);
        }

        let failed_cases = FAILED_CASE
            .captures_iter(&output)
            .map(|c| c[1].to_string())
            .collect();

        let status = if timed_out {
            RegressionStatus::TimedOut
        } else if status == Some(0) {
            RegressionStatus::Passed
        } else {
            RegressionStatus::Failed
        };

        RegressionTestReport {
            status,
            failed_cases,
            duration_ms,
            command: command_line,
            output_tail: tail(&output, OUTPUT_TAIL_LINES),
        }
    }
}

fn read_all(pipe: Option<impl Read>) -> String {
    let mut buf = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut buf);
    }
    buf
}

/// Poll for exit until the deadline, then kill; returns (exit code, timed out)
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> (Option<i32>, bool) {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return (status.code(), false),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return (None, true);
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                log::warn!("Regression runner wait failed: {e}");
                let _ = child.kill();
                return (None, false);
            }
        }
    }
}

fn tail(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
