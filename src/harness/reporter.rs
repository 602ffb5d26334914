//! Batch reporting
//!
//! ## BatchReporter Trait
//!
//! The runner uses a `BatchReporter` trait to separate reporting from execution. [`ConsoleReporter`] prints a
//! pytest-style session; [`JsonReporter`] writes one machine-readable document when the batch completes.

use std::io::{self, Write};

use serde_json::{Value, json};

use super::case::TestCaseSpec;
use super::runner::{BatchReport, ScenarioReport};
use super::stage::StageOutcome;
use super::verify::{Check, CheckStatus};
use crate::version::HARNESS_VERSION;

/// Trait for reporting batch execution results.
///
/// Implement this trait to customize output format.
pub trait BatchReporter {
    /// Called once before the first scenario runs
    fn on_batch_start(&mut self, _scenario_count: usize) {}

    /// Called when a scenario begins
    fn on_scenario_start(&mut self, _spec: &TestCaseSpec) {}

    /// Called when a scenario has been executed and verified
    fn on_scenario_complete(&mut self, report: &ScenarioReport);

    /// Called after the artifacts of the batch have been removed
    fn on_batch_complete(&mut self, report: &BatchReport);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl BatchReporter for SilentReporter {
    fn on_scenario_complete(&mut self, _report: &ScenarioReport) {}

    fn on_batch_complete(&mut self, _report: &BatchReport) {}
}

/// Default console reporter (pytest-style)
pub struct ConsoleReporter<W: Write = io::Stdout> {
    out: W,
    pub verbose: bool,
    /// Emit ANSI colors
    pub color: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn new(verbose: bool, color: bool) -> Self {
        Self::with_writer(io::stdout(), verbose, color)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn with_writer(out: W, verbose: bool, color: bool) -> Self {
        Self { out, verbose, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    /// Render the FAILURES section for a finished batch (empty when everything passed).
    pub fn render_failures(&self, report: &BatchReport) -> String {
        let mut failures = report.failed_scenarios().peekable();
        if failures.peek().is_none() {
            return String::new();
        }

        let mut text = String::new();
        text.push_str(&self.paint("1;31", "=================== FAILURES ==================="));
        text.push('\n');
        for scenario in failures {
            text.push('\n');
            text.push_str(&self.paint("1", &format!("___________ {} ___________", scenario.name)));
            text.push('\n');
            for check in scenario.checks.failures() {
                text.push_str(&format!("    {}\n", check));
            }
            if let Some(stderr) = interpreter_stderr(scenario) {
                text.push_str(&format!("    interpreter stderr: {}\n", stderr.escape_ascii()));
            }
        }
        text
    }

    fn summary_line(&self, report: &BatchReport) -> String {
        let failed = report.scenario_count() - report.passed_count();
        let mut parts = Vec::new();
        if report.passed_count() > 0 {
            parts.push(format!("{} passed", report.passed_count()));
        }
        if failed > 0 {
            parts.push(format!("{} failed ({} checks)", failed, report.failed_checks()));
        }
        if report.stopped_early {
            parts.push("stopped early".to_string());
        }
        if report.cleanup_error.is_some() {
            parts.push("cleanup failed".to_string());
        }
        let line = format!(
            "=================== {} in {:.2}s ===================",
            parts.join(", "),
            report.duration.as_secs_f64()
        );
        self.paint(if report.is_success() { "1;32" } else { "1;31" }, &line)
    }
}

impl<W: Write> BatchReporter for ConsoleReporter<W> {
    fn on_batch_start(&mut self, scenario_count: usize) {
        let header = self.paint("1", "=================== vypa session starts ===================");
        let _ = writeln!(self.out, "{}", header);
        let _ = writeln!(self.out, "collected {} scenario(s)", scenario_count);
        let _ = writeln!(self.out);
    }

    fn on_scenario_complete(&mut self, report: &ScenarioReport) {
        let status = if report.passed() {
            self.paint("32", "PASSED")
        } else if report.checks.failures().any(|c| matches!(c.status, CheckStatus::Fault { .. })) {
            self.paint("31", "ERROR")
        } else {
            self.paint("31", "FAILED")
        };

        if self.verbose {
            let _ = writeln!(self.out, "{} {} ({}ms)", report.name, status, report.duration.as_millis());
            for check in &report.checks.checks {
                let _ = writeln!(self.out, "    {}", check);
            }
        } else {
            let _ = writeln!(self.out, "{} {}", report.name, status);
        }
    }

    fn on_batch_complete(&mut self, report: &BatchReport) {
        let failures = self.render_failures(report);
        if !failures.is_empty() {
            let _ = writeln!(self.out);
            let _ = write!(self.out, "{}", failures);
        }
        if let Some(error) = &report.cleanup_error {
            let _ = writeln!(self.out);
            let _ = writeln!(self.out, "{}", self.paint("31", &format!("artifact cleanup: {}", error)));
        }
        let summary = self.summary_line(report);
        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "{}", summary);
        let _ = self.out.flush();
    }
}

/// Writes the whole batch as one JSON document.
pub struct JsonReporter<W: Write = io::Stdout> {
    out: W,
}

impl JsonReporter<io::Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for JsonReporter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> BatchReporter for JsonReporter<W> {
    fn on_scenario_complete(&mut self, _report: &ScenarioReport) {}

    fn on_batch_complete(&mut self, report: &BatchReport) {
        if let Err(e) = serde_json::to_writer_pretty(&mut self.out, &batch_json(report)) {
            tracing::warn!(error = %e, "failed to write JSON report");
            return;
        }
        let _ = writeln!(self.out);
        let _ = self.out.flush();
    }
}

/// JSON form of a batch report.
pub fn batch_json(report: &BatchReport) -> Value {
    json!({
        "version": HARNESS_VERSION,
        "scenarios": report.scenarios.iter().map(scenario_json).collect::<Vec<_>>(),
        "total": report.scenario_count(),
        "passed": report.passed_count(),
        "failed_checks": report.failed_checks(),
        "stopped_early": report.stopped_early,
        "cleanup_error": report.cleanup_error,
        "duration_ms": report.duration.as_millis() as u64,
    })
}

fn scenario_json(scenario: &ScenarioReport) -> Value {
    json!({
        "name": scenario.name,
        "passed": scenario.passed(),
        "duration_ms": scenario.duration.as_millis() as u64,
        "compile": outcome_json(&scenario.observed.compile),
        "interpret": scenario.observed.interpret.as_ref().map(outcome_json),
        "checks": scenario.checks.checks.iter().map(check_json).collect::<Vec<_>>(),
    })
}

fn outcome_json(outcome: &StageOutcome) -> Value {
    match outcome {
        StageOutcome::Completed {
            exit_code,
            stdout,
            stderr,
        } => json!({
            "status": "completed",
            "exit_code": exit_code,
            "stdout": String::from_utf8_lossy(stdout),
            "stderr": String::from_utf8_lossy(stderr),
        }),
        StageOutcome::TimedOut { timeout } => json!({
            "status": "timed_out",
            "timeout_ms": timeout.as_millis() as u64,
        }),
        StageOutcome::SpawnFailed { reason } => json!({
            "status": "spawn_failed",
            "reason": reason,
        }),
    }
}

fn check_json(check: &Check) -> Value {
    match &check.status {
        CheckStatus::Passed => json!({ "kind": check.kind.as_str(), "status": "passed" }),
        CheckStatus::Mismatch { expected, actual } => json!({
            "kind": check.kind.as_str(),
            "status": "mismatch",
            "expected": expected.render(check.kind),
            "actual": actual.render(check.kind),
        }),
        CheckStatus::Fault { reason } => json!({
            "kind": check.kind.as_str(),
            "status": "fault",
            "reason": reason,
        }),
    }
}

fn interpreter_stderr(scenario: &ScenarioReport) -> Option<&[u8]> {
    scenario
        .observed
        .interpret
        .as_ref()
        .and_then(StageOutcome::stderr)
        .filter(|stderr| !stderr.is_empty())
}
