//! Result verification
//!
//! [`verify`] turns an [`ObservedResult`] into an ordered list of checks. Every check is evaluated even when an
//! earlier one failed, so a report always shows the full picture of a scenario.
//!
//! ## Notes
//! - A stage that did not run is compared through sentinels: exit code [`DID_NOT_RUN`] and empty output.
//! - A stage that timed out or could not be launched yields [`CheckStatus::Fault`], never a mismatch.

use std::fmt;

use vypa_core::exit_codes::{self, DID_NOT_RUN};

use super::case::TestCaseSpec;
use super::pipeline::ObservedResult;
use super::stage::StageOutcome;

/// Which property of the observation a check compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    CompileExit,
    InterpretExit,
    Stdout,
    Stderr,
}

impl CheckKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckKind::CompileExit => "compile-exit-code",
            CheckKind::InterpretExit => "interpret-exit-code",
            CheckKind::Stdout => "stdout",
            CheckKind::Stderr => "stderr",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compared value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckValue {
    ExitCode(i32),
    Bytes(Vec<u8>),
}

impl CheckValue {
    /// Render the value as reported for `kind`. Only compiler exit codes carry the vocabulary label.
    pub fn render(&self, kind: CheckKind) -> String {
        match (self, kind) {
            (CheckValue::ExitCode(code), CheckKind::CompileExit) => exit_codes::describe(*code),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for CheckValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckValue::ExitCode(code) => write!(f, "{}", code),
            CheckValue::Bytes(bytes) => write!(f, "b\"{}\"", bytes.escape_ascii()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Passed,
    /// The toolchain behaved like a process but not like the scenario expected.
    Mismatch { expected: CheckValue, actual: CheckValue },
    /// The toolchain did not behave like a well-formed process (timeout, launch failure).
    Fault { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub kind: CheckKind,
    pub status: CheckStatus,
}

impl Check {
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            CheckStatus::Passed => write!(f, "{}: ok", self.kind),
            CheckStatus::Mismatch { expected, actual } => {
                write!(
                    f,
                    "{}: expected {}, got {}",
                    self.kind,
                    expected.render(self.kind),
                    actual.render(self.kind)
                )
            }
            CheckStatus::Fault { reason } => write!(f, "{}: harness fault: {}", self.kind, reason),
        }
    }
}

/// The ordered checks of one scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    pub checks: Vec<Check>,
}

impl CheckOutcome {
    /// Overall verdict: every check passed.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(Check::passed)
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.passed())
    }

    pub fn get(&self, kind: CheckKind) -> Option<&Check> {
        self.checks.iter().find(|c| c.kind == kind)
    }
}

/// Compare an observation against a scenario's expectations.
pub fn verify(spec: &TestCaseSpec, observed: &ObservedResult) -> CheckOutcome {
    let mut checks = vec![
        Check {
            kind: CheckKind::CompileExit,
            status: exit_status("compiler", Some(&observed.compile), spec.expected_compile_exit),
        },
        Check {
            kind: CheckKind::InterpretExit,
            status: exit_status("interpreter", observed.interpret.as_ref(), spec.expected_interpret_exit),
        },
        Check {
            kind: CheckKind::Stdout,
            status: output_status(observed.interpret.as_ref(), StageOutcome::stdout, &spec.expected_stdout),
        },
    ];

    if let Some(expected_stderr) = &spec.expected_stderr {
        checks.push(Check {
            kind: CheckKind::Stderr,
            status: output_status(observed.interpret.as_ref(), StageOutcome::stderr, expected_stderr),
        });
    }

    CheckOutcome { checks }
}

fn exit_status(stage: &str, outcome: Option<&StageOutcome>, expected: i32) -> CheckStatus {
    let actual = match outcome {
        None => DID_NOT_RUN,
        Some(outcome) => match (outcome.exit_code(), outcome.fault()) {
            (Some(code), _) => code,
            (None, reason) => {
                return CheckStatus::Fault {
                    reason: format!("{} {}", stage, reason.unwrap_or_default()),
                };
            }
        },
    };
    compare(CheckValue::ExitCode(expected), CheckValue::ExitCode(actual))
}

fn output_status(
    outcome: Option<&StageOutcome>,
    stream: fn(&StageOutcome) -> Option<&[u8]>,
    expected: &[u8],
) -> CheckStatus {
    let actual = match outcome {
        None => &[][..],
        Some(outcome) => match stream(outcome) {
            Some(bytes) => bytes,
            None => {
                return CheckStatus::Fault {
                    reason: format!("interpreter {}", outcome.fault().unwrap_or_default()),
                };
            }
        },
    };
    compare(CheckValue::Bytes(expected.to_vec()), CheckValue::Bytes(actual.to_vec()))
}

fn compare(expected: CheckValue, actual: CheckValue) -> CheckStatus {
    if expected == actual {
        CheckStatus::Passed
    } else {
        CheckStatus::Mismatch { expected, actual }
    }
}
