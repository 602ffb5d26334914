//! Scenario descriptions
//!
//! A [`TestCaseSpec`] is the owned, immutable form of one scenario. Specs are usually built from the static
//! registry in `vypa_core::cases`, but the builder methods allow ad-hoc scenarios (tests, external tables).

use std::path::PathBuf;

use vypa_core::cases::{self, CaseInfo};
use vypa_core::exit_codes::{self, ExitCodeId};

use super::HarnessError;

/// One end-to-end scenario: a source fixture plus the expected toolchain behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseSpec {
    /// Scenario id, unique within a batch.
    pub name: String,
    /// Fixture path, relative to the configured cases directory (or absolute).
    pub source_file: PathBuf,
    /// Bytes written to the interpreter's stdin.
    pub stdin: Vec<u8>,
    pub expected_stdout: Vec<u8>,
    /// Interpreter stderr, only checked when set.
    pub expected_stderr: Option<Vec<u8>>,
    pub expected_compile_exit: i32,
    pub expected_interpret_exit: i32,
}

impl TestCaseSpec {
    /// Create a scenario that expects a clean compile, a clean run, and no output.
    pub fn new(name: impl Into<String>, source_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source_file: source_file.into(),
            stdin: Vec::new(),
            expected_stdout: Vec::new(),
            expected_stderr: None,
            expected_compile_exit: exit_codes::code(ExitCodeId::Success),
            // The interpreter's own exit codes are not part of the compiler vocabulary.
            expected_interpret_exit: 0,
        }
    }

    pub fn with_stdin(mut self, stdin: impl Into<Vec<u8>>) -> Self {
        self.stdin = stdin.into();
        self
    }

    pub fn with_expected_stdout(mut self, stdout: impl Into<Vec<u8>>) -> Self {
        self.expected_stdout = stdout.into();
        self
    }

    pub fn with_expected_stderr(mut self, stderr: impl Into<Vec<u8>>) -> Self {
        self.expected_stderr = Some(stderr.into());
        self
    }

    pub fn with_expected_compile_exit(mut self, code: i32) -> Self {
        self.expected_compile_exit = code;
        self
    }

    pub fn with_expected_interpret_exit(mut self, code: i32) -> Self {
        self.expected_interpret_exit = code;
        self
    }

    /// Every scenario of the static registry, in declared order.
    pub fn registry() -> Vec<TestCaseSpec> {
        cases::CASES.iter().map(TestCaseSpec::from).collect()
    }

    /// Look up one registered scenario by id.
    pub fn from_registry(id: &str) -> Result<TestCaseSpec, HarnessError> {
        cases::find(id)
            .map(TestCaseSpec::from)
            .ok_or_else(|| HarnessError::UnknownScenario(id.to_string()))
    }
}

impl From<&CaseInfo> for TestCaseSpec {
    fn from(info: &CaseInfo) -> Self {
        TestCaseSpec::new(info.id, info.fixture)
            .with_stdin(info.stdin)
            .with_expected_stdout(info.expected_stdout)
            .with_expected_compile_exit(exit_codes::code(info.expected_compile_exit))
            .with_expected_interpret_exit(info.expected_interpret_exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let spec = TestCaseSpec::new("plain", "plain.vl");
        assert!(spec.stdin.is_empty());
        assert!(spec.expected_stdout.is_empty());
        assert_eq!(spec.expected_stderr, None);
        assert_eq!(spec.expected_compile_exit, exit_codes::code(ExitCodeId::Success));
        assert_eq!(spec.expected_interpret_exit, 0);
    }

    #[test]
    fn test_registry_preserves_order() {
        let specs = TestCaseSpec::registry();
        let ids: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        let expected: Vec<&str> = cases::CASES.iter().map(|c| c.id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_from_registry_redefinition() {
        let spec = TestCaseSpec::from_registry("redefinition_error").unwrap();
        assert_eq!(spec.expected_compile_exit, 19);
        assert_eq!(spec.expected_interpret_exit, 0);
        assert!(spec.expected_stdout.is_empty());
    }

    #[test]
    fn test_from_registry_unknown() {
        let err = TestCaseSpec::from_registry("missing").unwrap_err();
        assert!(matches!(err, HarnessError::UnknownScenario(ref id) if id == "missing"));
    }
}
