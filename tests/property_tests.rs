//! Property-based tests for result verification
//!
//! These tests use proptest to check the verifier across many generated
//! observations, catching edge cases that hand-written tests might miss.

use proptest::prelude::*;
use vypa_harness::harness::verify::{CheckKind, CheckStatus, verify};
use vypa_harness::{ObservedResult, StageOutcome, TestCaseSpec};

fn completed(exit_code: i32, stdout: Vec<u8>, stderr: Vec<u8>) -> StageOutcome {
    StageOutcome::Completed {
        exit_code,
        stdout,
        stderr,
    }
}

fn runnable(stdin: Vec<u8>, stdout: Vec<u8>) -> TestCaseSpec {
    TestCaseSpec::new("generated", "generated.vl")
        .with_stdin(stdin)
        .with_expected_stdout(stdout)
}

proptest! {
    /// Property: an observation that matches every expectation passes.
    #[test]
    fn matching_observation_passes(stdout in prop::collection::vec(any::<u8>(), 0..256), exit in 0i32..256) {
        let spec = runnable(Vec::new(), stdout.clone()).with_expected_interpret_exit(exit);
        let observed = ObservedResult {
            compile: completed(0, Vec::new(), Vec::new()),
            interpret: Some(completed(exit, stdout, b"ignored".to_vec())),
        };
        let outcome = verify(&spec, &observed);
        prop_assert!(outcome.passed());
        prop_assert_eq!(outcome.checks.len(), 3);
    }

    /// Property: any byte-level difference in stdout is a mismatch.
    #[test]
    fn stdout_compared_byte_exactly(
        expected in prop::collection::vec(any::<u8>(), 0..64),
        actual in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let spec = runnable(Vec::new(), expected.clone());
        let observed = ObservedResult {
            compile: completed(0, Vec::new(), Vec::new()),
            interpret: Some(completed(0, actual.clone(), Vec::new())),
        };
        let stdout = verify(&spec, &observed).get(CheckKind::Stdout).cloned();
        prop_assert_eq!(stdout.map(|c| c.passed()), Some(expected == actual));
    }

    /// Property: a compile exit code other than the expected one always fails the compile check,
    /// and the remaining checks still run.
    #[test]
    fn unexpected_compile_exit_fails(expected in 0i32..32, actual in 0i32..32) {
        prop_assume!(expected != actual);
        let spec = TestCaseSpec::new("generated", "generated.vl").with_expected_compile_exit(expected);
        let observed = ObservedResult {
            compile: completed(actual, Vec::new(), Vec::new()),
            interpret: None,
        };
        let outcome = verify(&spec, &observed);
        let kinds: Vec<CheckKind> = outcome.checks.iter().map(|c| c.kind).collect();
        prop_assert_eq!(kinds, vec![CheckKind::CompileExit, CheckKind::InterpretExit, CheckKind::Stdout]);
        let is_mismatch = matches!(
            outcome.get(CheckKind::CompileExit).map(|c| &c.status),
            Some(CheckStatus::Mismatch { .. })
        );
        prop_assert!(is_mismatch);
    }

    /// Property: verification is a pure function of its inputs.
    #[test]
    fn verify_is_deterministic(
        exit in -1i32..130,
        stdout in prop::collection::vec(any::<u8>(), 0..32),
        stderr in proptest::option::of(prop::collection::vec(any::<u8>(), 0..8)),
    ) {
        let mut spec = runnable(Vec::new(), b"expected".to_vec());
        if let Some(stderr) = stderr.clone() {
            spec = spec.with_expected_stderr(stderr);
        }
        let observed = ObservedResult {
            compile: completed(0, Vec::new(), Vec::new()),
            interpret: Some(completed(exit, stdout, Vec::new())),
        };
        let first = verify(&spec, &observed);
        prop_assert_eq!(&first, &verify(&spec, &observed));
        prop_assert_eq!(first.checks.len(), if stderr.is_some() { 4 } else { 3 });
    }
}
