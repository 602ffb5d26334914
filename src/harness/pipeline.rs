//! Pipeline: compile, then conditionally interpret
//!
//! The interpreter only ever sees an artifact the compiler vouched for with exit code 0. Whether the scenario
//! *expected* the compile to succeed plays no part in that decision.

use std::path::Path;

use super::case::TestCaseSpec;
use super::config::{HarnessConfig, ToolchainPaths};
use super::stage::{ProcessStage, StageCommand, StageExecutor, StageOutcome};

/// What the toolchain did for one scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedResult {
    pub compile: StageOutcome,
    /// `None` when the interpreter was never started, as opposed to started and silent.
    pub interpret: Option<StageOutcome>,
}

/// Composes the compile and interpret stages for one toolchain.
pub struct Pipeline<'a, E: StageExecutor = ProcessStage> {
    paths: &'a ToolchainPaths,
    config: &'a HarnessConfig,
    executor: E,
}

impl<'a> Pipeline<'a, ProcessStage> {
    /// A pipeline that runs real processes.
    pub fn new(paths: &'a ToolchainPaths, config: &'a HarnessConfig) -> Self {
        Self::with_executor(paths, config, ProcessStage::default())
    }
}

impl<'a, E: StageExecutor> Pipeline<'a, E> {
    pub fn with_executor(paths: &'a ToolchainPaths, config: &'a HarnessConfig, executor: E) -> Self {
        Self {
            paths,
            config,
            executor,
        }
    }

    /// `<compiler> -v <source> <artifact>`
    pub fn compile_command(&self, spec: &TestCaseSpec, artifact: &Path) -> StageCommand {
        StageCommand::launched(&self.config.compiler_launcher, &self.paths.compiler)
            .arg("-v")
            .arg(self.config.fixture_path(&spec.source_file))
            .arg(artifact)
    }

    /// `java -jar <interpreter> <artifact>`
    pub fn interpret_command(&self, artifact: &Path) -> StageCommand {
        StageCommand::launched(&self.config.interpreter_launcher, &self.paths.interpreter).arg(artifact)
    }

    /// Run one scenario through the toolchain, writing the compiled program to `artifact`.
    #[tracing::instrument(skip_all, fields(scenario = %spec.name))]
    pub fn execute(&self, spec: &TestCaseSpec, artifact: &Path) -> ObservedResult {
        let compile = self
            .executor
            .run(&self.compile_command(spec, artifact), &[], self.config.compile_timeout);

        if !compile.succeeded() {
            tracing::debug!(exit_code = ?compile.exit_code(), "compile did not succeed, skipping interpreter");
            return ObservedResult {
                compile,
                interpret: None,
            };
        }

        let interpret = self
            .executor
            .run(&self.interpret_command(artifact), &spec.stdin, self.config.interpret_timeout);

        ObservedResult {
            compile,
            interpret: Some(interpret),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use super::*;

    /// Replays canned outcomes and records every command it was asked to run.
    struct Scripted {
        outcomes: RefCell<Vec<StageOutcome>>,
        calls: RefCell<Vec<(String, Vec<u8>, Duration)>>,
    }

    impl Scripted {
        fn new(outcomes: Vec<StageOutcome>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl StageExecutor for Scripted {
        fn run(&self, command: &StageCommand, input: &[u8], timeout: Duration) -> StageOutcome {
            self.calls.borrow_mut().push((command.to_string(), input.to_vec(), timeout));
            self.outcomes.borrow_mut().remove(0)
        }
    }

    fn completed(exit_code: i32, stdout: &[u8]) -> StageOutcome {
        StageOutcome::Completed {
            exit_code,
            stdout: stdout.to_vec(),
            stderr: Vec::new(),
        }
    }

    fn fixtures() -> (ToolchainPaths, HarnessConfig) {
        (
            ToolchainPaths::new("/opt/vypa/vypcomp", "/opt/vypa/vypint.jar"),
            HarnessConfig::new().with_cases_dir("/cases"),
        )
    }

    #[test]
    fn test_compile_success_runs_interpreter_with_stdin() {
        let (paths, config) = fixtures();
        let executor = Scripted::new(vec![completed(0, b""), completed(0, b"Hello, world!")]);
        let pipeline = Pipeline::with_executor(&paths, &config, &executor);
        let spec = TestCaseSpec::new("hello", "hello.vl").with_stdin(&b"in"[..]);

        let observed = pipeline.execute(&spec, Path::new("testout.vc"));

        assert_eq!(observed.interpret, Some(completed(0, b"Hello, world!")));
        let calls = executor.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "/opt/vypa/vypcomp -v /cases/hello.vl testout.vc");
        assert!(calls[0].1.is_empty());
        assert_eq!(calls[1].0, "java -jar /opt/vypa/vypint.jar testout.vc");
        assert_eq!(calls[1].1, b"in");
        assert_eq!(calls[1].2, Duration::from_secs(2));
    }

    #[test]
    fn test_compile_failure_skips_interpreter() {
        let (paths, config) = fixtures();
        let executor = Scripted::new(vec![completed(19, b"")]);
        let pipeline = Pipeline::with_executor(&paths, &config, &executor);
        let spec = TestCaseSpec::new("redef", "redefinition.vl").with_expected_compile_exit(19);

        let observed = pipeline.execute(&spec, Path::new("testout.vc"));

        assert_eq!(observed.compile.exit_code(), Some(19));
        assert_eq!(observed.interpret, None);
        assert_eq!(executor.calls.borrow().len(), 1);
    }

    #[test]
    fn test_compile_timeout_skips_interpreter() {
        let (paths, config) = fixtures();
        let timed_out = StageOutcome::TimedOut {
            timeout: config.compile_timeout,
        };
        let executor = Scripted::new(vec![timed_out.clone()]);
        let pipeline = Pipeline::with_executor(&paths, &config, &executor);

        let observed = pipeline.execute(&TestCaseSpec::new("hang", "hang.vl"), Path::new("testout.vc"));

        assert_eq!(observed.compile, timed_out);
        assert_eq!(observed.interpret, None);
    }

    #[test]
    fn test_compiler_launcher_prefix() {
        let (paths, config) = fixtures();
        let config = config.with_compiler_launcher(["valgrind", "-q"]);
        let pipeline = Pipeline::new(&paths, &config);

        let command = pipeline.compile_command(&TestCaseSpec::new("a", "a.vl"), Path::new("out.vc"));

        assert_eq!(command.to_string(), "valgrind -q /opt/vypa/vypcomp -v /cases/a.vl out.vc");
    }
}
