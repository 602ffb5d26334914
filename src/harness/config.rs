//! Harness configuration
//!
//! [`ToolchainPaths`] names the binaries under test; [`HarnessConfig`] holds everything else that shapes a run.
//! Both are built once and only ever borrowed by the pipeline and runner.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Paths to the toolchain under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainPaths {
    /// The `vypcomp` executable.
    pub compiler: PathBuf,
    /// The `vypint` jar.
    pub interpreter: PathBuf,
}

impl ToolchainPaths {
    pub fn new(compiler: impl Into<PathBuf>, interpreter: impl Into<PathBuf>) -> Self {
        Self {
            compiler: compiler.into(),
            interpreter: interpreter.into(),
        }
    }
}

/// Where compiled artifacts are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStrategy {
    /// One fixed path reused by every scenario of a batch. Scenarios must run sequentially.
    Shared(PathBuf),
    /// One `<dir>/<scenario>.vc` per scenario, safe for parallel execution.
    PerScenario(PathBuf),
}

impl ArtifactStrategy {
    /// Whether two scenarios may compile at the same time.
    pub fn allows_parallel(&self) -> bool {
        matches!(self, ArtifactStrategy::PerScenario(_))
    }
}

impl Default for ArtifactStrategy {
    fn default() -> Self {
        ArtifactStrategy::Shared(PathBuf::from(DEFAULT_ARTIFACT))
    }
}

/// Artifact name used by the shared strategy.
pub const DEFAULT_ARTIFACT: &str = "testout.vc";

/// Directory holding the source fixtures.
pub const DEFAULT_CASES_DIR: &str = "compiler_cases";

/// Wall-clock budget for each stage.
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(2);

/// Harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Timeout for the compiler stage
    pub compile_timeout: Duration,
    /// Timeout for the interpreter stage
    pub interpret_timeout: Duration,
    /// Program and arguments placed in front of the compiler path (empty runs it directly)
    pub compiler_launcher: Vec<OsString>,
    /// Program and arguments placed in front of the interpreter path
    pub interpreter_launcher: Vec<OsString>,
    /// Directory that fixture file names are resolved against
    pub cases_dir: PathBuf,
    pub artifact: ArtifactStrategy,
    /// Number of scenarios run at once (only honored for per-scenario artifacts)
    pub jobs: usize,
    /// Stop the batch after the first failing scenario
    pub stop_on_fail: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            compile_timeout: DEFAULT_STAGE_TIMEOUT,
            interpret_timeout: DEFAULT_STAGE_TIMEOUT,
            compiler_launcher: Vec::new(),
            interpreter_launcher: vec![OsString::from("java"), OsString::from("-jar")],
            cases_dir: PathBuf::from(DEFAULT_CASES_DIR),
            artifact: ArtifactStrategy::default(),
            jobs: 1,
            stop_on_fail: false,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the same timeout for both stages
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_compile_timeout(timeout).with_interpret_timeout(timeout)
    }

    pub fn with_compile_timeout(mut self, timeout: Duration) -> Self {
        self.compile_timeout = timeout;
        self
    }

    pub fn with_interpret_timeout(mut self, timeout: Duration) -> Self {
        self.interpret_timeout = timeout;
        self
    }

    pub fn with_compiler_launcher<I, S>(mut self, launcher: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.compiler_launcher = launcher.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_interpreter_launcher<I, S>(mut self, launcher: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.interpreter_launcher = launcher.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cases_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cases_dir = dir.into();
        self
    }

    pub fn with_artifact(mut self, artifact: ArtifactStrategy) -> Self {
        self.artifact = artifact;
        self
    }

    /// Set the number of concurrent scenarios (clamped to at least 1)
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_stop_on_fail(mut self, stop: bool) -> Self {
        self.stop_on_fail = stop;
        self
    }

    /// Resolve a fixture file name against the cases directory.
    ///
    /// The result is absolute so the compiler sees the same path regardless of its working directory.
    pub fn fixture_path(&self, fixture: &Path) -> PathBuf {
        let joined = self.cases_dir.join(fixture);
        if joined.is_absolute() {
            return joined;
        }
        std::env::current_dir().map(|cwd| cwd.join(&joined)).unwrap_or(joined)
    }

    /// Number of worker threads the runner actually uses.
    pub fn effective_jobs(&self) -> usize {
        if self.artifact.allows_parallel() { self.jobs.max(1) } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let config = HarnessConfig::default();
        assert_eq!(config.compile_timeout, Duration::from_secs(2));
        assert_eq!(config.interpret_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_default_interpreter_launcher_is_java_jar() {
        let config = HarnessConfig::default();
        assert_eq!(config.interpreter_launcher, vec![OsString::from("java"), OsString::from("-jar")]);
        assert!(config.compiler_launcher.is_empty());
    }

    #[test]
    fn test_default_artifact_is_shared_testout() {
        let config = HarnessConfig::default();
        assert_eq!(config.artifact, ArtifactStrategy::Shared(PathBuf::from("testout.vc")));
        assert!(!config.artifact.allows_parallel());
    }

    #[test]
    fn test_with_timeout_sets_both_stages() {
        let config = HarnessConfig::new().with_timeout(Duration::from_millis(150));
        assert_eq!(config.compile_timeout, Duration::from_millis(150));
        assert_eq!(config.interpret_timeout, Duration::from_millis(150));
    }

    #[test]
    fn test_with_jobs_clamps_zero() {
        let config = HarnessConfig::new().with_jobs(0);
        assert_eq!(config.jobs, 1);
    }

    #[test]
    fn test_jobs_ignored_for_shared_artifact() {
        let config = HarnessConfig::new().with_jobs(8);
        assert_eq!(config.effective_jobs(), 1);

        let config = config.with_artifact(ArtifactStrategy::PerScenario(PathBuf::from("target/vypa")));
        assert_eq!(config.effective_jobs(), 8);
    }

    #[test]
    fn test_fixture_path_is_absolute() {
        let config = HarnessConfig::new().with_cases_dir("compiler_cases");
        let path = config.fixture_path(Path::new("hello_world.vl"));
        assert!(path.is_absolute());
        assert!(path.ends_with("compiler_cases/hello_world.vl"));
    }

    #[test]
    fn test_builder_override() {
        let config = HarnessConfig::new()
            .with_interpreter_launcher(["java"])
            .with_interpreter_launcher(["sh"]);
        assert_eq!(config.interpreter_launcher, vec![OsString::from("sh")]);
    }
}
