//! CLI module for the VYPa toolchain harness
//!
//! ## Usage
//!
//! - `vypa-harness <COMPILER> <INTERPRETER>` - Run every registered scenario
//! - `vypa-harness --list` - Show the scenario registry
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::harness::config::{ArtifactStrategy, DEFAULT_ARTIFACT, DEFAULT_CASES_DIR, HarnessConfig};
use crate::harness::HarnessError;
use crate::version::HARNESS_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<HarnessError> for CliError {
    fn from(err: HarnessError) -> Self {
        CliError::failure(format!("Error: {}", err))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
}

/// Run vypcomp + vypint end-to-end tests
#[derive(Parser, Debug)]
#[command(name = "vypa-harness")]
#[command(version = HARNESS_VERSION)]
#[command(about = "Run vypcomp + vypint end-to-end tests", long_about = None)]
pub struct Cli {
    /// Path (relative or absolute) to the vypcomp binary
    #[arg(value_name = "COMPILER", required_unless_present = "list")]
    pub compiler: Option<PathBuf>,

    /// Path (relative or absolute) to the vypint jar file
    #[arg(value_name = "INTERPRETER", required_unless_present = "list")]
    pub interpreter: Option<PathBuf>,

    /// Directory containing the source fixtures
    #[arg(long, value_name = "DIR", default_value = DEFAULT_CASES_DIR)]
    pub cases_dir: PathBuf,

    /// Only run scenarios whose name contains EXPR
    #[arg(short = 'k', value_name = "EXPR")]
    pub filter: Option<String>,

    /// Stop on first failing scenario
    #[arg(short = 'x', long = "exitfirst")]
    pub stop_on_fail: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// List registered scenarios and exit
    #[arg(long)]
    pub list: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Compiler timeout in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 2000)]
    pub compile_timeout: u64,

    /// Interpreter timeout in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 2000)]
    pub interpret_timeout: u64,

    /// JVM used to launch the interpreter jar
    #[arg(long, value_name = "PROGRAM", default_value = "java")]
    pub java: String,

    /// Shared artifact path written by the compiler
    #[arg(long, value_name = "PATH", conflicts_with = "artifact_dir")]
    pub artifact: Option<PathBuf>,

    /// Write one artifact per scenario into DIR (allows --jobs)
    #[arg(long, value_name = "DIR")]
    pub artifact_dir: Option<PathBuf>,

    /// Number of scenarios to run at once (requires --artifact-dir)
    #[arg(short, long, value_name = "N", default_value_t = 1)]
    pub jobs: usize,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Build the harness configuration from the parsed flags.
    pub fn harness_config(&self) -> HarnessConfig {
        let artifact = match (&self.artifact, &self.artifact_dir) {
            (_, Some(dir)) => ArtifactStrategy::PerScenario(dir.clone()),
            (Some(path), None) => ArtifactStrategy::Shared(path.clone()),
            (None, None) => ArtifactStrategy::Shared(PathBuf::from(DEFAULT_ARTIFACT)),
        };
        HarnessConfig::new()
            .with_compile_timeout(Duration::from_millis(self.compile_timeout))
            .with_interpret_timeout(Duration::from_millis(self.interpret_timeout))
            .with_interpreter_launcher([self.java.as_str(), "-jar"])
            .with_cases_dir(&self.cases_dir)
            .with_artifact(artifact)
            .with_jobs(self.jobs)
            .with_stop_on_fail(self.stop_on_fail)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    if cli.list {
        return commands::list_cases(&cli.harness_config(), cli.filter.as_deref());
    }
    commands::run_batch(&cli)
}

// ============================================================================
// Tests
// ============================================================================
