//! Process orchestration and result verification
//!
//! ## Modules
//!
//! - `config` - Toolchain paths and harness settings
//! - `case` - Scenario descriptions (`TestCaseSpec`)
//! - `stage` - One external-process invocation with timeout and captured output
//! - `pipeline` - Compile, then conditionally interpret
//! - `verify` - Compare an observation against a scenario's expectations
//! - `artifact` - Lifecycle of the compiled artifact file(s) of a batch
//! - `runner` - Drive a batch of scenarios and aggregate the results
//! - `reporter` - Console and JSON output
//!
//! ## Design
//!
//! The toolchain is a black box: every way it can misbehave (nonzero exit, wrong output, hang, missing binary)
//! ends up as a [`verify::CheckStatus`] in the batch report. [`HarnessError`] is reserved for problems with the
//! harness's own environment, such as an artifact that cannot be removed.

pub mod artifact;
pub mod case;
pub mod config;
pub mod pipeline;
pub mod reporter;
pub mod runner;
pub mod stage;
pub mod verify;

use std::path::PathBuf;

use thiserror::Error;

pub use artifact::{ArtifactBatch, ArtifactManager};
pub use case::TestCaseSpec;
pub use config::{ArtifactStrategy, HarnessConfig, ToolchainPaths};
pub use pipeline::{ObservedResult, Pipeline};
pub use reporter::{BatchReporter, ConsoleReporter, JsonReporter};
pub use runner::{BatchReport, Runner, ScenarioReport};
pub use stage::{ProcessStage, StageCommand, StageExecutor, StageOutcome};
pub use verify::{Check, CheckKind, CheckOutcome, CheckStatus};

/// Errors from the harness's own environment.
///
/// Toolchain misbehavior is never represented here; see [`verify::CheckStatus`].
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove artifact {}: {source}", .path.display())]
    ArtifactCleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source fixture not found: {}", .0.display())]
    MissingFixture(PathBuf),

    #[error("no scenarios to run")]
    NoScenarios,

    #[error("unknown scenario '{0}'")]
    UnknownScenario(String),
}
