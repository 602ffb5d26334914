#![forbid(unsafe_code)]
//! VYPa Toolchain Harness
//!
//! End-to-end tests for the VYPa compiler (`vypcomp`) and interpreter (`vypint`). Every scenario compiles a source
//! fixture, runs the produced artifact on the interpreter with fixed stdin, and compares exit codes and output
//! against golden expectations.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Toolchain failures are data**: a compiler that crashes, hangs, or cannot be launched is reported as a failed
//!   check, never as a Rust error or panic.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod harness;
pub mod version;

pub use harness::{
    ArtifactManager, ArtifactStrategy, BatchReport, BatchReporter, CheckOutcome, ConsoleReporter, HarnessConfig,
    HarnessError, JsonReporter, ObservedResult, Pipeline, ProcessStage, Runner, StageExecutor, StageOutcome,
    TestCaseSpec, ToolchainPaths,
};
