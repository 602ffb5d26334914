//! Provide the shared, pure vocabulary for the VYPa toolchain harness.
//!
//! This crate is intentionally small and dependency-free. It contains the data that both the harness engine and
//! its tooling (listing, reporting, guardrail tests) need to agree on:
//! - the compiler's exit-code contract, and
//! - the static table of end-to-end scenarios.
//!
//! ## Notes
//!
//! - No IO, no process handling, no global state. Running the toolchain lives in the `vypa_harness` crate.
//! - Scenarios are registered statically; there is no runtime discovery.

pub mod cases;
pub mod exit_codes;
