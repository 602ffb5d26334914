//! Harness version information.
//!
//! Exposed as a single constant so the CLI and the JSON report agree on the same value.

/// The harness version string (for example, `0.2.0`).
pub const HARNESS_VERSION: &str = env!("CARGO_PKG_VERSION");
