//! Compiler exit-code vocabulary.
//!
//! `vypcomp` reports the class of a failure through its process exit code. This registry gives each code a stable
//! id so the harness, reports, and scenario tables never compare bare integers.
//!
//! ## Notes
//! - Only [`ExitCodeId::Success`] means "the artifact is usable". Every other code means the interpreter stage must
//!   not consume the artifact.
//! - Codes the compiler does not document resolve to `None` via [`from_code`]; callers render them numerically.
//!
//! ## Examples
//! ```rust
//! use vypa_core::exit_codes::{self, ExitCodeId};
//!
//! assert_eq!(exit_codes::from_code(19), Some(ExitCodeId::SemanticError));
//! assert_eq!(exit_codes::code(ExitCodeId::SyntaxError), 12);
//! ```

/// Stable identifier for a documented compiler exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitCodeId {
    Success,
    LexicalError,
    SyntaxError,
    /// Semantic errors (redefinitions, type errors) and any other internal failure.
    SemanticError,
}

/// Metadata for a documented exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodeInfo {
    pub id: ExitCodeId,
    pub code: i32,
    /// Short label used in listings and reports.
    pub label: &'static str,
    pub description: &'static str,
}

/// Registry of documented compiler exit codes.
pub const COMPILER_EXIT_CODES: &[ExitCodeInfo] = &[
    ExitCodeInfo {
        id: ExitCodeId::Success,
        code: 0,
        label: "ok",
        description: "Compilation succeeded and the artifact is usable.",
    },
    ExitCodeInfo {
        id: ExitCodeId::LexicalError,
        code: 11,
        label: "lexical error",
        description: "The source could not be tokenized.",
    },
    ExitCodeInfo {
        id: ExitCodeId::SyntaxError,
        code: 12,
        label: "syntax error",
        description: "The token stream does not match the grammar.",
    },
    ExitCodeInfo {
        id: ExitCodeId::SemanticError,
        code: 19,
        label: "semantic error",
        description: "Redefinitions, type errors, and other failures detected after parsing.",
    },
];

/// Exit code the harness assumes for a stage that never ran.
pub const DID_NOT_RUN: i32 = 0;

/// Look up the documented exit code for a raw process exit code.
pub fn from_code(code: i32) -> Option<ExitCodeId> {
    COMPILER_EXIT_CODES.iter().find(|info| info.code == code).map(|info| info.id)
}

/// Return the registry entry for an id.
pub fn info_for(id: ExitCodeId) -> &'static ExitCodeInfo {
    match COMPILER_EXIT_CODES.iter().find(|info| info.id == id) {
        Some(info) => info,
        None => unreachable!("every ExitCodeId has a registry entry"),
    }
}

/// Return the raw process exit code for an id.
pub fn code(id: ExitCodeId) -> i32 {
    info_for(id).code
}

/// Render a raw exit code for humans, e.g. `19 (semantic error)`.
pub fn describe(code: i32) -> String {
    match from_code(code) {
        Some(id) => format!("{} ({})", code, info_for(id).label),
        None => code.to_string(),
    }
}
