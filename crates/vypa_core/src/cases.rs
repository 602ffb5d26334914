//! Static registry of end-to-end scenarios.
//!
//! Each entry names a source fixture (relative to the harness's cases directory), the bytes fed to the
//! interpreter's stdin, and the expected observable behavior of the toolchain.
//!
//! ## Notes
//! - Order matters: the harness runs scenarios in table order.
//! - Scenarios whose compile exit is not [`ExitCodeId::Success`] never reach the interpreter, so their expected
//!   stdout is empty and their expected interpreter exit is [`DID_NOT_RUN`].
//!
//! ## Examples
//! ```rust
//! use vypa_core::cases;
//!
//! let hello = cases::find("hello_world").unwrap();
//! assert_eq!(hello.fixture, "hello_world.vl");
//! assert_eq!(hello.expected_stdout, b"Hello, world!");
//! ```

use crate::exit_codes::{DID_NOT_RUN, ExitCodeId};

/// Metadata for one registered scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseInfo {
    /// Unique scenario id (also used to name per-scenario artifacts).
    pub id: &'static str,
    /// Source file name inside the cases directory.
    pub fixture: &'static str,
    pub stdin: &'static [u8],
    pub expected_stdout: &'static [u8],
    pub expected_compile_exit: ExitCodeId,
    pub expected_interpret_exit: i32,
}

const fn runs(id: &'static str, fixture: &'static str, stdin: &'static [u8], stdout: &'static [u8]) -> CaseInfo {
    CaseInfo {
        id,
        fixture,
        stdin,
        expected_stdout: stdout,
        expected_compile_exit: ExitCodeId::Success,
        expected_interpret_exit: 0,
    }
}

const fn rejected(id: &'static str, fixture: &'static str, exit: ExitCodeId) -> CaseInfo {
    CaseInfo {
        id,
        fixture,
        stdin: b"",
        expected_stdout: b"",
        expected_compile_exit: exit,
        expected_interpret_exit: DID_NOT_RUN,
    }
}

/// Registry of scenarios, in execution order.
pub const CASES: &[CaseInfo] = &[
    runs("hello_world", "hello_world.vl", b"", b"Hello, world!"),
    runs("hello_world_adv", "hello_world_adv.vl", b"", b"Hello, world!"),
    runs(
        "hello_name",
        "hello_io.vl",
        b"Richard",
        b"What's your name? Hello, Richard. Your name has length: 7",
    ),
    runs("if_taken", "if_test1.vl", b"", b"if taken\nif exited"),
    runs("if_not_taken", "if_test0.vl", b"", b"else taken\nif exited"),
    runs(
        "recursive_calls",
        "recursive_calls.vl",
        b"\n\n\ny",
        b"enter to cont, q to quit\ncontinue\nenter to cont, q to quit\ncontinue\nenter to cont, q to quit\ncontinue\nenter to cont, q to quit\nexiting",
    ),
    runs(
        "while_loop",
        "while.vl",
        b"a\nb\nc\n\n",
        b"string is not empty\nstring is not empty\nstring is not empty\nstring is not empty\nstring empty",
    ),
    rejected("redefinition_error", "redefinition.vl", ExitCodeId::SemanticError),
    rejected("lexical_error", "lexical_error.vl", ExitCodeId::LexicalError),
    rejected("syntax_error", "syntax_error.vl", ExitCodeId::SyntaxError),
    rejected("if_condition_type", "if_string_condition.vl", ExitCodeId::SemanticError),
    rejected("while_condition_type", "while_float_condition.vl", ExitCodeId::SemanticError),
];

/// Look up a scenario by id.
pub fn find(id: &str) -> Option<&'static CaseInfo> {
    CASES.iter().find(|case| case.id == id)
}
