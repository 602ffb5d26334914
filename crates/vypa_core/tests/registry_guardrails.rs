use std::collections::HashSet;
use std::path::{Path, PathBuf};

use vypa_core::cases::CASES;
use vypa_core::exit_codes::{self, COMPILER_EXIT_CODES, ExitCodeId};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../compiler_cases")
}

#[test]
fn case_ids_are_unique() {
    let mut seen = HashSet::new();
    for case in CASES {
        assert!(seen.insert(case.id), "duplicate scenario id: {}", case.id);
    }
}

#[test]
fn case_ids_are_filename_safe() {
    for case in CASES {
        assert!(
            case.id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
            "scenario id {:?} is not usable as an artifact name",
            case.id
        );
    }
}

#[test]
fn every_fixture_exists() {
    let dir = fixtures_dir();
    for case in CASES {
        let path = dir.join(case.fixture);
        assert!(path.is_file(), "fixture for {} missing: {}", case.id, path.display());
    }
}

#[test]
fn exit_codes_resolvable_and_unique() {
    let mut seen = HashSet::new();
    for info in COMPILER_EXIT_CODES {
        assert_eq!(exit_codes::from_code(info.code), Some(info.id));
        assert_eq!(exit_codes::code(info.id), info.code);
        assert!(seen.insert(info.code), "duplicate exit code {}", info.code);
    }
}

#[test]
fn only_success_reaches_the_interpreter() {
    let runnable = CASES
        .iter()
        .filter(|c| c.expected_compile_exit == ExitCodeId::Success)
        .count();
    assert!(runnable > 0);
    assert!(runnable < CASES.len(), "registry should cover compiler rejections too");
}
