//! Shared fixture helpers for integration tests.

use std::path::PathBuf;

use navigator_lib::{Voyage, VoyageLog};

/// Path to the fixtures directory shared by every crate in the workspace.
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// The fixture voyage log (six good rows, one malformed).
#[allow(dead_code)]
pub fn fixture_log() -> VoyageLog {
    VoyageLog::from_path(&fixtures_dir().join("voyages.csv")).expect("load fixture voyages.csv")
}

#[allow(dead_code)]
pub fn fixture_voyages() -> Vec<Voyage> {
    fixture_log().voyages
}
