//! Backend-specific recognition of uniqueness violations.
//!
//! The stores only report constraint failures as text, so detection is a
//! narrow message match. Each backend supplies its own detector.

use crate::repo::RepoError;

/// Returns `true` when a storage error is a uniqueness violation.
pub type DuplicateDetector = fn(&RepoError) -> bool;

/// Message fragment SQLite emits for UNIQUE / PRIMARY KEY violations.
pub const SQLITE_UNIQUE_SIGNATURE: &str = "UNIQUE constraint failed";

/// Detector for SQLite-backed repositories.
pub fn sqlite_unique_violation(err: &RepoError) -> bool {
    err.to_string().contains(SQLITE_UNIQUE_SIGNATURE)
}
