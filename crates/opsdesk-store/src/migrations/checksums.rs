//! Migration checksums
//!
//! A migration's SHA-256 is recorded when it is applied and compared on
//! every later run, so edits to an applied migration are caught.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of the migration SQL
pub fn compute_checksum(sql: &str) -> String {
    hex::encode(Sha256::digest(sql.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            compute_checksum(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_whitespace_changes_checksum() {
        assert_ne!(compute_checksum("SELECT 1"), compute_checksum("SELECT 1 "));
    }
}
