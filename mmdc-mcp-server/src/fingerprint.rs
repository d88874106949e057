//! Content fingerprints used as the retry-tracking key.
//!
//! Only the diagram source bytes are hashed; output options never change the
//! fingerprint.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex characters kept from the SHA-256 digest.
pub const FINGERPRINT_LEN: usize = 12;

/// Short, deterministic digest of a diagram source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a diagram source.
    pub fn of(source: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        let hex = format!("{:x}", hasher.finalize());
        Self(hex[..FINGERPRINT_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_sources_share_fingerprint() {
        let a = Fingerprint::of("graph TD\n    A --> B");
        let b = Fingerprint::of("graph TD\n    A --> B");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), FINGERPRINT_LEN);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_any_byte_difference_changes_fingerprint() {
        let base = Fingerprint::of("graph TD\n    A --> B");
        assert_ne!(base, Fingerprint::of("graph TD\n    A --> C"));
        assert_ne!(base, Fingerprint::of("graph TD\n    A --> B "));
        assert_ne!(base, Fingerprint::of("graph TD\r\n    A --> B"));
    }

    #[test]
    fn test_known_digest_prefix() {
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb924...
        assert_eq!(Fingerprint::of("").to_string(), "e3b0c44298fc");
    }
}
