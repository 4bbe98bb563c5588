use sha2::{Digest, Sha256};

/// SHA-256 fingerprints of stored schema content
pub struct ContentDigest;

impl ContentDigest {
    /// Hash `content`, returning the hex digest with a "sha256:" prefix
    pub fn of(content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        format!("sha256:{:x}", hasher.finalize())
    }

    /// Check that a digest string is a well-formed "sha256:<64 hex>" value
    pub fn is_valid(digest: &str) -> bool {
        match digest.strip_prefix("sha256:") {
            Some(hex) => hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => false,
        }
    }

    /// Verify content matches the expected digest
    pub fn verify(content: &[u8], expected: &str) -> bool {
        Self::of(content) == expected
    }
}
