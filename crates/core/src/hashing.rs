//! Shared SHA-256 hex digest utility.
//!
//! Used by the hash-chained ledger and the admin API key check.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Compute a SHA-256 hex digest over several byte slices fed in order.
pub fn sha256_hex_chained(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_produces_known_hash() {
        let hash = sha256_hex(b"");
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn chained_matches_concatenation() {
        assert_eq!(
            sha256_hex_chained(&[b"hello ", b"world"]),
            sha256_hex(b"hello world")
        );
    }
}
