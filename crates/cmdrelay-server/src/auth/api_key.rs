// Shared secret hashing and comparison
// Decision: Only the SHA-256 digest of the configured secret is kept in memory
// Decision: Digests are compared byte by byte without early exit

use sha2::{Digest, Sha256};

/// Header carrying the shared secret
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authorization scheme carrying the shared secret
pub const API_KEY_SCHEME: &str = "ApiKey ";

/// Hash a key for in-memory storage and comparison
pub fn hash_api_key(key: &str) -> String {
    let hash = Sha256::digest(key.as_bytes());
    hex::encode(hash)
}

/// Compare a supplied key against a stored digest
pub fn verify_api_key(supplied: &str, expected_hash: &str) -> bool {
    let supplied_hash = hash_api_key(supplied);
    if supplied_hash.len() != expected_hash.len() {
        return false;
    }
    supplied_hash
        .bytes()
        .zip(expected_hash.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_hex() {
        let hash = hash_api_key("s3cret");
        assert_eq!(hash, hash_api_key("s3cret"));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verify_api_key() {
        let stored = hash_api_key("s3cret");
        assert!(verify_api_key("s3cret", &stored));
        assert!(!verify_api_key("S3cret", &stored));
        assert!(!verify_api_key("", &stored));
        assert!(!verify_api_key("s3cret", "short"));
    }
}
