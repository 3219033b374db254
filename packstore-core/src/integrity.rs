use crate::error::{Result, StoreError};
use sha2::{Digest, Sha512};

/// SHA-512 of `data` as a lowercase hex string.
pub fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Checks `data` against an advertised hash. Signatures attached to an entry
/// are opaque to this module; only the content digest is enforced here.
pub fn verify_hash(data: &[u8], expected_hash: &str) -> Result<()> {
    let actual = compute_hash(data);
    if actual != expected_hash {
        return Err(StoreError::HashMismatch {
            expected: expected_hash.to_string(),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_sha512_vector() {
        assert_eq!(
            compute_hash(b"abc"),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    #[test]
    fn verify_accepts_matching_hash() {
        let hash = compute_hash(b"payload");
        assert!(verify_hash(b"payload", &hash).is_ok());
    }

    #[test]
    fn verify_rejects_mismatch() {
        let hash = compute_hash(b"payload");
        let error = verify_hash(b"tampered", &hash).unwrap_err();
        assert!(matches!(error, StoreError::HashMismatch { .. }));
    }
}
