//! SHA-256 hashing and the key-hash binding.
//!
//! Signature and encrypted envelopes reference keys by
//! `keyHash = base64(SHA-256(utf8(key_json)))`, where `key_json` is
//! the **full canonical JSON string** of the public key — not its
//! `key` field. The hash is therefore only stable across peers when
//! both sides serialize keys in the same field order; generators in
//! this workspace emit one fixed order for exactly that reason.

use sha2::{Digest, Sha256};

use crate::codec::b64_encode;

/// Raw SHA-256 digest length.
pub const HASH_LEN: usize = 32;

/// Length of a base64-encoded SHA-256 digest.
pub const KEY_HASH_B64_LEN: usize = 44;

/// Computes the SHA-256 digest of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&digest);
    out
}

/// Computes the key hash of a JSON string: `base64(SHA-256(utf8(s)))`.
///
/// The result is always [`KEY_HASH_B64_LEN`] characters and decodes to
/// [`HASH_LEN`] bytes.
pub fn key_hash(input: &str) -> String {
    b64_encode(&sha256(input.as_bytes()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// NIST SHA-256 test vector: "abc".
    #[test]
    fn sha256_abc() {
        let digest = sha256(b"abc");
        let expected = [
            0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae,
            0x22, 0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61,
            0xf2, 0x00, 0x15, 0xad,
        ];
        assert_eq!(digest, expected);
    }

    #[test]
    fn key_hash_known_vector() {
        assert_eq!(
            key_hash("hello world"),
            "uU0nuZNNPgilLlLX2n2r+sSE7+N6U4DukIj3rOLvzek="
        );
    }

    #[test]
    fn key_hash_length_invariant() -> sealchat_types::Result<()> {
        let hash = key_hash("any input at all");
        assert_eq!(hash.len(), KEY_HASH_B64_LEN);
        assert_eq!(crate::codec::b64_decode(&hash)?.len(), HASH_LEN);
        Ok(())
    }

    #[test]
    fn key_hash_is_deterministic() {
        assert_eq!(key_hash("sealchat"), key_hash("sealchat"));
        assert_ne!(key_hash("sealchat"), key_hash("sealchat "));
    }
}
