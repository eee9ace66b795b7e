//! Base64 and hex codecs.
//!
//! Every binary field on the wire is base64 with the **standard**
//! alphabet and `=` padding. Hex is lowercase, two characters per
//! byte, and only used for display/debugging surfaces.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sealchat_types::{Result, SealchatError};

/// Encodes bytes as standard-alphabet, padded base64.
pub fn b64_encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decodes standard-alphabet, padded base64.
///
/// # Errors
///
/// Returns [`SealchatError::InvalidEncoding`] on any malformed input.
pub fn b64_decode(data: &str) -> Result<Vec<u8>> {
    BASE64.decode(data).map_err(|e| SealchatError::InvalidEncoding {
        reason: format!("malformed base64: {e}"),
    })
}

/// Returns `true` if `data` is valid base64 decoding to exactly
/// `expected_len` bytes.
///
/// Shared fast path for the structural validators, which check decoded
/// sizes rather than string lengths.
pub fn b64_decodes_to(data: &str, expected_len: usize) -> bool {
    matches!(BASE64.decode(data), Ok(bytes) if bytes.len() == expected_len)
}

/// Encodes bytes as lowercase hex.
pub fn hex_encode(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decodes lowercase or uppercase hex.
///
/// # Errors
///
/// Returns [`SealchatError::InvalidEncoding`] on any malformed input.
pub fn hex_decode(data: &str) -> Result<Vec<u8>> {
    hex::decode(data).map_err(|e| SealchatError::InvalidEncoding {
        reason: format!("malformed hex: {e}"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
