//! Core shared types for the Sealchat end-to-end-encryption library.
//!
//! This crate defines the error surface and the small primitives that
//! every other crate in the workspace builds on. No other crate should
//! define shared types — everything lives here.

pub mod session;
pub mod time;

use thiserror::Error;

// ---------------------------------------------------------------------------
// SealchatError
// ---------------------------------------------------------------------------

/// Central error type for the Sealchat library.
///
/// All crates in the workspace convert their internal failures into
/// variants of this enum, ensuring a unified error handling surface.
/// No operation panics across the API boundary; the only fatal
/// condition is an unavailable OS entropy source, which aborts inside
/// the `rand` stack.
#[derive(Debug, Error)]
pub enum SealchatError {
    /// A key JSON is malformed: wrong `keyType`, wrong algorithm
    /// literal, wrong raw size, or a bad session UUID.
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Human-readable description of the key validation failure.
        reason: String,
    },

    /// A signature or encrypted envelope is structurally invalid.
    #[error("invalid envelope: {reason}")]
    InvalidEnvelope {
        /// Human-readable description of the envelope validation failure.
        reason: String,
    },

    /// A message is malformed, missing required fields, or fails
    /// schema validation.
    #[error("invalid message: {reason}")]
    InvalidMessage {
        /// Human-readable description of the message validation failure.
        reason: String,
    },

    /// A binary field could not be decoded (malformed base64 or hex).
    #[error("invalid encoding: {reason}")]
    InvalidEncoding {
        /// Human-readable description of the decoding failure.
        reason: String,
    },

    /// A cryptographic operation failed: AEAD tag mismatch, KEM
    /// encapsulation/decapsulation failure, or a primitive rejected
    /// its input.
    #[error("crypto error: {reason}")]
    CryptoError {
        /// Human-readable description of the cryptographic failure.
        reason: String,
    },

    /// A signature did not verify against the expected public key.
    #[error("verification failed: {reason}")]
    VerificationFailed {
        /// Human-readable description of the verification failure.
        reason: String,
    },

    /// A message timestamp fell outside the accepted freshness window.
    #[error("timestamp out of range: {reason}")]
    TimestampSkew {
        /// Human-readable description including the observed skew.
        reason: String,
    },

    /// An envelope is bound to a different room than the caller's.
    #[error("room mismatch: {reason}")]
    RoomMismatch {
        /// Human-readable description of the binding failure.
        reason: String,
    },

    /// A required issuer signature over a subordinate key is missing
    /// or does not verify.
    #[error("untrusted key: {reason}")]
    UntrustedKey {
        /// Human-readable description of the trust failure.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Result alias
// ---------------------------------------------------------------------------

/// Convenience result type using [`SealchatError`].
pub type Result<T> = std::result::Result<T, SealchatError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
