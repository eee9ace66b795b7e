//! Message encryption and decryption.
//!
//! # Sending
//!
//! ```text
//! 1. inner ← JSON(message value)
//! 2. envelope ← roomKey.encrypt(inner)
//! 3. outer ← { encrypted: true, value: JSON(envelope), channel,
//!              original?, timestamp, isLarge, roomid }
//! 4. message ← JSON(outer)
//! 5. sign ← identityPrivate.sign(message, identityPublicHash)
//! ```
//!
//! # Receiving
//!
//! The identity signature over the exact message string is verified
//! **first**; only then are the room binding and the freshness window
//! enforced, and only then is the inner envelope decrypted. Cleartext
//! messages pass through the same signature and binding gates.
//!
//! Freshness is the only implicit state in the whole library: a
//! message is accepted iff `|timestamp − server_timestamp|` is at most
//! the window (inclusive — a skew of exactly 60 000 ms passes).

use sealchat_keys::room::RoomKey;
use sealchat_keys::{EncryptedData, IdentityKeyPrivate, IdentityKeyPublic};
use sealchat_types::{Result, SealchatError};
use tracing::debug;

use crate::message::{
    ClearMessage, EncryptedMessage, MessageMeta, MessageValue, SignedMessage, CHANNEL_MAX_CHARS,
};

/// Accepted skew between a message timestamp and the server timestamp,
/// in milliseconds. Inclusive on both ends.
pub const FRESHNESS_WINDOW_MS: u64 = 60_000;

// ---------------------------------------------------------------------------
// Encrypt
// ---------------------------------------------------------------------------

/// Encrypts a message value under `room_key` and signs the resulting
/// outer message with the sender's identity key.
///
/// `identity_public_hash` is the key hash of the sender's identity
/// public key JSON; it is recorded in the signature envelope so the
/// recipient can locate the verifying key.
///
/// # Errors
///
/// - [`SealchatError::InvalidKey`] if the room key or identity key
///   fails validation.
/// - [`SealchatError::InvalidMessage`] if the channel exceeds
///   [`CHANNEL_MAX_CHARS`] or serialization fails.
/// - [`SealchatError::CryptoError`] if encryption fails.
pub fn encrypt_message(
    value: &MessageValue,
    meta: &MessageMeta,
    room_key: &RoomKey,
    identity_private: &IdentityKeyPrivate,
    identity_public_hash: &str,
    roomid: &str,
) -> Result<SignedMessage> {
    room_key.validate()?;
    identity_private.validate()?;
    if meta.channel.chars().count() > CHANNEL_MAX_CHARS {
        return Err(SealchatError::InvalidMessage {
            reason: format!("channel exceeds {CHANNEL_MAX_CHARS} characters"),
        });
    }

    let inner = serde_json::to_string(value).map_err(|e| SealchatError::InvalidMessage {
        reason: format!("message value serialization failed: {e}"),
    })?;
    let envelope = room_key.encrypt(&inner)?;

    let outer = EncryptedMessage {
        encrypted: true,
        value: envelope.to_json()?,
        channel: meta.channel.clone(),
        original: meta.original.clone(),
        timestamp: meta.timestamp,
        is_large: meta.is_large,
        roomid: roomid.to_string(),
    };
    let message = serde_json::to_string(&outer).map_err(|e| SealchatError::InvalidMessage {
        reason: format!("outer message serialization failed: {e}"),
    })?;

    let sign = identity_private.sign(message.as_bytes(), identity_public_hash)?;
    Ok(SignedMessage { message, sign })
}

// ---------------------------------------------------------------------------
// Decrypt
// ---------------------------------------------------------------------------

/// Verifies and decrypts a signed message with the default
/// [`FRESHNESS_WINDOW_MS`].
///
/// `room_key` may be `None` for rooms without encryption; it is only
/// required when the outer message is the encrypted form.
///
/// # Errors
///
/// - [`SealchatError::VerificationFailed`] if the identity signature
///   does not verify.
/// - [`SealchatError::RoomMismatch`] if the message is bound to a
///   different room.
/// - [`SealchatError::TimestampSkew`] if the message timestamp is
///   outside the window.
/// - [`SealchatError::InvalidKey`] / [`SealchatError::InvalidEnvelope`]
///   / [`SealchatError::InvalidMessage`] on structural failures.
/// - [`SealchatError::CryptoError`] if decryption fails.
pub fn decrypt_message(
    signed: &SignedMessage,
    server_timestamp: u64,
    room_key: Option<&RoomKey>,
    identity_public: &IdentityKeyPublic,
    roomid: &str,
) -> Result<ClearMessage> {
    decrypt_message_with_window(
        signed,
        server_timestamp,
        room_key,
        identity_public,
        roomid,
        FRESHNESS_WINDOW_MS,
    )
}

/// [`decrypt_message`] with a caller-chosen freshness window.
pub fn decrypt_message_with_window(
    signed: &SignedMessage,
    server_timestamp: u64,
    room_key: Option<&RoomKey>,
    identity_public: &IdentityKeyPublic,
    roomid: &str,
    window_ms: u64,
) -> Result<ClearMessage> {
    identity_public.validate()?;
    identity_public.verify(&signed.sign, signed.message.as_bytes())?;

    let outer: Outer =
        serde_json::from_str(&signed.message).map_err(|e| SealchatError::InvalidMessage {
            reason: format!("outer message parse failed: {e}"),
        })?;

    match outer {
        Outer::Encrypted(message) => {
            if !message.encrypted {
                return Err(SealchatError::InvalidMessage {
                    reason: "encrypted-form message with encrypted: false".into(),
                });
            }
            check_binding(message.roomid.as_str(), roomid)?;
            check_freshness(message.timestamp, server_timestamp, window_ms)?;

            let room_key = room_key.ok_or_else(|| SealchatError::InvalidKey {
                reason: "room key required for an encrypted message".into(),
            })?;
            room_key.validate()?;

            let envelope = EncryptedData::from_json(&message.value)?;
            let inner = room_key.decrypt(&envelope)?;
            let value: MessageValue =
                serde_json::from_str(&inner).map_err(|e| SealchatError::InvalidMessage {
                    reason: format!("decrypted message value parse failed: {e}"),
                })?;

            Ok(ClearMessage {
                encrypted: false,
                value,
                channel: message.channel,
                original: message.original,
                timestamp: message.timestamp,
                is_large: message.is_large,
                roomid: message.roomid,
            })
        }
        Outer::Clear(message) => {
            if message.encrypted {
                return Err(SealchatError::InvalidMessage {
                    reason: "clear-form message with encrypted: true".into(),
                });
            }
            check_binding(message.roomid.as_str(), roomid)?;
            check_freshness(message.timestamp, server_timestamp, window_ms)?;
            Ok(message)
        }
    }
}

/// Outer message forms, distinguished by the shape of `value`.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Outer {
    Encrypted(EncryptedMessage),
    Clear(ClearMessage),
}

fn check_binding(message_roomid: &str, expected_roomid: &str) -> Result<()> {
    if message_roomid != expected_roomid {
        debug!(expected = %expected_roomid, "rejecting message bound to another room");
        return Err(SealchatError::RoomMismatch {
            reason: format!("message is bound to room {message_roomid:?}"),
        });
    }
    Ok(())
}

fn check_freshness(timestamp: u64, server_timestamp: u64, window_ms: u64) -> Result<()> {
    let skew = timestamp.abs_diff(server_timestamp);
    if skew > window_ms {
        debug!(skew_ms = skew, window_ms, "rejecting stale message");
        return Err(SealchatError::TimestampSkew {
            reason: format!("message is {skew} ms from server time, window is {window_ms} ms"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_window_is_inclusive() {
        assert!(check_freshness(1_000_000, 1_000_000 + FRESHNESS_WINDOW_MS, FRESHNESS_WINDOW_MS)
            .is_ok());
        assert!(check_freshness(1_000_000 + FRESHNESS_WINDOW_MS, 1_000_000, FRESHNESS_WINDOW_MS)
            .is_ok());
        assert!(check_freshness(
            1_000_000,
            1_000_000 + FRESHNESS_WINDOW_MS + 1,
            FRESHNESS_WINDOW_MS
        )
        .is_err());
    }

    #[test]
    fn binding_check() {
        assert!(check_binding("room-a", "room-a").is_ok());
        assert!(check_binding("room-a", "room-b").is_err());
    }
}
