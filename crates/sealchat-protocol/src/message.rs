//! Message wire types.
//!
//! A [`MessageValue`] is the cleartext payload (`type`, `content`,
//! optional reply and mentions). The outer message wraps it with the
//! delivery bindings — channel, timestamp, size flag, room id — in
//! either encrypted form ([`EncryptedMessage`], where `value` is a
//! room-envelope JSON string) or clear form ([`ClearMessage`], where
//! `value` is the message value itself). A [`SignedMessage`] pairs the
//! exact outer JSON string with the identity signature over it.
//!
//! Canonical outer field order: `encrypted`, `value`, `channel`,
//! `original` (omitted when absent), `timestamp`, `isLarge`, `roomid`.

use sealchat_keys::Sign;
use serde::{Deserialize, Serialize};

/// The content kinds a message value may carry.
pub const MESSAGE_TYPES: [&str; 6] = ["text", "image", "video", "audio", "file", "thumbnail"];

/// Maximum channel name length, in characters.
pub const CHANNEL_MAX_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// MessageValue
// ---------------------------------------------------------------------------

/// Reference to the message being replied to.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplyInfo {
    /// Identifier of the quoted message.
    pub id: String,
}

/// Cleartext message payload; becomes the room-key plaintext.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageValue {
    /// Content kind: one of [`MESSAGE_TYPES`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Content JSON string for the kind (see [`crate::content`]).
    pub content: String,
    /// Present when this message replies to another.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyInfo>,
    /// Mentioned user identifiers. Absent and empty are equivalent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mention: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Outer messages
// ---------------------------------------------------------------------------

/// Encrypted outer message: `value` is a `roomKey` envelope JSON string.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptedMessage {
    /// Always `true` for this form.
    pub encrypted: bool,
    /// Room-envelope JSON string wrapping the message value.
    pub value: String,
    /// Channel name (≤ [`CHANNEL_MAX_CHARS`] characters).
    pub channel: String,
    /// Identifier of the message this one supersedes, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    /// Sender timestamp, milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Whether the payload is delivered out of band as a large object.
    #[serde(rename = "isLarge")]
    pub is_large: bool,
    /// Room this message is bound to.
    pub roomid: String,
}

/// Clear outer message: `value` is the message value itself.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClearMessage {
    /// Always `false` for this form.
    pub encrypted: bool,
    /// The cleartext message value.
    pub value: MessageValue,
    /// Channel name (≤ [`CHANNEL_MAX_CHARS`] characters).
    pub channel: String,
    /// Identifier of the message this one supersedes, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    /// Sender timestamp, milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Whether the payload is delivered out of band as a large object.
    #[serde(rename = "isLarge")]
    pub is_large: bool,
    /// Room this message is bound to.
    pub roomid: String,
}

/// Delivery metadata supplied by the caller when sending.
#[derive(Clone, Debug)]
pub struct MessageMeta {
    /// Channel name (≤ [`CHANNEL_MAX_CHARS`] characters).
    pub channel: String,
    /// Sender timestamp, milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Whether the payload is delivered out of band as a large object.
    pub is_large: bool,
    /// Identifier of the message this one supersedes, if any.
    pub original: Option<String>,
}

// ---------------------------------------------------------------------------
// SignedMessage
// ---------------------------------------------------------------------------

/// An outer message string paired with the identity signature over it.
///
/// `message` is kept as the exact serialized string — the signature
/// covers these bytes, so re-serialization must never happen between
/// signing and verification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedMessage {
    /// Serialized outer message (encrypted or clear form).
    pub message: String,
    /// Identity signature envelope over `message`.
    pub sign: Sign,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
