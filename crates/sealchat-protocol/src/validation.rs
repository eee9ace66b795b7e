//! Total structural message validation.
//!
//! [`is_valid_message`] is the schema gate hosts run on anything that
//! claims to be an outer message, before signature verification or
//! decryption is attempted. It is total: any string — malformed JSON
//! included — yields `false`, never a panic.

use sealchat_keys::room::is_valid_encrypted_data_room_key;
use serde_json::Value;

use crate::message::{CHANNEL_MAX_CHARS, MESSAGE_TYPES};

/// Returns `true` if `message` is a structurally valid outer message.
///
/// Both forms share the base checks: `channel` is a string of at most
/// [`CHANNEL_MAX_CHARS`] characters, `timestamp` is an unsigned
/// integer, `isLarge` is a bool, `roomid` is a string, and `original`
/// is absent or a string. The encrypted form additionally requires
/// `value` to be a valid `roomKey` envelope JSON string; the clear
/// form requires `value` to be a well-formed message value whose
/// `content` parses as JSON.
pub fn is_valid_message(message: &str) -> bool {
    let Ok(outer) = serde_json::from_str::<Value>(message) else {
        return false;
    };
    let Some(outer) = outer.as_object() else {
        return false;
    };

    let base_ok = outer
        .get("channel")
        .and_then(Value::as_str)
        .is_some_and(|c| c.chars().count() <= CHANNEL_MAX_CHARS)
        && outer.get("timestamp").and_then(Value::as_u64).is_some()
        && outer.get("isLarge").and_then(Value::as_bool).is_some()
        && outer.get("roomid").and_then(Value::as_str).is_some()
        && match outer.get("original") {
            None | Some(Value::Null) => true,
            Some(original) => original.is_string(),
        };
    if !base_ok {
        return false;
    }

    match outer.get("encrypted") {
        Some(Value::Bool(true)) => outer
            .get("value")
            .and_then(Value::as_str)
            .is_some_and(is_valid_encrypted_data_room_key),
        Some(Value::Bool(false)) => outer.get("value").is_some_and(is_valid_clear_value),
        _ => false,
    }
}

fn is_valid_clear_value(value: &Value) -> bool {
    let Some(value) = value.as_object() else {
        return false;
    };

    let kind_ok = value
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| MESSAGE_TYPES.contains(&t));

    // The content field is itself a JSON string.
    let content_ok = value
        .get("content")
        .and_then(Value::as_str)
        .is_some_and(|c| serde_json::from_str::<Value>(c).is_ok());

    let reply_ok = match value.get("reply") {
        None | Some(Value::Null) => true,
        Some(reply) => reply.get("id").is_some_and(Value::is_string),
    };

    // Absent and empty mention lists are both accepted.
    let mention_ok = match value.get("mention") {
        None | Some(Value::Null) => true,
        Some(Value::Array(entries)) => entries.iter().all(Value::is_string),
        Some(_) => false,
    };

    kind_ok && content_ok && reply_ok && mention_ok
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
