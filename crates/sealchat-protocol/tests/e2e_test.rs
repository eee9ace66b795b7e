//! Integration tests for the message pipeline: encrypt → sign →
//! verify → decrypt, with the room binding and freshness guards.
//!
//! All tests issue fresh keys; the freshness boundary tests pin the
//! sender timestamp so the ±60 000 ms window is exercised exactly.

use sealchat_keys::identity::generate_identity_key;
use sealchat_keys::master::MasterKeyPair;
use sealchat_keys::room::RoomKey;
use sealchat_keys::IdentityKeyBundle;
use sealchat_crypto::hash::key_hash;
use sealchat_protocol::e2e::{decrypt_message, encrypt_message, FRESHNESS_WINDOW_MS};
use sealchat_protocol::message::{MessageMeta, MessageValue};
use sealchat_protocol::validation::is_valid_message;
use sealchat_types::{Result, SealchatError};

const SESSION: &str = "018fdb31-0798-78a2-b4c9-e145d5b5b88e";
const NOW: u64 = 1_700_000_000_000;

struct Sender {
    identity: IdentityKeyBundle,
    identity_hash: String,
}

fn sender() -> Result<Sender> {
    let master = MasterKeyPair::generate()?;
    let identity = generate_identity_key(SESSION, &master.public, &master.private)?;
    let identity_hash = key_hash(&identity.public.to_json()?);
    Ok(Sender {
        identity,
        identity_hash,
    })
}

fn text_value() -> MessageValue {
    MessageValue {
        kind: "text".into(),
        content: r#"{"text":"hello room"}"#.into(),
        reply: None,
        mention: None,
    }
}

fn meta() -> MessageMeta {
    MessageMeta {
        channel: "c".into(),
        timestamp: NOW,
        is_large: false,
        original: None,
    }
}

// ---------------------------------------------------------------------------
// 1. Roundtrip
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() -> Result<()> {
    let sender = sender()?;
    let room_key = RoomKey::generate(SESSION)?;

    let signed = encrypt_message(
        &text_value(),
        &meta(),
        &room_key,
        &sender.identity.private,
        &sender.identity_hash,
        SESSION,
    )?;
    assert!(is_valid_message(&signed.message));

    let decrypted = decrypt_message(&signed, NOW, Some(&room_key), &sender.identity.public, SESSION)?;
    assert!(!decrypted.encrypted);
    assert_eq!(decrypted.value, text_value());
    assert_eq!(decrypted.channel, "c");
    assert_eq!(decrypted.timestamp, NOW);
    assert_eq!(decrypted.roomid, SESSION);
    Ok(())
}

#[test]
fn reply_and_mentions_survive_roundtrip() -> Result<()> {
    let sender = sender()?;
    let room_key = RoomKey::generate(SESSION)?;

    let value = MessageValue {
        kind: "text".into(),
        content: r#"{"text":"@bob see above"}"#.into(),
        reply: Some(sealchat_protocol::message::ReplyInfo { id: "msg-41".into() }),
        mention: Some(vec!["bob".into()]),
    };
    let signed = encrypt_message(
        &value,
        &meta(),
        &room_key,
        &sender.identity.private,
        &sender.identity_hash,
        SESSION,
    )?;

    let decrypted = decrypt_message(&signed, NOW, Some(&room_key), &sender.identity.public, SESSION)?;
    assert_eq!(decrypted.value, value);
    Ok(())
}

// ---------------------------------------------------------------------------
// 2. Signature gate
// ---------------------------------------------------------------------------

#[test]
fn wrong_identity_key_rejected() -> Result<()> {
    let other = sender()?;
    let sender = sender()?;
    let room_key = RoomKey::generate(SESSION)?;

    let signed = encrypt_message(
        &text_value(),
        &meta(),
        &room_key,
        &sender.identity.private,
        &sender.identity_hash,
        SESSION,
    )?;

    let result = decrypt_message(&signed, NOW, Some(&room_key), &other.identity.public, SESSION);
    assert!(matches!(result, Err(SealchatError::VerificationFailed { .. })));
    Ok(())
}

#[test]
fn tampered_message_rejected() -> Result<()> {
    let sender = sender()?;
    let room_key = RoomKey::generate(SESSION)?;

    let mut signed = encrypt_message(
        &text_value(),
        &meta(),
        &room_key,
        &sender.identity.private,
        &sender.identity_hash,
        SESSION,
    )?;
    signed.message = signed.message.replace("\"isLarge\":false", "\"isLarge\":true");

    let result = decrypt_message(&signed, NOW, Some(&room_key), &sender.identity.public, SESSION);
    assert!(matches!(result, Err(SealchatError::VerificationFailed { .. })));
    Ok(())
}

// ---------------------------------------------------------------------------
// 3. Freshness window
// ---------------------------------------------------------------------------

#[test]
fn skew_of_exactly_window_is_accepted() -> Result<()> {
    let sender = sender()?;
    let room_key = RoomKey::generate(SESSION)?;
    let signed = encrypt_message(
        &text_value(),
        &meta(),
        &room_key,
        &sender.identity.private,
        &sender.identity_hash,
        SESSION,
    )?;

    for server_time in [NOW + FRESHNESS_WINDOW_MS, NOW - FRESHNESS_WINDOW_MS] {
        decrypt_message(
            &signed,
            server_time,
            Some(&room_key),
            &sender.identity.public,
            SESSION,
        )?;
    }
    Ok(())
}

#[test]
fn skew_of_window_plus_one_is_rejected() -> Result<()> {
    let sender = sender()?;
    let room_key = RoomKey::generate(SESSION)?;
    let signed = encrypt_message(
        &text_value(),
        &meta(),
        &room_key,
        &sender.identity.private,
        &sender.identity_hash,
        SESSION,
    )?;

    for server_time in [NOW + FRESHNESS_WINDOW_MS + 1, NOW - FRESHNESS_WINDOW_MS - 1] {
        let result = decrypt_message(
            &signed,
            server_time,
            Some(&room_key),
            &sender.identity.public,
            SESSION,
        );
        assert!(matches!(result, Err(SealchatError::TimestampSkew { .. })));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 4. Room binding
// ---------------------------------------------------------------------------

#[test]
fn foreign_roomid_rejected() -> Result<()> {
    let sender = sender()?;
    let room_key = RoomKey::generate(SESSION)?;
    let signed = encrypt_message(
        &text_value(),
        &meta(),
        &room_key,
        &sender.identity.private,
        &sender.identity_hash,
        SESSION,
    )?;

    let result = decrypt_message(
        &signed,
        NOW,
        Some(&room_key),
        &sender.identity.public,
        "01900000-0000-7000-8000-000000000000",
    );
    assert!(matches!(result, Err(SealchatError::RoomMismatch { .. })));
    Ok(())
}

// ---------------------------------------------------------------------------
// 5. Room key requirements
// ---------------------------------------------------------------------------

#[test]
fn encrypted_message_without_room_key_rejected() -> Result<()> {
    let sender = sender()?;
    let room_key = RoomKey::generate(SESSION)?;
    let signed = encrypt_message(
        &text_value(),
        &meta(),
        &room_key,
        &sender.identity.private,
        &sender.identity_hash,
        SESSION,
    )?;

    assert!(decrypt_message(&signed, NOW, None, &sender.identity.public, SESSION).is_err());
    Ok(())
}

#[test]
fn wrong_room_key_fails_decrypt() -> Result<()> {
    let sender = sender()?;
    let room_key = RoomKey::generate(SESSION)?;
    let other_key = RoomKey::generate(SESSION)?;
    let signed = encrypt_message(
        &text_value(),
        &meta(),
        &room_key,
        &sender.identity.private,
        &sender.identity_hash,
        SESSION,
    )?;

    let result = decrypt_message(&signed, NOW, Some(&other_key), &sender.identity.public, SESSION);
    assert!(matches!(result, Err(SealchatError::CryptoError { .. })));
    Ok(())
}

// ---------------------------------------------------------------------------
// 6. Channel cap on send
// ---------------------------------------------------------------------------

#[test]
fn channel_cap_enforced_on_encrypt() -> Result<()> {
    let sender = sender()?;
    let room_key = RoomKey::generate(SESSION)?;

    let mut long_meta = meta();
    long_meta.channel = "c".repeat(100);
    assert!(encrypt_message(
        &text_value(),
        &long_meta,
        &room_key,
        &sender.identity.private,
        &sender.identity_hash,
        SESSION,
    )
    .is_ok());

    long_meta.channel = "c".repeat(101);
    assert!(encrypt_message(
        &text_value(),
        &long_meta,
        &room_key,
        &sender.identity.private,
        &sender.identity_hash,
        SESSION,
    )
    .is_err());
    Ok(())
}
