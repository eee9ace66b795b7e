//! The room key (AES-256-GCM).
//!
//! A room key is the shared symmetric key of a room's members. It is
//! generated against the room's session UUID and distributed to each
//! member wrapped under their account key (see the protocol crate).
//! Payload encryption uses the symmetric envelope, which carries no
//! `cipherText`.

use sealchat_crypto::aead::{generate_symmetric_key, SYMMETRIC_KEY_LEN};
use sealchat_crypto::codec::b64_decodes_to;
use sealchat_types::session::is_valid_uuid_v7;
use sealchat_types::time::now_millis;
use sealchat_types::{Result, SealchatError};
use serde::{Deserialize, Serialize};

use crate::sealed::{self, EncryptedData, ALG_AES_GCM};

const KEY_TYPE: &str = "roomKey";

/// Envelope kind for payloads encrypted with a room key.
pub const ROOM_ENVELOPE_KIND: &str = "roomKey";

// ---------------------------------------------------------------------------
// RoomKey
// ---------------------------------------------------------------------------

/// Room symmetric key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomKey {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 256-bit AES key.
    pub key: String,
    /// Always `"AES-GCM"`.
    pub algorithm: String,
    /// Issuance time, milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// UUIDv7 of the room session this key belongs to.
    #[serde(rename = "sessionUuid")]
    pub session_uuid: String,
}

impl RoomKey {
    /// Generates a fresh room key bound to `session_uuid`.
    ///
    /// # Errors
    ///
    /// Returns [`SealchatError::InvalidKey`] if the UUID is not a
    /// UUIDv7.
    pub fn generate(session_uuid: &str) -> Result<Self> {
        if !is_valid_uuid_v7(session_uuid) {
            return Err(SealchatError::InvalidKey {
                reason: "sessionUuid is not a UUIDv7".into(),
            });
        }
        Ok(Self {
            key_type: KEY_TYPE.into(),
            key: generate_symmetric_key(),
            algorithm: ALG_AES_GCM.into(),
            timestamp: now_millis(),
            session_uuid: session_uuid.into(),
        })
    }

    /// Parses and validates a room key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: RoomKey = serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
            reason: format!("room key parse failed: {e}"),
        })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("room key serialization failed: {e}"),
        })
    }

    /// Structural validation: keyType, algorithm literal, raw size,
    /// session UUID.
    pub fn validate(&self) -> Result<()> {
        if self.key_type != KEY_TYPE {
            return Err(SealchatError::InvalidKey {
                reason: format!("expected keyType {KEY_TYPE:?}, got {:?}", self.key_type),
            });
        }
        if self.algorithm != ALG_AES_GCM {
            return Err(SealchatError::InvalidKey {
                reason: format!("room key algorithm must be {ALG_AES_GCM:?}"),
            });
        }
        if !b64_decodes_to(&self.key, SYMMETRIC_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!("room key must decode to {SYMMETRIC_KEY_LEN} bytes"),
            });
        }
        if !is_valid_uuid_v7(&self.session_uuid) {
            return Err(SealchatError::InvalidKey {
                reason: "sessionUuid is not a UUIDv7".into(),
            });
        }
        Ok(())
    }

    /// Encrypts `data` under this room key (symmetric envelope).
    pub fn encrypt(&self, data: &str) -> Result<EncryptedData> {
        self.validate()?;
        sealed::seal_symmetric(ROOM_ENVELOPE_KIND, &self.to_json()?, &self.key, data)
    }

    /// Decrypts a `roomKey` envelope.
    pub fn decrypt(&self, envelope: &EncryptedData) -> Result<String> {
        self.validate()?;
        envelope.validate_symmetric(ROOM_ENVELOPE_KIND)?;
        sealed::open_symmetric(&self.key, envelope)
    }
}

// ---------------------------------------------------------------------------
// Total validators
// ---------------------------------------------------------------------------

/// Returns `true` if `json` is a structurally valid room key.
pub fn is_valid_room_key(json: &str) -> bool {
    RoomKey::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid `roomKey`
/// encrypted envelope.
pub fn is_valid_encrypted_data_room_key(json: &str) -> bool {
    match EncryptedData::from_json(json) {
        Ok(envelope) => envelope.validate_symmetric(ROOM_ENVELOPE_KIND).is_ok(),
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: &str = "018fdb31-0798-78a2-b4c9-e145d5b5b88e";

    #[test]
    fn generate_encrypt_decrypt_roundtrip() -> Result<()> {
        let key = RoomKey::generate(SESSION)?;
        let envelope = key.encrypt("compatibility-test")?;
        assert!(envelope.cipher_text.is_none());
        assert!(is_valid_encrypted_data_room_key(&envelope.to_json()?));
        assert_eq!(key.decrypt(&envelope)?, "compatibility-test");
        Ok(())
    }

    #[test]
    fn wrong_key_fails_decrypt() -> Result<()> {
        let key_a = RoomKey::generate(SESSION)?;
        let key_b = RoomKey::generate(SESSION)?;
        let envelope = key_a.encrypt("secret")?;
        assert!(key_b.decrypt(&envelope).is_err());
        Ok(())
    }

    #[test]
    fn generate_rejects_bad_uuid() {
        assert!(RoomKey::generate("invalid-uuid").is_err());
        assert!(RoomKey::generate("550e8400-e29b-41d4-a716-446655440000").is_err());
    }

    #[test]
    fn wire_shape_roundtrip() -> Result<()> {
        let key = RoomKey::generate(SESSION)?;
        let json = key.to_json()?;
        assert!(json.starts_with("{\"keyType\":\"roomKey\",\"key\":\""));
        assert!(json.contains("\"algorithm\":\"AES-GCM\""));
        assert!(is_valid_room_key(&json));

        let parsed = RoomKey::from_json(&json)?;
        assert_eq!(parsed.key, key.key);
        assert_eq!(parsed.session_uuid, SESSION);
        Ok(())
    }

    #[test]
    fn validators_are_total() {
        assert!(!is_valid_room_key("not json"));
        assert!(!is_valid_room_key("{\"keyType\":\"roomKey\"}"));
        assert!(!is_valid_encrypted_data_room_key("null"));
    }
}
