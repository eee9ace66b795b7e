//! The device key (AES-256-GCM).
//!
//! A device key encrypts data at rest on a single device. It never
//! leaves the device, is not master-signed and carries no session or
//! timestamp binding.

use sealchat_crypto::aead::{generate_symmetric_key, SYMMETRIC_KEY_LEN};
use sealchat_crypto::codec::b64_decodes_to;
use sealchat_types::{Result, SealchatError};
use serde::{Deserialize, Serialize};

use crate::sealed::{self, EncryptedData};

const KEY_TYPE: &str = "deviceKey";

/// Envelope kind for payloads encrypted with a device key.
pub const DEVICE_ENVELOPE_KIND: &str = "deviceKey";

/// Device symmetric key: `{"keyType":"deviceKey","key":…}`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceKey {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 256-bit AES key.
    pub key: String,
}

impl DeviceKey {
    /// Generates a fresh device key.
    pub fn generate() -> Self {
        Self {
            key_type: KEY_TYPE.into(),
            key: generate_symmetric_key(),
        }
    }

    /// Parses and validates a device key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: DeviceKey = serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
            reason: format!("device key parse failed: {e}"),
        })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("device key serialization failed: {e}"),
        })
    }

    /// Structural validation: keyType literal and raw size.
    pub fn validate(&self) -> Result<()> {
        if self.key_type != KEY_TYPE {
            return Err(SealchatError::InvalidKey {
                reason: format!("expected keyType {KEY_TYPE:?}, got {:?}", self.key_type),
            });
        }
        if !b64_decodes_to(&self.key, SYMMETRIC_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!("device key must decode to {SYMMETRIC_KEY_LEN} bytes"),
            });
        }
        Ok(())
    }

    /// Encrypts `data` under this device key (symmetric envelope).
    pub fn encrypt(&self, data: &str) -> Result<EncryptedData> {
        self.validate()?;
        sealed::seal_symmetric(DEVICE_ENVELOPE_KIND, &self.to_json()?, &self.key, data)
    }

    /// Decrypts a `deviceKey` envelope.
    pub fn decrypt(&self, envelope: &EncryptedData) -> Result<String> {
        self.validate()?;
        envelope.validate_symmetric(DEVICE_ENVELOPE_KIND)?;
        sealed::open_symmetric(&self.key, envelope)
    }
}

/// Returns `true` if `json` is a structurally valid device key.
pub fn is_valid_device_key(json: &str) -> bool {
    DeviceKey::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid `deviceKey`
/// encrypted envelope.
pub fn is_valid_encrypted_data_device_key(json: &str) -> bool {
    match EncryptedData::from_json(json) {
        Ok(envelope) => envelope.validate_symmetric(DEVICE_ENVELOPE_KIND).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() -> Result<()> {
        let key = DeviceKey::generate();
        let envelope = key.encrypt("local secret")?;
        assert!(envelope.cipher_text.is_none());
        assert!(is_valid_encrypted_data_device_key(&envelope.to_json()?));
        assert_eq!(key.decrypt(&envelope)?, "local secret");
        Ok(())
    }

    #[test]
    fn wrong_key_fails_decrypt() -> Result<()> {
        let key_a = DeviceKey::generate();
        let key_b = DeviceKey::generate();
        let envelope = key_a.encrypt("secret")?;
        assert!(key_b.decrypt(&envelope).is_err());
        Ok(())
    }

    #[test]
    fn wire_shape() -> Result<()> {
        let key = DeviceKey::generate();
        let json = key.to_json()?;
        assert!(json.starts_with("{\"keyType\":\"deviceKey\",\"key\":\""));
        assert!(is_valid_device_key(&json));
        Ok(())
    }

    #[test]
    fn rejects_wrong_size_key() {
        let json = r#"{"keyType":"deviceKey","key":"c2hvcnQ="}"#;
        assert!(!is_valid_device_key(json));
    }
}
