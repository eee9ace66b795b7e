//! The server key (ML-DSA-65).
//!
//! Server keys sign server-issued assertions (timestamps, membership
//! statements). They are self-standing — not part of the master
//! cross-signing graph — and carry only an issuance timestamp.

use sealchat_crypto::codec::b64_decodes_to;
use sealchat_crypto::dsa::{generate_dsa65_keypair, DSA65_PRIVATE_KEY_LEN, DSA65_PUBLIC_KEY_LEN};
use sealchat_types::time::now_millis;
use sealchat_types::{Result, SealchatError};
use serde::{Deserialize, Serialize};

use crate::signature::{sign_with_dsa65, verify_sign, Sign};

const KEY_TYPE_PUBLIC: &str = "serverKeyPublic";
const KEY_TYPE_PRIVATE: &str = "serverKeyPrivate";

/// Signer role recorded in server signature envelopes.
pub const SERVER_SIGNER_ROLE: &str = "serverKey";

/// Server verifying key: `{"keyType":"serverKeyPublic","key":…,"timestamp":…}`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerKeyPublic {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 ML-DSA-65 verifying key (1952 bytes).
    pub key: String,
    /// Issuance time, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Server signing key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerKeyPrivate {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 ML-DSA-65 signing key (4032 bytes).
    pub key: String,
    /// Issuance time, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// A freshly generated server keypair.
pub struct ServerKeyPair {
    pub public: ServerKeyPublic,
    pub private: ServerKeyPrivate,
}

impl ServerKeyPair {
    /// Generates a new ML-DSA-65 server keypair.
    pub fn generate() -> Self {
        let (public_b64, private_b64) = generate_dsa65_keypair();
        let timestamp = now_millis();
        Self {
            public: ServerKeyPublic {
                key_type: KEY_TYPE_PUBLIC.into(),
                key: public_b64,
                timestamp,
            },
            private: ServerKeyPrivate {
                key_type: KEY_TYPE_PRIVATE.into(),
                key: private_b64,
                timestamp,
            },
        }
    }
}

impl ServerKeyPublic {
    /// Parses and validates a server public key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: ServerKeyPublic =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("server public key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("server public key serialization failed: {e}"),
        })
    }

    /// Structural validation: keyType literal and raw key size.
    pub fn validate(&self) -> Result<()> {
        if self.key_type != KEY_TYPE_PUBLIC {
            return Err(SealchatError::InvalidKey {
                reason: format!("expected keyType {KEY_TYPE_PUBLIC:?}, got {:?}", self.key_type),
            });
        }
        if !b64_decodes_to(&self.key, DSA65_PUBLIC_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!("server public key must decode to {DSA65_PUBLIC_KEY_LEN} bytes"),
            });
        }
        Ok(())
    }

    /// Verifies a `serverKey` signature envelope over `data`.
    pub fn verify(&self, sign: &Sign, data: &[u8]) -> Result<()> {
        self.validate()?;
        verify_sign(&self.key, sign, data, SERVER_SIGNER_ROLE)
    }
}

impl ServerKeyPrivate {
    /// Parses and validates a server private key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: ServerKeyPrivate =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("server private key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("server private key serialization failed: {e}"),
        })
    }

    /// Structural validation: keyType literal and raw key size.
    pub fn validate(&self) -> Result<()> {
        if self.key_type != KEY_TYPE_PRIVATE {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "expected keyType {KEY_TYPE_PRIVATE:?}, got {:?}",
                    self.key_type
                ),
            });
        }
        if !b64_decodes_to(&self.key, DSA65_PRIVATE_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!("server private key must decode to {DSA65_PRIVATE_KEY_LEN} bytes"),
            });
        }
        Ok(())
    }

    /// Signs `data`, producing a `serverKey` envelope bound to
    /// `public_key_hash`.
    pub fn sign(&self, data: &[u8], public_key_hash: &str) -> Result<Sign> {
        self.validate()?;
        sign_with_dsa65(&self.key, data, public_key_hash, SERVER_SIGNER_ROLE)
    }
}

/// Returns `true` if `json` is a structurally valid server public key.
pub fn is_valid_server_key_public(json: &str) -> bool {
    ServerKeyPublic::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid server private key.
pub fn is_valid_server_key_private(json: &str) -> bool {
    ServerKeyPrivate::from_json(json).is_ok()
}
