//! Share keys (ML-KEM-768) and share-sign keys (ML-DSA-65).
//!
//! Share keys let a session hand encrypted state to another session of
//! the same account; share-sign keys authenticate that state. Both are
//! session-scoped like identity keys and master-signed at issuance.

use sealchat_crypto::codec::b64_decodes_to;
use sealchat_crypto::dsa::{generate_dsa65_keypair, DSA65_PRIVATE_KEY_LEN, DSA65_PUBLIC_KEY_LEN};
use sealchat_crypto::hash::key_hash;
use sealchat_crypto::kem::{generate_kem_keypair, KEM_PRIVATE_KEY_LEN, KEM_PUBLIC_KEY_LEN};
use sealchat_types::session::is_valid_uuid_v7;
use sealchat_types::time::now_millis;
use sealchat_types::{Result, SealchatError};
use serde::{Deserialize, Serialize};

use crate::account::ALG_ML_KEM_768;
use crate::master::{MasterKeyPrivate, MasterKeyPublic};
use crate::sealed::{self, EncryptedData};
use crate::signature::{sign_with_dsa65, verify_sign, Sign, ALG_ML_DSA_65};

const SHARE_TYPE_PUBLIC: &str = "shareKeyPublic";
const SHARE_TYPE_PRIVATE: &str = "shareKeyPrivate";
const SHARE_SIGN_TYPE_PUBLIC: &str = "shareSignKeyPublic";
const SHARE_SIGN_TYPE_PRIVATE: &str = "shareSignKeyPrivate";

/// Envelope kind for payloads sealed to a share key.
pub const SHARE_ENVELOPE_KIND: &str = "shareKey";

/// Signer role recorded in share-sign signature envelopes.
pub const SHARE_SIGNER_ROLE: &str = "shareSignKey";

// ---------------------------------------------------------------------------
// ShareKey wire structs
// ---------------------------------------------------------------------------

/// Share encapsulation key.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareKeyPublic {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 ML-KEM-768 encapsulation key (1184 bytes).
    pub key: String,
    /// Always `"ML-KEM-768"`.
    pub algorithm: String,
    /// Issuance time, milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// UUIDv7 of the session this key belongs to.
    #[serde(rename = "sessionUuid")]
    pub session_uuid: String,
}

/// Share decapsulation key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareKeyPrivate {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 ML-KEM-768 decapsulation key (2400 bytes).
    pub key: String,
    /// Always `"ML-KEM-768"`.
    pub algorithm: String,
    /// Issuance time, milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// UUIDv7 of the session this key belongs to.
    #[serde(rename = "sessionUuid")]
    pub session_uuid: String,
}

/// Output of share key issuance.
pub struct ShareKeyBundle {
    pub public: ShareKeyPublic,
    pub private: ShareKeyPrivate,
    /// Master signature over `public.to_json()`.
    pub master_sign: Sign,
}

// ---------------------------------------------------------------------------
// ShareKey issuance and operations
// ---------------------------------------------------------------------------

/// Generates a share keypair for `session_uuid` and signs its public
/// half with the master key.
pub fn generate_share_key(
    session_uuid: &str,
    master_public: &MasterKeyPublic,
    master_private: &MasterKeyPrivate,
) -> Result<ShareKeyBundle> {
    if !is_valid_uuid_v7(session_uuid) {
        return Err(SealchatError::InvalidKey {
            reason: "sessionUuid is not a UUIDv7".into(),
        });
    }
    master_public.validate()?;
    master_private.validate()?;

    let (public_b64, private_b64) = generate_kem_keypair();
    let timestamp = now_millis();

    let public = ShareKeyPublic {
        key_type: SHARE_TYPE_PUBLIC.into(),
        key: public_b64,
        algorithm: ALG_ML_KEM_768.into(),
        timestamp,
        session_uuid: session_uuid.into(),
    };
    let private = ShareKeyPrivate {
        key_type: SHARE_TYPE_PRIVATE.into(),
        key: private_b64,
        algorithm: ALG_ML_KEM_768.into(),
        timestamp,
        session_uuid: session_uuid.into(),
    };

    let public_json = public.to_json()?;
    let master_hash = key_hash(&master_public.to_json()?);
    let master_sign = master_private.sign(public_json.as_bytes(), &master_hash)?;

    Ok(ShareKeyBundle {
        public,
        private,
        master_sign,
    })
}

impl ShareKeyPublic {
    /// Parses and validates a share public key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: ShareKeyPublic =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("share public key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("share public key serialization failed: {e}"),
        })
    }

    /// Structural validation: keyType, algorithm, raw size, session UUID.
    pub fn validate(&self) -> Result<()> {
        if self.key_type != SHARE_TYPE_PUBLIC {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "expected keyType {SHARE_TYPE_PUBLIC:?}, got {:?}",
                    self.key_type
                ),
            });
        }
        if self.algorithm != ALG_ML_KEM_768 {
            return Err(SealchatError::InvalidKey {
                reason: format!("share key algorithm must be {ALG_ML_KEM_768:?}"),
            });
        }
        if !b64_decodes_to(&self.key, KEM_PUBLIC_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!("share public key must decode to {KEM_PUBLIC_KEY_LEN} bytes"),
            });
        }
        if !is_valid_uuid_v7(&self.session_uuid) {
            return Err(SealchatError::InvalidKey {
                reason: "sessionUuid is not a UUIDv7".into(),
            });
        }
        Ok(())
    }

    /// Seals `data` to this share key (hybrid KEM+AEAD).
    pub fn encrypt(&self, data: &str) -> Result<EncryptedData> {
        self.validate()?;
        sealed::seal(SHARE_ENVELOPE_KIND, &self.to_json()?, &self.key, data)
    }
}

impl ShareKeyPrivate {
    /// Parses and validates a share private key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: ShareKeyPrivate =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("share private key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("share private key serialization failed: {e}"),
        })
    }

    /// Structural validation mirroring [`ShareKeyPublic::validate`].
    pub fn validate(&self) -> Result<()> {
        if self.key_type != SHARE_TYPE_PRIVATE {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "expected keyType {SHARE_TYPE_PRIVATE:?}, got {:?}",
                    self.key_type
                ),
            });
        }
        if self.algorithm != ALG_ML_KEM_768 {
            return Err(SealchatError::InvalidKey {
                reason: format!("share key algorithm must be {ALG_ML_KEM_768:?}"),
            });
        }
        if !b64_decodes_to(&self.key, KEM_PRIVATE_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!("share private key must decode to {KEM_PRIVATE_KEY_LEN} bytes"),
            });
        }
        if !is_valid_uuid_v7(&self.session_uuid) {
            return Err(SealchatError::InvalidKey {
                reason: "sessionUuid is not a UUIDv7".into(),
            });
        }
        Ok(())
    }

    /// Opens a `shareKey` envelope sealed to this key.
    pub fn decrypt(&self, envelope: &EncryptedData) -> Result<String> {
        self.validate()?;
        envelope.validate_asymmetric(SHARE_ENVELOPE_KIND)?;
        sealed::open(&self.key, envelope)
    }
}

// ---------------------------------------------------------------------------
// ShareSignKey wire structs
// ---------------------------------------------------------------------------

/// Share-sign verifying key.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareSignKeyPublic {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 ML-DSA-65 verifying key (1952 bytes).
    pub key: String,
    /// Always `"ML-DSA-65"`.
    pub algorithm: String,
    /// Issuance time, milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// UUIDv7 of the session this key belongs to.
    #[serde(rename = "sessionUuid")]
    pub session_uuid: String,
}

/// Share-sign signing key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareSignKeyPrivate {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 ML-DSA-65 signing key (4032 bytes).
    pub key: String,
    /// Always `"ML-DSA-65"`.
    pub algorithm: String,
    /// Issuance time, milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// UUIDv7 of the session this key belongs to.
    #[serde(rename = "sessionUuid")]
    pub session_uuid: String,
}

/// Output of share-sign key issuance.
pub struct ShareSignKeyBundle {
    pub public: ShareSignKeyPublic,
    pub private: ShareSignKeyPrivate,
    /// Master signature over `public.to_json()`.
    pub master_sign: Sign,
}

// ---------------------------------------------------------------------------
// ShareSignKey issuance and operations
// ---------------------------------------------------------------------------

/// Generates a share-sign keypair for `session_uuid` and signs its
/// public half with the master key.
pub fn generate_share_sign_key(
    session_uuid: &str,
    master_public: &MasterKeyPublic,
    master_private: &MasterKeyPrivate,
) -> Result<ShareSignKeyBundle> {
    if !is_valid_uuid_v7(session_uuid) {
        return Err(SealchatError::InvalidKey {
            reason: "sessionUuid is not a UUIDv7".into(),
        });
    }
    master_public.validate()?;
    master_private.validate()?;

    let (public_b64, private_b64) = generate_dsa65_keypair();
    let timestamp = now_millis();

    let public = ShareSignKeyPublic {
        key_type: SHARE_SIGN_TYPE_PUBLIC.into(),
        key: public_b64,
        algorithm: ALG_ML_DSA_65.into(),
        timestamp,
        session_uuid: session_uuid.into(),
    };
    let private = ShareSignKeyPrivate {
        key_type: SHARE_SIGN_TYPE_PRIVATE.into(),
        key: private_b64,
        algorithm: ALG_ML_DSA_65.into(),
        timestamp,
        session_uuid: session_uuid.into(),
    };

    let public_json = public.to_json()?;
    let master_hash = key_hash(&master_public.to_json()?);
    let master_sign = master_private.sign(public_json.as_bytes(), &master_hash)?;

    Ok(ShareSignKeyBundle {
        public,
        private,
        master_sign,
    })
}

impl ShareSignKeyPublic {
    /// Parses and validates a share-sign public key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: ShareSignKeyPublic =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("share-sign public key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("share-sign public key serialization failed: {e}"),
        })
    }

    /// Structural validation: keyType, algorithm, raw size, session UUID.
    pub fn validate(&self) -> Result<()> {
        if self.key_type != SHARE_SIGN_TYPE_PUBLIC {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "expected keyType {SHARE_SIGN_TYPE_PUBLIC:?}, got {:?}",
                    self.key_type
                ),
            });
        }
        if self.algorithm != ALG_ML_DSA_65 {
            return Err(SealchatError::InvalidKey {
                reason: format!("share-sign key algorithm must be {ALG_ML_DSA_65:?}"),
            });
        }
        if !b64_decodes_to(&self.key, DSA65_PUBLIC_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "share-sign public key must decode to {DSA65_PUBLIC_KEY_LEN} bytes"
                ),
            });
        }
        if !is_valid_uuid_v7(&self.session_uuid) {
            return Err(SealchatError::InvalidKey {
                reason: "sessionUuid is not a UUIDv7".into(),
            });
        }
        Ok(())
    }

    /// Verifies a `shareSignKey` signature envelope over `data`.
    pub fn verify(&self, sign: &Sign, data: &[u8]) -> Result<()> {
        self.validate()?;
        verify_sign(&self.key, sign, data, SHARE_SIGNER_ROLE)
    }
}

impl ShareSignKeyPrivate {
    /// Parses and validates a share-sign private key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: ShareSignKeyPrivate =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("share-sign private key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("share-sign private key serialization failed: {e}"),
        })
    }

    /// Structural validation mirroring [`ShareSignKeyPublic::validate`].
    pub fn validate(&self) -> Result<()> {
        if self.key_type != SHARE_SIGN_TYPE_PRIVATE {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "expected keyType {SHARE_SIGN_TYPE_PRIVATE:?}, got {:?}",
                    self.key_type
                ),
            });
        }
        if self.algorithm != ALG_ML_DSA_65 {
            return Err(SealchatError::InvalidKey {
                reason: format!("share-sign key algorithm must be {ALG_ML_DSA_65:?}"),
            });
        }
        if !b64_decodes_to(&self.key, DSA65_PRIVATE_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "share-sign private key must decode to {DSA65_PRIVATE_KEY_LEN} bytes"
                ),
            });
        }
        if !is_valid_uuid_v7(&self.session_uuid) {
            return Err(SealchatError::InvalidKey {
                reason: "sessionUuid is not a UUIDv7".into(),
            });
        }
        Ok(())
    }

    /// Signs `data`, producing a `shareSignKey` envelope bound to
    /// `public_key_hash`.
    pub fn sign(&self, data: &[u8], public_key_hash: &str) -> Result<Sign> {
        self.validate()?;
        sign_with_dsa65(&self.key, data, public_key_hash, SHARE_SIGNER_ROLE)
    }
}

// ---------------------------------------------------------------------------
// Total validators
// ---------------------------------------------------------------------------

/// Returns `true` if `json` is a structurally valid share public key.
pub fn is_valid_share_key_public(json: &str) -> bool {
    ShareKeyPublic::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid share private key.
pub fn is_valid_share_key_private(json: &str) -> bool {
    ShareKeyPrivate::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid `shareKey`
/// encrypted envelope.
pub fn is_valid_encrypted_data_share_key(json: &str) -> bool {
    match EncryptedData::from_json(json) {
        Ok(envelope) => envelope.validate_asymmetric(SHARE_ENVELOPE_KIND).is_ok(),
        Err(_) => false,
    }
}

/// Returns `true` if `json` is a structurally valid share-sign public key.
pub fn is_valid_share_sign_key_public(json: &str) -> bool {
    ShareSignKeyPublic::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid share-sign private key.
pub fn is_valid_share_sign_key_private(json: &str) -> bool {
    ShareSignKeyPrivate::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid `shareSignKey`
/// signature envelope (ML-DSA-65).
pub fn is_valid_sign_share_sign_key(json: &str) -> bool {
    match Sign::from_json(json) {
        Ok(sign) => sign.key_type == SHARE_SIGNER_ROLE && sign.algorithm == ALG_ML_DSA_65,
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
