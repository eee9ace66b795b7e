//! Migrate keys (ML-KEM-768) and migrate-sign keys (ML-DSA-65).
//!
//! Migrate keys move account state to a new device during a transfer.
//! They are deliberately standalone: no master signature is issued for
//! them, the transfer is authenticated out of band, and the optional
//! `timestamp` is omitted at generation.

use sealchat_crypto::codec::b64_decodes_to;
use sealchat_crypto::dsa::{generate_dsa65_keypair, DSA65_PRIVATE_KEY_LEN, DSA65_PUBLIC_KEY_LEN};
use sealchat_crypto::kem::{generate_kem_keypair, KEM_PRIVATE_KEY_LEN, KEM_PUBLIC_KEY_LEN};
use sealchat_types::{Result, SealchatError};
use serde::{Deserialize, Serialize};

use crate::sealed::{self, EncryptedData};
use crate::signature::{sign_with_dsa65, verify_sign, Sign, ALG_ML_DSA_65};

const MIGRATE_TYPE_PUBLIC: &str = "migrateKeyPublic";
const MIGRATE_TYPE_PRIVATE: &str = "migrateKeyPrivate";
const MIGRATE_SIGN_TYPE_PUBLIC: &str = "migrateSignKeyPublic";
const MIGRATE_SIGN_TYPE_PRIVATE: &str = "migrateSignKeyPrivate";

/// Envelope kind for payloads sealed to a migrate key.
pub const MIGRATE_ENVELOPE_KIND: &str = "migrateKey";

/// Signer role recorded in migrate-sign signature envelopes.
pub const MIGRATE_SIGNER_ROLE: &str = "migrateSignKey";

// ---------------------------------------------------------------------------
// MigrateKey wire structs
// ---------------------------------------------------------------------------

/// Migrate encapsulation key: `{"keyType":"migrateKeyPublic","key":…}`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrateKeyPublic {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 ML-KEM-768 encapsulation key (1184 bytes).
    pub key: String,
    /// Optional issuance time; omitted at generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// Migrate decapsulation key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrateKeyPrivate {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 ML-KEM-768 decapsulation key (2400 bytes).
    pub key: String,
    /// Optional issuance time; omitted at generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// A freshly generated migrate keypair. No master signature.
pub struct MigrateKeyPair {
    pub public: MigrateKeyPublic,
    pub private: MigrateKeyPrivate,
}

impl MigrateKeyPair {
    /// Generates a new ML-KEM-768 migrate keypair.
    pub fn generate() -> Self {
        let (public_b64, private_b64) = generate_kem_keypair();
        Self {
            public: MigrateKeyPublic {
                key_type: MIGRATE_TYPE_PUBLIC.into(),
                key: public_b64,
                timestamp: None,
            },
            private: MigrateKeyPrivate {
                key_type: MIGRATE_TYPE_PRIVATE.into(),
                key: private_b64,
                timestamp: None,
            },
        }
    }
}

impl MigrateKeyPublic {
    /// Parses and validates a migrate public key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: MigrateKeyPublic =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("migrate public key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("migrate public key serialization failed: {e}"),
        })
    }

    /// Structural validation: keyType literal and raw size.
    pub fn validate(&self) -> Result<()> {
        if self.key_type != MIGRATE_TYPE_PUBLIC {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "expected keyType {MIGRATE_TYPE_PUBLIC:?}, got {:?}",
                    self.key_type
                ),
            });
        }
        if !b64_decodes_to(&self.key, KEM_PUBLIC_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!("migrate public key must decode to {KEM_PUBLIC_KEY_LEN} bytes"),
            });
        }
        Ok(())
    }

    /// Seals `data` to this migrate key (hybrid KEM+AEAD).
    pub fn encrypt(&self, data: &str) -> Result<EncryptedData> {
        self.validate()?;
        sealed::seal(MIGRATE_ENVELOPE_KIND, &self.to_json()?, &self.key, data)
    }
}

impl MigrateKeyPrivate {
    /// Parses and validates a migrate private key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: MigrateKeyPrivate =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("migrate private key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("migrate private key serialization failed: {e}"),
        })
    }

    /// Structural validation: keyType literal and raw size.
    pub fn validate(&self) -> Result<()> {
        if self.key_type != MIGRATE_TYPE_PRIVATE {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "expected keyType {MIGRATE_TYPE_PRIVATE:?}, got {:?}",
                    self.key_type
                ),
            });
        }
        if !b64_decodes_to(&self.key, KEM_PRIVATE_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!("migrate private key must decode to {KEM_PRIVATE_KEY_LEN} bytes"),
            });
        }
        Ok(())
    }

    /// Opens a `migrateKey` envelope sealed to this key.
    pub fn decrypt(&self, envelope: &EncryptedData) -> Result<String> {
        self.validate()?;
        envelope.validate_asymmetric(MIGRATE_ENVELOPE_KIND)?;
        sealed::open(&self.key, envelope)
    }
}

// ---------------------------------------------------------------------------
// MigrateSignKey wire structs
// ---------------------------------------------------------------------------

/// Migrate-sign verifying key.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrateSignKeyPublic {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 ML-DSA-65 verifying key (1952 bytes).
    pub key: String,
    /// Optional issuance time; omitted at generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// Migrate-sign signing key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrateSignKeyPrivate {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 ML-DSA-65 signing key (4032 bytes).
    pub key: String,
    /// Optional issuance time; omitted at generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// A freshly generated migrate-sign keypair. No master signature.
pub struct MigrateSignKeyPair {
    pub public: MigrateSignKeyPublic,
    pub private: MigrateSignKeyPrivate,
}

impl MigrateSignKeyPair {
    /// Generates a new ML-DSA-65 migrate-sign keypair.
    pub fn generate() -> Self {
        let (public_b64, private_b64) = generate_dsa65_keypair();
        Self {
            public: MigrateSignKeyPublic {
                key_type: MIGRATE_SIGN_TYPE_PUBLIC.into(),
                key: public_b64,
                timestamp: None,
            },
            private: MigrateSignKeyPrivate {
                key_type: MIGRATE_SIGN_TYPE_PRIVATE.into(),
                key: private_b64,
                timestamp: None,
            },
        }
    }
}

impl MigrateSignKeyPublic {
    /// Parses and validates a migrate-sign public key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: MigrateSignKeyPublic =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("migrate-sign public key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("migrate-sign public key serialization failed: {e}"),
        })
    }

    /// Structural validation: keyType literal and raw size.
    pub fn validate(&self) -> Result<()> {
        if self.key_type != MIGRATE_SIGN_TYPE_PUBLIC {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "expected keyType {MIGRATE_SIGN_TYPE_PUBLIC:?}, got {:?}",
                    self.key_type
                ),
            });
        }
        if !b64_decodes_to(&self.key, DSA65_PUBLIC_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "migrate-sign public key must decode to {DSA65_PUBLIC_KEY_LEN} bytes"
                ),
            });
        }
        Ok(())
    }

    /// Verifies a `migrateSignKey` signature envelope over `data`.
    pub fn verify(&self, sign: &Sign, data: &[u8]) -> Result<()> {
        self.validate()?;
        verify_sign(&self.key, sign, data, MIGRATE_SIGNER_ROLE)
    }
}

impl MigrateSignKeyPrivate {
    /// Parses and validates a migrate-sign private key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: MigrateSignKeyPrivate =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("migrate-sign private key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("migrate-sign private key serialization failed: {e}"),
        })
    }

    /// Structural validation: keyType literal and raw size.
    pub fn validate(&self) -> Result<()> {
        if self.key_type != MIGRATE_SIGN_TYPE_PRIVATE {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "expected keyType {MIGRATE_SIGN_TYPE_PRIVATE:?}, got {:?}",
                    self.key_type
                ),
            });
        }
        if !b64_decodes_to(&self.key, DSA65_PRIVATE_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "migrate-sign private key must decode to {DSA65_PRIVATE_KEY_LEN} bytes"
                ),
            });
        }
        Ok(())
    }

    /// Signs `data`, producing a `migrateSignKey` envelope bound to
    /// `public_key_hash`.
    pub fn sign(&self, data: &[u8], public_key_hash: &str) -> Result<Sign> {
        self.validate()?;
        sign_with_dsa65(&self.key, data, public_key_hash, MIGRATE_SIGNER_ROLE)
    }
}

// ---------------------------------------------------------------------------
// Total validators
// ---------------------------------------------------------------------------

/// Returns `true` if `json` is a structurally valid migrate public key.
pub fn is_valid_migrate_key_public(json: &str) -> bool {
    MigrateKeyPublic::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid migrate private key.
pub fn is_valid_migrate_key_private(json: &str) -> bool {
    MigrateKeyPrivate::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid `migrateKey`
/// encrypted envelope.
pub fn is_valid_encrypted_data_migrate_key(json: &str) -> bool {
    match EncryptedData::from_json(json) {
        Ok(envelope) => envelope.validate_asymmetric(MIGRATE_ENVELOPE_KIND).is_ok(),
        Err(_) => false,
    }
}

/// Returns `true` if `json` is a structurally valid `migrateSignKey`
/// signature envelope (ML-DSA-65).
pub fn is_valid_sign_migrate_sign_key(json: &str) -> bool {
    match Sign::from_json(json) {
        Ok(sign) => sign.key_type == MIGRATE_SIGNER_ROLE && sign.algorithm == ALG_ML_DSA_65,
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
