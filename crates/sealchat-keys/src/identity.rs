//! The identity key (ML-DSA-65).
//!
//! Identity keys sign messages and room-key distribution metadata.
//! They are session-scoped: each key is bound to a UUIDv7 session
//! identifier and an issuance timestamp, and is only trusted through
//! the master signature produced at generation time.

use sealchat_crypto::codec::b64_decodes_to;
use sealchat_crypto::dsa::{generate_dsa65_keypair, DSA65_PRIVATE_KEY_LEN, DSA65_PUBLIC_KEY_LEN};
use sealchat_crypto::hash::key_hash;
use sealchat_types::session::is_valid_uuid_v7;
use sealchat_types::time::now_millis;
use sealchat_types::{Result, SealchatError};
use serde::{Deserialize, Serialize};

use crate::master::{MasterKeyPrivate, MasterKeyPublic};
use crate::signature::{sign_with_dsa65, verify_sign, Sign, ALG_ML_DSA_65};

const KEY_TYPE_PUBLIC: &str = "identityKeyPublic";
const KEY_TYPE_PRIVATE: &str = "identityKeyPrivate";

/// Signer role recorded in identity signature envelopes.
pub const IDENTITY_SIGNER_ROLE: &str = "identityKey";

// ---------------------------------------------------------------------------
// Wire structs
// ---------------------------------------------------------------------------

/// Identity verifying key.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityKeyPublic {
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

/// Identity signing key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityKeyPrivate {
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

/// Output of identity key issuance: the keypair plus the master
/// signature over the public key's JSON.
pub struct IdentityKeyBundle {
    pub public: IdentityKeyPublic,
    pub private: IdentityKeyPrivate,
    /// Master signature over `public.to_json()`.
    pub master_sign: Sign,
}

// ---------------------------------------------------------------------------
// Issuance
// ---------------------------------------------------------------------------

/// Generates an identity keypair for `session_uuid` and signs its
/// public half with the master key.
///
/// # Errors
///
/// - [`SealchatError::InvalidKey`] if the session UUID is not a
///   UUIDv7 or either master key fails validation.
/// - [`SealchatError::CryptoError`] if a primitive fails.
pub fn generate_identity_key(
    session_uuid: &str,
    master_public: &MasterKeyPublic,
    master_private: &MasterKeyPrivate,
) -> Result<IdentityKeyBundle> {
    if !is_valid_uuid_v7(session_uuid) {
        return Err(SealchatError::InvalidKey {
            reason: "sessionUuid is not a UUIDv7".into(),
        });
    }
    master_public.validate()?;
    master_private.validate()?;

    let (public_b64, private_b64) = generate_dsa65_keypair();
    let timestamp = now_millis();

    let public = IdentityKeyPublic {
        key_type: KEY_TYPE_PUBLIC.into(),
        key: public_b64,
        algorithm: ALG_ML_DSA_65.into(),
        timestamp,
        session_uuid: session_uuid.into(),
    };
    let private = IdentityKeyPrivate {
        key_type: KEY_TYPE_PRIVATE.into(),
        key: private_b64,
        algorithm: ALG_ML_DSA_65.into(),
        timestamp,
        session_uuid: session_uuid.into(),
    };

    let public_json = public.to_json()?;
    let master_hash = key_hash(&master_public.to_json()?);
    let master_sign = master_private.sign(public_json.as_bytes(), &master_hash)?;

    Ok(IdentityKeyBundle {
        public,
        private,
        master_sign,
    })
}

// ---------------------------------------------------------------------------
// IdentityKeyPublic
// ---------------------------------------------------------------------------

impl IdentityKeyPublic {
    /// Parses and validates an identity public key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: IdentityKeyPublic =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("identity public key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("identity public key serialization failed: {e}"),
        })
    }

    /// Structural validation: keyType, algorithm literal, raw size,
    /// session UUID.
    pub fn validate(&self) -> Result<()> {
        if self.key_type != KEY_TYPE_PUBLIC {
            return Err(SealchatError::InvalidKey {
                reason: format!("expected keyType {KEY_TYPE_PUBLIC:?}, got {:?}", self.key_type),
            });
        }
        if self.algorithm != ALG_ML_DSA_65 {
            return Err(SealchatError::InvalidKey {
                reason: format!("identity key algorithm must be {ALG_ML_DSA_65:?}"),
            });
        }
        if !b64_decodes_to(&self.key, DSA65_PUBLIC_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!("identity public key must decode to {DSA65_PUBLIC_KEY_LEN} bytes"),
            });
        }
        if !is_valid_uuid_v7(&self.session_uuid) {
            return Err(SealchatError::InvalidKey {
                reason: "sessionUuid is not a UUIDv7".into(),
            });
        }
        Ok(())
    }

    /// Verifies an `identityKey` signature envelope over `data`.
    pub fn verify(&self, sign: &Sign, data: &[u8]) -> Result<()> {
        self.validate()?;
        verify_sign(&self.key, sign, data, IDENTITY_SIGNER_ROLE)
    }
}

// ---------------------------------------------------------------------------
// IdentityKeyPrivate
// ---------------------------------------------------------------------------

impl IdentityKeyPrivate {
    /// Parses and validates an identity private key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: IdentityKeyPrivate =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("identity private key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("identity private key serialization failed: {e}"),
        })
    }

    /// Structural validation mirroring [`IdentityKeyPublic::validate`].
    pub fn validate(&self) -> Result<()> {
        if self.key_type != KEY_TYPE_PRIVATE {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "expected keyType {KEY_TYPE_PRIVATE:?}, got {:?}",
                    self.key_type
                ),
            });
        }
        if self.algorithm != ALG_ML_DSA_65 {
            return Err(SealchatError::InvalidKey {
                reason: format!("identity key algorithm must be {ALG_ML_DSA_65:?}"),
            });
        }
        if !b64_decodes_to(&self.key, DSA65_PRIVATE_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "identity private key must decode to {DSA65_PRIVATE_KEY_LEN} bytes"
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

    /// Signs `data` with the identity key, producing an `identityKey`
    /// envelope bound to `public_key_hash`.
    pub fn sign(&self, data: &[u8], public_key_hash: &str) -> Result<Sign> {
        self.validate()?;
        sign_with_dsa65(&self.key, data, public_key_hash, IDENTITY_SIGNER_ROLE)
    }
}

// ---------------------------------------------------------------------------
// Total validators
// ---------------------------------------------------------------------------

/// Returns `true` if `json` is a structurally valid identity public key.
pub fn is_valid_identity_key_public(json: &str) -> bool {
    IdentityKeyPublic::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid identity private key.
pub fn is_valid_identity_key_private(json: &str) -> bool {
    IdentityKeyPrivate::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid `identityKey`
/// signature envelope (ML-DSA-65).
pub fn is_valid_sign_identity_key(json: &str) -> bool {
    match Sign::from_json(json) {
        Ok(sign) => sign.key_type == IDENTITY_SIGNER_ROLE && sign.algorithm == ALG_ML_DSA_65,
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
