//! The account key (ML-KEM-768).
//!
//! Account keys receive encrypted payloads — most importantly wrapped
//! room keys during distribution. Like identity keys they are only
//! trusted through the master signature issued alongside them, but
//! they carry no session binding, only an issuance timestamp.

use sealchat_crypto::codec::b64_decodes_to;
use sealchat_crypto::hash::key_hash;
use sealchat_crypto::kem::{generate_kem_keypair, KEM_PRIVATE_KEY_LEN, KEM_PUBLIC_KEY_LEN};
use sealchat_types::time::now_millis;
use sealchat_types::{Result, SealchatError};
use serde::{Deserialize, Serialize};

use crate::master::{MasterKeyPrivate, MasterKeyPublic};
use crate::sealed::{self, EncryptedData};
use crate::signature::Sign;

const KEY_TYPE_PUBLIC: &str = "accountKeyPublic";
const KEY_TYPE_PRIVATE: &str = "accountKeyPrivate";

/// Algorithm literal carried by account keys.
pub const ALG_ML_KEM_768: &str = "ML-KEM-768";

/// Envelope kind for payloads sealed to an account key.
pub const ACCOUNT_ENVELOPE_KIND: &str = "accountKey";

// ---------------------------------------------------------------------------
// Wire structs
// ---------------------------------------------------------------------------

/// Account encapsulation key.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountKeyPublic {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 ML-KEM-768 encapsulation key (1184 bytes).
    pub key: String,
    /// Always `"ML-KEM-768"`.
    pub algorithm: String,
    /// Issuance time, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Account decapsulation key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountKeyPrivate {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 ML-KEM-768 decapsulation key (2400 bytes).
    pub key: String,
    /// Always `"ML-KEM-768"`.
    pub algorithm: String,
    /// Issuance time, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Output of account key issuance: the keypair plus the master
/// signature over the public key's JSON.
pub struct AccountKeyBundle {
    pub public: AccountKeyPublic,
    pub private: AccountKeyPrivate,
    /// Master signature over `public.to_json()`.
    pub master_sign: Sign,
}

// ---------------------------------------------------------------------------
// Issuance
// ---------------------------------------------------------------------------

/// Generates an account keypair and signs its public half with the
/// master key.
pub fn generate_account_key(
    master_public: &MasterKeyPublic,
    master_private: &MasterKeyPrivate,
) -> Result<AccountKeyBundle> {
    master_public.validate()?;
    master_private.validate()?;

    let (public_b64, private_b64) = generate_kem_keypair();
    let timestamp = now_millis();

    let public = AccountKeyPublic {
        key_type: KEY_TYPE_PUBLIC.into(),
        key: public_b64,
        algorithm: ALG_ML_KEM_768.into(),
        timestamp,
    };
    let private = AccountKeyPrivate {
        key_type: KEY_TYPE_PRIVATE.into(),
        key: private_b64,
        algorithm: ALG_ML_KEM_768.into(),
        timestamp,
    };

    let public_json = public.to_json()?;
    let master_hash = key_hash(&master_public.to_json()?);
    let master_sign = master_private.sign(public_json.as_bytes(), &master_hash)?;

    Ok(AccountKeyBundle {
        public,
        private,
        master_sign,
    })
}

// ---------------------------------------------------------------------------
// AccountKeyPublic
// ---------------------------------------------------------------------------

impl AccountKeyPublic {
    /// Parses and validates an account public key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: AccountKeyPublic =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("account public key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("account public key serialization failed: {e}"),
        })
    }

    /// Structural validation: keyType, algorithm literal, raw size.
    pub fn validate(&self) -> Result<()> {
        if self.key_type != KEY_TYPE_PUBLIC {
            return Err(SealchatError::InvalidKey {
                reason: format!("expected keyType {KEY_TYPE_PUBLIC:?}, got {:?}", self.key_type),
            });
        }
        if self.algorithm != ALG_ML_KEM_768 {
            return Err(SealchatError::InvalidKey {
                reason: format!("account key algorithm must be {ALG_ML_KEM_768:?}"),
            });
        }
        if !b64_decodes_to(&self.key, KEM_PUBLIC_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!("account public key must decode to {KEM_PUBLIC_KEY_LEN} bytes"),
            });
        }
        Ok(())
    }

    /// Seals `data` to this account key (hybrid KEM+AEAD).
    pub fn encrypt(&self, data: &str) -> Result<EncryptedData> {
        self.validate()?;
        sealed::seal(ACCOUNT_ENVELOPE_KIND, &self.to_json()?, &self.key, data)
    }
}

// ---------------------------------------------------------------------------
// AccountKeyPrivate
// ---------------------------------------------------------------------------

impl AccountKeyPrivate {
    /// Parses and validates an account private key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: AccountKeyPrivate =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("account private key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("account private key serialization failed: {e}"),
        })
    }

    /// Structural validation mirroring [`AccountKeyPublic::validate`].
    pub fn validate(&self) -> Result<()> {
        if self.key_type != KEY_TYPE_PRIVATE {
            return Err(SealchatError::InvalidKey {
                reason: format!(
                    "expected keyType {KEY_TYPE_PRIVATE:?}, got {:?}",
                    self.key_type
                ),
            });
        }
        if self.algorithm != ALG_ML_KEM_768 {
            return Err(SealchatError::InvalidKey {
                reason: format!("account key algorithm must be {ALG_ML_KEM_768:?}"),
            });
        }
        if !b64_decodes_to(&self.key, KEM_PRIVATE_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!("account private key must decode to {KEM_PRIVATE_KEY_LEN} bytes"),
            });
        }
        Ok(())
    }

    /// Opens an `accountKey` envelope sealed to this key.
    pub fn decrypt(&self, envelope: &EncryptedData) -> Result<String> {
        self.validate()?;
        envelope.validate_asymmetric(ACCOUNT_ENVELOPE_KIND)?;
        sealed::open(&self.key, envelope)
    }
}

// ---------------------------------------------------------------------------
// Total validators
// ---------------------------------------------------------------------------

/// Returns `true` if `json` is a structurally valid account public key.
pub fn is_valid_account_key_public(json: &str) -> bool {
    AccountKeyPublic::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid account private key.
pub fn is_valid_account_key_private(json: &str) -> bool {
    AccountKeyPrivate::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid `accountKey`
/// encrypted envelope.
pub fn is_valid_encrypted_data_account_key(json: &str) -> bool {
    match EncryptedData::from_json(json) {
        Ok(envelope) => envelope.validate_asymmetric(ACCOUNT_ENVELOPE_KIND).is_ok(),
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
