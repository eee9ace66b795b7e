//! The master key (ML-DSA-87).
//!
//! The master key is the root of the cross-signing graph: identity,
//! account, share and share-sign keys are only trusted through a
//! master signature over their public-key JSON. The master key itself
//! carries no timestamp or session binding.

use sealchat_crypto::codec::b64_decodes_to;
use sealchat_crypto::dsa::{generate_dsa87_keypair, DSA87_PRIVATE_KEY_LEN, DSA87_PUBLIC_KEY_LEN};
use sealchat_types::{Result, SealchatError};
use serde::{Deserialize, Serialize};

use crate::signature::{sign_with_dsa87, verify_sign, Sign};

const KEY_TYPE_PUBLIC: &str = "masterKeyPublic";
const KEY_TYPE_PRIVATE: &str = "masterKeyPrivate";

/// Signer role recorded in master signature envelopes.
pub const MASTER_SIGNER_ROLE: &str = "masterKey";

// ---------------------------------------------------------------------------
// Wire structs
// ---------------------------------------------------------------------------

/// Master verifying key: `{"keyType":"masterKeyPublic","key":…}`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MasterKeyPublic {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 ML-DSA-87 verifying key (2592 bytes).
    pub key: String,
}

/// Master signing key: `{"keyType":"masterKeyPrivate","key":…}`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MasterKeyPrivate {
    #[serde(rename = "keyType")]
    key_type: String,
    /// Base64 ML-DSA-87 signing key (4896 bytes).
    pub key: String,
}

// MasterKeyPrivate intentionally does not implement Debug to keep the
// signing key out of logs.

/// A freshly generated master keypair.
pub struct MasterKeyPair {
    pub public: MasterKeyPublic,
    pub private: MasterKeyPrivate,
}

impl MasterKeyPair {
    /// Generates a new ML-DSA-87 master keypair.
    ///
    /// # Errors
    ///
    /// Returns [`SealchatError::CryptoError`] if key generation fails.
    pub fn generate() -> Result<Self> {
        let (public_b64, private_b64) = generate_dsa87_keypair()?;
        Ok(Self {
            public: MasterKeyPublic {
                key_type: KEY_TYPE_PUBLIC.into(),
                key: public_b64,
            },
            private: MasterKeyPrivate {
                key_type: KEY_TYPE_PRIVATE.into(),
                key: private_b64,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// MasterKeyPublic
// ---------------------------------------------------------------------------

impl MasterKeyPublic {
    /// Parses and validates a master public key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: MasterKeyPublic =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("master public key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("master public key serialization failed: {e}"),
        })
    }

    /// Structural validation: keyType literal and raw key size.
    pub fn validate(&self) -> Result<()> {
        if self.key_type != KEY_TYPE_PUBLIC {
            return Err(SealchatError::InvalidKey {
                reason: format!("expected keyType {KEY_TYPE_PUBLIC:?}, got {:?}", self.key_type),
            });
        }
        if !b64_decodes_to(&self.key, DSA87_PUBLIC_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!("master public key must decode to {DSA87_PUBLIC_KEY_LEN} bytes"),
            });
        }
        Ok(())
    }

    /// Verifies a master signature envelope over `data`.
    ///
    /// Rejects envelopes whose signer role is not `masterKey` before
    /// running any cryptography.
    pub fn verify(&self, sign: &Sign, data: &[u8]) -> Result<()> {
        self.validate()?;
        verify_sign(&self.key, sign, data, MASTER_SIGNER_ROLE)
    }
}

// ---------------------------------------------------------------------------
// MasterKeyPrivate
// ---------------------------------------------------------------------------

impl MasterKeyPrivate {
    /// Parses and validates a master private key JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: MasterKeyPrivate =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidKey {
                reason: format!("master private key parse failed: {e}"),
            })?;
        key.validate()?;
        Ok(key)
    }

    /// Serializes the key in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidKey {
            reason: format!("master private key serialization failed: {e}"),
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
        if !b64_decodes_to(&self.key, DSA87_PRIVATE_KEY_LEN) {
            return Err(SealchatError::InvalidKey {
                reason: format!("master private key must decode to {DSA87_PRIVATE_KEY_LEN} bytes"),
            });
        }
        Ok(())
    }

    /// Signs `data` with the master key, producing a `masterKey`
    /// envelope. `public_key_hash` must be the key hash of the
    /// matching public key's JSON.
    pub fn sign(&self, data: &[u8], public_key_hash: &str) -> Result<Sign> {
        self.validate()?;
        sign_with_dsa87(&self.key, data, public_key_hash, MASTER_SIGNER_ROLE)
    }
}

// ---------------------------------------------------------------------------
// Total validators
// ---------------------------------------------------------------------------

/// Returns `true` if `json` is a structurally valid master public key.
pub fn is_valid_master_key_public(json: &str) -> bool {
    MasterKeyPublic::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid master private key.
pub fn is_valid_master_key_private(json: &str) -> bool {
    MasterKeyPrivate::from_json(json).is_ok()
}

/// Returns `true` if `json` is a structurally valid `masterKey`
/// signature envelope (ML-DSA-87).
pub fn is_valid_sign_master_key(json: &str) -> bool {
    match Sign::from_json(json) {
        Ok(sign) => {
            sign.key_type == MASTER_SIGNER_ROLE
                && sign.algorithm == crate::signature::ALG_ML_DSA_87
        }
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sealchat_crypto::hash::key_hash;

    #[test]
    fn generate_sign_verify() -> Result<()> {
        let pair = MasterKeyPair::generate()?;
        let public_hash = key_hash(&pair.public.to_json()?);

        let sign = pair.private.sign(b"Hello, World!", &public_hash)?;
        assert_eq!(sign.key_type, MASTER_SIGNER_ROLE);
        assert_eq!(sign.key_hash, public_hash);

        pair.public.verify(&sign, b"Hello, World!")
    }

    #[test]
    fn verify_rejects_tampered_data() -> Result<()> {
        let pair = MasterKeyPair::generate()?;
        let public_hash = key_hash(&pair.public.to_json()?);
        let sign = pair.private.sign(b"Hello, World!", &public_hash)?;
        assert!(pair.public.verify(&sign, b"Hello, World?").is_err());
        Ok(())
    }

    #[test]
    fn verify_rejects_foreign_role() -> Result<()> {
        let pair = MasterKeyPair::generate()?;
        let public_hash = key_hash(&pair.public.to_json()?);
        let mut sign = pair.private.sign(b"data", &public_hash)?;
        sign.key_type = "identityKey".into();
        assert!(pair.public.verify(&sign, b"data").is_err());
        Ok(())
    }

    #[test]
    fn wire_shape_roundtrip() -> Result<()> {
        let pair = MasterKeyPair::generate()?;
        let json = pair.public.to_json()?;
        assert!(json.starts_with("{\"keyType\":\"masterKeyPublic\",\"key\":\""));

        let parsed = MasterKeyPublic::from_json(&json)?;
        assert_eq!(parsed, pair.public);
        Ok(())
    }

    #[test]
    fn validators_are_total() {
        assert!(!is_valid_master_key_public("not json"));
        assert!(!is_valid_master_key_public("{}"));
        assert!(!is_valid_master_key_private(""));
        assert!(!is_valid_sign_master_key("{\"keyHash\":1}"));
    }

    #[test]
    fn public_rejects_private_key_type() -> Result<()> {
        let pair = MasterKeyPair::generate()?;
        let json = pair.private.to_json()?;
        assert!(MasterKeyPublic::from_json(&json).is_err());
        Ok(())
    }

    #[test]
    fn sign_envelope_validator_checks_algorithm() -> Result<()> {
        let pair = MasterKeyPair::generate()?;
        let public_hash = key_hash(&pair.public.to_json()?);
        let sign = pair.private.sign(b"data", &public_hash)?;
        assert!(is_valid_sign_master_key(&sign.to_json()?));
        Ok(())
    }
}
