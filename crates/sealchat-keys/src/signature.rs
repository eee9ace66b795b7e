//! The signature envelope.
//!
//! Every signature in Sealchat travels as a [`Sign`] envelope binding
//! the raw signature bytes to the role of the signer (`keyType`) and
//! to the hash of the signer's public-key JSON (`keyHash`), so a
//! verifier can locate the signing key among the keys it holds.
//!
//! Canonical field order: `keyHash`, `signature`, `keyType`,
//! `algorithm`. The `algorithm` field is required.

use sealchat_crypto::codec::b64_decodes_to;
use sealchat_crypto::dsa::{
    sign_dsa65, sign_dsa87, verify_dsa65, verify_dsa87, DSA65_SIGNATURE_LEN, DSA87_SIGNATURE_LEN,
};
use sealchat_crypto::hash::HASH_LEN;
use sealchat_types::{Result, SealchatError};
use serde::{Deserialize, Serialize};

/// Algorithm literal for ML-DSA-65 signatures.
pub const ALG_ML_DSA_65: &str = "ML-DSA-65";

/// Algorithm literal for ML-DSA-87 signatures.
pub const ALG_ML_DSA_87: &str = "ML-DSA-87";

/// The signer roles a signature envelope may carry.
const SIGNER_ROLES: [&str; 5] = [
    "masterKey",
    "identityKey",
    "shareSignKey",
    "migrateSignKey",
    "serverKey",
];

// ---------------------------------------------------------------------------
// Sign
// ---------------------------------------------------------------------------

/// Signature envelope.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sign {
    /// Base64 SHA-256 of the signer's public-key JSON.
    #[serde(rename = "keyHash")]
    pub key_hash: String,
    /// Base64 raw signature (3309 bytes for ML-DSA-65, 4627 for ML-DSA-87).
    pub signature: String,
    /// Role of the signer: `masterKey`, `identityKey`, `shareSignKey`,
    /// `migrateSignKey` or `serverKey`.
    #[serde(rename = "keyType")]
    pub key_type: String,
    /// Signature algorithm literal.
    pub algorithm: String,
}

impl Sign {
    /// Parses and structurally validates a signature envelope.
    ///
    /// # Errors
    ///
    /// Returns [`SealchatError::InvalidEnvelope`] on parse failure or
    /// any structural violation.
    pub fn from_json(json: &str) -> Result<Self> {
        let sign: Sign =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidEnvelope {
                reason: format!("signature envelope parse failed: {e}"),
            })?;
        sign.validate()?;
        Ok(sign)
    }

    /// Serializes the envelope in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidEnvelope {
            reason: format!("signature envelope serialization failed: {e}"),
        })
    }

    /// Structural validation: signer role, algorithm literal, key-hash
    /// size, signature size matching the algorithm.
    pub fn validate(&self) -> Result<()> {
        if !SIGNER_ROLES.contains(&self.key_type.as_str()) {
            return Err(SealchatError::InvalidEnvelope {
                reason: format!("unknown signer role {:?}", self.key_type),
            });
        }
        let expected_sig_len = match self.algorithm.as_str() {
            ALG_ML_DSA_65 => DSA65_SIGNATURE_LEN,
            ALG_ML_DSA_87 => DSA87_SIGNATURE_LEN,
            other => {
                return Err(SealchatError::InvalidEnvelope {
                    reason: format!("unknown signature algorithm {other:?}"),
                })
            }
        };
        if !b64_decodes_to(&self.key_hash, HASH_LEN) {
            return Err(SealchatError::InvalidEnvelope {
                reason: format!("keyHash must decode to {HASH_LEN} bytes"),
            });
        }
        if !b64_decodes_to(&self.signature, expected_sig_len) {
            return Err(SealchatError::InvalidEnvelope {
                reason: format!(
                    "{} signature must decode to {expected_sig_len} bytes",
                    self.algorithm
                ),
            });
        }
        Ok(())
    }
}

/// Returns `true` if `json` parses as a structurally valid signature
/// envelope. Total over arbitrary strings.
pub fn is_valid_sign(json: &str) -> bool {
    Sign::from_json(json).is_ok()
}

// ---------------------------------------------------------------------------
// Construction / verification
// ---------------------------------------------------------------------------

/// Signs `data` with an ML-DSA-65 signing key and wraps the result in
/// a [`Sign`] envelope.
///
/// `key_hash` must be the key hash of the signer's **public** key
/// JSON; `key_type` names the signer role.
pub fn sign_with_dsa65(
    private_key_b64: &str,
    data: &[u8],
    key_hash: &str,
    key_type: &str,
) -> Result<Sign> {
    let signature = sign_dsa65(private_key_b64, data)?;
    Ok(Sign {
        key_hash: key_hash.to_string(),
        signature: sealchat_crypto::codec::b64_encode(&signature),
        key_type: key_type.to_string(),
        algorithm: ALG_ML_DSA_65.to_string(),
    })
}

/// Signs `data` with an ML-DSA-87 signing key and wraps the result in
/// a [`Sign`] envelope.
pub fn sign_with_dsa87(
    private_key_b64: &str,
    data: &[u8],
    key_hash: &str,
    key_type: &str,
) -> Result<Sign> {
    let signature = sign_dsa87(private_key_b64, data)?;
    Ok(Sign {
        key_hash: key_hash.to_string(),
        signature: sealchat_crypto::codec::b64_encode(&signature),
        key_type: key_type.to_string(),
        algorithm: ALG_ML_DSA_87.to_string(),
    })
}

/// Verifies a signature envelope against a verifying key and the
/// expected signer role.
///
/// The algorithm is dispatched from the envelope's `algorithm` field;
/// a role mismatch is rejected before any cryptography runs.
///
/// # Errors
///
/// - [`SealchatError::VerificationFailed`] on role mismatch or an
///   invalid signature.
/// - [`SealchatError::InvalidEnvelope`] if the envelope is
///   structurally invalid.
pub fn verify_sign(
    public_key_b64: &str,
    sign: &Sign,
    data: &[u8],
    expected_key_type: &str,
) -> Result<()> {
    if sign.key_type != expected_key_type {
        return Err(SealchatError::VerificationFailed {
            reason: format!(
                "signature envelope is for role {:?}, expected {:?}",
                sign.key_type, expected_key_type
            ),
        });
    }
    sign.validate()?;

    let ok = match sign.algorithm.as_str() {
        ALG_ML_DSA_87 => verify_dsa87(public_key_b64, data, &sign.signature),
        ALG_ML_DSA_65 => verify_dsa65(public_key_b64, data, &sign.signature),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(SealchatError::VerificationFailed {
            reason: format!("{} signature did not verify", sign.algorithm),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sealchat_crypto::dsa::generate_dsa65_keypair;

    fn sample_sign() -> Result<(String, Sign)> {
        let (public, private) = generate_dsa65_keypair();
        let key_hash = sealchat_crypto::hash::key_hash("signer public key json");
        let sign = sign_with_dsa65(&private, b"payload", &key_hash, "identityKey")?;
        Ok((public, sign))
    }

    #[test]
    fn envelope_roundtrip_and_verify() -> Result<()> {
        let (public, private) = generate_dsa65_keypair();
        let key_hash = sealchat_crypto::hash::key_hash("some public key json");
        let sign = sign_with_dsa65(&private, b"payload", &key_hash, "identityKey")?;

        let json = sign.to_json()?;
        let parsed = Sign::from_json(&json)?;
        assert_eq!(parsed, sign);

        verify_sign(&public, &parsed, b"payload", "identityKey")
    }

    #[test]
    fn canonical_field_order() -> Result<()> {
        let (_, private) = generate_dsa65_keypair();
        let key_hash = sealchat_crypto::hash::key_hash("pk");
        let sign = sign_with_dsa65(&private, b"d", &key_hash, "serverKey")?;
        let json = sign.to_json()?;
        assert!(json.starts_with("{\"keyHash\":"));
        let hash_pos = json.find("keyHash").unwrap_or(usize::MAX);
        let sig_pos = json.find("signature").unwrap_or(0);
        let type_pos = json.find("keyType").unwrap_or(0);
        let alg_pos = json.find("algorithm").unwrap_or(0);
        assert!(hash_pos < sig_pos && sig_pos < type_pos && type_pos < alg_pos);
        Ok(())
    }

    #[test]
    fn role_mismatch_rejected() -> Result<()> {
        let (public, private) = generate_dsa65_keypair();
        let key_hash = sealchat_crypto::hash::key_hash("pk");
        let sign = sign_with_dsa65(&private, b"payload", &key_hash, "identityKey")?;
        assert!(verify_sign(&public, &sign, b"payload", "serverKey").is_err());
        Ok(())
    }

    #[test]
    fn tampered_data_rejected() -> Result<()> {
        let (public, private) = generate_dsa65_keypair();
        let key_hash = sealchat_crypto::hash::key_hash("pk");
        let sign = sign_with_dsa65(&private, b"payload", &key_hash, "identityKey")?;
        assert!(verify_sign(&public, &sign, b"payload!", "identityKey").is_err());
        Ok(())
    }

    #[test]
    fn unknown_role_rejected_structurally() -> Result<()> {
        let (_, sign) = sample_sign()?;
        let mut bad = sign;
        bad.key_type = "roomKey".into();
        assert!(bad.validate().is_err());
        Ok(())
    }

    #[test]
    fn missing_algorithm_rejected() {
        // The algorithm field is required; a legacy envelope without it
        // fails to parse.
        let json = r#"{"keyHash":"aGFzaA==","signature":"c2ln","keyType":"masterKey"}"#;
        assert!(Sign::from_json(json).is_err());
        assert!(!is_valid_sign(json));
    }

    #[test]
    fn wrong_signature_size_rejected() -> Result<()> {
        let (_, private) = generate_dsa65_keypair();
        let key_hash = sealchat_crypto::hash::key_hash("pk");
        let mut sign = sign_with_dsa65(&private, b"payload", &key_hash, "identityKey")?;
        // Claim ML-DSA-87 while carrying an ML-DSA-65-sized signature.
        sign.algorithm = ALG_ML_DSA_87.into();
        assert!(sign.validate().is_err());
        Ok(())
    }

    #[test]
    fn validator_is_total_on_garbage() {
        assert!(!is_valid_sign("not json"));
        assert!(!is_valid_sign("{}"));
        assert!(!is_valid_sign("[1,2,3]"));
    }
}
