//! The encrypted envelope and the two sealing paths.
//!
//! Asymmetric sealing (account, share, migrate keys) is hybrid
//! KEM+AEAD: encapsulate against the recipient's ML-KEM-768 key, then
//! AES-256-GCM under the shared secret. Symmetric sealing (room,
//! device keys) is AES-256-GCM directly under the stored key. Both
//! paths produce the same [`EncryptedData`] envelope; the symmetric
//! form simply has no `cipherText`.
//!
//! Canonical field order: `keyType`, `keyHash`, `encryptedData`, `iv`,
//! `algorithm`, `cipherText`.
//!
//! # Asymmetric sealing (sender)
//!
//! ```text
//! 1. (ct, ss) ← ML-KEM-768.Encaps(recipient.key)
//! 2. iv ← random 12 bytes
//! 3. enc ← AES-256-GCM.Encrypt(key = ss, iv, plaintext)   (tag appended)
//! 4. envelope ← { keyType, keyHash(recipient_json), enc, iv, "AES-GCM", ct }
//! ```
//!
//! Opening reverses the steps; any validation, decapsulation or tag
//! failure is an error with no partial output.

use sealchat_crypto::aead::{self, Iv, TAG_LEN};
use sealchat_crypto::codec::{b64_decode, b64_decodes_to, b64_encode};
use sealchat_crypto::hash::{key_hash, HASH_LEN};
use sealchat_crypto::kem::{self, KEM_CIPHERTEXT_LEN};
use sealchat_types::{Result, SealchatError};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Algorithm literal carried by every encrypted envelope.
pub const ALG_AES_GCM: &str = "AES-GCM";

// ---------------------------------------------------------------------------
// EncryptedData
// ---------------------------------------------------------------------------

/// Encrypted envelope, shared by the asymmetric and symmetric paths.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptedData {
    /// Kind of key this payload is encrypted to: `accountKey`,
    /// `shareKey`, `migrateKey`, `roomKey` or `deviceKey`.
    #[serde(rename = "keyType")]
    pub key_type: String,
    /// Base64 SHA-256 of the recipient key's JSON.
    #[serde(rename = "keyHash")]
    pub key_hash: String,
    /// Base64 AES-256-GCM ciphertext with the 16-byte tag appended.
    #[serde(rename = "encryptedData")]
    pub encrypted_data: String,
    /// Base64 12-byte IV.
    pub iv: String,
    /// Always `"AES-GCM"`.
    pub algorithm: String,
    /// Base64 ML-KEM-768 ciphertext (1088 bytes). Present on the
    /// asymmetric path only.
    #[serde(rename = "cipherText", skip_serializing_if = "Option::is_none")]
    pub cipher_text: Option<String>,
}

impl EncryptedData {
    /// Parses an encrypted envelope and runs the form-independent
    /// structural checks.
    ///
    /// # Errors
    ///
    /// Returns [`SealchatError::InvalidEnvelope`] on parse failure or
    /// any structural violation.
    pub fn from_json(json: &str) -> Result<Self> {
        let envelope: EncryptedData =
            serde_json::from_str(json).map_err(|e| SealchatError::InvalidEnvelope {
                reason: format!("encrypted envelope parse failed: {e}"),
            })?;
        envelope.validate_common()?;
        Ok(envelope)
    }

    /// Serializes the envelope in canonical field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealchatError::InvalidEnvelope {
            reason: format!("encrypted envelope serialization failed: {e}"),
        })
    }

    fn validate_common(&self) -> Result<()> {
        if self.algorithm != ALG_AES_GCM {
            return Err(SealchatError::InvalidEnvelope {
                reason: format!("unknown envelope algorithm {:?}", self.algorithm),
            });
        }
        if !b64_decodes_to(&self.key_hash, HASH_LEN) {
            return Err(SealchatError::InvalidEnvelope {
                reason: format!("keyHash must decode to {HASH_LEN} bytes"),
            });
        }
        if !b64_decodes_to(&self.iv, Iv::LEN) {
            return Err(SealchatError::InvalidEnvelope {
                reason: format!("iv must decode to {} bytes", Iv::LEN),
            });
        }
        match b64_decode(&self.encrypted_data) {
            Ok(bytes) if bytes.len() >= TAG_LEN => {}
            Ok(bytes) => {
                return Err(SealchatError::InvalidEnvelope {
                    reason: format!(
                        "encryptedData must be at least {TAG_LEN} bytes, got {}",
                        bytes.len()
                    ),
                })
            }
            Err(e) => return Err(e),
        }
        if let Some(ct) = &self.cipher_text {
            if !b64_decodes_to(ct, KEM_CIPHERTEXT_LEN) {
                return Err(SealchatError::InvalidEnvelope {
                    reason: format!("cipherText must decode to {KEM_CIPHERTEXT_LEN} bytes"),
                });
            }
        }
        Ok(())
    }

    /// Validates the asymmetric (KEM+AEAD) form for a given kind.
    ///
    /// # Errors
    ///
    /// Returns [`SealchatError::InvalidEnvelope`] on a kind mismatch,
    /// a missing `cipherText`, or any common structural violation.
    pub fn validate_asymmetric(&self, expected_kind: &str) -> Result<()> {
        self.validate_common()?;
        if self.key_type != expected_kind {
            return Err(SealchatError::InvalidEnvelope {
                reason: format!(
                    "envelope is for kind {:?}, expected {:?}",
                    self.key_type, expected_kind
                ),
            });
        }
        if self.cipher_text.is_none() {
            return Err(SealchatError::InvalidEnvelope {
                reason: "asymmetric envelope is missing cipherText".into(),
            });
        }
        Ok(())
    }

    /// Validates the symmetric form for a given kind.
    ///
    /// # Errors
    ///
    /// Returns [`SealchatError::InvalidEnvelope`] on a kind mismatch,
    /// a spurious `cipherText`, or any common structural violation.
    pub fn validate_symmetric(&self, expected_kind: &str) -> Result<()> {
        self.validate_common()?;
        if self.key_type != expected_kind {
            return Err(SealchatError::InvalidEnvelope {
                reason: format!(
                    "envelope is for kind {:?}, expected {:?}",
                    self.key_type, expected_kind
                ),
            });
        }
        if self.cipher_text.is_some() {
            return Err(SealchatError::InvalidEnvelope {
                reason: "symmetric envelope must not carry cipherText".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sealing
// ---------------------------------------------------------------------------

/// Seals `plaintext` to a recipient's ML-KEM-768 public key.
///
/// `recipient_json` is the recipient public key's full JSON string
/// (hashed into `keyHash`); `recipient_key_b64` is its `key` field.
pub(crate) fn seal(
    kind: &str,
    recipient_json: &str,
    recipient_key_b64: &str,
    plaintext: &str,
) -> Result<EncryptedData> {
    let (kem_ciphertext, shared) = kem::encapsulate(recipient_key_b64)?;
    let iv = aead::generate_iv();
    let encrypted = aead::encrypt(&shared, &iv, plaintext.as_bytes())?;

    Ok(EncryptedData {
        key_type: kind.to_string(),
        key_hash: key_hash(recipient_json),
        encrypted_data: b64_encode(&encrypted),
        iv: b64_encode(iv.as_bytes()),
        algorithm: ALG_AES_GCM.to_string(),
        cipher_text: Some(b64_encode(&kem_ciphertext)),
    })
}

/// Opens an asymmetric envelope with the recipient's ML-KEM-768
/// private key (its base64 `key` field).
pub(crate) fn open(private_key_b64: &str, envelope: &EncryptedData) -> Result<String> {
    let ct_b64 = envelope
        .cipher_text
        .as_ref()
        .ok_or_else(|| SealchatError::InvalidEnvelope {
            reason: "asymmetric envelope is missing cipherText".into(),
        })?;
    let kem_ciphertext = b64_decode(ct_b64)?;
    let shared = kem::decapsulate(private_key_b64, &kem_ciphertext)?;
    open_body(&shared, envelope)
}

/// Seals `plaintext` under a stored symmetric key.
///
/// `key_json` is the key's full JSON string (hashed into `keyHash`);
/// `key_b64` is its `key` field.
pub(crate) fn seal_symmetric(
    kind: &str,
    key_json: &str,
    key_b64: &str,
    plaintext: &str,
) -> Result<EncryptedData> {
    let key = Zeroizing::new(b64_decode(key_b64)?);
    let iv = aead::generate_iv();
    let encrypted = aead::encrypt(&key, &iv, plaintext.as_bytes())?;

    Ok(EncryptedData {
        key_type: kind.to_string(),
        key_hash: key_hash(key_json),
        encrypted_data: b64_encode(&encrypted),
        iv: b64_encode(iv.as_bytes()),
        algorithm: ALG_AES_GCM.to_string(),
        cipher_text: None,
    })
}

/// Opens a symmetric envelope with the stored key's base64 `key` field.
pub(crate) fn open_symmetric(key_b64: &str, envelope: &EncryptedData) -> Result<String> {
    let key = Zeroizing::new(b64_decode(key_b64)?);
    open_body(&key, envelope)
}

fn open_body(key: &[u8], envelope: &EncryptedData) -> Result<String> {
    let iv_bytes = b64_decode(&envelope.iv)?;
    let iv = Iv::from_slice(&iv_bytes)?;
    let encrypted = b64_decode(&envelope.encrypted_data)?;
    let plaintext = aead::decrypt(key, &iv, &encrypted)?;
    String::from_utf8(plaintext).map_err(|_| SealchatError::CryptoError {
        reason: "decrypted payload is not valid UTF-8".into(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sealchat_crypto::aead::generate_symmetric_key;
    use sealchat_crypto::kem::generate_kem_keypair;

    #[test]
    fn asymmetric_seal_open_roundtrip() -> Result<()> {
        let (public, private) = generate_kem_keypair();
        let envelope = seal("accountKey", "{\"fake\":\"json\"}", &public, "compatibility-test")?;

        envelope.validate_asymmetric("accountKey")?;
        assert_eq!(envelope.algorithm, ALG_AES_GCM);

        let opened = open(&private, &envelope)?;
        assert_eq!(opened, "compatibility-test");
        Ok(())
    }

    #[test]
    fn asymmetric_envelope_sizes() -> Result<()> {
        let (public, _) = generate_kem_keypair();
        let envelope = seal("shareKey", "{}", &public, "data")?;

        assert_eq!(b64_decode(&envelope.iv)?.len(), Iv::LEN);
        assert_eq!(b64_decode(&envelope.key_hash)?.len(), HASH_LEN);
        let ct = envelope.cipher_text.as_deref().unwrap_or("");
        assert_eq!(b64_decode(ct)?.len(), KEM_CIPHERTEXT_LEN);
        assert_eq!(b64_decode(&envelope.encrypted_data)?.len(), "data".len() + TAG_LEN);
        Ok(())
    }

    #[test]
    fn canonical_field_order() -> Result<()> {
        let (public, _) = generate_kem_keypair();
        let json = seal("accountKey", "{}", &public, "x")?.to_json()?;
        assert!(json.starts_with("{\"keyType\":\"accountKey\",\"keyHash\":"));
        assert!(json.contains("\"cipherText\":"));
        Ok(())
    }

    #[test]
    fn wrong_recipient_fails_open() -> Result<()> {
        let (public, _) = generate_kem_keypair();
        let (_, other_private) = generate_kem_keypair();
        let envelope = seal("accountKey", "{}", &public, "secret")?;
        assert!(open(&other_private, &envelope).is_err());
        Ok(())
    }

    #[test]
    fn tampered_payload_fails_open() -> Result<()> {
        let (public, private) = generate_kem_keypair();
        let mut envelope = seal("accountKey", "{}", &public, "secret")?;
        let mut bytes = b64_decode(&envelope.encrypted_data)?;
        bytes[0] ^= 0xFF;
        envelope.encrypted_data = b64_encode(&bytes);
        assert!(open(&private, &envelope).is_err());
        Ok(())
    }

    #[test]
    fn symmetric_seal_open_roundtrip() -> Result<()> {
        let key = generate_symmetric_key();
        let envelope = seal_symmetric("roomKey", "{\"k\":1}", &key, "compatibility-test")?;

        envelope.validate_symmetric("roomKey")?;
        assert!(envelope.cipher_text.is_none());

        let opened = open_symmetric(&key, &envelope)?;
        assert_eq!(opened, "compatibility-test");
        Ok(())
    }

    #[test]
    fn symmetric_envelope_omits_cipher_text_on_wire() -> Result<()> {
        let key = generate_symmetric_key();
        let json = seal_symmetric("deviceKey", "{}", &key, "x")?.to_json()?;
        assert!(!json.contains("cipherText"));
        Ok(())
    }

    #[test]
    fn cipher_text_size_is_exact() -> Result<()> {
        let (public, _) = generate_kem_keypair();
        let envelope = seal("accountKey", "{}", &public, "data")?;

        let mut short = envelope.clone();
        short.cipher_text = Some(b64_encode(&[0u8; KEM_CIPHERTEXT_LEN - 1]));
        assert!(short.validate_asymmetric("accountKey").is_err());

        let mut long = envelope;
        long.cipher_text = Some(b64_encode(&[0u8; KEM_CIPHERTEXT_LEN + 1]));
        assert!(long.validate_asymmetric("accountKey").is_err());
        Ok(())
    }

    #[test]
    fn kind_mismatch_rejected() -> Result<()> {
        let key = generate_symmetric_key();
        let envelope = seal_symmetric("roomKey", "{}", &key, "x")?;
        assert!(envelope.validate_symmetric("deviceKey").is_err());
        Ok(())
    }

    #[test]
    fn symmetric_form_rejects_cipher_text() -> Result<()> {
        let key = generate_symmetric_key();
        let mut envelope = seal_symmetric("roomKey", "{}", &key, "x")?;
        envelope.cipher_text = Some(b64_encode(&[0u8; KEM_CIPHERTEXT_LEN]));
        assert!(envelope.validate_symmetric("roomKey").is_err());
        Ok(())
    }

    #[test]
    fn unknown_fields_rejected() {
        let json = r#"{"keyType":"roomKey","keyHash":"aGFzaA==","encryptedData":"ZGF0YQ==","iv":"aXY=","algorithm":"AES-GCM","extra":1}"#;
        assert!(EncryptedData::from_json(json).is_err());
    }
}
