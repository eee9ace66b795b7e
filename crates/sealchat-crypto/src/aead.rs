//! AES-256-GCM authenticated encryption.
//!
//! All symmetric encryption in Sealchat uses AES-256-GCM with 96-bit
//! (12-byte) IVs drawn from OS entropy. The 16-byte authentication tag
//! is appended to the ciphertext. No associated data is used — the
//! binding of an envelope to its key happens through the `keyHash`
//! field at the envelope layer, not through AAD.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use sealchat_types::{Result, SealchatError};

use crate::codec::b64_encode;

/// AES-256 key length.
pub const SYMMETRIC_KEY_LEN: usize = 32;

/// GCM tag length, appended to every ciphertext.
pub const TAG_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Iv
// ---------------------------------------------------------------------------

/// 96-bit (12-byte) AES-GCM initialization vector.
///
/// Must be unique per encryption under a given key; [`generate_iv`]
/// draws fresh OS entropy on every call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Iv([u8; 12]);

impl Iv {
    /// Fixed byte length of an AES-GCM IV.
    pub const LEN: usize = 12;

    /// Creates an [`Iv`] from raw bytes.
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Creates an [`Iv`] from a slice, checking the length.
    ///
    /// # Errors
    ///
    /// Returns [`SealchatError::InvalidEnvelope`] if the slice is not
    /// exactly [`Iv::LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 12] = bytes
            .try_into()
            .map_err(|_| SealchatError::InvalidEnvelope {
                reason: format!("iv must be {} bytes, got {}", Iv::LEN, bytes.len()),
            })?;
        Ok(Self(arr))
    }

    /// Returns the underlying 12-byte array.
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

/// Generates a fresh random IV from OS entropy.
pub fn generate_iv() -> Iv {
    let mut bytes = [0u8; 12];
    OsRng.fill_bytes(&mut bytes);
    Iv(bytes)
}

/// Generates a fresh 256-bit symmetric key, base64-encoded.
pub fn generate_symmetric_key() -> String {
    let mut key = [0u8; SYMMETRIC_KEY_LEN];
    OsRng.fill_bytes(&mut key);
    b64_encode(&key)
}

// ---------------------------------------------------------------------------
// Encrypt / Decrypt
// ---------------------------------------------------------------------------

/// Encrypts `plaintext` with AES-256-GCM.
///
/// Returns the ciphertext with the 16-byte tag appended
/// (length = plaintext length + [`TAG_LEN`]).
///
/// # Errors
///
/// Returns [`SealchatError::InvalidKey`] if `key` is not 32 bytes, or
/// [`SealchatError::CryptoError`] if the cipher fails.
pub fn encrypt(key: &[u8], iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SealchatError::InvalidKey {
        reason: format!(
            "AES-256-GCM key must be {SYMMETRIC_KEY_LEN} bytes, got {}",
            key.len()
        ),
    })?;
    let nonce = Nonce::from_slice(iv.as_bytes());
    cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| SealchatError::CryptoError {
            reason: "AES-256-GCM encryption failed".into(),
        })
}

/// Decrypts AES-256-GCM `ciphertext` (with appended tag).
///
/// # Errors
///
/// Returns [`SealchatError::InvalidKey`] for a wrong-size key, or
/// [`SealchatError::CryptoError`] when the tag does not verify (wrong
/// key, wrong IV, or tampered ciphertext).
pub fn decrypt(key: &[u8], iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SealchatError::InvalidKey {
        reason: format!(
            "AES-256-GCM key must be {SYMMETRIC_KEY_LEN} bytes, got {}",
            key.len()
        ),
    })?;
    let nonce = Nonce::from_slice(iv.as_bytes());
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| SealchatError::CryptoError {
            reason: "AES-256-GCM authentication failed".into(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() -> Result<()> {
        let key = [0x42u8; SYMMETRIC_KEY_LEN];
        let iv = generate_iv();
        let plaintext = b"hello sealchat";

        let ciphertext = encrypt(&key, &iv, plaintext)?;
        assert_ne!(ciphertext.as_slice(), plaintext.as_slice());
        assert_eq!(ciphertext.len(), plaintext.len() + TAG_LEN);

        let decrypted = decrypt(&key, &iv, &ciphertext)?;
        assert_eq!(decrypted.as_slice(), plaintext.as_slice());
        Ok(())
    }

    #[test]
    fn empty_plaintext_roundtrip() -> Result<()> {
        let key = [0x01u8; SYMMETRIC_KEY_LEN];
        let iv = generate_iv();

        let ciphertext = encrypt(&key, &iv, b"")?;
        assert_eq!(ciphertext.len(), TAG_LEN);

        let decrypted = decrypt(&key, &iv, &ciphertext)?;
        assert!(decrypted.is_empty());
        Ok(())
    }

    #[test]
    fn wrong_key_fails_decrypt() -> Result<()> {
        let iv = generate_iv();
        let ciphertext = encrypt(&[0x42u8; 32], &iv, b"secret")?;
        assert!(decrypt(&[0x43u8; 32], &iv, &ciphertext).is_err());
        Ok(())
    }

    #[test]
    fn wrong_iv_fails_decrypt() -> Result<()> {
        let key = [0x42u8; SYMMETRIC_KEY_LEN];
        let ciphertext = encrypt(&key, &Iv::from_bytes([0xAA; 12]), b"secret")?;
        assert!(decrypt(&key, &Iv::from_bytes([0xAB; 12]), &ciphertext).is_err());
        Ok(())
    }

    #[test]
    fn tampered_ciphertext_fails_decrypt() -> Result<()> {
        let key = [0x42u8; SYMMETRIC_KEY_LEN];
        let iv = generate_iv();
        let mut ciphertext = encrypt(&key, &iv, b"secret")?;
        if let Some(byte) = ciphertext.first_mut() {
            *byte ^= 0xFF;
        }
        assert!(decrypt(&key, &iv, &ciphertext).is_err());
        Ok(())
    }

    #[test]
    fn wrong_size_key_rejected() {
        let iv = generate_iv();
        assert!(encrypt(&[0u8; 16], &iv, b"data").is_err());
        assert!(decrypt(&[0u8; 31], &iv, b"data").is_err());
    }

    #[test]
    fn generated_ivs_are_unique() {
        assert_ne!(generate_iv(), generate_iv());
    }

    #[test]
    fn iv_from_slice_checks_length() {
        assert!(Iv::from_slice(&[0u8; 12]).is_ok());
        assert!(Iv::from_slice(&[0u8; 11]).is_err());
        assert!(Iv::from_slice(&[0u8; 13]).is_err());
    }

    #[test]
    fn symmetric_key_decodes_to_32_bytes() -> Result<()> {
        let key = generate_symmetric_key();
        assert_eq!(crate::codec::b64_decode(&key)?.len(), SYMMETRIC_KEY_LEN);
        Ok(())
    }
}
