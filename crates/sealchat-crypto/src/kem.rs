//! ML-KEM-768 key encapsulation (FIPS 203).
//!
//! Keys and ciphertexts cross this boundary as raw bytes or their
//! base64 form; the envelope layer above decides how they appear on
//! the wire. Shared secrets are returned inside [`Zeroizing`] buffers
//! and wiped when dropped.

use ml_kem::kem::{Decapsulate, Encapsulate};
use ml_kem::{array::Array, EncodedSizeUser, KemCore, MlKem768};
use rand::rngs::OsRng;
use sealchat_types::{Result, SealchatError};
use zeroize::Zeroizing;

use crate::codec::{b64_decode, b64_encode};

/// Encapsulation (public) key length.
pub const KEM_PUBLIC_KEY_LEN: usize = 1184;

/// Decapsulation (private) key length.
pub const KEM_PRIVATE_KEY_LEN: usize = 2400;

/// KEM ciphertext length.
pub const KEM_CIPHERTEXT_LEN: usize = 1088;

/// Shared secret length.
pub const KEM_SHARED_SECRET_LEN: usize = 32;

/// Generates an ML-KEM-768 keypair.
///
/// Returns `(public, private)` as base64 strings of the encoded
/// encapsulation and decapsulation keys.
pub fn generate_kem_keypair() -> (String, String) {
    let mut rng = OsRng;
    let (dk, ek) = MlKem768::generate(&mut rng);
    (
        b64_encode(ek.as_bytes().as_slice()),
        b64_encode(dk.as_bytes().as_slice()),
    )
}

/// Encapsulates against a recipient's public key.
///
/// Returns the KEM ciphertext (always [`KEM_CIPHERTEXT_LEN`] bytes)
/// and the 32-byte shared secret.
///
/// # Errors
///
/// - [`SealchatError::InvalidEncoding`] if the key is not base64.
/// - [`SealchatError::InvalidKey`] if the decoded key has the wrong size.
/// - [`SealchatError::CryptoError`] if encapsulation fails.
pub fn encapsulate(public_key_b64: &str) -> Result<(Vec<u8>, Zeroizing<Vec<u8>>)> {
    let pk_bytes = b64_decode(public_key_b64)?;
    let pk_arr: Array<u8, <<MlKem768 as KemCore>::EncapsulationKey as EncodedSizeUser>::EncodedSize> =
        Array::try_from(&pk_bytes[..]).map_err(|_| SealchatError::InvalidKey {
            reason: format!(
                "ML-KEM-768 public key must be {KEM_PUBLIC_KEY_LEN} bytes, got {}",
                pk_bytes.len()
            ),
        })?;
    let ek = <MlKem768 as KemCore>::EncapsulationKey::from_bytes(&pk_arr);

    let mut rng = OsRng;
    let (ct, shared) = ek.encapsulate(&mut rng).map_err(|_| SealchatError::CryptoError {
        reason: "ML-KEM-768 encapsulation failed".into(),
    })?;

    Ok((
        ct.as_slice().to_vec(),
        Zeroizing::new(shared.as_slice().to_vec()),
    ))
}

/// Decapsulates a KEM ciphertext with the recipient's private key.
///
/// # Errors
///
/// - [`SealchatError::InvalidEncoding`] if the key is not base64.
/// - [`SealchatError::InvalidKey`] if the decoded key has the wrong size.
/// - [`SealchatError::InvalidEnvelope`] if the ciphertext has the wrong size.
/// - [`SealchatError::CryptoError`] if decapsulation fails.
pub fn decapsulate(private_key_b64: &str, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let sk_bytes = Zeroizing::new(b64_decode(private_key_b64)?);
    let sk_arr: Array<u8, <<MlKem768 as KemCore>::DecapsulationKey as EncodedSizeUser>::EncodedSize> =
        Array::try_from(&sk_bytes[..]).map_err(|_| SealchatError::InvalidKey {
            reason: format!(
                "ML-KEM-768 private key must be {KEM_PRIVATE_KEY_LEN} bytes, got {}",
                sk_bytes.len()
            ),
        })?;
    let dk = <MlKem768 as KemCore>::DecapsulationKey::from_bytes(&sk_arr);

    let ct_arr: Array<u8, <MlKem768 as KemCore>::CiphertextSize> = Array::try_from(ciphertext)
        .map_err(|_| SealchatError::InvalidEnvelope {
            reason: format!(
                "ML-KEM-768 ciphertext must be {KEM_CIPHERTEXT_LEN} bytes, got {}",
                ciphertext.len()
            ),
        })?;
    let shared = dk.decapsulate(&ct_arr).map_err(|_| SealchatError::CryptoError {
        reason: "ML-KEM-768 decapsulation failed".into(),
    })?;

    Ok(Zeroizing::new(shared.as_slice().to_vec()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
