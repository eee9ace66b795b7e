//! ML-DSA-65 and ML-DSA-87 signatures (FIPS 204).
//!
//! Two parameter sets are in play: the master key signs with ML-DSA-87,
//! everything else (identity, share-sign, migrate-sign, server) signs
//! with ML-DSA-65. The two wrappers are kept as separate functions so
//! the encoded-size types stay concrete.
//!
//! Signing is deterministic for a given key and message. Private keys
//! only exist here as transient [`Zeroizing`] buffers decoded from
//! their base64 wire form.

use ml_dsa::signature::{SignatureEncoding, Signer, Verifier};
use ml_dsa::{
    EncodedSignature, EncodedSigningKey, EncodedVerifyingKey, KeyGen, MlDsa65, MlDsa87, Signature,
    SigningKey, VerifyingKey,
};
use rand::rngs::OsRng;
use sealchat_types::{Result, SealchatError};
use zeroize::Zeroizing;

use crate::codec::{b64_decode, b64_encode};

/// ML-DSA-65 verifying (public) key length.
pub const DSA65_PUBLIC_KEY_LEN: usize = 1952;

/// ML-DSA-65 signing (private) key length.
pub const DSA65_PRIVATE_KEY_LEN: usize = 4032;

/// ML-DSA-65 signature length.
pub const DSA65_SIGNATURE_LEN: usize = 3309;

/// ML-DSA-87 verifying (public) key length.
pub const DSA87_PUBLIC_KEY_LEN: usize = 2592;

/// ML-DSA-87 signing (private) key length.
pub const DSA87_PRIVATE_KEY_LEN: usize = 4896;

/// ML-DSA-87 signature length.
pub const DSA87_SIGNATURE_LEN: usize = 4627;

/// Stack size for the ML-DSA-87 keygen worker thread.
///
/// ML-DSA-87 key generation needs more stack than some host threads
/// provide; 8 MiB is comfortably above its working set.
const DSA87_KEYGEN_STACK: usize = 8 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Key generation
// ---------------------------------------------------------------------------

/// Generates an ML-DSA-65 keypair.
///
/// Returns `(public, private)` as base64 strings of the encoded
/// verifying and signing keys.
pub fn generate_dsa65_keypair() -> (String, String) {
    let mut rng = OsRng;
    let kp = MlDsa65::key_gen(&mut rng);
    (
        b64_encode(kp.verifying_key().encode().as_slice()),
        b64_encode(kp.signing_key().encode().as_slice()),
    )
}

/// Generates an ML-DSA-87 keypair on a dedicated large-stack thread.
///
/// # Errors
///
/// Returns [`SealchatError::CryptoError`] if the worker thread cannot
/// be spawned or panics.
pub fn generate_dsa87_keypair() -> Result<(String, String)> {
    let handle = std::thread::Builder::new()
        .stack_size(DSA87_KEYGEN_STACK)
        .spawn(|| {
            let mut rng = OsRng;
            let kp = MlDsa87::key_gen(&mut rng);
            (
                b64_encode(kp.verifying_key().encode().as_slice()),
                b64_encode(kp.signing_key().encode().as_slice()),
            )
        })
        .map_err(|e| SealchatError::CryptoError {
            reason: format!("failed to spawn ML-DSA-87 keygen thread: {e}"),
        })?;

    handle.join().map_err(|_| SealchatError::CryptoError {
        reason: "ML-DSA-87 keygen thread panicked".into(),
    })
}

// ---------------------------------------------------------------------------
// ML-DSA-65
// ---------------------------------------------------------------------------

/// Signs `data` with an ML-DSA-65 signing key (base64) and returns the
/// raw signature bytes.
///
/// # Errors
///
/// - [`SealchatError::InvalidEncoding`] if the key is not base64.
/// - [`SealchatError::InvalidKey`] if the decoded key has the wrong size.
pub fn sign_dsa65(private_key_b64: &str, data: &[u8]) -> Result<Vec<u8>> {
    let sk_bytes = Zeroizing::new(b64_decode(private_key_b64)?);
    let sk_arr = <EncodedSigningKey<MlDsa65>>::try_from(&sk_bytes[..]).map_err(|_| {
        SealchatError::InvalidKey {
            reason: format!(
                "ML-DSA-65 signing key must be {DSA65_PRIVATE_KEY_LEN} bytes, got {}",
                sk_bytes.len()
            ),
        }
    })?;
    let sk = SigningKey::<MlDsa65>::decode(&sk_arr);
    let sig: Signature<MlDsa65> = sk.sign(data);
    Ok(sig.to_bytes().as_slice().to_vec())
}

/// Verifies a base64 ML-DSA-65 signature over `data`.
///
/// Total over arbitrary input: any decoding or size failure simply
/// returns `false`.
pub fn verify_dsa65(public_key_b64: &str, data: &[u8], signature_b64: &str) -> bool {
    let Ok(pk_bytes) = b64_decode(public_key_b64) else {
        return false;
    };
    let Ok(pk_arr) = <EncodedVerifyingKey<MlDsa65>>::try_from(&pk_bytes[..]) else {
        return false;
    };
    let pk = VerifyingKey::<MlDsa65>::decode(&pk_arr);

    let Ok(sig_bytes) = b64_decode(signature_b64) else {
        return false;
    };
    let Ok(sig_arr) = <EncodedSignature<MlDsa65>>::try_from(&sig_bytes[..]) else {
        return false;
    };
    let Some(sig) = Signature::<MlDsa65>::decode(&sig_arr) else {
        return false;
    };

    pk.verify(data, &sig).is_ok()
}

// ---------------------------------------------------------------------------
// ML-DSA-87
// ---------------------------------------------------------------------------

/// Signs `data` with an ML-DSA-87 signing key (base64) and returns the
/// raw signature bytes.
///
/// # Errors
///
/// Same classes as [`sign_dsa65`].
pub fn sign_dsa87(private_key_b64: &str, data: &[u8]) -> Result<Vec<u8>> {
    let sk_bytes = Zeroizing::new(b64_decode(private_key_b64)?);
    let sk_arr = <EncodedSigningKey<MlDsa87>>::try_from(&sk_bytes[..]).map_err(|_| {
        SealchatError::InvalidKey {
            reason: format!(
                "ML-DSA-87 signing key must be {DSA87_PRIVATE_KEY_LEN} bytes, got {}",
                sk_bytes.len()
            ),
        }
    })?;
    let sk = SigningKey::<MlDsa87>::decode(&sk_arr);
    let sig: Signature<MlDsa87> = sk.sign(data);
    Ok(sig.to_bytes().as_slice().to_vec())
}

/// Verifies a base64 ML-DSA-87 signature over `data`.
///
/// Total over arbitrary input, like [`verify_dsa65`].
pub fn verify_dsa87(public_key_b64: &str, data: &[u8], signature_b64: &str) -> bool {
    let Ok(pk_bytes) = b64_decode(public_key_b64) else {
        return false;
    };
    let Ok(pk_arr) = <EncodedVerifyingKey<MlDsa87>>::try_from(&pk_bytes[..]) else {
        return false;
    };
    let pk = VerifyingKey::<MlDsa87>::decode(&pk_arr);

    let Ok(sig_bytes) = b64_decode(signature_b64) else {
        return false;
    };
    let Ok(sig_arr) = <EncodedSignature<MlDsa87>>::try_from(&sig_bytes[..]) else {
        return false;
    };
    let Some(sig) = Signature::<MlDsa87>::decode(&sig_arr) else {
        return false;
    };

    pk.verify(data, &sig).is_ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
