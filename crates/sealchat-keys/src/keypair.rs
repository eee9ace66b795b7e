//! Cross-kind keypair consistency checks.
//!
//! Structural validators prove a key parses; these checks prove the
//! two halves of a pair actually belong together, by running a trial
//! operation. Used by hosts after importing key material from storage
//! or from a migration payload.

use serde_json::Value;

use sealchat_crypto::dsa::{sign_dsa65, sign_dsa87, verify_dsa65, verify_dsa87};
use sealchat_crypto::codec::b64_encode;
use sealchat_crypto::kem::{decapsulate, encapsulate};

const PROBE: &[u8] = b"sealchat-keypair-probe";

fn key_fields(json: &str) -> Option<(String, String)> {
    let value: Value = serde_json::from_str(json).ok()?;
    let key_type = value.get("keyType")?.as_str()?.to_string();
    let key = value.get("key")?.as_str()?.to_string();
    Some((key_type, key))
}

/// Returns `true` if `public_json`/`private_json` form a working
/// signing pair: a trial signature by the private key verifies under
/// the public key.
///
/// Master pairs are probed with ML-DSA-87, every other signing kind
/// with ML-DSA-65. Total over arbitrary input.
pub fn is_valid_key_pair_sign(public_json: &str, private_json: &str) -> bool {
    let Some((public_type, public_key)) = key_fields(public_json) else {
        return false;
    };
    let Some((private_type, private_key)) = key_fields(private_json) else {
        return false;
    };

    if public_type == "masterKeyPublic" && private_type == "masterKeyPrivate" {
        match sign_dsa87(&private_key, PROBE) {
            Ok(sig) => verify_dsa87(&public_key, PROBE, &b64_encode(&sig)),
            Err(_) => false,
        }
    } else {
        match sign_dsa65(&private_key, PROBE) {
            Ok(sig) => verify_dsa65(&public_key, PROBE, &b64_encode(&sig)),
            Err(_) => false,
        }
    }
}

/// Returns `true` if `public_json`/`private_json` form a working
/// encryption pair: encapsulating against the public key and
/// decapsulating with the private key yields the same shared secret.
///
/// Total over arbitrary input.
pub fn is_valid_key_pair_encrypt(public_json: &str, private_json: &str) -> bool {
    let Some((_, public_key)) = key_fields(public_json) else {
        return false;
    };
    let Some((_, private_key)) = key_fields(private_json) else {
        return false;
    };

    let Ok((ciphertext, shared_enc)) = encapsulate(&public_key) else {
        return false;
    };
    let Ok(shared_dec) = decapsulate(&private_key, &ciphertext) else {
        return false;
    };
    shared_enc.as_slice() == shared_dec.as_slice()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::generate_account_key;
    use crate::master::MasterKeyPair;
    use sealchat_types::Result;

    #[test]
    fn master_pair_passes_sign_check() -> Result<()> {
        let master = MasterKeyPair::generate()?;
        assert!(is_valid_key_pair_sign(
            &master.public.to_json()?,
            &master.private.to_json()?
        ));
        Ok(())
    }

    #[test]
    fn mismatched_master_pair_fails_sign_check() -> Result<()> {
        let master_a = MasterKeyPair::generate()?;
        let master_b = MasterKeyPair::generate()?;
        assert!(!is_valid_key_pair_sign(
            &master_a.public.to_json()?,
            &master_b.private.to_json()?
        ));
        Ok(())
    }

    #[test]
    fn account_pair_passes_encrypt_check() -> Result<()> {
        let master = MasterKeyPair::generate()?;
        let account = generate_account_key(&master.public, &master.private)?;
        assert!(is_valid_key_pair_encrypt(
            &account.public.to_json()?,
            &account.private.to_json()?
        ));
        Ok(())
    }

    #[test]
    fn mismatched_account_pair_fails_encrypt_check() -> Result<()> {
        let master = MasterKeyPair::generate()?;
        let account_a = generate_account_key(&master.public, &master.private)?;
        let account_b = generate_account_key(&master.public, &master.private)?;
        assert!(!is_valid_key_pair_encrypt(
            &account_a.public.to_json()?,
            &account_b.private.to_json()?
        ));
        Ok(())
    }

    #[test]
    fn checks_are_total_on_garbage() {
        assert!(!is_valid_key_pair_sign("not json", "also not json"));
        assert!(!is_valid_key_pair_encrypt("{}", "{}"));
        assert!(!is_valid_key_pair_sign("{\"keyType\":\"masterKeyPublic\"}", "{}"));
    }
}
