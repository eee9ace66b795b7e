//! Room-key distribution.
//!
//! When a room key is created or a member joins, the key is wrapped to
//! each member's account key and the distribution itself is
//! authenticated: the sender's identity key signs both the room-key
//! JSON and a metadata record naming every recipient and the hash of
//! the distributed key. Recipients verify the metadata signature
//! before trusting their wrapped copy.
//!
//! Output lists preserve the input recipient order.

use sealchat_crypto::hash::key_hash;
use sealchat_keys::{
    AccountKeyPublic, EncryptedData, IdentityKeyPrivate, IdentityKeyPublic, MasterKeyPublic,
    RoomKey, Sign,
};
use sealchat_types::{Result, SealchatError};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One distribution target.
pub struct Recipient {
    /// Stable user identifier, echoed into the output rows.
    pub user_id: String,
    /// The recipient's master public key.
    pub master_public: MasterKeyPublic,
    /// The recipient's account public key (the wrap target).
    pub account_public: AccountKeyPublic,
    /// Master signature over the account key, when the sender has it.
    pub account_sign: Option<Sign>,
    /// Whether to require and verify `account_sign` before wrapping.
    pub verify_account_key: bool,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Row of the signed metadata record, one per recipient.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SharedUser {
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Key hash of the recipient's master public key JSON.
    #[serde(rename = "masterKeyHash")]
    pub master_key_hash: String,
    /// Issuance timestamp of the account key the room key was wrapped to.
    #[serde(rename = "accountKeyTimeStamp")]
    pub account_key_timestamp: u64,
}

/// Signed record of who received the room key.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DistributionMetadata {
    /// Key hash of the distributed room-key JSON.
    #[serde(rename = "roomKeyHash")]
    pub room_key_hash: String,
    /// Recipients, in input order.
    #[serde(rename = "sharedUser")]
    pub shared_user: Vec<SharedUser>,
}

/// One wrapped room key, addressed to a recipient.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RecipientEnvelope {
    #[serde(rename = "userId")]
    pub user_id: String,
    /// `accountKey` envelope holding the room-key JSON.
    #[serde(rename = "encryptedData")]
    pub encrypted_data: EncryptedData,
}

/// Complete output of a room-key distribution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomKeyDistribution {
    /// Who received the key, and which key.
    pub metadata: DistributionMetadata,
    /// Identity signature over the metadata JSON.
    #[serde(rename = "metadataSign")]
    pub metadata_sign: Sign,
    /// Wrapped room keys, in input order.
    #[serde(rename = "encryptedData")]
    pub encrypted_data: Vec<RecipientEnvelope>,
    /// Identity signature over the room-key JSON itself.
    pub sign: Sign,
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// Wraps `room_key` to every recipient's account key and signs the
/// distribution with the sender's identity key.
///
/// For recipients with `verify_account_key` set, the supplied master
/// signature over the account key is verified first; a missing or
/// invalid signature aborts the whole distribution.
///
/// # Errors
///
/// - [`SealchatError::UntrustedKey`] if a required account-key
///   signature is missing or does not verify.
/// - [`SealchatError::InvalidKey`] if any input key fails validation.
/// - [`SealchatError::CryptoError`] if wrapping or signing fails.
pub fn encrypt_room_key_with_account_keys(
    recipients: &[Recipient],
    room_key: &RoomKey,
    identity_private: &IdentityKeyPrivate,
    identity_public: &IdentityKeyPublic,
) -> Result<RoomKeyDistribution> {
    room_key.validate()?;
    identity_private.validate()?;
    identity_public.validate()?;

    let room_key_json = room_key.to_json()?;
    let identity_hash = key_hash(&identity_public.to_json()?);

    let mut shared_user = Vec::with_capacity(recipients.len());
    let mut encrypted_data = Vec::with_capacity(recipients.len());

    for recipient in recipients {
        recipient.account_public.validate()?;

        if recipient.verify_account_key {
            let account_sign =
                recipient
                    .account_sign
                    .as_ref()
                    .ok_or_else(|| SealchatError::UntrustedKey {
                        reason: format!(
                            "verification requested but no master signature supplied for user {:?}",
                            recipient.user_id
                        ),
                    })?;
            let account_json = recipient.account_public.to_json()?;
            recipient
                .master_public
                .verify(account_sign, account_json.as_bytes())
                .map_err(|_| {
                    debug!(user = %recipient.user_id, "account key failed master verification");
                    SealchatError::UntrustedKey {
                        reason: format!(
                            "account key of user {:?} failed master verification",
                            recipient.user_id
                        ),
                    }
                })?;
        }

        let envelope = recipient.account_public.encrypt(&room_key_json)?;
        shared_user.push(SharedUser {
            user_id: recipient.user_id.clone(),
            master_key_hash: key_hash(&recipient.master_public.to_json()?),
            account_key_timestamp: recipient.account_public.timestamp,
        });
        encrypted_data.push(RecipientEnvelope {
            user_id: recipient.user_id.clone(),
            encrypted_data: envelope,
        });
    }

    let metadata = DistributionMetadata {
        room_key_hash: key_hash(&room_key_json),
        shared_user,
    };
    let metadata_json =
        serde_json::to_string(&metadata).map_err(|e| SealchatError::InvalidMessage {
            reason: format!("distribution metadata serialization failed: {e}"),
        })?;

    let metadata_sign = identity_private.sign(metadata_json.as_bytes(), &identity_hash)?;
    let sign = identity_private.sign(room_key_json.as_bytes(), &identity_hash)?;

    Ok(RoomKeyDistribution {
        metadata,
        metadata_sign,
        encrypted_data,
        sign,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sealchat_keys::account::generate_account_key;
    use sealchat_keys::identity::generate_identity_key;
    use sealchat_keys::master::MasterKeyPair;

    const SESSION: &str = "018fdb31-0798-78a2-b4c9-e145d5b5b88e";

    struct Member {
        master: MasterKeyPair,
        account: sealchat_keys::AccountKeyBundle,
    }

    fn member() -> Result<Member> {
        let master = MasterKeyPair::generate()?;
        let account = generate_account_key(&master.public, &master.private)?;
        Ok(Member { master, account })
    }

    fn recipient(id: &str, member: &Member, verify: bool) -> Recipient {
        Recipient {
            user_id: id.to_string(),
            master_public: member.master.public.clone(),
            account_public: member.account.public.clone(),
            account_sign: Some(member.account.master_sign.clone()),
            verify_account_key: verify,
        }
    }

    #[test]
    fn two_recipients_each_get_a_valid_wrap() -> Result<()> {
        let sender_master = MasterKeyPair::generate()?;
        let identity = generate_identity_key(SESSION, &sender_master.public, &sender_master.private)?;
        let room_key = RoomKey::generate(SESSION)?;

        let alice = member()?;
        let bob = member()?;
        let recipients = [recipient("alice", &alice, true), recipient("bob", &bob, true)];

        let distribution = encrypt_room_key_with_account_keys(
            &recipients,
            &room_key,
            &identity.private,
            &identity.public,
        )?;

        assert_eq!(distribution.encrypted_data.len(), 2);
        assert_eq!(distribution.metadata.shared_user.len(), 2);
        // Input order preserved.
        assert_eq!(distribution.encrypted_data[0].user_id, "alice");
        assert_eq!(distribution.encrypted_data[1].user_id, "bob");
        for entry in &distribution.encrypted_data {
            assert!(sealchat_keys::account::is_valid_encrypted_data_account_key(
                &entry.encrypted_data.to_json()?
            ));
        }

        // Each recipient can unwrap their copy back to the same key.
        let room_key_json = room_key.to_json()?;
        for (member, row) in [(&alice, 0), (&bob, 1)] {
            let unwrapped = member
                .account
                .private
                .decrypt(&distribution.encrypted_data[row].encrypted_data)?;
            assert_eq!(unwrapped, room_key_json);
        }
        Ok(())
    }

    #[test]
    fn metadata_binds_room_key_and_recipients() -> Result<()> {
        let sender_master = MasterKeyPair::generate()?;
        let identity = generate_identity_key(SESSION, &sender_master.public, &sender_master.private)?;
        let room_key = RoomKey::generate(SESSION)?;
        let alice = member()?;

        let distribution = encrypt_room_key_with_account_keys(
            &[recipient("alice", &alice, false)],
            &room_key,
            &identity.private,
            &identity.public,
        )?;

        assert_eq!(
            distribution.metadata.room_key_hash,
            key_hash(&room_key.to_json()?)
        );
        let row = &distribution.metadata.shared_user[0];
        assert_eq!(row.master_key_hash, key_hash(&alice.master.public.to_json()?));
        assert_eq!(row.account_key_timestamp, alice.account.public.timestamp);

        // Both signatures verify under the sender's identity key.
        let metadata_json = serde_json::to_string(&distribution.metadata)
            .map_err(|e| SealchatError::InvalidMessage { reason: e.to_string() })?;
        identity
            .public
            .verify(&distribution.metadata_sign, metadata_json.as_bytes())?;
        identity
            .public
            .verify(&distribution.sign, room_key.to_json()?.as_bytes())
    }

    #[test]
    fn unverifiable_account_key_aborts_distribution() -> Result<()> {
        let sender_master = MasterKeyPair::generate()?;
        let identity = generate_identity_key(SESSION, &sender_master.public, &sender_master.private)?;
        let room_key = RoomKey::generate(SESSION)?;

        let mallory = member()?;
        let other = member()?;
        // Signature from a different master than the claimed one.
        let mut bad = recipient("mallory", &mallory, true);
        bad.account_sign = Some(other.account.master_sign.clone());

        let result = encrypt_room_key_with_account_keys(
            &[bad],
            &room_key,
            &identity.private,
            &identity.public,
        );
        assert!(matches!(result, Err(SealchatError::UntrustedKey { .. })));
        Ok(())
    }

    #[test]
    fn missing_signature_with_verification_requested_aborts() -> Result<()> {
        let sender_master = MasterKeyPair::generate()?;
        let identity = generate_identity_key(SESSION, &sender_master.public, &sender_master.private)?;
        let room_key = RoomKey::generate(SESSION)?;

        let alice = member()?;
        let mut unverified = recipient("alice", &alice, true);
        unverified.account_sign = None;

        let result = encrypt_room_key_with_account_keys(
            &[unverified],
            &room_key,
            &identity.private,
            &identity.public,
        );
        assert!(matches!(result, Err(SealchatError::UntrustedKey { .. })));
        Ok(())
    }

    #[test]
    fn metadata_wire_shape() -> Result<()> {
        let metadata = DistributionMetadata {
            room_key_hash: "hash".into(),
            shared_user: vec![SharedUser {
                user_id: "alice".into(),
                master_key_hash: "mh".into(),
                account_key_timestamp: 5,
            }],
        };
        let json = serde_json::to_string(&metadata)
            .map_err(|e| SealchatError::InvalidMessage { reason: e.to_string() })?;
        assert_eq!(
            json,
            r#"{"roomKeyHash":"hash","sharedUser":[{"userId":"alice","masterKeyHash":"mh","accountKeyTimeStamp":5}]}"#
        );
        Ok(())
    }
}
