//! Typed key kinds, cross-signing and encryption envelopes for the
//! Sealchat E2EE library.
//!
//! Every key is a JSON value on the wire with an exact field set; this
//! crate owns those shapes, their structural validators and the
//! operations each kind supports:
//!
//! | Kind | Crypto | Master-signed | Session-scoped |
//! |---|---|---|---|
//! | [`master`] | ML-DSA-87 | — (root) | no |
//! | [`identity`] | ML-DSA-65 | yes | yes |
//! | [`account`] | ML-KEM-768 | yes | no |
//! | [`room`] | AES-256-GCM | no | yes |
//! | [`share`] (+ share-sign) | ML-KEM-768 / ML-DSA-65 | yes | yes |
//! | [`migrate`] (+ migrate-sign) | ML-KEM-768 / ML-DSA-65 | no | no |
//! | [`device`] | AES-256-GCM | no | no |
//! | [`server`] | ML-DSA-65 | no | no |
//!
//! The cross-signing rule: every subkey carrying a `timestamp` or
//! `sessionUuid` that participates in the trust graph (identity,
//! account, share, share-sign) is issued together with a master
//! signature over its public-key JSON, whose `keyHash` points at the
//! master public key.
//!
//! Hybrid KEM+AEAD sealing and symmetric sealing are implemented once
//! in [`sealed`] and shared by all kinds.

pub mod account;
pub mod device;
pub mod identity;
pub mod keypair;
pub mod master;
pub mod migrate;
pub mod room;
pub mod sealed;
pub mod server;
pub mod share;
pub mod signature;

pub use account::{generate_account_key, AccountKeyBundle, AccountKeyPrivate, AccountKeyPublic};
pub use device::DeviceKey;
pub use identity::{
    generate_identity_key, IdentityKeyBundle, IdentityKeyPrivate, IdentityKeyPublic,
};
pub use keypair::{is_valid_key_pair_encrypt, is_valid_key_pair_sign};
pub use master::{MasterKeyPair, MasterKeyPrivate, MasterKeyPublic};
pub use migrate::{MigrateKeyPair, MigrateKeyPrivate, MigrateKeyPublic, MigrateSignKeyPair};
pub use room::RoomKey;
pub use sealed::EncryptedData;
pub use server::{ServerKeyPair, ServerKeyPrivate, ServerKeyPublic};
pub use share::{
    generate_share_key, generate_share_sign_key, ShareKeyBundle, ShareKeyPrivate, ShareKeyPublic,
    ShareSignKeyBundle, ShareSignKeyPrivate, ShareSignKeyPublic,
};
pub use signature::Sign;
