//! Message protocol for the Sealchat E2EE library.
//!
//! Couples room-key encryption with identity-key signing: a message
//! value is encrypted under the room key, wrapped in an outer message
//! carrying channel/timestamp/room bindings, and the exact outer JSON
//! string is signed with the sender's identity key. Decryption
//! verifies the signature first, then enforces the room binding and
//! the ±60 s freshness window against a server-supplied timestamp.
//!
//! # Modules
//!
//! - [`message`] — message value, outer message and signed-message types
//! - [`content`] — typed content kinds and constructor helpers
//! - [`e2e`] — `encrypt_message` / `decrypt_message`
//! - [`validation`] — total structural message validation
//! - [`distribution`] — per-recipient room-key distribution

pub mod content;
pub mod distribution;
pub mod e2e;
pub mod message;
pub mod validation;

pub use distribution::{encrypt_room_key_with_account_keys, Recipient, RoomKeyDistribution};
pub use e2e::{decrypt_message, decrypt_message_with_window, encrypt_message};
pub use message::{ClearMessage, EncryptedMessage, MessageMeta, MessageValue, SignedMessage};
pub use validation::is_valid_message;
