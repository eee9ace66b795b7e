//! Cryptographic primitives for the Sealchat E2EE library.
//!
//! This crate is the **sole** location for raw cryptographic
//! operations:
//!
//! - **ML-KEM-768** key encapsulation (FIPS 203)
//! - **ML-DSA-65 / ML-DSA-87** signatures (FIPS 204)
//! - **AES-256-GCM** authenticated encryption
//! - **SHA-256** hashing and the key-hash binding
//! - **Base64 / hex** codecs with the wire-format alphabet
//!
//! No other crate in the workspace should touch a cipher, a digest or
//! the entropy source directly. Private-key material and KEM shared
//! secrets handled here are zeroized as soon as they leave scope.

pub mod aead;
pub mod codec;
pub mod dsa;
pub mod hash;
pub mod kem;
pub mod random;
