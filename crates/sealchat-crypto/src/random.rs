//! Miscellaneous CSPRNG helpers.

use rand::rngs::OsRng;
use rand::RngCore;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a random alphanumeric string of `len` characters from OS
/// entropy. Used by hosts for nonce strings and challenge values; not
/// suitable as key material.
pub fn random_string(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| {
            let idx = (rng.next_u32() as usize) % ALPHANUMERIC.len();
            ALPHANUMERIC[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_requested_length() {
        assert_eq!(random_string(0).len(), 0);
        assert_eq!(random_string(16).len(), 16);
        assert_eq!(random_string(64).len(), 64);
    }

    #[test]
    fn is_alphanumeric() {
        assert!(random_string(128).chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn two_draws_differ() {
        assert_ne!(random_string(32), random_string(32));
    }
}
