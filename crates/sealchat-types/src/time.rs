//! Millisecond timestamps.
//!
//! All timestamps on the wire are unsigned integer milliseconds since
//! the Unix epoch, UTC. The freshness window in the protocol crate
//! compares these against a server-supplied timestamp; this module
//! only provides the local clock reading used when issuing keys and
//! messages.

use chrono::Utc;

/// Current UTC time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    Utc::now().timestamp_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_after_2024() {
        // 2024-01-01T00:00:00Z in milliseconds.
        assert!(now_millis() > 1_704_067_200_000);
    }

    #[test]
    fn now_is_monotonic_enough() {
        let a = now_millis();
        let b = now_millis();
        assert!(b >= a);
    }
}
