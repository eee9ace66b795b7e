//! Session identifier validation.
//!
//! Sealchat binds identity, room and share keys to a session via a
//! UUIDv7 time-ordered identifier. The library never issues session
//! UUIDs itself — the host does — so the only operation here is the
//! syntactic gate used as a precondition by every generator and
//! validator that carries a `sessionUuid` field.

use std::sync::OnceLock;

use regex::Regex;

/// Case-insensitive UUIDv7 pattern: version nibble `7`, variant nibble
/// `8`, `9`, `a` or `b`.
const UUID_V7_PATTERN: &str =
    r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-7[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$";

fn uuid_v7_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(UUID_V7_PATTERN).expect("UUIDv7 pattern is valid"))
}

/// Returns `true` if `uuid` is syntactically a UUIDv7.
///
/// Purely syntactic: no timestamp extraction, no uniqueness check.
/// Total over arbitrary input — never panics.
pub fn is_valid_uuid_v7(uuid: &str) -> bool {
    uuid_v7_regex().is_match(uuid)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
