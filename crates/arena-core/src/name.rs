//! Display-name sanitizing
//!
//! Claimed user names come straight from the SSH client and are later drawn
//! into other players' terminals, so anything that could carry an escape
//! sequence is stripped before the name is used.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::Identity;

/// Maximum display-name length in Unicode code points
pub const MAX_NAME_LEN: usize = 100;

/// Everything outside the ASCII word class `[0-9A-Za-z_]`
fn non_word() -> &'static Regex {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    NON_WORD.get_or_init(|| Regex::new(r"[^0-9A-Za-z_]+").expect("valid regex"))
}

/// Strip non-word characters and bound the length to [`MAX_NAME_LEN`]
pub fn sanitize(claimed: &str) -> String {
    let stripped = non_word().replace_all(claimed, "");
    truncate(&stripped, MAX_NAME_LEN)
}

/// Name used when sanitizing leaves nothing behind
pub fn fallback(id: Identity) -> String {
    format!("player-{}", id)
}

/// Sanitize `claimed`, falling back to a name derived from `id`
pub fn display_name(claimed: &str, id: Identity) -> String {
    let name = sanitize(claimed);
    if name.is_empty() {
        fallback(id)
    } else {
        name
    }
}

/// `name` with `-<id>` appended, keeping the result within [`MAX_NAME_LEN`]
pub fn suffixed(name: &str, id: Identity) -> String {
    let suffix = format!("-{}", id);
    let base = truncate(name, MAX_NAME_LEN.saturating_sub(suffix.chars().count()));
    base + &suffix
}

/// Keep at most `max` code points
fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
