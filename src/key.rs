//! Cache key derivation for instructor names.
//!
//! Keys are built from the first initial and the surname, so two people who
//! share both collide on the same key. That is accepted: the cache is keyed
//! by initials + surname, not by full identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized initials + surname key, e.g. `"J. SMITH"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First and last whitespace-delimited tokens of a display name.
///
/// A single-token name yields the same token for both parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameParts<'a> {
    pub first: &'a str,
    pub last: &'a str,
}

impl<'a> NameParts<'a> {
    pub fn split(full_name: &'a str) -> Self {
        let mut tokens = full_name.split_whitespace();
        let first = tokens.next().unwrap_or_default();
        let last = tokens.last().unwrap_or(first);
        Self { first, last }
    }
}

/// Derive the cache key for a raw on-page name.
///
/// Callers are expected to filter out blank names first; a blank name maps
/// to the degenerate key `". "` rather than failing.
///
/// ```
/// use roster_ratings::derive_key;
///
/// assert_eq!(derive_key("Jane Smith").as_str(), "J. SMITH");
/// assert_eq!(derive_key("  mary   anne   doe  ").as_str(), "M. DOE");
/// ```
pub fn derive_key(raw_name: &str) -> CacheKey {
    let parts = NameParts::split(raw_name);
    let initial: String = parts.first.chars().take(1).collect();
    CacheKey(format!("{}. {}", initial, parts.last).to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_and_surname() {
        assert_eq!(derive_key("Jane Smith").as_str(), "J. SMITH");
        assert_eq!(derive_key("  mary   anne   doe  ").as_str(), "M. DOE");
        assert_eq!(derive_key("A. Lee").as_str(), "A. LEE");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let names = ["Jane Smith", "  Jane Smith", "Jane Smith\t\n", " Jane   Smith "];
        for name in names {
            assert_eq!(derive_key(name), derive_key("Jane Smith"));
            assert_eq!(derive_key(name), derive_key(name));
        }
    }

    #[test]
    fn single_token_repeats_itself() {
        assert_eq!(derive_key("Staff").as_str(), "S. STAFF");
        let parts = NameParts::split("Staff");
        assert_eq!(parts.first, "Staff");
        assert_eq!(parts.last, "Staff");
    }

    #[test]
    fn shared_initial_and_surname_collide() {
        assert_eq!(derive_key("John Smith"), derive_key("Jane Q. Smith"));
    }

    #[test]
    fn blank_name_does_not_panic() {
        assert_eq!(derive_key("   ").as_str(), ". ");
    }
}
