//! Visitor fingerprinting for unique-click detection.

use sha2::{Digest, Sha256};

/// Derives a stable, non-reversible visitor id from the requester IP and
/// user agent.
///
/// This is a privacy control, not a security one: the digest only has to be
/// one-way and stable, and collisions between distinct visitors are accepted
/// as noise in the unique counter.
pub fn visitor_id(ip: &str, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(b"|");
    hasher.update(user_agent.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visitor_id_is_stable() {
        let a = visitor_id("203.0.113.7", "Mozilla/5.0");
        let b = visitor_id("203.0.113.7", "Mozilla/5.0");
        assert_eq!(a, b);
    }

    #[test]
    fn test_visitor_id_is_hex_sha256() {
        let id = visitor_id("203.0.113.7", "Mozilla/5.0");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_visitor_id_varies_by_input() {
        let base = visitor_id("203.0.113.7", "Mozilla/5.0");
        assert_ne!(base, visitor_id("203.0.113.8", "Mozilla/5.0"));
        assert_ne!(base, visitor_id("203.0.113.7", "curl/8.5"));
    }

    #[test]
    fn test_visitor_id_separator_prevents_ambiguity() {
        // "ab" + "c" must not fingerprint the same as "a" + "bc".
        assert_ne!(visitor_id("ab", "c"), visitor_id("a", "bc"));
    }

    #[test]
    fn test_visitor_id_does_not_echo_input() {
        let id = visitor_id("203.0.113.7", "Mozilla/5.0");
        assert!(!id.contains("203.0.113.7"));
        assert!(!id.contains("Mozilla"));
    }
}
