//! Short code generation and alias format validation.
//!
//! The reserved-keyword check lives in the allocator, which owns an
//! injected set; this module only knows the seed list and the pure format
//! rules.

use rand::Rng;
use serde_json::json;

use crate::error::AppError;

/// Alphabet for generated codes: base62 minus the visually confusable
/// `0`, `O`, `I` and `l`.
pub const CODE_ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Length of generated short codes.
pub const CODE_LENGTH: usize = 7;

/// Default seed for the allocator's reserved-alias set: names that collide
/// with routes and product pages.
pub const RESERVED_ALIASES: &[&str] = &[
    "api", "admin", "app", "auth", "login", "logout", "register", "signup", "signin", "account",
    "dashboard", "settings", "stats", "analytics", "health", "metrics", "static", "assets",
    "about", "pricing", "terms", "privacy", "support", "help", "docs", "blog", "www", "link",
    "links", "verify",
];

const ALIAS_MIN_LENGTH: usize = 3;
const ALIAS_MAX_LENGTH: usize = 30;

/// Generates a random short code from the unambiguous alphabet.
///
/// Uniqueness is not guaranteed here; the allocator retries against the
/// unique index. The codes only need to be collision-rare, not unguessable.
pub fn generate_code() -> String {
    let mut rng = rand::rng();

    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Validates the format of a user-provided custom alias.
///
/// # Rules
///
/// - Length: 3-30 characters
/// - Allowed characters: letters, digits, hyphens
///
/// Reserved-keyword rejection is the allocator's job, not a format rule.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if either rule is violated.
pub fn validate_alias_format(alias: &str) -> Result<(), AppError> {
    if alias.len() < ALIAS_MIN_LENGTH {
        return Err(AppError::bad_request(
            "Alias must be at least 3 characters",
            json!({ "alias": alias, "provided_length": alias.len() }),
        ));
    }

    if alias.len() > ALIAS_MAX_LENGTH {
        return Err(AppError::bad_request(
            "Alias must be at most 30 characters",
            json!({ "alias": alias, "provided_length": alias.len() }),
        ));
    }

    if !alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(AppError::bad_request(
            "Alias can only contain letters, digits, and hyphens",
            json!({ "alias": alias }),
        ));
    }

    Ok(())
}
