//! Identifier and contact-detail policies shared by the stores and the API.

use regex::Regex;
use std::sync::OnceLock;

/// Shortest accepted username
pub const MIN_USERNAME_LENGTH: usize = 3;

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN.get_or_init(|| {
        Regex::new(r"^[\w.!#$%&'*+/=?^`{|}~-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+$")
            .expect("email pattern is valid")
    })
}

/// Trim and lowercase a username into its identity key.
pub fn normalize_username(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Letters, digits and underscores, case-insensitive, at least three characters.
pub fn is_valid_username(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.len() >= MIN_USERNAME_LENGTH
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn is_non_empty(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn is_valid_email(value: &str) -> bool {
    email_pattern().is_match(value.trim())
}
