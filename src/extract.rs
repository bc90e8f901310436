//! Email address detection for bulk import and single-address validation.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static EMAIL_IN_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid address pattern")
});

static SINGLE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid address pattern"));

/// Trim and lowercase a user-typed address.
pub fn normalize_email(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Loose `local@domain.tld` check applied to a single typed address.
pub fn is_valid_email(email: &str) -> bool {
    SINGLE_EMAIL.is_match(email)
}

/// Scan free-form text for addresses.
///
/// Matches are lowercased and deduplicated; order follows the first
/// occurrence in `text`.
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    EMAIL_IN_TEXT
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|email| seen.insert(email.clone()))
        .collect()
}
