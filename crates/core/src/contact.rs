//! Normalization of patient contact details.
//!
//! Email addresses and phone numbers are the keys used to deduplicate
//! patients, both when staff create records and when the legacy booking
//! system is synchronized. Both sides must normalize identically, so the
//! rules live here.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum number of digits for a phone number to be usable as a match key.
pub const MIN_PHONE_DIGITS: usize = 7;

/// Maximum number of digits allowed by E.164.
pub const MAX_PHONE_DIGITS: usize = 15;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

/// Trim and lowercase an email address. Blank input yields `None`.
pub fn normalize_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Whether the (already normalized) address looks like `local@domain.tld`.
pub fn is_plausible_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Reduce a phone number to its digits.
///
/// Formatting characters (`+`, spaces, dashes, parentheses, dots) are
/// dropped. Returns `None` when fewer than [`MIN_PHONE_DIGITS`] or more than
/// [`MAX_PHONE_DIGITS`] digits remain.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < MIN_PHONE_DIGITS || digits.len() > MAX_PHONE_DIGITS {
        return None;
    }
    Some(digits)
}

/// Validate an optional phone number supplied through the API.
pub fn validate_phone(raw: &str) -> Result<(), String> {
    if normalize_phone(raw).is_none() {
        return Err(format!(
            "Phone number must contain between {MIN_PHONE_DIGITS} and {MAX_PHONE_DIGITS} digits"
        ));
    }
    Ok(())
}
