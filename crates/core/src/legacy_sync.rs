//! Pure rules for bridging the legacy booking system.
//!
//! The legacy MySQL database stores bookings with free-form names, loosely
//! formatted contact details, and its own status vocabulary. These helpers
//! translate that data into the clinic's model without touching either
//! database.

use crate::appointment::AppointmentStatus;
use crate::contact::{is_plausible_email, normalize_email, normalize_phone};

define_text_enum! {
    /// Outcome of one synchronization pass.
    SyncRunStatus("sync run status") {
        Running => "RUNNING",
        Completed => "COMPLETED",
        Partial => "PARTIAL",
        Failed => "FAILED",
    }
}

/// The first contact detail to look an incoming patient up by.
///
/// A booking keyed by email is still matched by phone when no patient has
/// that email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKey {
    Email(String),
    Phone(String),
    None,
}

/// Pick the strongest usable match key from raw legacy contact fields.
pub fn choose_match_key(email: Option<&str>, phone: Option<&str>) -> MatchKey {
    if let Some(email) = email.and_then(normalize_email) {
        if is_plausible_email(&email) {
            return MatchKey::Email(email);
        }
    }
    if let Some(phone) = phone.and_then(normalize_phone) {
        return MatchKey::Phone(phone);
    }
    MatchKey::None
}

/// Split a single legacy name field into `(first_name, last_name)`.
///
/// Handles both `"Last, First"` and `"First Middle Last"`. A single word
/// becomes the first name with an empty last name.
pub fn split_full_name(full: &str) -> (String, String) {
    let full = full.trim();
    if let Some((last, first)) = full.split_once(',') {
        return (first.trim().to_string(), last.trim().to_string());
    }
    match full.rsplit_once(char::is_whitespace) {
        Some((first, last)) => (first.trim().to_string(), last.trim().to_string()),
        None => (full.to_string(), String::new()),
    }
}

/// Translate a legacy booking status into an [`AppointmentStatus`].
///
/// Unknown values fall back to `SCHEDULED` so a new legacy status never
/// blocks a sync pass.
pub fn map_legacy_status(raw: &str) -> AppointmentStatus {
    match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
        "confirmed" => AppointmentStatus::Confirmed,
        "attended" | "completed" | "done" | "checked_out" => AppointmentStatus::Completed,
        "cancelled" | "canceled" | "deleted" => AppointmentStatus::Cancelled,
        "no_show" | "noshow" | "missed" => AppointmentStatus::NoShow,
        _ => AppointmentStatus::Scheduled,
    }
}
