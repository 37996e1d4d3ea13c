//! Appointment states and scheduling constraints.

use crate::error::CoreError;

/// Shortest bookable slot in minutes.
pub const MIN_DURATION_MINUTES: i32 = 5;

/// Longest bookable slot in minutes.
pub const MAX_DURATION_MINUTES: i32 = 480;

/// Slot length used when neither staff nor the legacy system supply one.
pub const DEFAULT_DURATION_MINUTES: i32 = 30;

define_text_enum! {
    /// Appointment lifecycle.
    AppointmentStatus("appointment status") {
        Scheduled => "SCHEDULED",
        Confirmed => "CONFIRMED",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
        NoShow => "NO_SHOW",
    }
}

define_text_enum! {
    /// Where a patient or appointment record originated.
    RecordSource("record source") {
        Internal => "INTERNAL",
        Legacy => "LEGACY",
    }
}

/// Validate an appointment duration.
pub fn validate_duration(minutes: i32) -> Result<(), CoreError> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(CoreError::Validation(format!(
            "Duration must be between {MIN_DURATION_MINUTES} and {MAX_DURATION_MINUTES} minutes"
        )));
    }
    Ok(())
}

/// Clamp a duration coming from an external system into the valid range.
pub fn clamp_duration(minutes: Option<i32>) -> i32 {
    minutes
        .unwrap_or(DEFAULT_DURATION_MINUTES)
        .clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES)
}
