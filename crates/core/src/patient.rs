//! Patient field validation.

use chrono::Months;

use crate::types::Date;

/// Maximum length of a first or last name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Oldest plausible patient age, used to reject typos in birth dates.
pub const MAX_AGE_YEARS: u32 = 120;

/// Validate a first or last name: non-blank and within [`MAX_NAME_LENGTH`].
pub fn validate_name(field: &str, value: &str) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "{field} must be at most {MAX_NAME_LENGTH} characters"
        ));
    }
    Ok(())
}

/// Validate a date of birth against `today`.
///
/// Rejects future dates and dates more than [`MAX_AGE_YEARS`] in the past.
pub fn validate_date_of_birth(dob: Date, today: Date) -> Result<(), String> {
    if dob > today {
        return Err("Date of birth cannot be in the future".to_string());
    }
    let oldest = today
        .checked_sub_months(Months::new(MAX_AGE_YEARS * 12))
        .unwrap_or(Date::MIN);
    if dob < oldest {
        return Err(format!(
            "Date of birth is more than {MAX_AGE_YEARS} years in the past"
        ));
    }
    Ok(())
}

/// Display name used in logs and legacy-sync reports.
pub fn full_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name.trim(), last_name.trim())
        .trim()
        .to_string()
}
