//! Treatment plan and phase rules.

use crate::error::CoreError;
use crate::types::Date;

/// Maximum length of a plan title or phase name.
pub const MAX_TITLE_LENGTH: usize = 200;

define_text_enum! {
    /// Lifecycle of a treatment plan.
    TreatmentStatus("treatment status") {
        Planned => "PLANNED",
        Active => "ACTIVE",
        OnHold => "ON_HOLD",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

define_text_enum! {
    /// Appliance family used by a plan.
    TreatmentType("treatment type") {
        Braces => "BRACES",
        ClearAligners => "CLEAR_ALIGNERS",
        Retainer => "RETAINER",
        Expander => "EXPANDER",
        Other => "OTHER",
    }
}

define_text_enum! {
    /// Progress of a single phase inside a plan.
    PhaseStatus("phase status") {
        Pending => "PENDING",
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
        Skipped => "SKIPPED",
    }
}

impl TreatmentStatus {
    /// Whether a plan may move from `self` to `next`.
    ///
    /// Setting the current status again is always allowed.
    pub fn can_transition_to(self, next: TreatmentStatus) -> bool {
        use TreatmentStatus::*;
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Planned, Active)
                | (Planned, Cancelled)
                | (Active, OnHold)
                | (Active, Completed)
                | (Active, Cancelled)
                | (OnHold, Active)
                | (OnHold, Cancelled)
        )
    }

    /// Completed and cancelled plans are read-only.
    pub fn is_terminal(self) -> bool {
        matches!(self, TreatmentStatus::Completed | TreatmentStatus::Cancelled)
    }
}

/// Validate a status change, producing a readable error.
pub fn validate_status_transition(
    from: TreatmentStatus,
    to: TreatmentStatus,
) -> Result<(), CoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Cannot change treatment status from {from} to {to}"
        )))
    }
}

/// Validate an optional date range: the end may not precede the start.
pub fn validate_date_range(start: Option<Date>, end: Option<Date>) -> Result<(), CoreError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(CoreError::Validation(format!(
                "End date {end} is before start date {start}"
            )));
        }
    }
    Ok(())
}

/// Validate a phase's position inside its plan (1-based).
pub fn validate_phase_order(order: i32) -> Result<(), CoreError> {
    if order < 1 {
        return Err(CoreError::Validation(
            "Phase order must be a positive integer".into(),
        ));
    }
    Ok(())
}

/// Validate a plan title or phase name.
pub fn validate_title(field: &str, value: &str) -> Result<(), CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn status_round_trips_through_text() {
        for status in TreatmentStatus::ALL {
            assert_eq!(TreatmentStatus::parse(status.as_str()).unwrap(), *status);
        }
        assert_matches!(
            TreatmentStatus::parse("active"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn planned_plan_can_start_or_cancel() {
        assert!(TreatmentStatus::Planned.can_transition_to(TreatmentStatus::Active));
        assert!(TreatmentStatus::Planned.can_transition_to(TreatmentStatus::Cancelled));
        assert!(!TreatmentStatus::Planned.can_transition_to(TreatmentStatus::Completed));
    }

    #[test]
    fn on_hold_resumes_only_to_active() {
        assert!(TreatmentStatus::OnHold.can_transition_to(TreatmentStatus::Active));
        assert!(!TreatmentStatus::OnHold.can_transition_to(TreatmentStatus::Completed));
    }

    #[test]
    fn terminal_states_are_final() {
        for next in TreatmentStatus::ALL {
            if *next != TreatmentStatus::Completed {
                assert!(!TreatmentStatus::Completed.can_transition_to(*next));
            }
        }
        assert!(TreatmentStatus::Cancelled.is_terminal());
        assert_matches!(
            validate_status_transition(TreatmentStatus::Cancelled, TreatmentStatus::Active),
            Err(CoreError::Validation(msg)) if msg.contains("CANCELLED")
        );
    }

    #[test]
    fn date_range_rejects_inverted_dates() {
        let start = Date::from_ymd_opt(2026, 1, 10);
        let end = Date::from_ymd_opt(2026, 1, 9);
        assert!(validate_date_range(start, end).is_err());
        assert!(validate_date_range(end, start).is_ok());
        assert!(validate_date_range(start, None).is_ok());
    }

    #[test]
    fn phase_order_must_be_positive() {
        assert!(validate_phase_order(0).is_err());
        assert!(validate_phase_order(-3).is_err());
        assert!(validate_phase_order(1).is_ok());
    }

    #[test]
    fn type_serializes_as_stored_text() {
        let json = serde_json::to_string(&TreatmentType::ClearAligners).unwrap();
        assert_eq!(json, "\"CLEAR_ALIGNERS\"");
    }
}
