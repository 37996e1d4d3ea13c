use async_trait::async_trait;
use ortho_core::legacy_sync::split_full_name;
use ortho_core::types::Timestamp;

use crate::error::SyncError;

/// One booking as read from the legacy system.
///
/// Contact fields are passed through untouched; normalization happens in
/// the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyBooking {
    pub booking_number: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Single-field name used by older booking forms.
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub starts_at: Timestamp,
    pub duration_minutes: Option<i32>,
    pub service: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub updated_at: Timestamp,
}

impl LegacyBooking {
    /// Best available `(first_name, last_name)` for a new patient record.
    pub fn patient_name(&self) -> (String, String) {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        match (non_blank(&self.first_name), non_blank(&self.last_name)) {
            (Some(first), last) => (first, last.unwrap_or_default()),
            (None, Some(last)) => ("Unknown".to_string(), last),
            (None, None) => match non_blank(&self.full_name) {
                Some(full) => split_full_name(&full),
                None => ("Unknown".to_string(), String::new()),
            },
        }
    }
}

/// Read access to the legacy booking store.
#[async_trait]
pub trait BookingSource: Send + Sync {
    /// Bookings whose `updated_at` is at or after `since`, oldest first.
    /// `None` means a full import.
    async fn fetch_updated_since(
        &self,
        since: Option<Timestamp>,
    ) -> Result<Vec<LegacyBooking>, SyncError>;

    /// Current versions of specific bookings, used to retry earlier
    /// failures. Numbers no longer present in the legacy system are
    /// simply absent from the result.
    async fn fetch_by_booking_numbers(
        &self,
        booking_numbers: &[String],
    ) -> Result<Vec<LegacyBooking>, SyncError>;
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn booking() -> LegacyBooking {
        LegacyBooking {
            booking_number: "B-1".into(),
            first_name: None,
            last_name: None,
            full_name: None,
            email: None,
            phone: None,
            starts_at: Utc::now(),
            duration_minutes: None,
            service: None,
            status: "booked".into(),
            notes: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn explicit_names_win() {
        let b = LegacyBooking {
            first_name: Some(" Ana ".into()),
            last_name: Some("Lopez".into()),
            full_name: Some("Someone Else".into()),
            ..booking()
        };
        assert_eq!(b.patient_name(), ("Ana".into(), "Lopez".into()));
    }

    #[test]
    fn full_name_fallback() {
        let b = LegacyBooking {
            first_name: Some("  ".into()),
            full_name: Some("Lopez, Ana".into()),
            ..booking()
        };
        assert_eq!(b.patient_name(), ("Ana".into(), "Lopez".into()));
    }

    #[test]
    fn anonymous_booking() {
        assert_eq!(booking().patient_name(), ("Unknown".into(), String::new()));
    }
}
