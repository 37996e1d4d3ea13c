//! The synchronization pass.
//!
//! Bookings are processed one at a time. A failure on one booking is
//! logged, counted and parked in `legacy_sync_failures`; it never aborts
//! the rest of the pass or holds back the watermark.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::Mutex;
use ortho_core::appointment::{clamp_duration, RecordSource};
use ortho_core::contact::normalize_phone;
use ortho_core::legacy_sync::{choose_match_key, map_legacy_status, MatchKey, SyncRunStatus};
use ortho_core::types::{DbId, Timestamp};
use ortho_db::models::appointment::{Appointment, CreateAppointment, UpdateAppointment};
use ortho_db::models::legacy_sync_run::FinishSyncRun;
use ortho_db::models::patient::{CreatePatient, Patient};
use ortho_db::repositories::{
    AppointmentRepo, LegacySyncFailureRepo, LegacySyncRunRepo, PatientRepo,
};

use crate::error::SyncError;
use crate::source::{BookingSource, LegacyBooking};

/// Most parked failures re-read in one pass.
const RETRY_BATCH_LIMIT: i64 = 500;

/// Counters for one pass, returned to the caller and persisted on the run row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub run_id: DbId,
    pub status: String,
    pub fetched: i32,
    pub patients_created: i32,
    pub patients_matched: i32,
    pub appointments_created: i32,
    pub appointments_updated: i32,
    pub appointments_unchanged: i32,
    /// Earlier failures re-read this pass.
    pub retried: i32,
    pub errors: i32,
    pub last_error: Option<String>,
    pub max_source_updated_at: Option<Timestamp>,
}

impl SyncReport {
    fn finish_input(&self) -> FinishSyncRun {
        FinishSyncRun {
            status: self.status.clone(),
            fetched: self.fetched,
            patients_created: self.patients_created,
            patients_matched: self.patients_matched,
            appointments_created: self.appointments_created,
            appointments_updated: self.appointments_updated,
            appointments_unchanged: self.appointments_unchanged,
            retried: self.retried,
            error_count: self.errors,
            last_error: self.last_error.clone(),
            max_source_updated_at: self.max_source_updated_at,
        }
    }
}

enum PatientOutcome {
    Matched,
    Created,
}

enum AppointmentOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Runs sync passes against one source. Only one pass runs at a time.
pub struct SyncEngine {
    pool: PgPool,
    source: Arc<dyn BookingSource>,
    lock: Mutex<()>,
}

impl SyncEngine {
    pub fn new(pool: PgPool, source: Arc<dyn BookingSource>) -> Self {
        Self {
            pool,
            source,
            lock: Mutex::new(()),
        }
    }

    /// Execute one incremental pass.
    ///
    /// Returns [`SyncError::AlreadyRunning`] if another pass is in flight,
    /// and [`SyncError::Source`] (after recording a `FAILED` run) when the
    /// legacy database cannot be read.
    pub async fn run_once(&self, triggered_by: Option<DbId>) -> Result<SyncReport, SyncError> {
        let _guard = self.lock.try_lock().map_err(|_| SyncError::AlreadyRunning)?;

        let watermark = LegacySyncRunRepo::last_watermark(&self.pool).await?;
        let run = LegacySyncRunRepo::start(&self.pool, triggered_by).await?;
        let mut report = SyncReport {
            run_id: run.id,
            status: SyncRunStatus::Running.as_str().to_string(),
            ..Default::default()
        };

        tracing::info!(run_id = run.id, watermark = ?watermark, "Legacy sync pass started");

        // Earlier failures first, re-read by number so the watermark never
        // has to wait for them.
        let pending: Vec<String> = LegacySyncFailureRepo::list_pending(&self.pool, RETRY_BATCH_LIMIT)
            .await?
            .into_iter()
            .map(|f| f.booking_number)
            .collect();
        let mut retried = HashSet::new();
        if !pending.is_empty() {
            let current = match self.source.fetch_by_booking_numbers(&pending).await {
                Ok(bookings) => bookings,
                Err(e) => return self.fail_run(report, e).await,
            };
            for booking in &current {
                self.process(booking, true, &mut report).await;
                retried.insert(booking.booking_number.clone());
            }
            for number in pending.iter().filter(|n| !retried.contains(*n)) {
                tracing::info!(booking_number = %number, "Failed legacy booking no longer exists upstream");
                self.forget_failure(number).await;
            }
            report.retried = current.len() as i32;
        }

        let bookings = match self.source.fetch_updated_since(watermark).await {
            Ok(bookings) => bookings,
            Err(e) => return self.fail_run(report, e).await,
        };

        report.fetched = bookings.len() as i32;
        report.max_source_updated_at = bookings.iter().map(|b| b.updated_at).max();

        for booking in bookings
            .iter()
            .filter(|b| !retried.contains(&b.booking_number))
        {
            self.process(booking, false, &mut report).await;
        }

        let status = if report.errors == 0 {
            SyncRunStatus::Completed
        } else {
            SyncRunStatus::Partial
        };
        report.status = status.as_str().to_string();
        LegacySyncRunRepo::finish(&self.pool, run.id, &report.finish_input()).await?;

        tracing::info!(
            run_id = run.id,
            status = %status,
            retried = report.retried,
            fetched = report.fetched,
            patients_created = report.patients_created,
            appointments_created = report.appointments_created,
            appointments_updated = report.appointments_updated,
            errors = report.errors,
            "Legacy sync pass finished"
        );
        Ok(report)
    }

    /// Close the run as `FAILED` and hand the source error back.
    async fn fail_run(&self, mut report: SyncReport, err: SyncError) -> Result<SyncReport, SyncError> {
        tracing::error!(run_id = report.run_id, error = %err, "Legacy source unavailable");
        report.status = SyncRunStatus::Failed.as_str().to_string();
        report.last_error = Some(err.to_string());
        LegacySyncRunRepo::finish(&self.pool, report.run_id, &report.finish_input()).await?;
        Err(err)
    }

    /// Apply one booking, parking it for retry on failure.
    async fn process(&self, booking: &LegacyBooking, was_pending: bool, report: &mut SyncReport) {
        match self.apply_booking(booking, report).await {
            Ok(()) if was_pending => self.forget_failure(&booking.booking_number).await,
            Ok(()) => {}
            Err(e) => {
                tracing::warn!(
                    run_id = report.run_id,
                    booking_number = %booking.booking_number,
                    error = %e,
                    "Failed to sync legacy booking"
                );
                report.errors += 1;
                report.last_error = Some(format!("{}: {e}", booking.booking_number));
                if let Err(db) = LegacySyncFailureRepo::record(
                    &self.pool,
                    &booking.booking_number,
                    booking.updated_at,
                    &e.to_string(),
                )
                .await
                {
                    tracing::error!(
                        booking_number = %booking.booking_number,
                        error = %db,
                        "Failed to park legacy booking for retry"
                    );
                }
            }
        }
    }

    async fn forget_failure(&self, booking_number: &str) {
        if let Err(e) = LegacySyncFailureRepo::clear(&self.pool, booking_number).await {
            tracing::error!(booking_number, error = %e, "Failed to clear legacy sync failure");
        }
    }

    async fn apply_booking(
        &self,
        booking: &LegacyBooking,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let (patient, outcome) = self.resolve_patient(booking).await?;
        match outcome {
            PatientOutcome::Matched => report.patients_matched += 1,
            PatientOutcome::Created => report.patients_created += 1,
        }

        match self.upsert_appointment(patient.id, booking).await? {
            AppointmentOutcome::Created => report.appointments_created += 1,
            AppointmentOutcome::Updated => report.appointments_updated += 1,
            AppointmentOutcome::Unchanged => report.appointments_unchanged += 1,
        }
        Ok(())
    }

    /// Find the patient a booking belongs to, creating one when no contact
    /// detail matches.
    ///
    /// Email is tried first, then the phone number.
    async fn resolve_patient(
        &self,
        booking: &LegacyBooking,
    ) -> Result<(Patient, PatientOutcome), SyncError> {
        let key = choose_match_key(booking.email.as_deref(), booking.phone.as_deref());

        let existing = match &key {
            MatchKey::Email(email) => {
                match PatientRepo::find_by_normalized_email(&self.pool, email).await? {
                    Some(patient) => Some(patient),
                    None => match booking.phone.as_deref().and_then(normalize_phone) {
                        Some(phone) => {
                            PatientRepo::find_by_normalized_phone(&self.pool, &phone).await?
                        }
                        None => None,
                    },
                }
            }
            MatchKey::Phone(phone) => PatientRepo::find_by_normalized_phone(&self.pool, phone).await?,
            MatchKey::None => None,
        };
        if let Some(patient) = existing {
            return Ok((patient, PatientOutcome::Matched));
        }

        let (first_name, last_name) = booking.patient_name();
        let email = match key {
            MatchKey::Email(email) => Some(email),
            _ => None,
        };
        let input = CreatePatient {
            first_name,
            last_name,
            email,
            phone: booking.phone.clone(),
            source: Some(RecordSource::Legacy.as_str().to_string()),
            ..Default::default()
        };
        let patient = PatientRepo::create(&self.pool, &input).await?;
        tracing::debug!(
            patient_id = patient.id,
            booking_number = %booking.booking_number,
            "Created patient from legacy booking"
        );
        Ok((patient, PatientOutcome::Created))
    }

    async fn upsert_appointment(
        &self,
        patient_id: DbId,
        booking: &LegacyBooking,
    ) -> Result<AppointmentOutcome, SyncError> {
        let status = map_legacy_status(&booking.status).as_str();
        let duration = clamp_duration(booking.duration_minutes);

        let Some(existing) =
            AppointmentRepo::find_by_legacy_booking_number(&self.pool, &booking.booking_number)
                .await?
        else {
            let input = CreateAppointment {
                patient_id,
                doctor_id: None,
                starts_at: booking.starts_at,
                duration_minutes: duration,
                status: Some(status.to_string()),
                appointment_type: booking.service.clone(),
                notes: booking.notes.clone(),
                source: Some(RecordSource::Legacy.as_str().to_string()),
                legacy_booking_number: Some(booking.booking_number.clone()),
                legacy_updated_at: Some(booking.updated_at),
            };
            AppointmentRepo::create(&self.pool, &input).await?;
            return Ok(AppointmentOutcome::Created);
        };

        if !needs_update(&existing, booking, status, duration) {
            return Ok(AppointmentOutcome::Unchanged);
        }

        let input = UpdateAppointment {
            starts_at: Some(booking.starts_at),
            duration_minutes: Some(duration),
            status: Some(status.to_string()),
            appointment_type: booking.service.clone(),
            notes: booking.notes.clone(),
            legacy_updated_at: Some(booking.updated_at),
            ..Default::default()
        };
        AppointmentRepo::update(&self.pool, existing.id, &input).await?;
        Ok(AppointmentOutcome::Updated)
    }
}

/// A legacy change is applied only when the booking is newer than the last
/// imported version and actually differs from what is stored.
fn needs_update(existing: &Appointment, booking: &LegacyBooking, status: &str, duration: i32) -> bool {
    if existing
        .legacy_updated_at
        .is_some_and(|seen| seen >= booking.updated_at)
    {
        return false;
    }
    existing.starts_at != booking.starts_at
        || existing.status != status
        || existing.duration_minutes != duration
        || (booking.service.is_some() && existing.appointment_type != booking.service)
        || (booking.notes.is_some() && existing.notes != booking.notes)
}
