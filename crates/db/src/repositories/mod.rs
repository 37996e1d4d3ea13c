//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod appointment_repo;
pub mod clinical_note_repo;
pub mod legacy_sync_failure_repo;
pub mod legacy_sync_run_repo;
pub mod patient_repo;
pub mod payment_repo;
pub mod photo_repo;
pub mod role_repo;
pub mod session_repo;
pub mod treatment_phase_repo;
pub mod treatment_plan_repo;
pub mod user_repo;

pub use appointment_repo::AppointmentRepo;
pub use clinical_note_repo::ClinicalNoteRepo;
pub use legacy_sync_failure_repo::LegacySyncFailureRepo;
pub use legacy_sync_run_repo::LegacySyncRunRepo;
pub use patient_repo::PatientRepo;
pub use payment_repo::PaymentRepo;
pub use photo_repo::PhotoRepo;
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use treatment_phase_repo::TreatmentPhaseRepo;
pub use treatment_plan_repo::TreatmentPlanRepo;
pub use user_repo::UserRepo;
