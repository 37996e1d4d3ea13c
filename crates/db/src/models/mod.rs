//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts
//! - An update DTO (all `Option` fields) for partial updates

pub mod appointment;
pub mod clinical_note;
pub mod legacy_sync_failure;
pub mod legacy_sync_run;
pub mod patient;
pub mod payment;
pub mod photo;
pub mod role;
pub mod session;
pub mod treatment;
pub mod user;
