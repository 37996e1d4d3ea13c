//! One-way bridge from the legacy MySQL booking system.
//!
//! A [`BookingSource`] yields bookings changed since a watermark; the
//! [`SyncEngine`] folds them into patients and appointments, deduplicating
//! by contact details and legacy booking number, and records every pass in
//! `legacy_sync_runs`.

pub mod config;
pub mod engine;
pub mod error;
pub mod mysql;
pub mod source;

pub use config::LegacySyncConfig;
pub use engine::{SyncEngine, SyncReport};
pub use error::SyncError;
pub use mysql::MySqlBookingSource;
pub use source::{BookingSource, LegacyBooking};
