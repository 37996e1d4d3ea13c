//! Domain types, error type, and pure business rules for the clinic backend.
//!
//! Nothing in this crate performs I/O. The db, api, and sync crates build on
//! these rules so that validation lives in one place.

#[macro_use]
mod macros;

pub mod appointment;
pub mod contact;
pub mod error;
pub mod legacy_sync;
pub mod notes;
pub mod patient;
pub mod payment;
pub mod photo;
pub mod roles;
pub mod treatment;
pub mod types;
