//! Request extractors for authentication, authorization and body validation.
//!
//! - [`auth::AuthUser`] -- the caller identified by a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- `ADMIN` only.
//! - [`rbac::RequireClinician`] -- `ADMIN` or `DOCTOR`.
//! - [`rbac::RequireStaff`] -- any clinic role.
//! - [`validation::ValidatedJson`] -- JSON body checked with `validator`.

pub mod auth;
pub mod rbac;
pub mod validation;
