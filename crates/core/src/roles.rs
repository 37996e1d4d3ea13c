//! Well-known role name constants.
//!
//! These must match the seed data in `20260301000001_create_roles_and_users.sql`.

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_DOCTOR: &str = "DOCTOR";
pub const ROLE_ASSISTANT: &str = "ASSISTANT";

/// Every role a clinic user may hold.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_DOCTOR, ROLE_ASSISTANT];

/// Whether `role` is one of the known role names (case-sensitive).
pub fn is_valid_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}

/// Admins and doctors may author clinical data (plans, phases).
pub fn is_clinician(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_DOCTOR
}
