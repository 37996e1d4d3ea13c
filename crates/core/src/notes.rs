//! Clinical note categories and content validation.

use crate::error::CoreError;
use crate::roles::ROLE_ADMIN;
use crate::types::DbId;

/// Maximum length of note content in characters.
pub const MAX_NOTE_CONTENT_LENGTH: usize = 10_000;

define_text_enum! {
    /// Coarse grouping of notes on a patient chart.
    NoteCategory("note category") {
        General => "GENERAL",
        Clinical => "CLINICAL",
        Treatment => "TREATMENT",
        Billing => "BILLING",
    }
}

/// Validate note content: non-blank and within [`MAX_NOTE_CONTENT_LENGTH`].
pub fn validate_content(content: &str) -> Result<(), CoreError> {
    if content.trim().is_empty() {
        return Err(CoreError::Validation("Note content must not be empty".into()));
    }
    if content.chars().count() > MAX_NOTE_CONTENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Note content must be at most {MAX_NOTE_CONTENT_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Only the author or an administrator may edit or remove a note.
pub fn can_modify(author_id: DbId, user_id: DbId, role: &str) -> bool {
    author_id == user_id || role == ROLE_ADMIN
}
