//! Error type for the patch engine.

use crate::diff::PatchParseError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Malformed patch: {0}")]
    MalformedPatch(#[from] PatchParseError),

    #[error("Internal error: {0}")]
    Internal(String),
}
