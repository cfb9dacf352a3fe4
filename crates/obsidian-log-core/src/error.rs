//! Error types for the Obsidian Log core crate.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while validating or parsing site data.
#[derive(Error, Debug)]
pub enum Error {
    /// A user-supplied field failed validation. The reason is user-facing.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        /// The name of the invalid field.
        field: &'static str,
        /// Description of what's wrong.
        reason: String,
    },

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Front matter (YAML) parsing or serialization error.
    #[error("front matter error: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an [`Error::InvalidField`].
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// The user-facing message for validation failures, or the display string
    /// for everything else.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidField { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}
