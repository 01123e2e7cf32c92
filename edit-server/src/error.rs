//! Error types for edit-server.

use textsync_edit_types::{CodecError, TextEditServerError, TextFieldError};

/// Main error type for edit-server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Registration or session notification error.
    #[error("session error: {0}")]
    Session(#[from] TextEditServerError),

    /// Text-field operation error.
    #[error("text field error: {0}")]
    Field(#[from] TextFieldError),

    /// Wire codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Result type alias for edit-server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Map a field-level failure from an out-of-band update onto the session error space.
pub(crate) fn state_update_error(err: TextFieldError) -> TextEditServerError {
    match err {
        TextFieldError::StaleRevision { presented, current } => {
            TextEditServerError::StaleRevision { presented, current }
        }
        TextFieldError::Closed => TextEditServerError::NotRegistered,
        TextFieldError::Internal(msg) => TextEditServerError::Internal(msg),
        other => TextEditServerError::InvalidState(other.to_string()),
    }
}
