//! Error types for textsync.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RevisionId;

/// Coarse classification of an error, used to pick a recovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Duplicate or missing registration.
    Registration,
    /// Operation attempted outside its lifecycle state.
    State,
    /// Caller's view of the field is outdated.
    Concurrency,
    /// Malformed caller input.
    Validation,
    /// Failure not attributable to caller input.
    Internal,
}

/// Errors returned by text-field transaction, composition and content calls.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TextFieldError {
    /// Presented revision does not match the field's current revision
    #[error("stale revision: presented {presented}, current {current}")]
    StaleRevision {
        /// Revision the caller presented.
        presented: RevisionId,
        /// Revision in effect.
        current: RevisionId,
    },

    /// Transaction id is unknown or already closed
    #[error("unknown or closed transaction")]
    BadTransaction,

    /// Operation not valid in the current lifecycle state
    #[error("bad state: {0}")]
    BadState(String),

    /// Range with `start > end`
    #[error("invalid range: start {start} > end {end}")]
    InvalidRange {
        /// Range start.
        start: usize,
        /// Range end.
        end: usize,
    },

    /// Position beyond the end of the content
    #[error("position {position} out of bounds (len {len})")]
    OutOfBounds {
        /// Offending position.
        position: usize,
        /// Content length in code points.
        len: usize,
    },

    /// Highlighted segment index outside the segment list
    #[error("highlighted segment {index} out of range ({segments} segments)")]
    InvalidHighlight {
        /// Presented index.
        index: usize,
        /// Number of segments.
        segments: usize,
    },

    /// Text exceeds a configured length limit
    #[error("text too long: {len} code points (limit {limit})")]
    TooLong {
        /// Length in code points.
        len: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Line break inserted into a single-line field
    #[error("line break at {position} in a single-line field")]
    LineBreak {
        /// Code point offset of the line break within the inserted text.
        position: usize,
    },

    /// Session was torn down
    #[error("session closed")]
    Closed,

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl TextFieldError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StaleRevision { .. } | Self::BadTransaction => ErrorKind::Concurrency,
            Self::BadState(_) | Self::Closed => ErrorKind::State,
            Self::InvalidRange { .. }
            | Self::OutOfBounds { .. }
            | Self::InvalidHighlight { .. }
            | Self::TooLong { .. }
            | Self::LineBreak { .. } => ErrorKind::Validation,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether re-fetching state and retrying can succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Concurrency
    }
}

/// MessagePack codec failures for [`Request`](crate::Request) and [`Response`](crate::Response).
#[derive(Debug, Error)]
pub enum CodecError {
    /// MessagePack serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] rmp_serde::encode::Error),

    /// MessagePack deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] rmp_serde::decode::Error),
}

/// Errors returned by registration and session notification calls.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TextEditServerError {
    /// The field endpoint already has a live session
    #[error("text field already registered")]
    AlreadyRegistered,

    /// No live session for the handle
    #[error("text field not registered")]
    NotRegistered,

    /// Out-of-band state did not move the revision forward
    #[error("stale revision: presented {presented}, current {current}")]
    StaleRevision {
        /// Revision the caller presented.
        presented: RevisionId,
        /// Revision in effect.
        current: RevisionId,
    },

    /// Pushed state is malformed or does not fit the content
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Session limit reached and every session is focused
    #[error("session limit reached ({limit})")]
    ResourceExhausted {
        /// Configured session limit.
        limit: usize,
    },

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl TextEditServerError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyRegistered | Self::NotRegistered => ErrorKind::Registration,
            Self::StaleRevision { .. } => ErrorKind::Concurrency,
            Self::InvalidState(_) => ErrorKind::Validation,
            Self::ResourceExhausted { .. } | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}
