//! Protocol messages exchanged between an edit server and a text-field session.
//!
//! Registration is not a session message: a session only exists once
//! `RegisterFocusedTextField` has succeeded, and every [`Request`] is
//! addressed to that session.

use serde::{Deserialize, Serialize};

use crate::{
    CodecError, CompositionUpdate, Range, RevisionId, Selection, TextFieldError, TextFieldState,
    TransactionId,
};

/// Requests an edit server sends to a text-field session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Read a bounded chunk of content
    GetText {
        /// Code points to read; clamped to the configured chunk size
        range: Range,
    },
    /// Fetch the current compact state
    GetState,
    /// Open a transaction against the presented revision
    BeginTransaction {
        /// Revision the edit server believes is current
        revision_id: RevisionId,
    },
    /// Buffer a selection change
    SetSelection {
        /// Open transaction
        transaction_id: TransactionId,
        /// New selection
        selection: Selection,
    },
    /// Buffer a text replacement
    SetText {
        /// Open transaction
        transaction_id: TransactionId,
        /// Code points to replace
        old_range: Range,
        /// Replacement text
        new_text: String,
    },
    /// Apply buffered edits
    CommitTransaction {
        /// Open transaction
        transaction_id: TransactionId,
    },
    /// Discard buffered edits
    CancelTransaction {
        /// Open transaction
        transaction_id: TransactionId,
    },
    /// Open a composition against the presented revision
    BeginComposition {
        /// Revision the edit server believes is current
        revision_id: RevisionId,
    },
    /// Commit a transaction inside the open composition
    CommitTransactionInComposition {
        /// Open transaction
        transaction_id: TransactionId,
        /// Replacement composition decoration
        composition_update: CompositionUpdate,
    },
    /// Accept the composition into the content
    CompleteComposition,
    /// Revert everything the composition committed
    CancelComposition,
}

/// Responses a text-field session returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Content chunk
    Text {
        /// Code points actually read
        range: Range,
        /// The text
        text: String,
    },
    /// Transaction opened
    TransactionBegun {
        /// Token for subsequent calls
        transaction_id: TransactionId,
    },
    /// Call succeeded with nothing to return
    Ack,
    /// State after a state-changing call
    State {
        /// The snapshot
        state: TextFieldState,
    },
    /// Call failed
    Error {
        /// What went wrong
        error: TextFieldError,
    },
}

impl Request {
    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        rmp_serde::to_vec_named(self).map_err(CodecError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        rmp_serde::from_slice(bytes).map_err(CodecError::Deserialization)
    }
}

impl Response {
    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        rmp_serde::to_vec_named(self).map_err(CodecError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        rmp_serde::from_slice(bytes).map_err(CodecError::Deserialization)
    }
}

impl From<Result<TextFieldState, TextFieldError>> for Response {
    fn from(result: Result<TextFieldState, TextFieldError>) -> Self {
        match result {
            Ok(state) => Self::State { state },
            Err(error) => Self::Error { error },
        }
    }
}
