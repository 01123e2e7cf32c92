//! # edit-types
//!
//! Wire format types for the textsync text-field synchronization protocol.
//!
//! This crate provides the foundational types used across all textsync crates:
//! - [`TextFieldHandle`], [`FieldEndpointId`], [`RevisionId`], [`TransactionId`] - Identity and versioning
//! - [`Range`], [`Selection`] - Code-point addressing
//! - [`TextFieldState`], [`CompositionUpdate`] - Compact state snapshots and IME composition data
//! - [`Request`], [`Response`] - Protocol messages
//! - [`TextFieldError`], [`TextEditServerError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;
mod state;
mod text;

pub use error::{CodecError, ErrorKind, TextEditServerError, TextFieldError};
pub use ids::{FieldEndpointId, RevisionId, TextFieldHandle, TransactionId};
pub use messages::{Request, Response};
pub use state::{
    CompositionSegment, CompositionState, CompositionUpdate, InputType, TextFieldOptions,
    TextFieldState,
};
pub use text::{Affinity, Range, Selection};
