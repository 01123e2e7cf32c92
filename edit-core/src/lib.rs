//! # edit-core
//!
//! Pure logic for textsync (no I/O, instant tests).
//!
//! This crate implements the revision ledger, the transaction and
//! composition state machines, and the per-field synchronizer that ties
//! them to a content provider, without any network or async runtime.
//!
//! ## Design Philosophy
//!
//! Every type here is driven by plain method calls and returns plain
//! results. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! Serialization of access to a field (one caller at a time) is the job of
//! `edit-server`, which wraps each [`FieldSynchronizer`] in a mutex.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod composition;
pub mod content;
pub mod field;
pub mod ledger;
pub mod transaction;
pub mod undo;

pub use composition::Composition;
pub use content::{read_chunked, SharedText, TextContent};
pub use field::{EditLimits, FieldSynchronizer};
pub use ledger::RevisionLedger;
pub use transaction::Transaction;
pub use undo::{Replacement, UndoLog};
