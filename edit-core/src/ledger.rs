//! Revision tracking for one text field.
//!
//! The ledger is the basis for optimistic concurrency between the client's
//! view of a field and the edit server's view:
//! - Every opening call (transaction or composition) presents a revision
//!   and is rejected unless it matches [`RevisionLedger::current`]
//! - Every committing or cancelling call advances the ledger exactly once
//! - Out-of-band client updates may move it forward, never backward
//!
//! A fresh registration always starts a fresh ledger at zero.

use textsync_edit_types::{RevisionId, TextFieldError};

/// Monotonic revision counter for a single field.
#[derive(Debug, Clone, Default)]
pub struct RevisionLedger {
    current: RevisionId,
}

impl RevisionLedger {
    /// Create a ledger at revision zero.
    pub fn new() -> Self {
        Self {
            current: RevisionId::zero(),
        }
    }

    /// The revision in effect.
    pub fn current(&self) -> RevisionId {
        self.current
    }

    /// Move to the next revision and return it.
    pub fn advance(&mut self) -> RevisionId {
        self.current = self.current.next();
        self.current
    }

    /// Whether `presented` is the revision in effect.
    pub fn validate(&self, presented: RevisionId) -> bool {
        presented == self.current
    }

    /// Like [`validate`](Self::validate), but as a stale-revision error.
    pub fn check(&self, presented: RevisionId) -> Result<(), TextFieldError> {
        if self.validate(presented) {
            Ok(())
        } else {
            Err(TextFieldError::StaleRevision {
                presented,
                current: self.current,
            })
        }
    }

    /// Adopt a revision reported out-of-band by the client.
    ///
    /// Only a strictly greater revision is accepted.
    pub fn observe(&mut self, revision: RevisionId) -> Result<(), TextFieldError> {
        if revision <= self.current {
            return Err(TextFieldError::StaleRevision {
                presented: revision,
                current: self.current,
            });
        }
        self.current = revision;
        Ok(())
    }
}
