//! A single exclusive edit transaction.
//!
//! A transaction buffers edits without touching the content. Each edit is
//! validated against the content length *projected* from the edits
//! buffered before it, so a commit can only fail if the content provider
//! itself fails or the content changed out-of-band underneath it.
//!
//! Buffered edits apply in order: the range of a `set_text` addresses the
//! content as it will be after every earlier `set_text` of the same
//! transaction.

use textsync_edit_types::{Range, Selection, TextFieldError, TransactionId};

use crate::content::TextContent;
use crate::field::EditLimits;
use crate::undo::{Replacement, UndoLog};

/// An Active transaction and its buffered edits.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: TransactionId,
    edits: Vec<Replacement>,
    selection: Option<Selection>,
    projected_len: usize,
}

/// Result of applying a transaction's edits.
#[derive(Debug)]
pub struct Applied {
    /// Inverses of the applied edits.
    pub undo: UndoLog,
    /// Selection to install, if the transaction set one.
    pub selection: Option<Selection>,
}

impl Transaction {
    /// Open a transaction over content of `len` code points.
    pub fn new(id: TransactionId, len: usize) -> Self {
        Self {
            id,
            edits: Vec::new(),
            selection: None,
            projected_len: len,
        }
    }

    /// This transaction's token.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Content length once every buffered edit is applied.
    pub fn projected_len(&self) -> usize {
        self.projected_len
    }

    /// Selection the transaction will install, if any.
    pub fn pending_selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Number of buffered text edits.
    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    /// Buffer a selection change.
    pub fn set_selection(&mut self, selection: Selection) -> Result<(), TextFieldError> {
        selection.validate_within(self.projected_len)?;
        self.selection = Some(selection);
        Ok(())
    }

    /// Buffer a replacement of `old_range` with `new_text`.
    ///
    /// Leaves the caret after the inserted text, replacing any selection
    /// buffered earlier in this transaction.
    pub fn set_text(
        &mut self,
        old_range: Range,
        new_text: &str,
        limits: &EditLimits,
    ) -> Result<(), TextFieldError> {
        old_range.validate_within(self.projected_len)?;

        let inserted = new_text.chars().count();
        if inserted > limits.max_insert_chars {
            return Err(TextFieldError::TooLong {
                len: inserted,
                limit: limits.max_insert_chars,
            });
        }

        let new_len = self.projected_len - old_range.len() + inserted;
        if new_len > limits.max_content_chars {
            return Err(TextFieldError::TooLong {
                len: new_len,
                limit: limits.max_content_chars,
            });
        }

        self.edits.push(Replacement::new(old_range, new_text));
        self.selection = Some(Selection::caret(old_range.start + inserted));
        self.projected_len = new_len;
        Ok(())
    }

    /// Apply every buffered edit to `content`, all or nothing.
    pub fn apply(self, content: &mut dyn TextContent) -> Result<Applied, TextFieldError> {
        let undo = UndoLog::apply_all(&self.edits, content)?;
        Ok(Applied {
            undo,
            selection: self.selection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::SharedText;

    fn range(start: usize, end: usize) -> Range {
        Range::new(start, end).unwrap()
    }

    fn tx(len: usize) -> Transaction {
        Transaction::new(TransactionId::new(1), len)
    }

    #[test]
    fn set_text_moves_caret_after_insert() {
        let mut t = tx(5);
        t.set_text(range(0, 5), "HELLO!", &EditLimits::default()).unwrap();
        assert_eq!(t.pending_selection(), Some(Selection::caret(6)));
        assert_eq!(t.projected_len(), 6);
    }

    #[test]
    fn set_text_supersedes_earlier_selection() {
        let mut t = tx(5);
        t.set_selection(Selection::new(0, 5)).unwrap();
        t.set_text(range(1, 2), "xy", &EditLimits::default()).unwrap();
        assert_eq!(t.pending_selection(), Some(Selection::caret(3)));
    }

    #[test]
    fn later_selection_overrides_text_caret() {
        let mut t = tx(5);
        t.set_text(range(0, 0), "a", &EditLimits::default()).unwrap();
        t.set_selection(Selection::new(0, 6)).unwrap();
        assert_eq!(t.pending_selection(), Some(Selection::new(0, 6)));
    }

    #[test]
    fn ranges_checked_against_projected_length() {
        let mut t = tx(3);
        t.set_text(range(0, 3), "", &EditLimits::default()).unwrap();
        let err = t.set_text(range(0, 1), "x", &EditLimits::default()).unwrap_err();
        assert!(matches!(err, TextFieldError::OutOfBounds { position: 1, len: 0 }));
        // Failed call leaves earlier edits intact
        assert_eq!(t.edit_count(), 1);
        assert_eq!(t.projected_len(), 0);
    }

    #[test]
    fn inverted_range_rejected() {
        let mut t = tx(5);
        let bad = Range { start: 4, end: 2 };
        assert!(matches!(
            t.set_text(bad, "x", &EditLimits::default()),
            Err(TextFieldError::InvalidRange { .. })
        ));
        assert_eq!(t.edit_count(), 0);
    }

    #[test]
    fn selection_out_of_bounds_rejected() {
        let mut t = tx(2);
        assert!(t.set_selection(Selection::new(0, 3)).is_err());
        assert_eq!(t.pending_selection(), None);
    }

    #[test]
    fn insert_limit_enforced() {
        let limits = EditLimits {
            max_insert_chars: 3,
            ..EditLimits::default()
        };
        let mut t = tx(0);
        assert!(matches!(
            t.set_text(Range::caret(0), "four", &limits),
            Err(TextFieldError::TooLong { len: 4, limit: 3 })
        ));
    }

    #[test]
    fn content_limit_enforced() {
        let limits = EditLimits {
            max_content_chars: 6,
            ..EditLimits::default()
        };
        let mut t = tx(5);
        t.set_text(Range::caret(5), "!", &limits).unwrap();
        assert!(matches!(
            t.set_text(Range::caret(6), "!", &limits),
            Err(TextFieldError::TooLong { len: 7, limit: 6 })
        ));
    }

    #[test]
    fn apply_runs_edits_in_order() {
        let mut text = SharedText::new("hello");
        let mut t = tx(5);
        t.set_text(range(0, 1), "J", &EditLimits::default()).unwrap();
        t.set_text(range(5, 5), "!", &EditLimits::default()).unwrap();
        let applied = t.apply(&mut text).unwrap();
        assert_eq!(text.contents().unwrap(), "Jello!");
        assert_eq!(applied.selection, Some(Selection::caret(6)));
        applied.undo.revert(&mut text).unwrap();
        assert_eq!(text.contents().unwrap(), "hello");
    }
}
