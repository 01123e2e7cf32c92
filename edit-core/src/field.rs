//! Per-field synchronizer.
//!
//! [`FieldSynchronizer`] owns everything mutable about one registered text
//! field: its revision ledger, its single transaction slot, its optional
//! composition, the current selection, and the content provider. Every
//! operation either succeeds completely or returns an error having changed
//! nothing, with one exception: a commit whose content provider fails
//! midway still closes the transaction and advances the revision (the
//! partial edits are rolled back first).
//!
//! ```text
//!                 begin_transaction
//!        Idle ───────────────────────► Active
//!         ▲                              │
//!         └── commit / cancel ◄──────────┘
//!
//!              begin_composition
//!        Idle ───────────────────────► Composing ◄──┐
//!         ▲                              │          │ commit_in_composition
//!         └── complete / cancel ◄────────┴──────────┘
//! ```

use textsync_edit_types::{
    CompositionUpdate, Range, RevisionId, Selection, TextFieldError, TextFieldOptions,
    TextFieldState, TransactionId,
};

use crate::composition::Composition;
use crate::content::TextContent;
use crate::ledger::RevisionLedger;
use crate::transaction::Transaction;

/// Length limits applied to reads and edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditLimits {
    /// Longest chunk a single `get_text` returns, in code points.
    pub max_get_text_chars: usize,
    /// Longest `new_text` a single `set_text` accepts.
    pub max_insert_chars: usize,
    /// Longest the content may grow to.
    pub max_content_chars: usize,
}

impl Default for EditLimits {
    fn default() -> Self {
        Self {
            max_get_text_chars: 4096,
            max_insert_chars: 64 * 1024,
            max_content_chars: 1024 * 1024,
        }
    }
}

/// Synchronization state for one text field.
pub struct FieldSynchronizer {
    ledger: RevisionLedger,
    content: Box<dyn TextContent>,
    selection: Selection,
    transaction: Option<Transaction>,
    composition: Option<Composition>,
    limits: EditLimits,
    read_only: bool,
    multiline: bool,
}

impl std::fmt::Debug for FieldSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSynchronizer")
            .field("revision", &self.ledger.current())
            .field("selection", &self.selection)
            .field("transaction", &self.transaction.as_ref().map(|t| t.id()))
            .field("composing", &self.composition.is_some())
            .field("read_only", &self.read_only)
            .field("multiline", &self.multiline)
            .finish_non_exhaustive()
    }
}

impl FieldSynchronizer {
    /// Create a synchronizer at revision zero with the caret at the start.
    ///
    /// Text replacement is unrestricted until [`apply_options`](Self::apply_options)
    /// says otherwise.
    pub fn new(content: Box<dyn TextContent>, limits: EditLimits) -> Self {
        Self {
            ledger: RevisionLedger::new(),
            content,
            selection: Selection::caret(0),
            transaction: None,
            composition: None,
            limits,
            read_only: false,
            multiline: true,
        }
    }

    /// Adopt the field's read-only and multiline restrictions.
    ///
    /// Edits already buffered in an Active transaction are not re-checked.
    pub fn apply_options(&mut self, options: &TextFieldOptions) {
        self.read_only = options.read_only;
        self.multiline = options.multiline;
    }

    /// The revision in effect.
    pub fn revision(&self) -> RevisionId {
        self.ledger.current()
    }

    /// Token of the Active transaction, if any.
    pub fn active_transaction(&self) -> Option<TransactionId> {
        self.transaction.as_ref().map(|t| t.id())
    }

    /// Whether a composition is open.
    pub fn is_composing(&self) -> bool {
        self.composition.is_some()
    }

    /// Materialize the compact state.
    pub fn state(&self) -> Result<TextFieldState, TextFieldError> {
        let len = self.content.len_chars()?;
        Ok(TextFieldState {
            revision_id: self.ledger.current(),
            contents_range: Range { start: 0, end: len },
            selection: self.selection,
            composition: self.composition.as_ref().map(|c| c.decoration().clone()),
        })
    }

    /// Read at most `max_get_text_chars` code points starting at `range.start`.
    ///
    /// Returns the range actually read alongside the text.
    pub fn get_text(&self, range: Range) -> Result<(Range, String), TextFieldError> {
        range.validate_within(self.content.len_chars()?)?;
        let clamped = Range {
            start: range.start,
            end: range
                .end
                .min(range.start.saturating_add(self.limits.max_get_text_chars)),
        };
        let text = self.content.get_text(clamped)?;
        Ok((clamped, text))
    }

    /// Open a transaction against `revision_id`.
    pub fn begin_transaction(
        &mut self,
        revision_id: RevisionId,
    ) -> Result<TransactionId, TextFieldError> {
        if self.transaction.is_some() {
            return Err(TextFieldError::BadState("transaction already active".into()));
        }
        self.ledger.check(revision_id)?;
        let len = self.content.len_chars()?;
        let id = TransactionId::random();
        self.transaction = Some(Transaction::new(id, len));
        Ok(id)
    }

    /// Buffer a selection change in the Active transaction.
    pub fn set_selection(
        &mut self,
        id: TransactionId,
        selection: Selection,
    ) -> Result<(), TextFieldError> {
        self.transaction_mut(id)?.set_selection(selection)
    }

    /// Buffer a text replacement in the Active transaction.
    pub fn set_text(
        &mut self,
        id: TransactionId,
        old_range: Range,
        new_text: &str,
    ) -> Result<(), TextFieldError> {
        let limits = self.limits;
        let (read_only, multiline) = (self.read_only, self.multiline);
        let transaction = self.transaction_mut(id)?;
        if read_only {
            return Err(TextFieldError::BadState("field is read-only".into()));
        }
        if !multiline {
            if let Some(position) = new_text.chars().position(|c| c == '\n' || c == '\r') {
                return Err(TextFieldError::LineBreak { position });
            }
        }
        transaction.set_text(old_range, new_text, &limits)
    }

    /// Apply the Active transaction's edits.
    pub fn commit_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<TextFieldState, TextFieldError> {
        self.reject_while_composing()?;
        let transaction = self.take_transaction(id)?;
        let applied = transaction.apply(self.content.as_mut());
        self.ledger.advance();
        if let Some(selection) = applied?.selection {
            self.selection = selection;
        }
        self.state()
    }

    /// Discard the Active transaction's edits.
    pub fn cancel_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<TextFieldState, TextFieldError> {
        self.reject_while_composing()?;
        self.take_transaction(id)?;
        self.ledger.advance();
        self.state()
    }

    /// Open a composition against `revision_id`.
    pub fn begin_composition(&mut self, revision_id: RevisionId) -> Result<(), TextFieldError> {
        if self.composition.is_some() {
            return Err(TextFieldError::BadState("composition already open".into()));
        }
        if self.transaction.is_some() {
            return Err(TextFieldError::BadState("transaction active".into()));
        }
        self.ledger.check(revision_id)?;
        self.composition = Some(Composition::begin(self.selection));
        Ok(())
    }

    /// Commit the Active transaction into the open composition.
    ///
    /// The update's segments are checked against the post-commit content
    /// length before anything is applied.
    pub fn commit_in_composition(
        &mut self,
        id: TransactionId,
        update: CompositionUpdate,
    ) -> Result<TextFieldState, TextFieldError> {
        if self.composition.is_none() {
            return Err(TextFieldError::BadState("no composition open".into()));
        }
        let projected_len = self.transaction_mut(id)?.projected_len();
        update.validate(projected_len)?;

        let transaction = self.take_transaction(id)?;
        let applied = transaction.apply(self.content.as_mut());
        self.ledger.advance();
        let applied = applied?;

        if let Some(composition) = self.composition.as_mut() {
            composition.record_commit(applied.undo, update);
        }
        if let Some(selection) = applied.selection {
            self.selection = selection;
        }
        self.state()
    }

    /// Accept the composition's edits and close it.
    pub fn complete_composition(&mut self) -> Result<TextFieldState, TextFieldError> {
        if self.composition.is_none() {
            return Err(TextFieldError::BadState("no composition open".into()));
        }
        if self.transaction.is_some() {
            return Err(TextFieldError::BadState("transaction active".into()));
        }
        self.composition = None;
        self.ledger.advance();
        self.state()
    }

    /// Revert everything the composition committed and close it.
    ///
    /// An Active transaction inside the composition is dropped. If the
    /// content changed out-of-band so that an undo no longer fits, the
    /// composition is still closed and an internal error is returned.
    pub fn cancel_composition(&mut self) -> Result<TextFieldState, TextFieldError> {
        let composition = self
            .composition
            .take()
            .ok_or_else(|| TextFieldError::BadState("no composition open".into()))?;
        self.transaction = None;

        let (undo, selection) = composition.into_rollback();
        let reverted = undo.revert(self.content.as_mut());
        self.selection = selection;
        self.ledger.advance();
        reverted?;
        self.state()
    }

    /// Adopt state pushed by the client for an out-of-band change.
    ///
    /// The Active transaction, if any, is left alone: it keeps the
    /// revision it was validated against and advances the ledger itself
    /// when it closes.
    pub fn observe_external(&mut self, state: &TextFieldState) -> Result<(), TextFieldError> {
        state
            .selection
            .validate_within(self.content.len_chars()?)?;
        self.ledger.observe(state.revision_id)?;
        self.selection = state.selection;
        Ok(())
    }

    /// Cancel whatever is open, as if the client had asked.
    ///
    /// Returns whether a transaction or composition was open.
    pub fn abort(&mut self) -> Result<bool, TextFieldError> {
        if self.composition.is_some() {
            self.cancel_composition()?;
            return Ok(true);
        }
        if self.transaction.take().is_some() {
            self.ledger.advance();
            return Ok(true);
        }
        Ok(false)
    }

    fn reject_while_composing(&self) -> Result<(), TextFieldError> {
        if self.composition.is_some() {
            return Err(TextFieldError::BadState(
                "composition open; commit through the composition".into(),
            ));
        }
        Ok(())
    }

    fn transaction_mut(&mut self, id: TransactionId) -> Result<&mut Transaction, TextFieldError> {
        match self.transaction.as_mut() {
            Some(transaction) if transaction.id() == id => Ok(transaction),
            _ => Err(TextFieldError::BadTransaction),
        }
    }

    fn take_transaction(&mut self, id: TransactionId) -> Result<Transaction, TextFieldError> {
        self.transaction_mut(id)?;
        self.transaction.take().ok_or(TextFieldError::BadTransaction)
    }
}
