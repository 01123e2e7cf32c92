//! IME composition envelope.
//!
//! A composition spans any number of transactions committed through the
//! composition-aware path. Each of those commits pushes its inverses onto
//! the composition's undo log, so cancelling the composition can restore
//! the content exactly as it was at `begin_composition`.

use textsync_edit_types::{CompositionState, CompositionUpdate, Selection};

use crate::undo::UndoLog;

/// An open composition.
#[derive(Debug, Clone)]
pub struct Composition {
    /// Selection at `begin_composition`, restored on cancel.
    selection_at_start: Selection,
    undo: UndoLog,
    decoration: CompositionState,
}

impl Composition {
    /// Open a composition, checkpointing the current selection.
    pub fn begin(selection: Selection) -> Self {
        Self {
            selection_at_start: selection,
            undo: UndoLog::new(),
            decoration: CompositionState::default(),
        }
    }

    /// Fold a committed transaction into the composition.
    pub fn record_commit(&mut self, undo: UndoLog, update: CompositionUpdate) {
        self.undo.extend(undo);
        self.decoration = update.into();
    }

    /// Current segment decoration.
    pub fn decoration(&self) -> &CompositionState {
        &self.decoration
    }

    /// Tear down for cancellation: the undo log and the selection to restore.
    pub fn into_rollback(self) -> (UndoLog, Selection) {
        (self.undo, self.selection_at_start)
    }
}
