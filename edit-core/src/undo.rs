//! Replacement edits and their inverses.
//!
//! Applying a [`Replacement`] yields its inverse; an [`UndoLog`] is a stack
//! of inverses that, replayed newest-first, restores the content to where
//! it was when the log was started. Transactions keep a small log for
//! their own partial-failure rollback; compositions keep one spanning
//! every transaction committed inside them.

use textsync_edit_types::{Range, TextFieldError};

use crate::content::TextContent;

/// Replace the code points in `range` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Code points to replace.
    pub range: Range,
    /// Text to put in their place.
    pub text: String,
}

impl Replacement {
    /// Create a replacement.
    pub fn new(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// Apply to `content` and return the inverse.
    pub fn apply(&self, content: &mut dyn TextContent) -> Result<Replacement, TextFieldError> {
        let removed = content.replace(self.range, &self.text)?;
        let inserted = self.text.chars().count();
        Ok(Replacement {
            range: Range {
                start: self.range.start,
                end: self.range.start + inserted,
            },
            text: removed,
        })
    }
}

/// Stack of inverse replacements.
#[derive(Debug, Clone, Default)]
pub struct UndoLog {
    entries: Vec<Replacement>,
}

impl UndoLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `edits` in order, recording inverses.
    ///
    /// All or nothing: if any edit fails, the ones already applied are
    /// reverted before the error is returned.
    pub fn apply_all(
        edits: &[Replacement],
        content: &mut dyn TextContent,
    ) -> Result<Self, TextFieldError> {
        let mut log = Self::new();
        for edit in edits {
            match edit.apply(content) {
                Ok(inverse) => log.entries.push(inverse),
                Err(e) => {
                    log.revert(content)?;
                    return Err(TextFieldError::Internal(format!("edit failed: {e}")));
                }
            }
        }
        Ok(log)
    }

    /// Append another log's entries; they will be undone before ours.
    pub fn extend(&mut self, later: UndoLog) {
        self.entries.extend(later.entries);
    }

    /// Replay inverses newest-first.
    pub fn revert(self, content: &mut dyn TextContent) -> Result<(), TextFieldError> {
        for inverse in self.entries.into_iter().rev() {
            inverse
                .apply(content)
                .map_err(|e| TextFieldError::Internal(format!("undo failed: {e}")))?;
        }
        Ok(())
    }

    /// Number of recorded inverses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
