//! Code-point ranges and selections.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TextFieldError;

/// Half-open interval `[start, end)` over code-point indices.
///
/// `start == end` denotes a caret position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Range {
    /// First code point in the range.
    pub start: usize,
    /// One past the last code point in the range.
    pub end: usize,
}

impl Range {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: usize, end: usize) -> Result<Self, TextFieldError> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    /// A zero-width range at `pos`.
    pub fn caret(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Check the `start <= end` invariant.
    ///
    /// Ranges arriving over the wire bypass [`Range::new`], so every
    /// consumer validates before use.
    pub fn validate(&self) -> Result<(), TextFieldError> {
        if self.start > self.end {
            return Err(TextFieldError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Check that the range is well-formed and fits inside `len` code points.
    pub fn validate_within(&self, len: usize) -> Result<(), TextFieldError> {
        self.validate()?;
        if self.end > len {
            return Err(TextFieldError::OutOfBounds {
                position: self.end,
                len,
            });
        }
        Ok(())
    }

    /// Number of code points covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether this range is a caret.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Which side of a line-wrap boundary a caret renders on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Affinity {
    /// Attach to the preceding code point.
    Upstream,
    /// Attach to the following code point.
    #[default]
    Downstream,
}

/// A selection over the field's content.
///
/// `base` and `extent` may appear in either order; `extent` is the moving end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Selection {
    /// Anchored end of the selection.
    pub base: usize,
    /// Moving end of the selection.
    pub extent: usize,
    /// Caret rendering hint, meaningful only when `base == extent`.
    pub affinity: Affinity,
}

impl Selection {
    /// Create a selection with downstream affinity.
    pub fn new(base: usize, extent: usize) -> Self {
        Self {
            base,
            extent,
            affinity: Affinity::Downstream,
        }
    }

    /// A caret at `pos`.
    pub fn caret(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    /// Check that both ends fit inside `len` code points.
    pub fn validate_within(&self, len: usize) -> Result<(), TextFieldError> {
        let far = self.base.max(self.extent);
        if far > len {
            return Err(TextFieldError::OutOfBounds { position: far, len });
        }
        Ok(())
    }
}
