//! Compact state snapshots and IME composition data.

use serde::{Deserialize, Serialize};

use crate::{Range, RevisionId, Selection, TextFieldError};

/// One user-composable unit of an IME composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionSegment {
    /// Code points covered by the segment in the field's content.
    pub range: Range,
    /// What the user typed to produce it (e.g. Pinyin).
    pub raw_input_text: String,
}

/// Replacement composition decoration, sent with each in-composition commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CompositionUpdate {
    /// Segments in display order.
    pub segments: Vec<CompositionSegment>,
    /// Index of the segment currently being converted, if any.
    pub highlighted_segment: Option<usize>,
}

impl CompositionUpdate {
    /// Check the highlight index and segment ranges.
    ///
    /// `len` is the content length the segments will be laid over.
    pub fn validate(&self, len: usize) -> Result<(), TextFieldError> {
        if let Some(index) = self.highlighted_segment {
            if index >= self.segments.len() {
                return Err(TextFieldError::InvalidHighlight {
                    index,
                    segments: self.segments.len(),
                });
            }
        }
        for segment in &self.segments {
            segment.range.validate_within(len)?;
        }
        Ok(())
    }
}

/// Running composition decoration reported in [`TextFieldState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CompositionState {
    /// Segments from the latest accepted update.
    pub segments: Vec<CompositionSegment>,
    /// Highlighted segment from the latest accepted update.
    pub highlighted_segment: Option<usize>,
}

impl From<CompositionUpdate> for CompositionState {
    fn from(update: CompositionUpdate) -> Self {
        Self {
            segments: update.segments,
            highlighted_segment: update.highlighted_segment,
        }
    }
}

/// Compact snapshot of a text field. Never carries the text itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFieldState {
    /// Revision this snapshot describes.
    pub revision_id: RevisionId,
    /// `[0, len)` over the field's content.
    pub contents_range: Range,
    /// Current selection.
    pub selection: Selection,
    /// Present only while a composition is open.
    pub composition: Option<CompositionState>,
}

/// Kind of input a field expects; a hint for the edit server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InputType {
    /// Free-form text.
    #[default]
    Text,
    /// Digits and numeric punctuation.
    Number,
    /// Phone numbers.
    Phone,
    /// Concealed input.
    Password,
}

/// Per-field options the client can change at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TextFieldOptions {
    /// Expected input kind.
    pub input_type: InputType,
    /// Whether newlines are accepted.
    pub multiline: bool,
    /// Read-only fields reject text replacement.
    pub read_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: usize, end: usize, raw: &str) -> CompositionSegment {
        CompositionSegment {
            range: Range::new(start, end).unwrap(),
            raw_input_text: raw.to_string(),
        }
    }

    #[test]
    fn highlight_must_index_a_segment() {
        let update = CompositionUpdate {
            segments: vec![segment(0, 2, "ni"), segment(2, 4, "hao")],
            highlighted_segment: Some(2),
        };
        assert!(matches!(
            update.validate(4),
            Err(TextFieldError::InvalidHighlight {
                index: 2,
                segments: 2
            })
        ));
    }

    #[test]
    fn highlight_on_empty_segments_rejected() {
        let update = CompositionUpdate {
            segments: vec![],
            highlighted_segment: Some(0),
        };
        assert!(update.validate(10).is_err());
    }

    #[test]
    fn segments_must_fit_content() {
        let update = CompositionUpdate {
            segments: vec![segment(0, 6, "nihao")],
            highlighted_segment: None,
        };
        assert!(update.validate(6).is_ok());
        assert!(update.validate(5).is_err());
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(CompositionUpdate::default().validate(0).is_ok());
    }

    #[test]
    fn default_options_are_editable_text() {
        let options = TextFieldOptions::default();
        assert_eq!(options.input_type, InputType::Text);
        assert!(!options.read_only);
    }
}
