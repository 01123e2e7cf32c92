//! Content provider contract.
//!
//! The synchronizer never holds the field's text. It reads and writes
//! through a [`TextContent`] supplied by the client at registration, and
//! readers fetch content in bounded chunks via [`read_chunked`].

use ropey::Rope;
use std::sync::{Arc, Mutex, MutexGuard};
use textsync_edit_types::{Range, TextFieldError};

/// Code-point addressed access to a text field's content.
pub trait TextContent: Send {
    /// Length of the content in code points.
    fn len_chars(&self) -> Result<usize, TextFieldError>;

    /// Read the code points in `range`.
    fn get_text(&self, range: Range) -> Result<String, TextFieldError>;

    /// Replace `range` with `text`, returning the removed text.
    fn replace(&mut self, range: Range, text: &str) -> Result<String, TextFieldError>;
}

/// In-memory content backed by a rope.
///
/// Clones share the same buffer, so a client can keep one clone and apply
/// out-of-band edits while the synchronizer holds another.
#[derive(Debug, Clone, Default)]
pub struct SharedText {
    inner: Arc<Mutex<Rope>>,
}

impl SharedText {
    /// Create content holding `text`.
    pub fn new(text: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Rope::from_str(text))),
        }
    }

    /// Snapshot the whole content.
    pub fn contents(&self) -> Result<String, TextFieldError> {
        Ok(self.lock()?.to_string())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Rope>, TextFieldError> {
        self.inner
            .lock()
            .map_err(|_| TextFieldError::Internal("content lock poisoned".into()))
    }
}

impl TextContent for SharedText {
    fn len_chars(&self) -> Result<usize, TextFieldError> {
        Ok(self.lock()?.len_chars())
    }

    fn get_text(&self, range: Range) -> Result<String, TextFieldError> {
        let rope = self.lock()?;
        range.validate_within(rope.len_chars())?;
        Ok(rope.slice(range.start..range.end).to_string())
    }

    fn replace(&mut self, range: Range, text: &str) -> Result<String, TextFieldError> {
        let mut rope = self.lock()?;
        range.validate_within(rope.len_chars())?;
        let removed = rope.slice(range.start..range.end).to_string();
        rope.remove(range.start..range.end);
        rope.insert(range.start, text);
        Ok(removed)
    }
}

/// Read all of `content` in chunks of at most `max_chunk` code points.
pub fn read_chunked(content: &dyn TextContent, max_chunk: usize) -> Result<String, TextFieldError> {
    if max_chunk == 0 {
        return Err(TextFieldError::Internal("chunk size must be > 0".into()));
    }
    let len = content.len_chars()?;
    let mut out = String::new();
    let mut start = 0;
    while start < len {
        let end = (start + max_chunk).min(len);
        out.push_str(&content.get_text(Range { start, end })?);
        start = end;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_counts_code_points() {
        let text = SharedText::new("日本語abc");
        assert_eq!(text.len_chars().unwrap(), 6);
    }

    #[test]
    fn get_text_by_code_point() {
        let text = SharedText::new("日本語abc");
        assert_eq!(text.get_text(Range::new(1, 4).unwrap()).unwrap(), "本語a");
    }

    #[test]
    fn get_text_out_of_bounds() {
        let text = SharedText::new("abc");
        assert!(matches!(
            text.get_text(Range::new(0, 4).unwrap()),
            Err(TextFieldError::OutOfBounds { position: 4, len: 3 })
        ));
    }

    #[test]
    fn replace_returns_removed() {
        let mut text = SharedText::new("hello world");
        let removed = text.replace(Range::new(0, 5).unwrap(), "HOWDY").unwrap();
        assert_eq!(removed, "hello");
        assert_eq!(text.contents().unwrap(), "HOWDY world");
    }

    #[test]
    fn replace_caret_inserts() {
        let mut text = SharedText::new("ac");
        text.replace(Range::caret(1), "b").unwrap();
        assert_eq!(text.contents().unwrap(), "abc");
    }

    #[test]
    fn clones_share_buffer() {
        let text = SharedText::new("one");
        let mut other = text.clone();
        other.replace(Range::new(0, 3).unwrap(), "two").unwrap();
        assert_eq!(text.contents().unwrap(), "two");
    }

    #[test]
    fn chunked_read_reassembles() {
        let text = SharedText::new("the quick brown fox");
        assert_eq!(read_chunked(&text, 4).unwrap(), "the quick brown fox");
        assert_eq!(read_chunked(&text, 100).unwrap(), "the quick brown fox");
    }

    #[test]
    fn chunked_read_of_empty_content() {
        let text = SharedText::new("");
        assert_eq!(read_chunked(&text, 4).unwrap(), "");
    }

    #[test]
    fn chunked_read_rejects_zero_chunk() {
        let text = SharedText::new("x");
        assert!(read_chunked(&text, 0).is_err());
    }
}
