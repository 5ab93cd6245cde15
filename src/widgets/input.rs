//! Single-line text input with grapheme-aware cursor movement.

use unicode_segmentation::UnicodeSegmentation;

use crate::key::{is_printable, parse_key};
use crate::style;

pub struct Input {
    value: String,
    /// Cursor position in grapheme clusters, 0..=len.
    cursor: usize,
    placeholder: String,
}

impl Input {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            placeholder: placeholder.into(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self.cursor = self.grapheme_count();
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    fn grapheme_count(&self) -> usize {
        self.value.graphemes(true).count()
    }

    /// Byte offset of the grapheme at `index`.
    fn byte_offset(&self, index: usize) -> usize {
        self.value
            .grapheme_indices(true)
            .nth(index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.value.len())
    }

    fn insert(&mut self, data: &str) -> bool {
        let offset = self.byte_offset(self.cursor);
        self.value.insert_str(offset, data);
        self.cursor += data.graphemes(true).count();
        true
    }

    /// Applies one input sequence. Returns true when the value or cursor
    /// changed.
    pub fn handle_input(&mut self, data: &str) -> bool {
        match parse_key(data) {
            Some("left") => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    return true;
                }
                false
            }
            Some("right") => {
                if self.cursor < self.grapheme_count() {
                    self.cursor += 1;
                    return true;
                }
                false
            }
            Some("home") => {
                self.cursor = 0;
                true
            }
            Some("end") => {
                self.cursor = self.grapheme_count();
                true
            }
            Some("backspace") => {
                if self.cursor > 0 {
                    let start = self.byte_offset(self.cursor - 1);
                    let end = self.byte_offset(self.cursor);
                    self.value.replace_range(start..end, "");
                    self.cursor -= 1;
                    return true;
                }
                false
            }
            Some("delete") => {
                if self.cursor < self.grapheme_count() {
                    let start = self.byte_offset(self.cursor);
                    let end = self.byte_offset(self.cursor + 1);
                    self.value.replace_range(start..end, "");
                    return true;
                }
                false
            }
            Some("ctrl+u") => {
                if self.value.is_empty() {
                    return false;
                }
                self.value.clear();
                self.cursor = 0;
                true
            }
            Some("space") => self.insert(" "),
            Some(_) => false,
            None => {
                if !is_printable(data) {
                    return false;
                }
                self.insert(data)
            }
        }
    }

    /// Renders the line with a reverse-video cursor cell. Shows the
    /// placeholder while empty.
    pub fn render(&self) -> String {
        if self.value.is_empty() {
            return format!("\x1b[7m \x1b[0m{}", style::blurred(&self.placeholder));
        }
        let mut out = String::new();
        for (index, grapheme) in self.value.graphemes(true).enumerate() {
            if index == self.cursor {
                out.push_str(&format!("\x1b[7m{grapheme}\x1b[0m"));
            } else {
                out.push_str(grapheme);
            }
        }
        if self.cursor >= self.grapheme_count() {
            out.push_str("\x1b[7m \x1b[0m");
        }
        out
    }
}
