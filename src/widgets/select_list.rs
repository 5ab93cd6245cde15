//! Vertical picker with a scrolling window, wrap-around selection, and
//! disabled rows that the cursor skips.

use crate::key::parse_key;
use crate::style;
use crate::text::truncate_to_width;

pub struct SelectRow {
    pub text: String,
    pub disabled: bool,
}

impl SelectRow {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            disabled: false,
        }
    }

    pub fn disabled(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            disabled: true,
        }
    }
}

pub struct SelectList {
    rows: Vec<SelectRow>,
    selected: usize,
    offset: usize,
    max_visible: usize,
}

impl SelectList {
    pub fn new(rows: Vec<SelectRow>, max_visible: usize) -> Self {
        let selected = rows.iter().position(|row| !row.disabled).unwrap_or(0);
        let mut list = Self {
            rows,
            selected,
            offset: 0,
            max_visible: max_visible.max(1),
        };
        list.scroll_into_view();
        list
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_row(&self) -> Option<&SelectRow> {
        let row = self.rows.get(self.selected)?;
        (!row.disabled).then_some(row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Applies one input sequence. Returns true when the selection moved.
    pub fn handle_input(&mut self, data: &str) -> bool {
        match parse_key(data) {
            Some("up") => self.step(-1),
            Some("down") => self.step(1),
            _ => false,
        }
    }

    fn step(&mut self, direction: isize) -> bool {
        if self.rows.iter().all(|row| row.disabled) || self.rows.is_empty() {
            return false;
        }
        let len = self.rows.len() as isize;
        let mut index = self.selected as isize;
        loop {
            index = (index + direction).rem_euclid(len);
            if index as usize == self.selected {
                return false;
            }
            if !self.rows[index as usize].disabled {
                self.selected = index as usize;
                self.scroll_into_view();
                return true;
            }
        }
    }

    fn scroll_into_view(&mut self) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + self.max_visible {
            self.offset = self.selected + 1 - self.max_visible;
        }
    }

    pub fn render(&self, width: usize) -> String {
        let mut lines = Vec::new();
        let end = (self.offset + self.max_visible).min(self.rows.len());
        for (index, row) in self.rows[self.offset..end].iter().enumerate() {
            let index = index + self.offset;
            let body = truncate_to_width(&row.text, width.saturating_sub(2));
            let line = if row.disabled {
                format!("  {}", style::blurred(&body))
            } else if index == self.selected {
                format!("{} {}", style::accent("→"), style::bold(&body))
            } else {
                format!("  {body}")
            };
            lines.push(line);
        }
        let below = self.rows.len().saturating_sub(end);
        if below > 0 {
            lines.push(style::blurred(&format!("  … {below} more")));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(spec: &[(&str, bool)]) -> Vec<SelectRow> {
        spec.iter()
            .map(|(text, disabled)| SelectRow {
                text: text.to_string(),
                disabled: *disabled,
            })
            .collect()
    }

    #[test]
    fn initial_selection_skips_leading_disabled_rows() {
        let list = SelectList::new(rows(&[("a", true), ("b", false)]), 5);
        assert_eq!(list.selected(), 1);
    }

    #[test]
    fn movement_wraps_around() {
        let mut list = SelectList::new(rows(&[("a", false), ("b", false)]), 5);
        assert!(list.handle_input("\x1b[A")); // up from the first row
        assert_eq!(list.selected(), 1);
        assert!(list.handle_input("\x1b[B"));
        assert_eq!(list.selected(), 0);
    }

    #[test]
    fn movement_skips_disabled_rows() {
        let mut list = SelectList::new(
            rows(&[("a", false), ("b", true), ("c", false)]),
            5,
        );
        assert!(list.handle_input("\x1b[B"));
        assert_eq!(list.selected(), 2);
    }

    #[test]
    fn all_disabled_never_selects() {
        let mut list = SelectList::new(rows(&[("a", true), ("b", true)]), 5);
        assert!(!list.handle_input("\x1b[B"));
        assert!(list.selected_row().is_none());
    }

    #[test]
    fn window_follows_the_selection() {
        let mut list = SelectList::new(
            rows(&[("a", false), ("b", false), ("c", false), ("d", false)]),
            2,
        );
        list.handle_input("\x1b[B");
        list.handle_input("\x1b[B");
        let rendered = list.render(40);
        assert!(rendered.contains('c'));
        assert!(!rendered.contains('a'));
    }

    #[test]
    fn overflow_indicator_counts_hidden_rows() {
        let list = SelectList::new(
            rows(&[("a", false), ("b", false), ("c", false)]),
            2,
        );
        assert!(list.render(40).contains("… 1 more"));
    }
}
