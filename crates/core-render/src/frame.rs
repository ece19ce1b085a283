//! Frame assembly: logical lines -> wrapped, indented physical rows.
//!
//! Stateless and deterministic: the same lines, width and glyph always yield
//! the same frame. Steps per logical line:
//! 1. replace the spinner placeholder with the glyph (wrapping must see final content);
//! 2. split embedded line breaks;
//! 3. hard wrap each piece at `width - indent` columns so indented rows never
//!    exceed the terminal width (indent is clamped to leave room for one
//!    double-width cluster);
//! 4. indent every produced row; each row inherits the line's `force` flag.

use crate::line::LogicalLine;
use crate::spinner::PLACEHOLDER;
use core_text::{indent, split_lines, str_width, strip, wrap};

/// One on-screen row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhysicalLine {
    pub text: String,
    pub force: bool,
}

/// Ordered physical rows, top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub rows: Vec<PhysicalLine>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_text(&self, idx: usize) -> &str {
        self.rows.get(idx).map_or("", |r| r.text.as_str())
    }

    /// (row, column) just past the last visible cluster; (0, 0) when empty.
    pub fn end(&self) -> (usize, u16) {
        match self.rows.last() {
            Some(last) => (self.rows.len() - 1, str_width(&strip(&last.text))),
            None => (0, 0),
        }
    }
}

/// Build a frame from logical lines at `width` columns.
pub fn build(lines: &[LogicalLine], width: u16, spinner_glyph: &str) -> Frame {
    let width = width.max(1);
    let mut rows = Vec::with_capacity(lines.len());
    for line in lines {
        let text = if line.text.contains(PLACEHOLDER) {
            line.text.replace(PLACEHOLDER, spinner_glyph)
        } else {
            line.text.clone()
        };
        let ind = line.indent.min(width.saturating_sub(2));
        let budget = width - ind;
        for piece in split_lines(&text) {
            for row in wrap(piece, budget) {
                rows.push(PhysicalLine {
                    text: indent(&row, ind),
                    force: line.force,
                });
            }
        }
    }
    Frame { rows }
}
