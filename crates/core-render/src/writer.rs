//! Relative cursor writer.
//!
//! The engine never addresses the terminal absolutely. It keeps a belief of
//! the cursor position relative to the session origin and moves with four
//! primitives only:
//! * up N rows (`CSI n A`), always followed by carriage return;
//! * down N rows by emitting CR LF N times (scrolls when at the bottom);
//! * left / right N columns (`CSI n D` / `CSI n C`);
//! * carriage return for column 0.
//!
//! Every move and every write goes through `Cursor`, which updates the belief
//! in the same call that queues the bytes.
//!
//! Deferred wrap: after a write fills the last column the terminal cursor
//! stays on that column with a pending wrap while the belief says `width`.
//! Any horizontal move from that state starts with CR, and line erasure is
//! skipped there (it would erase the last written cell).

use anyhow::Result;
use core_text::{RESET, has_style, str_width, strip};
use crossterm::{
    QueueableCommand,
    cursor::{MoveLeft, MoveRight, MoveUp},
    style::Print,
    terminal::{Clear, ClearType},
};
use std::io::Write;

/// Belief of the cursor location relative to the session start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorPosition {
    pub line: usize,
    pub index: u16,
}

impl CursorPosition {
    pub const fn new(line: usize, index: u16) -> Self {
        Self { line, index }
    }
}

#[derive(Debug, Default)]
pub struct Cursor {
    pos: CursorPosition,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> CursorPosition {
        self.pos
    }

    pub fn reset(&mut self) {
        self.pos = CursorPosition::default();
    }

    /// Replace the belief without emitting anything (terminal reflowed our rows).
    pub fn assume(&mut self, pos: CursorPosition) {
        self.pos = pos;
    }

    /// Move to `target` using relative motion only. `width` is the terminal width.
    pub fn move_to(&mut self, out: &mut dyn Write, target: CursorPosition, width: u16) -> Result<()> {
        if target.line < self.pos.line {
            let rows = self.pos.line - target.line;
            out.queue(MoveUp(rows.min(u16::MAX as usize) as u16))?
                .queue(Print('\r'))?;
            self.pos = CursorPosition::new(target.line, 0);
        } else if target.line > self.pos.line {
            for _ in self.pos.line..target.line {
                out.queue(Print("\r\n"))?;
            }
            self.pos = CursorPosition::new(target.line, 0);
        }

        if target.index == self.pos.index {
            return Ok(());
        }
        if target.index == 0 || self.pos.index >= width {
            out.queue(Print('\r'))?;
            self.pos.index = 0;
        }
        if target.index > self.pos.index {
            out.queue(MoveRight(target.index - self.pos.index))?;
        } else if target.index < self.pos.index {
            out.queue(MoveLeft(self.pos.index - target.index))?;
        }
        self.pos.index = target.index;
        Ok(())
    }

    /// Write styled `text` at the current position, then optionally erase to end of row.
    ///
    /// A reset follows any text carrying style sequences so styling never leaks
    /// into later writes.
    pub fn write(&mut self, out: &mut dyn Write, text: &str, clear_eol: bool, width: u16) -> Result<()> {
        if !text.is_empty() {
            out.queue(Print(text))?;
            if has_style(text) {
                out.queue(Print(RESET))?;
            }
            self.pos.index = self.pos.index.saturating_add(str_width(&strip(text)));
        }
        if clear_eol && self.pos.index < width {
            out.queue(Clear(ClearType::UntilNewLine))?;
        }
        Ok(())
    }

    /// Erase from the cursor to the end of the screen.
    pub fn erase_below(&mut self, out: &mut dyn Write) -> Result<()> {
        out.queue(Clear(ClearType::FromCursorDown))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit<F: FnOnce(&mut Cursor, &mut Vec<u8>)>(cursor: &mut Cursor, f: F) -> String {
        let mut buf = Vec::new();
        f(cursor, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn moving_down_emits_newlines_and_resets_column() {
        let mut c = Cursor::new();
        c.assume(CursorPosition::new(0, 5));
        let out = emit(&mut c, |c, b| c.move_to(b, CursorPosition::new(2, 0), 80).unwrap());
        assert_eq!(out, "\r\n\r\n");
        assert_eq!(c.position(), CursorPosition::new(2, 0));
    }

    #[test]
    fn moving_up_rewinds_and_returns_carriage() {
        let mut c = Cursor::new();
        c.assume(CursorPosition::new(3, 4));
        let out = emit(&mut c, |c, b| c.move_to(b, CursorPosition::new(1, 2), 80).unwrap());
        assert_eq!(out, "\x1b[2A\r\x1b[2C");
        assert_eq!(c.position(), CursorPosition::new(1, 2));
    }

    #[test]
    fn horizontal_moves_are_relative() {
        let mut c = Cursor::new();
        c.assume(CursorPosition::new(0, 6));
        let left = emit(&mut c, |c, b| c.move_to(b, CursorPosition::new(0, 2), 80).unwrap());
        assert_eq!(left, "\x1b[4D");
        let home = emit(&mut c, |c, b| c.move_to(b, CursorPosition::new(0, 0), 80).unwrap());
        assert_eq!(home, "\r");
    }

    #[test]
    fn no_motion_when_already_there() {
        let mut c = Cursor::new();
        let out = emit(&mut c, |c, b| c.move_to(b, CursorPosition::new(0, 0), 80).unwrap());
        assert_eq!(out, "");
    }

    #[test]
    fn pending_wrap_column_starts_with_carriage_return() {
        let mut c = Cursor::new();
        c.assume(CursorPosition::new(0, 10));
        let out = emit(&mut c, |c, b| c.move_to(b, CursorPosition::new(0, 4), 10).unwrap());
        assert_eq!(out, "\r\x1b[4C");
    }

    #[test]
    fn write_advances_by_visible_width_and_resets_style() {
        let mut c = Cursor::new();
        let out = emit(&mut c, |c, b| c.write(b, "\x1b[31mab界", false, 80).unwrap());
        assert_eq!(out, format!("\x1b[31mab界{RESET}"));
        assert_eq!(c.position().index, 4);
    }

    #[test]
    fn clear_skipped_at_full_row() {
        let mut c = Cursor::new();
        let out = emit(&mut c, |c, b| c.write(b, "abc", true, 3).unwrap());
        assert_eq!(out, "abc");
        let mut c = Cursor::new();
        let out = emit(&mut c, |c, b| c.write(b, "ab", true, 3).unwrap());
        assert_eq!(out, "ab\x1b[K");
    }
}
