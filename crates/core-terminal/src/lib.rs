//! Terminal backend abstraction and crossterm implementation.
//!
//! The render engine never touches stdout directly; it talks to a
//! `TerminalBackend` which provides three things: the current size (with a
//! default when the terminal cannot be measured), a byte sink for escape
//! sequences and text, and the input raw-mode toggle.
//!
//! `MemoryBackend` records every byte in a shared buffer and reports a
//! settable size so engine behavior can be asserted without a TTY.

use anyhow::Result;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, is_raw_mode_enabled, size};
use std::io::{Stdout, Write, stdout};
use tracing::debug;

pub mod memory;
pub use memory::MemoryBackend;

/// Terminal dimensions in columns / rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub width: u16,
    pub height: u16,
}

impl TerminalSize {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Size reported when the terminal cannot be measured (not a TTY, CI, pipes).
pub const DEFAULT_SIZE: TerminalSize = TerminalSize::new(80, 24);

pub trait TerminalBackend: Send {
    /// Current size. Must not fail; falls back to `DEFAULT_SIZE`.
    fn size(&self) -> TerminalSize;
    /// Sink for escape sequences and text.
    fn out(&mut self) -> &mut dyn Write;
    /// Whether input raw mode is currently enabled.
    fn raw_mode(&self) -> bool;
    fn set_raw_mode(&mut self, enabled: bool) -> Result<()>;
}

pub struct CrosstermBackend {
    out: Stdout,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { out: stdout() }
    }
}

impl TerminalBackend for CrosstermBackend {
    fn size(&self) -> TerminalSize {
        match size() {
            Ok((width, height)) if width > 0 => TerminalSize::new(width, height),
            Ok(_) => DEFAULT_SIZE,
            Err(e) => {
                debug!(target: "terminal", ?e, "size_unavailable");
                DEFAULT_SIZE
            }
        }
    }

    fn out(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    fn raw_mode(&self) -> bool {
        is_raw_mode_enabled().unwrap_or(false)
    }

    fn set_raw_mode(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            enable_raw_mode()?;
        } else {
            disable_raw_mode()?;
        }
        debug!(target: "terminal", enabled, "raw_mode");
        Ok(())
    }
}
