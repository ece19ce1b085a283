//! In-memory terminal used by tests and headless runs.
//!
//! Cloning a `MemoryBackend` shares its byte buffer, size and raw-mode flag,
//! so a test can keep one handle while the engine owns another.

use crate::{TerminalBackend, TerminalSize};
use anyhow::Result;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct SharedBytes(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBytes {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::other("memory terminal poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct MemoryBackend {
    bytes: SharedBytes,
    width: Arc<AtomicU16>,
    height: Arc<AtomicU16>,
    raw: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            bytes: SharedBytes::default(),
            width: Arc::new(AtomicU16::new(width)),
            height: Arc::new(AtomicU16::new(height)),
            raw: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_width(&self, width: u16) {
        self.width.store(width, Ordering::SeqCst);
    }

    /// Everything written so far, lossily decoded.
    pub fn output(&self) -> String {
        match self.bytes.0.lock() {
            Ok(guard) => String::from_utf8_lossy(&guard).into_owned(),
            Err(_) => String::new(),
        }
    }

    /// Return and clear everything written so far.
    pub fn take_output(&self) -> String {
        match self.bytes.0.lock() {
            Ok(mut guard) => String::from_utf8_lossy(&std::mem::take(&mut *guard)).into_owned(),
            Err(_) => String::new(),
        }
    }
}

impl TerminalBackend for MemoryBackend {
    fn size(&self) -> TerminalSize {
        TerminalSize::new(
            self.width.load(Ordering::SeqCst),
            self.height.load(Ordering::SeqCst),
        )
    }

    fn out(&mut self) -> &mut dyn Write {
        &mut self.bytes
    }

    fn raw_mode(&self) -> bool {
        self.raw.load(Ordering::SeqCst)
    }

    fn set_raw_mode(&mut self, enabled: bool) -> Result<()> {
        self.raw.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}
