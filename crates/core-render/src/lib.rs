//! Rendering core: styled line diffing, frame assembly and the inline render engine.
//!
//! The engine owns a region of the terminal starting at the row where the
//! session began and repaints only what changed between two renders. It never
//! uses absolute cursor addressing; every move is relative to a tracked belief
//! of where the cursor is.
//!
//! Pipeline per render cycle:
//! 1. Snapshot the next-frame logical lines (`line`), including shared lines.
//! 2. Build the old frame from the previous physical rows and the new frame
//!    from the snapshot, both at the current width (`frame`).
//! 3. Diff each physical row (`diff`), or rewrite it whole when force-flagged.
//! 4. Apply Changes in row order through the cursor writer (`writer`), erase
//!    stale rows, then park the cursor at the logical end of the new frame.
//! 5. Store the new rows (indent baked in) as the previous frame.
//!
//! Exposed Components:
//! - `Change`: one contiguous write at (row, display column).
//! - `diff`: pure styled-string diff producing ordered Changes.
//! - `frame`: `Frame` / `PhysicalLine` and the stateless builder.
//! - `line`: `LogicalLine`, `SharedLine`, `Content` normalization.
//! - `spinner`: placeholder token, glyphs, phase and the tick timer.
//! - `render_engine`: session state machine (INACTIVE / ACTIVE).
//! - `writer`: relative cursor moves and writes with belief tracking.
//! - `metrics` / `timing`: execution counters and last render duration.

pub mod diff;
pub mod frame;
pub mod line;
pub mod metrics;
pub mod render_engine;
pub mod spinner;
pub mod timing;
pub mod writer;

pub use diff::diff;
pub use frame::{Frame, PhysicalLine};
pub use line::{Content, LineSource, LogicalLine, SharedLine};
pub use metrics::RenderMetricsSnapshot;
pub use render_engine::{RenderEngine, SessionState, StartOptions};
pub use spinner::{CROSS, PLACEHOLDER, STYLED_CROSS, STYLED_TICK, StyleFn, TICK};
pub use writer::{Cursor, CursorPosition};

/// A single contiguous terminal write starting at display column `index` of row `line`.
///
/// `clear_eol` erases from the end of the written text to the end of the row.
/// An erase-only Change has empty `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub line: usize,
    pub index: u16,
    pub text: String,
    pub clear_eol: bool,
}

impl Change {
    pub fn new(line: usize, index: u16, text: impl Into<String>) -> Self {
        Self {
            line,
            index,
            text: text.into(),
            clear_eol: false,
        }
    }

    /// Erase from `index` to the end of the row.
    pub fn erase(line: usize, index: u16) -> Self {
        Self {
            line,
            index,
            text: String::new(),
            clear_eol: true,
        }
    }

    /// Rewrite a whole row and erase whatever followed it.
    pub fn rewrite(line: usize, text: impl Into<String>) -> Self {
        Self {
            line,
            index: 0,
            text: text.into(),
            clear_eol: true,
        }
    }

    pub fn is_erase_only(&self) -> bool {
        self.clear_eol && self.text.is_empty()
    }
}
