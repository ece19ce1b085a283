//! Styled text primitives shared by the frame builder and the diff engine.
//!
//! Everything here operates on *styled strings*: UTF-8 text that may embed
//! terminal style escape sequences (CSI, e.g. `\x1b[31m`). Style sequences
//! occupy zero columns; visible content is measured per grapheme cluster.
//!
//! Modules:
//! - `ansi`: tokenizer + `StyledText` (stripped clusters with a position -> style map).
//! - `width`: authoritative display width for a single grapheme cluster.
//! - `wrap`: hard wrap at a column budget, indentation and line splitting.
//!
//! Invariants:
//! - No function here trims whitespace. Trailing spaces are content and style
//!   adjacency depends on them.
//! - A grapheme cluster is never split across rows or Changes.

pub mod ansi;
pub mod width;
pub mod wrap;

pub use ansi::{RESET, StyledText, Token, has_style, is_reset, strip, tokens};
pub use width::{egc_width, str_width};
pub use wrap::{indent, split_lines, wrap};
