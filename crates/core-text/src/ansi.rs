//! Style sequence tokenizer and stripped-text view.
//!
//! A style sequence is any CSI escape (`ESC [ params intermediates final`).
//! Sequences are zero-width; the text between them is split into grapheme
//! clusters. `StyledText` keeps the visible clusters with their starting
//! display column plus a sparse map from cluster position to the sequence(s)
//! immediately preceding that cluster. Position `len()` holds trailing
//! sequences after the last visible cluster.
//!
//! An unterminated CSI at the end of input is kept as a style token so a
//! truncated sequence is never printed as text.

use crate::width::egc_width;
use unicode_segmentation::UnicodeSegmentation;

/// Neutral "reset all attributes" sequence.
pub const RESET: &str = "\x1b[0m";

const ESC: u8 = 0x1b;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// One complete style escape sequence.
    Style(&'a str),
    /// One visible grapheme cluster.
    Text(&'a str),
}

/// Byte length of the CSI sequence starting at `start` (which must point at ESC '[').
fn csi_len(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 2;
    while i < bytes.len() {
        if (0x40..=0x7e).contains(&bytes[i]) {
            return i + 1 - start;
        }
        i += 1;
    }
    bytes.len() - start
}

/// Split a styled string into style and grapheme tokens, in source order.
pub fn tokens(s: &str) -> Vec<Token<'_>> {
    let bytes = s.as_bytes();
    let mut out = Vec::new();
    let mut text_start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == ESC && bytes.get(i + 1) == Some(&b'[') {
            if text_start < i {
                out.extend(s[text_start..i].graphemes(true).map(Token::Text));
            }
            let len = csi_len(bytes, i);
            out.push(Token::Style(&s[i..i + len]));
            i += len;
            text_start = i;
        } else {
            i += 1;
        }
    }
    if text_start < bytes.len() {
        out.extend(s[text_start..].graphemes(true).map(Token::Text));
    }
    out
}

/// True when `s` embeds at least one style sequence.
pub fn has_style(s: &str) -> bool {
    s.as_bytes()
        .windows(2)
        .any(|w| w[0] == ESC && w[1] == b'[')
}

/// True for a sequence that clears every attribute (`ESC[m` or `ESC[0m`).
pub fn is_reset(seq: &str) -> bool {
    seq == RESET || seq == "\x1b[m"
}

/// Remove every style sequence, keeping visible text only.
pub fn strip(s: &str) -> String {
    if !has_style(s) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    for tok in tokens(s) {
        if let Token::Text(g) = tok {
            out.push_str(g);
        }
    }
    out
}

/// One visible grapheme cluster of a styled string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cluster<'a> {
    pub text: &'a str,
    /// Display column where the cluster starts.
    pub col: u16,
    pub width: u16,
}

/// Stripped view of a styled string with its position -> style map.
#[derive(Debug, Clone, Default)]
pub struct StyledText<'a> {
    clusters: Vec<Cluster<'a>>,
    /// Sorted by position, one entry per position (consecutive sequences are concatenated).
    styles: Vec<(usize, String)>,
    /// Parallel to `styles`: every sequence since the last reset, inclusive.
    active: Vec<String>,
    width: u16,
}

impl<'a> StyledText<'a> {
    pub fn parse(s: &'a str) -> Self {
        let mut clusters = Vec::new();
        let mut styles: Vec<(usize, String)> = Vec::new();
        let mut active: Vec<String> = Vec::new();
        let mut open = String::new();
        let mut col = 0u16;
        for tok in tokens(s) {
            match tok {
                Token::Style(seq) => {
                    let pos = clusters.len();
                    if is_reset(seq) {
                        open.clear();
                    }
                    open.push_str(seq);
                    match styles.last_mut() {
                        Some((last, group)) if *last == pos => {
                            group.push_str(seq);
                            if let Some(cur) = active.last_mut() {
                                cur.clone_from(&open);
                            }
                        }
                        _ => {
                            styles.push((pos, seq.to_string()));
                            active.push(open.clone());
                        }
                    }
                }
                Token::Text(g) => {
                    let width = egc_width(g);
                    clusters.push(Cluster {
                        text: g,
                        col,
                        width,
                    });
                    col = col.saturating_add(width);
                }
            }
        }
        Self {
            clusters,
            styles,
            active,
            width: col,
        }
    }

    pub fn clusters(&self) -> &[Cluster<'a>] {
        &self.clusters
    }

    /// Number of visible clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Total display width of the visible content.
    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn styles(&self) -> &[(usize, String)] {
        &self.styles
    }

    pub fn has_styles(&self) -> bool {
        !self.styles.is_empty()
    }

    /// Sequence(s) immediately preceding the cluster at `pos`.
    pub fn style_at(&self, pos: usize) -> Option<&str> {
        self.styles
            .binary_search_by_key(&pos, |(p, _)| *p)
            .ok()
            .map(|i| self.styles[i].1.as_str())
    }

    /// Style in effect at `pos`: every sequence since the last reset at or
    /// before it, so stacked attributes (bold then colour) survive a re-open.
    pub fn active_at(&self, pos: usize) -> Option<&str> {
        let idx = self.styles.partition_point(|(p, _)| *p <= pos);
        idx.checked_sub(1).map(|i| self.active[i].as_str())
    }

    /// Display column where cluster `pos` starts (`width()` when past the end).
    pub fn col_of(&self, pos: usize) -> u16 {
        self.clusters.get(pos).map_or(self.width, |c| c.col)
    }

    /// Visible text with all style sequences removed.
    pub fn stripped(&self) -> String {
        self.clusters.iter().map(|c| c.text).collect()
    }
}
