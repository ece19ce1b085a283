//! Grapheme cluster display width.
//!
//! Single authoritative entry point `egc_width`; every column decision in the
//! workspace (wrapping, diff offsets, cursor math) flows through it so the
//! engine's cursor belief and the terminal never disagree about a cluster.
//!
//! Invariants:
//! - Result is in `0..=2`.
//! - Zero is only returned for clusters the terminal does not advance over.
//! - Multi-codepoint emoji sequences (ZWJ, flags, keycaps) are one cluster of width 2.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width of a single grapheme cluster.
///
/// Precondition: `egc` is one grapheme cluster; callers segment first.
#[inline]
pub fn egc_width(egc: &str) -> u16 {
    if egc.is_empty() {
        return 0;
    }
    UnicodeWidthStr::width(egc).min(2) as u16
}

/// Display width of unstyled text (sum of its clusters).
pub fn str_width(s: &str) -> u16 {
    s.graphemes(true)
        .map(egc_width)
        .fold(0u16, |acc, w| acc.saturating_add(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii() {
        assert_eq!(egc_width("a"), 1);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(egc_width(""), 0);
        assert_eq!(str_width(""), 0);
    }

    #[test]
    fn wide_cjk() {
        assert_eq!(egc_width("界"), 2);
    }

    #[test]
    fn emoji_basic() {
        assert_eq!(egc_width("😀"), 2);
    }

    #[test]
    fn combining_acute() {
        assert_eq!(egc_width("e\u{0301}"), 1);
    }

    #[test]
    fn spinner_and_status_glyphs_are_narrow() {
        assert_eq!(egc_width("⠋"), 1);
        assert_eq!(egc_width("✔"), 1);
        assert_eq!(egc_width("✖"), 1);
    }

    #[test]
    fn str_width_mixes_narrow_and_wide() {
        assert_eq!(str_width("ab界"), 4);
    }
}
