//! Hard wrapping, indentation and line splitting for styled text.
//!
//! `wrap` breaks at exactly `width` display columns with no word lookahead.
//! A cluster that would overflow the row starts the next row instead, so a
//! wide cluster is never split. Continuation rows re-open every style sequence
//! seen since the last reset so each row renders correctly on its own.
//! Trailing whitespace is never trimmed.

use crate::ansi::{Token, is_reset, tokens};
use crate::width::egc_width;

/// Hard wrap a styled string into rows of at most `width` display columns.
///
/// Always returns at least one row. A `width` of 0 is treated as 1.
pub fn wrap(text: &str, width: u16) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut col = 0u16;
    let mut active = String::new();

    for tok in tokens(text) {
        match tok {
            Token::Style(seq) => {
                row.push_str(seq);
                if is_reset(seq) {
                    active.clear();
                }
                active.push_str(seq);
            }
            Token::Text(g) => {
                let w = egc_width(g);
                if col > 0 && col.saturating_add(w) > width {
                    rows.push(std::mem::replace(&mut row, active.clone()));
                    col = 0;
                }
                row.push_str(g);
                col = col.saturating_add(w);
            }
        }
    }
    rows.push(row);
    rows
}

/// Prefix `text` with `n` spaces.
pub fn indent(text: &str, n: u16) -> String {
    if n == 0 {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + n as usize);
    out.extend(std::iter::repeat_n(' ', n as usize));
    out.push_str(text);
    out
}

/// Split on embedded line breaks (`\n` or `\r\n`). Always yields at least one piece.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|piece| piece.strip_suffix('\r').unwrap_or(piece))
}
