//! Property-based tests for the styled line diff.

use core_render::{Change, diff};
use core_text::{Token, egc_width, str_width, strip, tokens};
use proptest::prelude::*;

fn styled_string() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            6 => "[a-d ]",
            1 => Just("界".to_string()),
            1 => Just("e\u{301}".to_string()),
            1 => Just("\x1b[31m".to_string()),
            1 => Just("\x1b[1;32m".to_string()),
            1 => Just("\x1b[0m".to_string()),
        ],
        0..16,
    )
    .prop_map(|parts| parts.concat())
}

/// One terminal cell: the cluster starting there, or `None` for the right
/// half of a double-width cluster.
type Cell = Option<String>;

fn clusters(text: &str) -> Vec<&str> {
    tokens(text)
        .into_iter()
        .filter_map(|tok| match tok {
            Token::Text(g) => Some(g),
            Token::Style(_) => None,
        })
        .collect()
}

fn put(row: &mut Vec<Cell>, col: usize, cluster: &str) {
    let width = egc_width(cluster).max(1) as usize;
    while row.len() < col + width {
        row.push(Some(" ".to_string()));
    }
    // Overwriting half of a wide cluster blanks the other half.
    if row[col].is_none() && col > 0 {
        row[col - 1] = Some(" ".to_string());
    }
    let last = col + width - 1;
    if row.get(last + 1).is_some_and(|c| c.is_none()) && row[last].is_some() {
        row[last + 1] = Some(" ".to_string());
    }
    row[col] = Some(cluster.to_string());
    for cell in &mut row[col + 1..=last] {
        *cell = None;
    }
}

/// Replay Changes onto a display-cell model of the row.
fn apply(original: &str, changes: &[Change]) -> String {
    let mut row: Vec<Cell> = Vec::new();
    let mut col = 0usize;
    for g in clusters(&strip(original)) {
        put(&mut row, col, g);
        col += egc_width(g) as usize;
    }
    for change in changes {
        let mut col = change.index as usize;
        assert!(col <= row.len(), "write past end of row: {change:?}");
        for g in clusters(&strip(&change.text)) {
            put(&mut row, col, g);
            col += egc_width(g) as usize;
        }
        if change.clear_eol {
            if row.get(col).is_some_and(|c| c.is_none()) && col > 0 {
                row[col - 1] = Some(" ".to_string());
            }
            row.truncate(col);
        }
    }
    row.into_iter().flatten().collect()
}

proptest! {
    #[test]
    fn identical_inputs_need_no_writes(s in styled_string(), line in 0usize..64) {
        prop_assert!(diff(&s, &s, line).is_empty());
    }

    #[test]
    fn replaying_changes_reaches_target(a in styled_string(), b in styled_string()) {
        let changes = diff(&a, &b, 0);
        prop_assert_eq!(apply(&a, &changes), strip(&b));
    }

    #[test]
    fn shrinking_ends_with_erase(a in styled_string(), b in styled_string()) {
        prop_assume!(str_width(&strip(&b)) < str_width(&strip(&a)));
        let changes = diff(&a, &b, 3);
        let last = changes.last().cloned();
        prop_assert!(last.is_some_and(|c| c.clear_eol));
    }

    #[test]
    fn changes_are_ordered_and_disjoint(a in styled_string(), b in styled_string()) {
        let changes = diff(&a, &b, 1);
        let mut end = 0usize;
        for change in &changes {
            prop_assert_eq!(change.line, 1);
            prop_assert!(change.index as usize >= end);
            end = change.index as usize + str_width(&strip(&change.text)) as usize;
        }
    }
}

#[test]
fn style_only_change_restyles_visible_text() {
    let changes = diff("\x1b[31mfoo", "\x1b[32mfoo", 0);
    assert!(!changes.is_empty());
    assert!(changes.iter().any(|c| strip(&c.text) == "foo"));
}

#[test]
fn wide_cluster_replaced_by_narrow_ones() {
    let changes = diff("a界b", "axyb", 0);
    assert_eq!(apply("a界b", &changes), "axyb");
}

#[test]
fn empty_strings_need_no_writes() {
    assert!(diff("", "", 0).is_empty());
    assert!(diff("abc", "abc", 0).is_empty());
}
