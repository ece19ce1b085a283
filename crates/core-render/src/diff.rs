//! Styled line diff: minimal ordered writes turning one styled row into another.
//!
//! Both strings are parsed into stripped grapheme clusters plus a sparse
//! position -> style map (`core_text::StyledText`). The target is scanned left
//! to right; a cluster position is *divergent* when any of these differ
//! between original and target:
//! - the cluster text (or the original has no cluster there),
//! - the display column the cluster starts at (a wide cluster earlier shifts everything after it),
//! - the style sequence in effect at that position.
//!
//! Divergent runs become Changes. A single non-divergent position between two
//! runs is absorbed instead of splitting, so alternating edits do not produce a
//! Change per cluster.
//!
//! Change text construction:
//! - opens with the target's active style at the run start, or `RESET` when
//!   there is none and either side carries styles (plain rows stay plain);
//! - interleaves the target's style sequences with its clusters;
//! - closes with the target sequence positioned exactly at the run end, so a
//!   reversion to the surrounding style is written in the same Change.
//!
//! A run whose clusters are all whitespace and whose content is unchanged
//! (only styling differs) is dropped. When the target is narrower than the
//! original an end-of-line erase is merged into the last Change if it reaches
//! the target end, otherwise appended as its own Change.
//!
//! Cost: one parse per side plus a binary search of the (small) style list per
//! position; no rescans of the full string.

use crate::Change;
use core_text::{RESET, StyledText};
use tracing::trace;

/// Compute the ordered Changes transforming `original` into `target` on row `line`.
pub fn diff(original: &str, target: &str, line: usize) -> Vec<Change> {
    if original == target {
        return Vec::new();
    }
    if original.is_empty() {
        return vec![Change::new(line, 0, target)];
    }
    if target.is_empty() {
        return vec![Change::erase(line, 0)];
    }

    let old = StyledText::parse(original);
    let new = StyledText::parse(target);
    let styled = old.has_styles() || new.has_styles();

    let mut changes = Vec::new();
    for run in divergent_runs(&old, &new) {
        let cols = &new.clusters()[run.start..run.end];
        if !run.content_changed && cols.iter().all(|c| c.text.chars().all(char::is_whitespace)) {
            continue;
        }
        changes.push(Change::new(line, new.col_of(run.start), run_text(&new, &run, styled)));
    }

    if new.width() < old.width() {
        let end = new.width();
        match changes.last_mut() {
            Some(last) if last.index + core_text::str_width(&core_text::strip(&last.text)) == end => {
                last.clear_eol = true;
            }
            _ => changes.push(Change::erase(line, end)),
        }
    }

    trace!(
        target: "render.diff",
        line,
        original_len = original.len(),
        target_len = target.len(),
        changes = changes.len(),
        "line_diff"
    );
    changes
}

/// Half-open range of target cluster positions to rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    start: usize,
    end: usize,
    /// Any position in the run differs in content, not only in style.
    content_changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Divergence {
    None,
    Style,
    Content,
}

fn divergence(old: &StyledText<'_>, new: &StyledText<'_>, pos: usize) -> Divergence {
    let target = new.clusters()[pos];
    match old.clusters().get(pos) {
        None => Divergence::Content,
        Some(orig) if orig.text != target.text || orig.col != target.col => Divergence::Content,
        Some(_) if old.active_at(pos) != new.active_at(pos) => Divergence::Style,
        Some(_) => Divergence::None,
    }
}

fn divergent_runs(old: &StyledText<'_>, new: &StyledText<'_>) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    let mut current: Option<Run> = None;
    for pos in 0..new.len() {
        let div = divergence(old, new, pos);
        if div == Divergence::None {
            if let Some(run) = current.take() {
                runs.push(run);
            }
            continue;
        }
        let content = div == Divergence::Content;
        match current.as_mut() {
            Some(run) => {
                run.end = pos + 1;
                run.content_changed |= content;
            }
            None => {
                // A one-position gap since the previous run is absorbed into it.
                match runs.last().copied() {
                    Some(mut merged) if merged.end + 1 == pos => {
                        runs.pop();
                        merged.end = pos + 1;
                        merged.content_changed |= content;
                        current = Some(merged);
                    }
                    _ => {
                        current = Some(Run {
                            start: pos,
                            end: pos + 1,
                            content_changed: content,
                        });
                    }
                }
            }
        }
    }
    if let Some(run) = current {
        runs.push(run);
    }
    runs
}

fn run_text(new: &StyledText<'_>, run: &Run, styled: bool) -> String {
    let mut text = String::new();
    match new.active_at(run.start) {
        Some(seq) => text.push_str(seq),
        None if styled => text.push_str(RESET),
        None => {}
    }
    for pos in run.start..run.end {
        if pos > run.start
            && let Some(seq) = new.style_at(pos)
        {
            text.push_str(seq);
        }
        text.push_str(new.clusters()[pos].text);
    }
    if let Some(seq) = new.style_at(run.end) {
        text.push_str(seq);
    }
    text
}
