//! RenderEngine: inline session state machine over a relative cursor.
//!
//! States are `Inactive` (initial / terminal) and `Active`. Every public
//! operation other than `start` is a no-op returning `false` while inactive.
//! The engine is single threaded by construction: it is driven by exactly one
//! owner (the channel worker or a test) and holds no locks of its own.
//!
//! Frame state between cycles is the list of physical rows last written,
//! stored as logical lines with indent 0 (indent is already baked into the
//! text). Rebuilding that list at the current width gives the old frame.
//!
//! Width changes:
//! - `repaint_on_resize`: cursor belief is re-derived from the old frame at
//!   the new width, the whole region is erased and the old frame is treated
//!   as empty, so every row is rewritten.
//! - otherwise: only the belief is re-derived and diffing proceeds against
//!   the rebuilt old frame.
//!
//! Spinner eligibility is decided on mutation (`update` / `append`) only. A
//! render or tick never rescans for the placeholder.

use crate::Change;
use crate::diff::diff;
use crate::frame::{self, Frame};
use crate::line::{Content, LineSource, LogicalLine, snapshot};
use crate::metrics::{RenderMetrics, RenderMetricsSnapshot};
use crate::spinner::{Spinner, SpinnerTimer, StyleFn, default_colour};
use crate::timing;
use crate::writer::{Cursor, CursorPosition};
use anyhow::Result;
use core_terminal::TerminalBackend;
use crossbeam_channel::Receiver;
use crossterm::QueueableCommand;
use crossterm::cursor::{Hide, Show};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Inactive,
    Active,
}

/// Options applied by `start`.
#[derive(Clone)]
pub struct StartOptions {
    pub hide_cursor: bool,
    /// Put the input stream in raw mode for the session.
    pub disable_input: bool,
    /// Glyph colouring; `None` uses the default cyan.
    pub spinner_colour: Option<StyleFn>,
    /// Spinner tick interval.
    pub update_frequency: Duration,
    pub repaint_on_resize: bool,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            hide_cursor: true,
            disable_input: false,
            spinner_colour: None,
            update_frequency: Duration::from_millis(80),
            repaint_on_resize: false,
        }
    }
}

impl fmt::Debug for StartOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartOptions")
            .field("hide_cursor", &self.hide_cursor)
            .field("disable_input", &self.disable_input)
            .field("spinner_colour", &self.spinner_colour.as_ref().map(|_| "fn"))
            .field("update_frequency", &self.update_frequency)
            .field("repaint_on_resize", &self.repaint_on_resize)
            .finish()
    }
}

pub struct RenderEngine {
    backend: Box<dyn TerminalBackend>,
    state: SessionState,
    options: StartOptions,
    /// Next-frame sources; shared lines are snapshotted per cycle.
    next: Vec<LineSource>,
    /// Physical rows written by the last cycle, indent 0.
    previous: Vec<LogicalLine>,
    cursor: Cursor,
    last_width: Option<u16>,
    spinner: Spinner,
    timer: SpinnerTimer,
    /// Raw-mode state observed at `start`, restored at `stop`.
    prior_raw: bool,
    last_changes: Vec<Change>,
    metrics: RenderMetrics,
}

impl RenderEngine {
    pub fn new(backend: Box<dyn TerminalBackend>) -> Self {
        Self {
            backend,
            state: SessionState::Inactive,
            options: StartOptions::default(),
            next: Vec::new(),
            previous: Vec::new(),
            cursor: Cursor::new(),
            last_width: None,
            spinner: Spinner::default(),
            timer: SpinnerTimer::new(),
            prior_raw: false,
            last_changes: Vec::new(),
            metrics: RenderMetrics::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Begin a session. Returns false (and changes nothing) when one is already active.
    pub fn start(&mut self, options: StartOptions) -> Result<bool> {
        if self.is_active() {
            debug!(target: "render.engine", "start_ignored_active");
            return Ok(false);
        }
        self.next.clear();
        self.previous.clear();
        self.cursor.reset();
        self.last_width = None;
        self.last_changes.clear();
        self.timer.disarm();
        self.spinner.reset();
        self.spinner
            .set_colour(options.spinner_colour.clone().unwrap_or_else(default_colour));

        self.prior_raw = self.backend.raw_mode();
        if options.disable_input && !self.prior_raw {
            self.backend.set_raw_mode(true)?;
        }
        if options.hide_cursor {
            let out = self.backend.out();
            out.queue(Hide)?;
            out.flush()?;
        }
        info!(target: "render.engine", ?options, "session_started");
        self.options = options;
        self.state = SessionState::Active;
        Ok(true)
    }

    /// Replace the next frame and render it.
    pub fn update(&mut self, content: Content) -> Result<bool> {
        if !self.is_active() {
            return Ok(false);
        }
        self.next = content.into_sources();
        let lines = snapshot(&self.next);
        self.refresh_spinner(&lines);
        self.render_lines(&lines, false)
    }

    /// Extend the next frame and render it.
    pub fn append(&mut self, content: Content) -> Result<bool> {
        if !self.is_active() {
            return Ok(false);
        }
        self.next.extend(content.into_sources());
        let lines = snapshot(&self.next);
        self.refresh_spinner(&lines);
        self.render_lines(&lines, false)
    }

    /// Render the current next frame, diffing every row.
    pub fn render(&mut self) -> Result<bool> {
        self.force_render(false)
    }

    /// Render, rewriting every row whole when `force` is set.
    pub fn force_render(&mut self, force: bool) -> Result<bool> {
        if !self.is_active() {
            return Ok(false);
        }
        let lines = snapshot(&self.next);
        self.render_lines(&lines, force)
    }

    /// Advance the spinner and render. Ignored unless the timer is armed.
    pub fn tick(&mut self) -> Result<bool> {
        if !self.is_active() || !self.timer.is_armed() {
            return Ok(false);
        }
        self.spinner.advance();
        RenderMetrics::add(&self.metrics.spinner_ticks, 1);
        self.render()
    }

    /// End the session. `commit` keeps the output on screen; otherwise it is erased.
    pub fn stop(&mut self, commit: bool) -> Result<bool> {
        if !self.is_active() {
            return Ok(false);
        }
        self.timer.disarm();
        let outcome = if commit {
            self.render().map(|_| ())
        } else {
            self.discard()
        };
        let restored = self.restore_terminal();
        self.state = SessionState::Inactive;
        info!(target: "render.engine", commit, "session_stopped");
        outcome?;
        restored?;
        Ok(true)
    }

    /// Current (uncommitted) next-frame lines.
    pub fn get_lines(&self) -> Vec<LogicalLine> {
        snapshot(&self.next)
    }

    /// Spinner tick source to select on; never fires while disarmed.
    pub fn spinner_ticks(&self) -> Receiver<Instant> {
        self.timer.ticks()
    }

    pub fn spinner_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// Changes applied by the most recent render cycle.
    pub fn last_changes(&self) -> &[Change] {
        &self.last_changes
    }

    pub fn cursor_position(&self) -> CursorPosition {
        self.cursor.position()
    }

    pub fn metrics_snapshot(&self) -> RenderMetricsSnapshot {
        self.metrics.snapshot()
    }

    fn refresh_spinner(&mut self, lines: &[LogicalLine]) {
        if lines.iter().any(LogicalLine::has_placeholder) {
            self.timer.arm(self.options.update_frequency);
        } else {
            self.timer.disarm();
        }
    }

    fn render_lines(&mut self, lines: &[LogicalLine], force_all: bool) -> Result<bool> {
        let started = Instant::now();
        let width = self.backend.size().width.max(1);
        let glyph = self.spinner.glyph();
        let new = frame::build(lines, width, &glyph);
        let mut old = frame::build(&self.previous, width, &glyph);
        let out = self.backend.out();

        if let Some(prev_width) = self.last_width
            && prev_width != width
        {
            let (row, col) = old.end();
            self.cursor.assume(CursorPosition::new(row, col));
            if self.options.repaint_on_resize {
                self.cursor.move_to(out, CursorPosition::default(), width)?;
                self.cursor.erase_below(out)?;
                old = Frame::default();
                RenderMetrics::add(&self.metrics.resize_repaints, 1);
            } else {
                RenderMetrics::add(&self.metrics.resize_reflows, 1);
            }
            debug!(target: "render.engine", prev_width, width, repaint = self.options.repaint_on_resize, "width_changed");
        }

        let mut changes = Vec::new();
        let mut forced = 0u64;
        for (idx, row) in new.rows.iter().enumerate() {
            if force_all || row.force {
                changes.push(Change::rewrite(idx, row.text.clone()));
                forced += 1;
            } else {
                changes.extend(diff(old.row_text(idx), &row.text, idx));
            }
        }

        for change in &changes {
            self.cursor
                .move_to(out, CursorPosition::new(change.line, change.index), width)?;
            self.cursor
                .write(out, &change.text, change.clear_eol, width)?;
        }
        if old.len() > new.len() {
            self.cursor
                .move_to(out, CursorPosition::new(new.len(), 0), width)?;
            self.cursor.erase_below(out)?;
            RenderMetrics::add(&self.metrics.rows_erased, (old.len() - new.len()) as u64);
        }
        let (row, col) = new.end();
        self.cursor.move_to(out, CursorPosition::new(row, col), width)?;
        out.flush()?;

        self.previous = new
            .rows
            .into_iter()
            .map(|row| LogicalLine::new(row.text))
            .collect();
        self.last_width = Some(width);

        let ns = timing::elapsed_ns(started);
        timing::record_last_render_ns(ns);
        RenderMetrics::add(&self.metrics.renders, 1);
        RenderMetrics::add(&self.metrics.changes_written, changes.len() as u64);
        RenderMetrics::add(&self.metrics.forced_rows, forced);
        self.metrics
            .last_render_ns
            .store(ns, std::sync::atomic::Ordering::Relaxed);
        trace!(
            target: "render.engine",
            rows = self.previous.len(),
            changes = changes.len(),
            forced,
            ns,
            "render_cycle"
        );
        self.last_changes = changes;
        Ok(true)
    }

    /// Drop the next frame and erase the session region.
    fn discard(&mut self) -> Result<()> {
        self.next.clear();
        let width = self.backend.size().width.max(1);
        if let Some(prev_width) = self.last_width
            && prev_width != width
        {
            let (row, col) = frame::build(&self.previous, width, "").end();
            self.cursor.assume(CursorPosition::new(row, col));
        }
        let out = self.backend.out();
        self.cursor.move_to(out, CursorPosition::default(), width)?;
        self.cursor.erase_below(out)?;
        out.flush()?;
        self.previous.clear();
        self.last_changes.clear();
        Ok(())
    }

    fn restore_terminal(&mut self) -> Result<()> {
        if self.options.hide_cursor {
            let out = self.backend.out();
            out.queue(Show)?;
            out.flush()?;
        }
        if self.backend.raw_mode() != self.prior_raw {
            self.backend.set_raw_mode(self.prior_raw)?;
        }
        Ok(())
    }
}

impl Drop for RenderEngine {
    fn drop(&mut self) {
        if self.is_active() {
            self.timer.disarm();
            if let Err(e) = self.restore_terminal() {
                warn!(target: "render.engine", error = %e, "restore_on_drop_failed");
            }
            self.state = SessionState::Inactive;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spinner::{FRAMES, PLACEHOLDER};
    use core_terminal::MemoryBackend;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn plain() -> StartOptions {
        StartOptions {
            hide_cursor: false,
            spinner_colour: Some(Arc::new(|g: &str| g.to_string())),
            ..StartOptions::default()
        }
    }

    fn engine(width: u16) -> (RenderEngine, MemoryBackend) {
        let term = MemoryBackend::new(width, 24);
        (RenderEngine::new(Box::new(term.clone())), term)
    }

    #[test]
    fn single_update_writes_whole_line() {
        let (mut eng, term) = engine(80);
        assert!(eng.start(plain()).unwrap());
        assert!(eng.update("Hello".into()).unwrap());
        assert_eq!(eng.last_changes(), &[Change::new(0, 0, "Hello")]);
        assert_eq!(term.output(), "Hello");
        assert_eq!(eng.cursor_position(), CursorPosition::new(0, 5));
    }

    #[test]
    fn deep_indent_with_wide_clusters_keeps_cursor_on_row() {
        let (mut eng, term) = engine(10);
        eng.start(plain()).unwrap();
        let lines = vec![LogicalLine::new("界界").with_indent(9), LogicalLine::new("x")];
        eng.update(lines.into()).unwrap();
        assert_eq!(term.output(), "        界\r\n        界\r\nx");
        assert_eq!(eng.cursor_position(), CursorPosition::new(2, 1));
        term.take_output();
        eng.update(vec![LogicalLine::new("界界").with_indent(9), LogicalLine::new("y")].into())
            .unwrap();
        assert_eq!(term.output(), "\ry");
    }

    #[test]
    fn partial_edit_moves_left_and_rewrites_suffix() {
        let (mut eng, term) = engine(80);
        eng.start(plain()).unwrap();
        eng.update("Hello world".into()).unwrap();
        term.take_output();
        eng.update("Hello there".into()).unwrap();
        assert_eq!(eng.last_changes(), &[Change::new(0, 6, "there")]);
        assert_eq!(term.output(), "\x1b[5Dthere");
    }

    #[test]
    fn shrink_erases_to_end_of_line() {
        let (mut eng, term) = engine(80);
        eng.start(plain()).unwrap();
        eng.update("abcdef".into()).unwrap();
        term.take_output();
        eng.update("abc".into()).unwrap();
        assert_eq!(eng.last_changes(), &[Change::erase(0, 3)]);
        assert_eq!(term.output(), "\x1b[3D\x1b[K");
    }

    #[test]
    fn fewer_rows_erase_below_and_park_at_end() {
        let (mut eng, term) = engine(80);
        eng.start(plain()).unwrap();
        eng.update(vec!["a", "b", "c"].into()).unwrap();
        assert_eq!(eng.cursor_position(), CursorPosition::new(2, 1));
        term.take_output();
        eng.update("a".into()).unwrap();
        assert!(eng.last_changes().is_empty());
        assert_eq!(term.output(), "\x1b[1A\r\x1b[J\x1b[1A\r\x1b[1C");
        assert_eq!(eng.cursor_position(), CursorPosition::new(0, 1));
        assert_eq!(eng.metrics_snapshot().rows_erased, 2);
    }

    #[test]
    fn append_extends_next_frame() {
        let (mut eng, _term) = engine(80);
        eng.start(plain()).unwrap();
        eng.update("one".into()).unwrap();
        eng.append("two\nthree".into()).unwrap();
        let texts: Vec<String> = eng.get_lines().into_iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(
            eng.last_changes(),
            &[Change::new(1, 0, "two"), Change::new(2, 0, "three")]
        );
    }

    #[test]
    fn start_twice_is_noop_and_keeps_frame() {
        let (mut eng, _term) = engine(80);
        assert!(eng.start(plain()).unwrap());
        eng.update("keep".into()).unwrap();
        assert!(!eng.start(plain()).unwrap());
        assert!(eng.is_active());
        assert_eq!(eng.get_lines()[0].text, "keep");
    }

    #[test]
    fn inactive_operations_are_noops() {
        let (mut eng, term) = engine(80);
        assert!(!eng.stop(true).unwrap());
        assert!(!eng.update("x".into()).unwrap());
        assert!(!eng.append("x".into()).unwrap());
        assert!(!eng.render().unwrap());
        assert!(!eng.tick().unwrap());
        assert_eq!(term.output(), "");
    }

    #[test]
    fn stop_without_commit_erases_region() {
        let (mut eng, term) = engine(80);
        eng.start(plain()).unwrap();
        eng.update(vec!["a", "bb"].into()).unwrap();
        term.take_output();
        assert!(eng.stop(false).unwrap());
        assert_eq!(term.output(), "\x1b[1A\r\x1b[J");
        assert_eq!(eng.cursor_position(), CursorPosition::default());
        assert!(eng.get_lines().is_empty());
        assert_eq!(eng.state(), SessionState::Inactive);
    }

    #[test]
    fn stop_with_commit_renders_latest_shared_state() {
        let (mut eng, _term) = engine(80);
        eng.start(plain()).unwrap();
        let line = crate::SharedLine::new("working");
        eng.update((&line).into()).unwrap();
        line.set_text("done");
        assert!(eng.stop(true).unwrap());
        assert_eq!(eng.last_changes(), &[Change::rewrite(0, "done")]);
    }

    #[test]
    fn hide_cursor_restored_on_stop() {
        let (mut eng, term) = engine(80);
        eng.start(StartOptions::default()).unwrap();
        assert_eq!(term.take_output(), "\x1b[?25l");
        eng.stop(true).unwrap();
        assert!(term.output().ends_with("\x1b[?25h"));
    }

    #[test]
    fn raw_mode_restored_on_stop_and_drop() {
        let (mut eng, term) = engine(80);
        let opts = StartOptions {
            disable_input: true,
            ..plain()
        };
        eng.start(opts.clone()).unwrap();
        assert!(term.raw_mode());
        eng.stop(true).unwrap();
        assert!(!term.raw_mode());

        eng.start(opts).unwrap();
        assert!(term.raw_mode());
        drop(eng);
        assert!(!term.raw_mode());
    }

    #[test]
    fn force_render_rewrites_every_row() {
        let (mut eng, _term) = engine(80);
        eng.start(plain()).unwrap();
        eng.update(vec!["a", "b"].into()).unwrap();
        assert!(eng.force_render(true).unwrap());
        assert_eq!(
            eng.last_changes(),
            &[Change::rewrite(0, "a"), Change::rewrite(1, "b")]
        );
        eng.render().unwrap();
        assert!(eng.last_changes().is_empty());
    }

    #[test]
    fn forced_line_bypasses_diff() {
        let (mut eng, _term) = engine(80);
        eng.start(plain()).unwrap();
        eng.update(LogicalLine::new("same").forced(true).into()).unwrap();
        eng.render().unwrap();
        assert_eq!(eng.last_changes(), &[Change::rewrite(0, "same")]);
        assert_eq!(eng.metrics_snapshot().forced_rows, 2);
    }

    #[test]
    fn spinner_armed_on_mutation_only() {
        let (mut eng, _term) = engine(80);
        eng.start(plain()).unwrap();
        eng.update(format!("{PLACEHOLDER} loading").into()).unwrap();
        assert!(eng.spinner_armed());
        assert_eq!(eng.get_lines()[0].text, format!("{PLACEHOLDER} loading"));
        assert_eq!(eng.last_changes()[0].text, format!("{} loading", FRAMES[0]));

        assert!(eng.tick().unwrap());
        assert_eq!(eng.last_changes(), &[Change::new(0, 0, FRAMES[1])]);

        eng.update("finished".into()).unwrap();
        assert!(!eng.spinner_armed());
        assert!(!eng.tick().unwrap());
    }

    #[test]
    fn shared_placeholder_removed_keeps_timer_until_mutation() {
        let (mut eng, _term) = engine(80);
        eng.start(plain()).unwrap();
        let line = crate::SharedLine::new(format!("{PLACEHOLDER} task"));
        eng.update((&line).into()).unwrap();
        line.set_text("task ok");
        eng.render().unwrap();
        assert!(eng.spinner_armed());
        eng.append("next".into()).unwrap();
        assert!(!eng.spinner_armed());
    }

    #[test]
    fn stop_disarms_spinner() {
        let (mut eng, _term) = engine(80);
        eng.start(plain()).unwrap();
        eng.update(PLACEHOLDER.into()).unwrap();
        eng.stop(true).unwrap();
        assert!(!eng.spinner_armed());
    }

    #[test]
    fn long_lines_wrap_at_terminal_width() {
        let (mut eng, _term) = engine(4);
        eng.start(plain()).unwrap();
        eng.update("abcdefg".into()).unwrap();
        assert_eq!(
            eng.last_changes(),
            &[Change::new(0, 0, "abcd"), Change::new(1, 0, "efg")]
        );
        assert_eq!(eng.cursor_position(), CursorPosition::new(1, 3));
    }

    #[test]
    fn resize_with_repaint_erases_and_rewrites() {
        let (mut eng, term) = engine(10);
        eng.start(StartOptions {
            repaint_on_resize: true,
            ..plain()
        })
        .unwrap();
        eng.update("abcdefgh".into()).unwrap();
        term.set_width(4);
        term.take_output();
        eng.render().unwrap();
        let out = term.output();
        assert!(out.starts_with("\x1b[1A\r\x1b[J"), "{out:?}");
        assert_eq!(
            eng.last_changes(),
            &[Change::new(0, 0, "abcd"), Change::new(1, 0, "efgh")]
        );
        assert_eq!(eng.metrics_snapshot().resize_repaints, 1);
    }

    #[test]
    fn resize_without_repaint_rederives_belief() {
        let (mut eng, term) = engine(10);
        eng.start(plain()).unwrap();
        eng.update("abcdefgh".into()).unwrap();
        term.set_width(4);
        eng.render().unwrap();
        assert!(eng.last_changes().is_empty());
        assert_eq!(eng.cursor_position(), CursorPosition::new(1, 4));
        assert_eq!(eng.metrics_snapshot().resize_reflows, 1);
    }

    #[test]
    fn styled_rows_never_leak_style() {
        let (mut eng, term) = engine(80);
        eng.start(plain()).unwrap();
        eng.update("\x1b[31mred".into()).unwrap();
        assert!(term.output().ends_with("\x1b[0m"));
    }
}
