//! Render execution counters.
//!
//! Records what the engine actually did per render cycle (rows rewritten,
//! forced rows, resize repaints) as opposed to what callers asked for. All
//! counters are relaxed atomics; `snapshot` gives a consistent-enough copy for
//! logging and tests.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RenderMetrics {
    /// Completed render cycles.
    pub renders: AtomicU64,
    /// Changes applied to the terminal (erase-only ones included).
    pub changes_written: AtomicU64,
    /// Physical rows rewritten whole because of a force flag.
    pub forced_rows: AtomicU64,
    /// Renders that started by erasing the whole region after a width change.
    pub resize_repaints: AtomicU64,
    /// Renders that only reflowed cursor belief after a width change.
    pub resize_reflows: AtomicU64,
    /// Stale trailing rows erased because the new frame was shorter.
    pub rows_erased: AtomicU64,
    /// Spinner ticks processed.
    pub spinner_ticks: AtomicU64,
    /// Duration (ns) of the most recent render.
    pub last_render_ns: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderMetricsSnapshot {
    pub renders: u64,
    pub changes_written: u64,
    pub forced_rows: u64,
    pub resize_repaints: u64,
    pub resize_reflows: u64,
    pub rows_erased: u64,
    pub spinner_ticks: u64,
    pub last_render_ns: u64,
}

impl RenderMetrics {
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RenderMetricsSnapshot {
        RenderMetricsSnapshot {
            renders: self.renders.load(Ordering::Relaxed),
            changes_written: self.changes_written.load(Ordering::Relaxed),
            forced_rows: self.forced_rows.load(Ordering::Relaxed),
            resize_repaints: self.resize_repaints.load(Ordering::Relaxed),
            resize_reflows: self.resize_reflows.load(Ordering::Relaxed),
            rows_erased: self.rows_erased.load(Ordering::Relaxed),
            spinner_ticks: self.spinner_ticks.load(Ordering::Relaxed),
            last_render_ns: self.last_render_ns.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments() {
        let m = RenderMetrics::default();
        RenderMetrics::add(&m.renders, 2);
        RenderMetrics::add(&m.changes_written, 5);
        let snap = m.snapshot();
        assert_eq!(snap.renders, 2);
        assert_eq!(snap.changes_written, 5);
        assert_eq!(snap.forced_rows, 0);
    }
}
