//! Render duration instrumentation.
//!
//! Process-wide record of the most recent render cycle duration, readable
//! from any thread (the demo binary logs it on exit). Per-engine counters live
//! in `metrics`.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static LAST_RENDER_NS: AtomicU64 = AtomicU64::new(0);

/// Record a render duration in nanoseconds.
pub fn record_last_render_ns(ns: u64) {
    LAST_RENDER_NS.store(ns, Ordering::Relaxed);
}

/// Fetch the last recorded render duration in nanoseconds.
pub fn last_render_ns() -> u64 {
    LAST_RENDER_NS.load(Ordering::Relaxed)
}

/// Nanoseconds elapsed since `start`, saturating at `u64::MAX`.
pub fn elapsed_ns(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_latest_duration() {
        record_last_render_ns(1234);
        assert_eq!(last_render_ns(), 1234);
    }

    #[test]
    fn elapsed_is_monotonic() {
        let start = Instant::now();
        let a = elapsed_ns(start);
        let b = elapsed_ns(start);
        assert!(b >= a);
    }
}
