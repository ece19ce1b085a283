//! Spinner placeholder, glyphs and the periodic tick timer.
//!
//! Lines may embed `PLACEHOLDER`; every frame build replaces it with the
//! current (styled) animation glyph. `SpinnerTimer` is an explicit two-state
//! machine (`Disarmed` / `Armed`) owning a crossbeam tick receiver. The engine
//! loop selects on `ticks()`; a disarmed timer hands out `never()`, so there
//! is no separate running flag to keep in sync. Re-arming replaces the
//! receiver and drops the previous one, so a duplicate periodic trigger can
//! never survive.

use crossbeam_channel::{Receiver, never, tick};
use crossterm::style::Stylize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Reserved token replaced by the spinner glyph at render time.
pub const PLACEHOLDER: &str = "%spinner%";

pub const TICK: &str = "✔";
pub const CROSS: &str = "✖";
pub const STYLED_TICK: &str = "\x1b[32m✔\x1b[39m";
pub const STYLED_CROSS: &str = "\x1b[31m✖\x1b[39m";

pub const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Lower bound for the tick interval.
pub const MIN_UPDATE_FREQUENCY: Duration = Duration::from_millis(10);

/// Colouring function applied to a glyph (the `styleText` collaborator).
pub type StyleFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

pub fn default_colour() -> StyleFn {
    Arc::new(|glyph: &str| glyph.cyan().to_string())
}

/// Animation phase + colouring.
pub struct Spinner {
    phase: usize,
    colour: StyleFn,
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new(default_colour())
    }
}

impl fmt::Debug for Spinner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spinner").field("phase", &self.phase).finish()
    }
}

impl Spinner {
    pub fn new(colour: StyleFn) -> Self {
        Self { phase: 0, colour }
    }

    pub fn set_colour(&mut self, colour: StyleFn) {
        self.colour = colour;
    }

    pub fn phase(&self) -> usize {
        self.phase
    }

    pub fn advance(&mut self) {
        self.phase = (self.phase + 1) % FRAMES.len();
    }

    pub fn reset(&mut self) {
        self.phase = 0;
    }

    /// Current glyph, styled.
    pub fn glyph(&self) -> String {
        (self.colour)(FRAMES[self.phase])
    }
}

#[derive(Debug, Default)]
enum TimerState {
    #[default]
    Disarmed,
    Armed {
        interval: Duration,
        ticks: Receiver<Instant>,
    },
}

#[derive(Debug, Default)]
pub struct SpinnerTimer {
    state: TimerState,
}

impl SpinnerTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking. No-op (returns false) when already armed.
    pub fn arm(&mut self, interval: Duration) -> bool {
        if self.is_armed() {
            return false;
        }
        let interval = interval.max(MIN_UPDATE_FREQUENCY);
        debug!(target: "render.spinner", interval_ms = interval.as_millis() as u64, "timer_armed");
        self.state = TimerState::Armed {
            interval,
            ticks: tick(interval),
        };
        true
    }

    /// Stop ticking. Returns false when already disarmed.
    pub fn disarm(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            TimerState::Disarmed => false,
            TimerState::Armed { .. } => {
                debug!(target: "render.spinner", "timer_disarmed");
                true
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, TimerState::Armed { .. })
    }

    pub fn interval(&self) -> Option<Duration> {
        match &self.state {
            TimerState::Armed { interval, .. } => Some(*interval),
            TimerState::Disarmed => None,
        }
    }

    /// Receiver to select on; never fires while disarmed.
    pub fn ticks(&self) -> Receiver<Instant> {
        match &self.state {
            TimerState::Armed { ticks, .. } => ticks.clone(),
            TimerState::Disarmed => never(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_cycles_through_frames() {
        let mut spinner = Spinner::new(Arc::new(|g: &str| g.to_string()));
        assert_eq!(spinner.glyph(), FRAMES[0]);
        for _ in 0..FRAMES.len() {
            spinner.advance();
        }
        assert_eq!(spinner.phase(), 0);
        spinner.advance();
        assert_eq!(spinner.glyph(), FRAMES[1]);
    }

    #[test]
    fn default_colour_wraps_glyph_in_style() {
        let spinner = Spinner::default();
        let glyph = spinner.glyph();
        assert!(glyph.contains(FRAMES[0]));
        assert!(core_text::has_style(&glyph));
    }

    #[test]
    fn arm_is_idempotent_and_disarm_stops_ticks() {
        let mut timer = SpinnerTimer::new();
        assert!(timer.ticks().recv_timeout(Duration::from_millis(20)).is_err());
        assert!(timer.arm(Duration::from_millis(10)));
        assert!(!timer.arm(Duration::from_millis(50)));
        assert_eq!(timer.interval(), Some(Duration::from_millis(10)));
        assert!(timer.ticks().recv_timeout(Duration::from_millis(500)).is_ok());
        assert!(timer.disarm());
        assert!(!timer.disarm());
        assert!(timer.ticks().recv_timeout(Duration::from_millis(30)).is_err());
    }

    #[test]
    fn interval_is_clamped() {
        let mut timer = SpinnerTimer::new();
        timer.arm(Duration::ZERO);
        assert_eq!(timer.interval(), Some(MIN_UPDATE_FREQUENCY));
    }

    #[test]
    fn styled_status_glyphs_strip_to_plain() {
        assert_eq!(core_text::strip(STYLED_TICK), TICK);
        assert_eq!(core_text::strip(STYLED_CROSS), CROSS);
    }
}
