//! Redraw scheduling for the interactive face.
//!
//! One boolean decision drives the timer: it runs while the face is visible
//! and not in ambient mode. The state machine owns the "is a tick pending"
//! flag; the runtime owns the actual timer and applies the returned actions,
//! so a pending tick is always removed before a new one may be posted and
//! duplicate concurrent ticks cannot arise.
//!
//! Ticks are aligned to wall-clock interval boundaries: after a tick at time
//! T the next delay is `interval - (T mod interval)`, so seconds flip right
//! at the turn of the second instead of drifting by the handler latency.

use embassy_time::{Duration, Instant};

use crate::config::UPDATE_INTERVAL;

/// What the runtime must do to its timer after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Drop any pending tick.
    Cancel,
    /// Drop any pending tick and deliver one immediately.
    Restart,
}

/// Visibility/ambient state machine gating the redraw timer.
#[derive(Debug)]
pub struct RedrawScheduler {
    visible: bool,
    ambient: bool,
    pending: bool,
    interval: Duration,
}

impl Default for RedrawScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self {
            visible: false,
            ambient: false,
            pending: false,
            interval: UPDATE_INTERVAL,
        }
    }

    #[cfg(test)]
    fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::new()
        }
    }

    /// The timer runs only while visible and interactive.
    pub fn should_run(&self) -> bool {
        self.visible && !self.ambient
    }

    /// Whether a tick is currently scheduled.
    pub fn has_pending_tick(&self) -> bool {
        self.pending
    }

    pub fn set_visible(&mut self, visible: bool) -> TimerAction {
        self.visible = visible;
        self.update_timer()
    }

    pub fn set_ambient(&mut self, ambient: bool) -> TimerAction {
        self.ambient = ambient;
        self.update_timer()
    }

    /// Cancel any pending tick, then restart the timer iff it should run.
    fn update_timer(&mut self) -> TimerAction {
        self.pending = false;
        if self.should_run() {
            self.pending = true;
            TimerAction::Restart
        } else {
            TimerAction::Cancel
        }
    }

    /// Consume the pending tick at monotonic time `now`.
    ///
    /// Returns the delay until the next tick, or `None` when the run
    /// condition no longer holds and the timer stops.
    pub fn on_tick(&mut self, now: Instant) -> Option<Duration> {
        self.pending = false;
        if !self.should_run() {
            return None;
        }
        self.pending = true;
        Some(self.aligned_delay(now))
    }

    /// Delay from `now` to the next interval boundary.
    fn aligned_delay(&self, now: Instant) -> Duration {
        let interval_ms = self.interval.as_millis();
        Duration::from_millis(interval_ms - (now.as_millis() % interval_ms))
    }
}
