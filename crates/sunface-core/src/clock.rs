//! Wall-clock keeping for the face.
//!
//! The core never reads a system clock. The runtime synchronizes a reference
//! point (UTC epoch seconds paired with the monotonic instant it was taken
//! at) and every render tick derives local time from that reference plus
//! elapsed monotonic time and the current timezone offset.

use chrono::{DateTime, NaiveDateTime};
use embassy_time::Instant;

/// UTC reference point: what time it was at a known monotonic instant.
#[derive(Debug, Clone, Copy)]
struct ClockReference {
    epoch_seconds: i64,
    instant: Instant,
}

/// Derives local wall time from a synced reference.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    reference: ClockReference,
    tz_offset_minutes: i32,
}

impl Clock {
    pub fn new(utc_epoch_seconds: i64, at: Instant, tz_offset_minutes: i32) -> Self {
        Self {
            reference: ClockReference {
                epoch_seconds: utc_epoch_seconds,
                instant: at,
            },
            tz_offset_minutes,
        }
    }

    /// Re-anchor the reference, e.g. after a time sync from the handheld.
    pub fn set_reference(&mut self, utc_epoch_seconds: i64, at: Instant) {
        self.reference = ClockReference {
            epoch_seconds: utc_epoch_seconds,
            instant: at,
        };
    }

    /// Apply a timezone-change broadcast.
    pub fn set_timezone_offset(&mut self, minutes: i32) {
        self.tz_offset_minutes = minutes;
    }

    pub fn timezone_offset(&self) -> i32 {
        self.tz_offset_minutes
    }

    /// Local calendar time at the given monotonic instant.
    ///
    /// Instants before the reference clamp to the reference time; an
    /// out-of-range epoch clamps to the Unix epoch rather than failing a
    /// draw over a nonsense sync.
    pub fn local_time(&self, now: Instant) -> NaiveDateTime {
        let elapsed_ms = now
            .as_millis()
            .saturating_sub(self.reference.instant.as_millis());
        let local_seconds = self.reference.epoch_seconds
            + elapsed_ms as i64 / 1000
            + self.tz_offset_minutes as i64 * 60;
        DateTime::from_timestamp(local_seconds, 0)
            .map(|dt| dt.naive_utc())
            .unwrap_or(NaiveDateTime::UNIX_EPOCH)
    }
}
