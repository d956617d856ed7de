//! Frame clock and monotonic timestamps.
//!
//! Every frame samples the time source exactly once. All reconciliation
//! and progress computations in that frame use the same [`Timestamp`], so
//! the values shown on screen are consistent with each other.
//!
//! # Design Principles
//!
//! - Timestamps are offsets from an arbitrary origin, never wall-clock time.
//! - The frame clock never moves backwards: a sample earlier than the
//!   previous frame is clamped to the previous frame.
//! - The tick counter uses checked arithmetic.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// A monotonic point in time, measured from the time source's origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Duration);

impl Timestamp {
    /// The time source's origin.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Create a timestamp `ms` milliseconds after the origin.
    pub const fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    /// Create a timestamp `secs` seconds after the origin.
    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// Offset since the origin.
    pub const fn offset(self) -> Duration {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, or zero if `earlier` is later.
    pub const fn saturating_since(self, earlier: Self) -> Duration {
        self.0.saturating_sub(earlier.0)
    }

    /// Return `self + delta`, saturating at the maximum duration.
    #[must_use]
    pub const fn saturating_add(self, delta: Duration) -> Self {
        Self(self.0.saturating_add(delta))
    }
}

/// A source of monotonic time.
pub trait TimeSource {
    /// Sample the current time.
    fn now(&self) -> Timestamp;
}

/// [`TimeSource`] backed by [`std::time::Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    /// Create a time source whose origin is the moment of construction.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now(&self) -> Timestamp {
        Timestamp(self.origin.elapsed())
    }
}

/// Manually driven [`TimeSource`] for tests and replays.
///
/// Optionally advances by a fixed step after every sample, which makes a
/// sequence of frames `step` apart.
#[derive(Debug, Default)]
pub struct ManualTime {
    now: Cell<Timestamp>,
    step: Duration,
}

impl ManualTime {
    /// Create a source frozen at `start`.
    pub const fn new(start: Timestamp) -> Self {
        Self {
            now: Cell::new(start),
            step: Duration::ZERO,
        }
    }

    /// Create a source that starts at `start` and moves forward by `step`
    /// after each sample.
    pub const fn with_step(start: Timestamp, step: Duration) -> Self {
        Self {
            now: Cell::new(start),
            step,
        }
    }

    /// Jump forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get().saturating_add(delta));
    }

    /// Jump to an absolute timestamp.
    pub fn set(&self, at: Timestamp) {
        self.now.set(at);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Timestamp {
        let current = self.now.get();
        self.now.set(current.saturating_add(self.step));
        current
    }
}

/// Per-frame clock: tick counter plus the timestamp sampled for the frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameClock {
    /// Number of frames started so far.
    tick: u64,

    /// Timestamp sampled at the start of the current frame.
    now: Timestamp,
}

impl FrameClock {
    /// Create a clock at tick 0.
    pub const fn new() -> Self {
        Self {
            tick: 0,
            now: Timestamp::ZERO,
        }
    }

    /// Start a new frame: advance the tick counter and sample `source` once.
    ///
    /// Returns the new tick number and the frame's timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn begin_frame(&mut self, source: &dyn TimeSource) -> Result<(u64, Timestamp), ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        self.now = source.now().max(self.now);
        Ok((self.tick, self.now))
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the timestamp of the current frame.
    pub const fn now(&self) -> Timestamp {
        self.now
    }
}
