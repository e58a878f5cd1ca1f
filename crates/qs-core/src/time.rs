//! Simulation time model.
//!
//! # Design
//!
//! Virtual time is a real number wrapped in [`SimTime`].  The unit is chosen
//! by the model (the bank and post-office models use hours, so `9.5` is
//! 09:30).  Time is unrelated to wall-clock time and only ever moves when the
//! kernel advances its [`SimClock`] to the next due entry.
//!
//! `f64` has no total order, so `SimTime` orders with [`f64::total_cmp`].
//! NaN never enters the clock: the kernel rejects non-finite and negative
//! delays before anything is scheduled.

use std::cmp::Ordering;
use std::fmt;

use crate::{CoreError, CoreResult};

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute point in virtual time.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    /// "Never", used for infinite patience.  Never scheduled.
    pub const INFINITY: SimTime = SimTime(f64::INFINITY);

    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// The time `delay` units after `self`.
    #[inline]
    pub fn after(self, delay: f64) -> SimTime {
        SimTime(self.0 + delay)
    }

    /// Time elapsed from `earlier` to `self`.
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Split an hour-based time into `(hour, minute)` of the day.
    /// Useful for human-readable logging without a datetime library.
    pub fn clock_hm(self) -> (u32, u32) {
        let total_minutes = (self.0.max(0.0) * 60.0).round() as u64;
        (((total_minutes / 60) % 24) as u32, (total_minutes % 60) as u32)
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for SimTime {
    #[inline]
    fn from(t: f64) -> SimTime {
        SimTime(t)
    }
}

impl std::ops::Add<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: f64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = f64;
    #[inline]
    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The kernel's clock.  Only the scheduler moves it.
#[derive(Clone, Debug)]
pub struct SimClock {
    now: SimTime,
}

impl SimClock {
    pub fn new(start: SimTime) -> Self {
        Self { now: start }
    }

    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Move the clock to `t`.
    ///
    /// # Panics
    /// Panics in debug mode if `t` is earlier than the current time.
    #[inline]
    pub fn advance_to(&mut self, t: SimTime) {
        debug_assert!(t >= self.now, "clock moved backwards: {} -> {}", self.now, t);
        self.now = t;
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m) = self.now.clock_hm();
        write!(f, "{} ({:02}:{:02})", self.now, h, m)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Run-level configuration shared by every model.
///
/// Typically embedded in a model config loaded from JSON by the application.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Virtual time at which the clock starts (e.g. 9.0 = 09:00).
    pub start_time: f64,

    /// How long to simulate, in the same unit.
    pub duration: f64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,
}

impl SimConfig {
    /// The time at which the run stops (inclusive deadline).
    #[inline]
    pub fn end_time(&self) -> SimTime {
        SimTime(self.start_time + self.duration)
    }

    #[inline]
    pub fn start(&self) -> SimTime {
        SimTime(self.start_time)
    }

    /// Construct a `SimClock` pre-set to `start_time`.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start())
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !self.start_time.is_finite() {
            return Err(CoreError::Config(format!(
                "start_time must be finite, got {}",
                self.start_time
            )));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(CoreError::Config(format!(
                "duration must be finite and non-negative, got {}",
                self.duration
            )));
        }
        Ok(())
    }
}
