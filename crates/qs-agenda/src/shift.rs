//! `Shift` and `Agenda`.
//!
//! Shifts are half-open: a staff member whose shift is `[9.0, 11.5)` is on
//! duty at 9.0 and off duty at 11.5.  Adjacent shifts (`end == next.start`)
//! are allowed; overlapping ones are rejected.  Both ends must be finite:
//! an agenda always runs out.

use qs_core::SimTime;

use crate::{AgendaError, AgendaResult};

// ── Shift ─────────────────────────────────────────────────────────────────────

/// One on-duty interval `[start, end)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shift {
    pub start: SimTime,
    pub end:   SimTime,
}

impl Shift {
    /// A validated shift.
    pub fn new(start: impl Into<SimTime>, end: impl Into<SimTime>) -> AgendaResult<Self> {
        let shift = Self { start: start.into(), end: end.into() };
        shift.validate()?;
        Ok(shift)
    }

    pub fn duration(&self) -> f64 {
        self.end.since(self.start)
    }

    /// `start <= t < end`.
    #[inline]
    pub fn contains(&self, t: SimTime) -> bool {
        self.start <= t && t < self.end
    }

    fn validate(&self) -> AgendaResult<()> {
        if self.start.is_finite() && self.end.is_finite() && self.start < self.end {
            Ok(())
        } else {
            Err(AgendaError::InvalidShift { start: self.start, end: self.end })
        }
    }
}

// ── Agenda ────────────────────────────────────────────────────────────────────

/// The ordered, non-overlapping shifts of one staff member or window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Shift>", into = "Vec<Shift>")
)]
pub struct Agenda {
    /// Sorted ascending by `start`.
    shifts: Vec<Shift>,
}

impl Agenda {
    /// Build an agenda, sorting `shifts` by start time.
    ///
    /// Fails if any shift is empty or inverted, or if two shifts overlap.
    pub fn new(mut shifts: Vec<Shift>) -> AgendaResult<Self> {
        for shift in &shifts {
            shift.validate()?;
        }
        shifts.sort_unstable_by_key(|s| s.start);
        for pair in shifts.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(AgendaError::Overlap { previous_end: pair[0].end, next: pair[1].start });
            }
        }
        Ok(Self { shifts })
    }

    /// Shorthand for `Agenda::new` over `(start, end)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> AgendaResult<Self> {
        Self::new(
            pairs
                .iter()
                .map(|&(start, end)| Shift { start: SimTime(start), end: SimTime(end) })
                .collect(),
        )
    }

    /// An agenda with no shifts: never on duty.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    /// The shift covering `t`, if on duty at `t`.
    pub fn shift_at(&self, t: SimTime) -> Option<&Shift> {
        let idx = self.shifts.partition_point(|s| s.start <= t);
        idx.checked_sub(1)
            .map(|i| &self.shifts[i])
            .filter(|s| s.contains(t))
    }

    #[inline]
    pub fn is_on_duty(&self, t: SimTime) -> bool {
        self.shift_at(t).is_some()
    }

    /// Shifts that are still relevant at `t`: the one in progress (if any)
    /// followed by every later one.
    pub fn remaining(&self, t: SimTime) -> &[Shift] {
        let idx = self.shifts.partition_point(|s| s.end <= t);
        &self.shifts[idx..]
    }

    /// The first shift starting at or after `t`.
    pub fn next_start(&self, t: SimTime) -> Option<&Shift> {
        let idx = self.shifts.partition_point(|s| s.start < t);
        self.shifts.get(idx)
    }

    /// Total on-duty time.
    pub fn total_duration(&self) -> f64 {
        self.shifts.iter().map(Shift::duration).sum()
    }
}

impl TryFrom<Vec<Shift>> for Agenda {
    type Error = AgendaError;

    fn try_from(shifts: Vec<Shift>) -> AgendaResult<Self> {
        Self::new(shifts)
    }
}

impl From<Agenda> for Vec<Shift> {
    fn from(agenda: Agenda) -> Self {
        agenda.shifts
    }
}
