use std::ops::Range;

use crate::error::ModelConstructionError;

/// Default slot length, in hours.
pub const DEFAULT_SLOT_HOURS: f64 = 1.0;

const SNAP_TOLERANCE: f64 = 1e-9;

/// The discrete horizon shared by flights and maintenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGrid {
    slots: usize,
    slot_hours: f64,
}

impl TimeGrid {
    pub fn new(slots: usize) -> Result<Self, ModelConstructionError> {
        Self::with_slot_hours(slots, DEFAULT_SLOT_HOURS)
    }

    pub fn with_slot_hours(slots: usize, slot_hours: f64) -> Result<Self, ModelConstructionError> {
        if slots == 0 {
            return Err(ModelConstructionError::EmptyHorizon);
        }
        if !slot_hours.is_finite() || slot_hours <= 0.0 {
            return Err(ModelConstructionError::InvalidSlotLength(slot_hours));
        }
        Ok(Self { slots, slot_hours })
    }

    /// Number of slots `T`.
    pub fn len(&self) -> usize {
        self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots == 0
    }

    pub fn slot_hours(&self) -> f64 {
        self.slot_hours
    }

    pub fn slots(&self) -> Range<usize> {
        0..self.slots
    }

    /// Converts a duration in hours to a whole number of slots, rounding up.
    ///
    /// The rounding is lossy on purpose: a 2.5h flight on a 1h grid blocks
    /// three full slots.
    pub fn slots_for_hours(&self, hours: f64) -> Option<usize> {
        if !hours.is_finite() || hours <= 0.0 {
            return None;
        }
        let ratio = hours / self.slot_hours;
        let nearest = ratio.round();
        // Exact multiples like 2.1h on 0.3h slots land just above an integer.
        let slots = if (ratio - nearest).abs() < SNAP_TOLERANCE {
            nearest
        } else {
            ratio.ceil()
        };
        Some(slots.max(1.0) as usize)
    }

    /// Latest feasible start slot for a flight of `duration` slots, if any.
    pub fn last_start(&self, duration: usize) -> Option<usize> {
        (duration >= 1 && duration <= self.slots).then(|| self.slots - duration)
    }

    /// Start slots `t2` whose occupancy `[t2, t2 + duration)` covers slot `t`.
    ///
    /// This is `[max(0, t - duration + 1), min(t + 1, T))`. Starts beyond
    /// [`TimeGrid::last_start`] are included here; callers only find variables
    /// for the feasible ones.
    pub fn occupancy_window(&self, t: usize, duration: usize) -> Range<usize> {
        let lo = (t + 1).saturating_sub(duration);
        let hi = (t + 1).min(self.slots);
        lo..hi
    }
}
