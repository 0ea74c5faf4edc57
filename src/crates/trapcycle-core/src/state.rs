use crate::error::TimeError;
use crate::{Fraction, TimeSpan};
use serde::{Deserialize, Serialize};

/// Smallest cycle length (in beats) a running pattern accepts
pub const MIN_CYCLE_BEATS: f64 = 0.01;

/// Cycle lengths this close to an integer snap to it
pub const CYCLE_SNAP_TOLERANCE: f64 = 0.001;

/// Smallest accepted units-per-beat resolution
pub const MIN_UNITS_PER_BEAT: f64 = 1.0;

/// Most steps a single cycle can be divided into
pub const MAX_TICKS_PER_CYCLE: i64 = 1 << 31;

/// Clamp and snap a live cycle length into an exact rational
///
/// Non-finite or too-small values fall back to [`MIN_CYCLE_BEATS`]. Values
/// within [`CYCLE_SNAP_TOLERANCE`] of an integer are snapped, absorbing the
/// float noise of knob automation.
pub fn normalize_cycle_beats(cycle_beats: f64) -> Fraction {
    let mut beats = if cycle_beats.is_finite() {
        cycle_beats.max(MIN_CYCLE_BEATS)
    } else {
        MIN_CYCLE_BEATS
    };
    let rounded = beats.round();
    if (beats - rounded).abs() < CYCLE_SNAP_TOLERANCE && rounded > 0.0 {
        beats = rounded;
    }
    Fraction::from_float(beats)
}

fn normalize_units_per_beat(units_per_beat: f64) -> f64 {
    if units_per_beat.is_finite() && units_per_beat >= MIN_UNITS_PER_BEAT {
        units_per_beat
    } else {
        MIN_UNITS_PER_BEAT
    }
}

/// Whole steps in one cycle, rounded and kept in `1..=MAX_TICKS_PER_CYCLE`
///
/// The phase only ever moves in multiples of `1 / ticks_per_cycle`, which
/// keeps its denominator bounded however the cycle length is automated.
pub fn ticks_per_cycle(units_per_beat: f64, cycle_beats: Fraction) -> i64 {
    let ticks = (normalize_units_per_beat(units_per_beat) * cycle_beats.to_float()).round();
    if ticks.is_nan() {
        return 1;
    }
    // `as` saturates, so huge lengths land on the upper bound
    (ticks as i64).clamp(1, MAX_TICKS_PER_CYCLE)
}

/// Drop the part of `phase` that falls between two steps of a `ticks` grid
fn snap_to_grid(phase: Fraction, ticks: i64) -> Result<Fraction, TimeError> {
    let offset = phase.fract().checked_mul(Fraction::from_int(ticks))?.floor_int();
    phase.floor().checked_add(Fraction::new(offset, ticks))
}

/// Playback position of one running pattern instance
///
/// Patterns carry no position of their own; all of it lives here. The
/// cycle length is latched: a new value only takes over once the phase
/// crosses an integer cycle boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    running: bool,
    /// Elapsed cycles since start
    phase: Fraction,
    last_step: Option<i64>,
    /// End of the last queried arc
    horizon: Fraction,
    latched_cycle_beats: Option<Fraction>,
    pending_cycle_beats: Option<Fraction>,
}

impl PlaybackState {
    /// A stopped state at phase zero
    pub fn new() -> Self {
        PlaybackState {
            running: false,
            phase: Fraction::default(),
            last_step: None,
            horizon: Fraction::default(),
            latched_cycle_beats: None,
            pending_cycle_beats: None,
        }
    }

    /// Start playback, optionally anchored at an external step
    pub fn start(&mut self, step: Option<i64>) {
        self.reset(step);
        self.running = true;
    }

    /// Stop playback; further advances return nothing
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Rewind to phase zero and drop the latched cycle length
    pub fn reset(&mut self, step: Option<i64>) {
        self.phase = Fraction::default();
        self.horizon = Fraction::default();
        self.last_step = step;
        self.latched_cycle_beats = None;
        self.pending_cycle_beats = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> Fraction {
        self.phase
    }

    /// Index of the cycle the phase is in
    pub fn cycle(&self) -> i64 {
        self.phase.floor_int()
    }

    pub fn last_step(&self) -> Option<i64> {
        self.last_step
    }

    pub fn latched_cycle_beats(&self) -> Option<Fraction> {
        self.latched_cycle_beats
    }

    pub fn pending_cycle_beats(&self) -> Option<Fraction> {
        self.pending_cycle_beats
    }

    /// Advance to `step` and return the arc that must be queried for it
    ///
    /// Returns `Ok(None)` while stopped, and for a step that does not move
    /// forward after the first advance. Consecutive arcs are contiguous, so
    /// skipped steps are covered and no time is queried twice: the arc runs
    /// from the end of the previous one to one step past the new phase.
    ///
    /// On the tick that crosses a cycle boundary the pending cycle length is
    /// latched, the phase is snapped down onto the new cycle's step grid and
    /// the arc ends one *new* step past it. Away from boundaries, and at a
    /// boundary where the length did not change, a single step yields
    /// exactly `[phase, phase + 1 / ticks_per_cycle)`.
    ///
    /// Fails with [`TimeError::Overflow`] if the phase no longer fits.
    pub fn advance(
        &mut self,
        step: i64,
        units_per_beat: f64,
        cycle_beats: f64,
    ) -> Result<Option<TimeSpan>, TimeError> {
        if !self.running {
            return Ok(None);
        }

        let incoming = normalize_cycle_beats(cycle_beats);

        let first = self.latched_cycle_beats.is_none();
        if first {
            self.latched_cycle_beats = Some(incoming);
            self.phase = Fraction::default();
            self.horizon = Fraction::default();
        }
        self.pending_cycle_beats = Some(incoming);

        let latched = self.latched_cycle_beats.unwrap_or(incoming);
        let mut increment = Fraction::new(1, ticks_per_cycle(units_per_beat, latched));

        let elapsed = match self.last_step {
            Some(last) => step - last,
            None => 0,
        };
        if !first && elapsed <= 0 {
            return Ok(None);
        }

        let cycle_before = self.phase.floor_int();
        if elapsed > 0 {
            let advanced = increment.checked_mul(Fraction::from_int(elapsed))?;
            self.phase = self.phase.checked_add(advanced)?;
        }
        if self.last_step.is_none() || elapsed > 0 {
            self.last_step = Some(step);
        }

        if self.phase.floor_int() > cycle_before {
            self.latched_cycle_beats = self.pending_cycle_beats;
            let ticks = ticks_per_cycle(units_per_beat, self.latched_cycle_beats.unwrap_or(incoming));
            increment = Fraction::new(1, ticks);
            self.phase = snap_to_grid(self.phase, ticks)?;
        }

        // A finer resolution can leave the new end behind the horizon
        let end = self.phase.checked_add(increment)?.max(self.horizon);
        let arc = TimeSpan::new(self.horizon, end);
        self.horizon = end;
        Ok(Some(arc))
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}
