use crate::error::TimeError;
use crate::{Fraction, Hap, Pattern, PlaybackState};

/// Drives a pattern from an external step counter
///
/// Pairs an immutable [`Pattern`] with its [`PlaybackState`]. Each
/// [`Scheduler::tick`] turns the elapsed steps into a rational arc, queries
/// the pattern over it and keeps only the events that start there.
#[derive(Debug, Clone)]
pub struct Scheduler {
    pattern: Pattern,
    state: PlaybackState,
}

impl Scheduler {
    /// Create a stopped scheduler for a pattern
    pub fn new(pattern: Pattern) -> Self {
        Scheduler {
            pattern,
            state: PlaybackState::new(),
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Start playback, optionally anchored at the current step
    pub fn start(&mut self, step: Option<i64>) -> &mut Self {
        self.state.start(step);
        self
    }

    pub fn stop(&mut self) -> &mut Self {
        self.state.stop();
        self
    }

    /// Rewind to phase zero, keeping the pattern and the running flag
    pub fn reset(&mut self, step: Option<i64>) -> &mut Self {
        self.state.reset(step);
        self
    }

    /// Advance to `step` and return the onset events for the elapsed time
    ///
    /// Rests and fragments without an onset are filtered out. A stopped
    /// scheduler, or a step that does not move forward, yields nothing.
    pub fn tick(
        &mut self,
        step: i64,
        units_per_beat: f64,
        cycle_beats: f64,
    ) -> Result<Vec<Hap>, TimeError> {
        let haps = match self.state.advance(step, units_per_beat, cycle_beats)? {
            Some(arc) => self
                .pattern
                .query(arc)
                .into_iter()
                .filter(|hap| hap.has_onset() && !hap.value.is_rest())
                .collect(),
            None => Vec::new(),
        };
        Ok(haps)
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn phase(&self) -> Fraction {
        self.state.phase()
    }

    pub fn cycle(&self) -> i64 {
        self.state.cycle()
    }

    /// Cycle length currently in effect, once the first tick has latched one
    pub fn latched_cycle_beats(&self) -> Option<Fraction> {
        self.state.latched_cycle_beats()
    }
}
