use crate::{Fraction, TimeSpan, Value};
use serde::{Deserialize, Serialize};

/// A Hap (Happening/Event) represents a value active during a timespan
///
/// The 'part' is the fragment of the event that falls inside the query, which
/// may be smaller than the 'whole' if the event is cut by the query edges.
/// The 'part' never extends outside the 'whole'. A `None` whole marks a value
/// without a logical start, which never fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hap {
    /// The full logical timespan of the event
    pub whole: Option<TimeSpan>,

    /// The active fragment timespan (always present)
    pub part: TimeSpan,

    /// The value of this event
    pub value: Value,
}

/// Alias used by the scheduler and chain layers
pub type Event = Hap;

impl Hap {
    /// Create a new Hap with the given timespans and value
    pub fn new(whole: Option<TimeSpan>, part: TimeSpan, value: Value) -> Self {
        Hap { whole, part, value }
    }

    /// Get the whole timespan or fall back to part
    pub fn whole_or_part(&self) -> TimeSpan {
        self.whole.unwrap_or(self.part)
    }

    /// True when this fragment carries the start of its whole
    pub fn has_onset(&self) -> bool {
        match self.whole {
            Some(w) => w.begin == self.part.begin,
            None => false,
        }
    }

    /// Apply a function to the value, returning a new Hap
    pub fn with_value<F>(&self, func: F) -> Hap
    where
        F: FnOnce(&Value) -> Value,
    {
        Hap {
            whole: self.whole,
            part: self.part,
            value: func(&self.value),
        }
    }

    /// Apply a function to both timespans, returning a new Hap
    pub fn with_span<F>(&self, func: F) -> Hap
    where
        F: Fn(&TimeSpan) -> TimeSpan,
    {
        Hap {
            whole: self.whole.map(|w| func(&w)),
            part: func(&self.part),
            value: self.value,
        }
    }

    /// Get the duration of this event
    pub fn duration(&self) -> Fraction {
        self.whole_or_part().duration()
    }
}
