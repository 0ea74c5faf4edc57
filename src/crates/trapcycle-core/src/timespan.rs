use crate::Fraction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open span of time `[begin, end)` used to query patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    pub begin: Fraction,
    pub end: Fraction,
}

impl TimeSpan {
    /// Create a new timespan
    pub fn new(begin: Fraction, end: Fraction) -> Self {
        TimeSpan { begin, end }
    }

    /// Create a timespan from two integers (whole numbers)
    pub fn from_ints(begin: i64, end: i64) -> Self {
        TimeSpan {
            begin: Fraction::from_int(begin),
            end: Fraction::from_int(end),
        }
    }

    /// The unit cycle `[n, n+1)` containing `time`
    pub fn cycle_of(time: Fraction) -> Self {
        let start = time.floor();
        TimeSpan::new(start, start + Fraction::from_int(1))
    }

    /// Get the duration of this timespan
    pub fn duration(&self) -> Fraction {
        self.end - self.begin
    }

    /// Check if this timespan contains a point in time
    pub fn contains(&self, time: Fraction) -> bool {
        time >= self.begin && time < self.end
    }

    /// Check if two timespans overlap
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    /// Get the intersection of two timespans, if it has non-zero width
    pub fn intersection(&self, other: &TimeSpan) -> Option<TimeSpan> {
        if !self.overlaps(other) {
            return None;
        }
        Some(TimeSpan::new(
            self.begin.max(other.begin),
            self.end.min(other.end),
        ))
    }

    /// Check if the timespan is empty (begin >= end)
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// Shift the timespan by an offset
    pub fn shift(&self, offset: Fraction) -> TimeSpan {
        TimeSpan::new(self.begin + offset, self.end + offset)
    }

    /// Scale the timespan by a factor
    pub fn scale(&self, factor: Fraction) -> TimeSpan {
        TimeSpan::new(self.begin * factor, self.end * factor)
    }

    /// Split into one sub-span per cycle touched, in ascending order
    ///
    /// Empty spans yield nothing.
    pub fn cycles(&self) -> Cycles {
        Cycles {
            cursor: self.begin,
            end: self.end,
        }
    }
}

/// Iterator returned by [`TimeSpan::cycles`]
#[derive(Debug, Clone)]
pub struct Cycles {
    cursor: Fraction,
    end: Fraction,
}

impl Iterator for Cycles {
    type Item = TimeSpan;

    fn next(&mut self) -> Option<TimeSpan> {
        if self.cursor >= self.end {
            return None;
        }
        let next_cycle = self.cursor.floor() + Fraction::from_int(1);
        let stop = next_cycle.min(self.end);
        let span = TimeSpan::new(self.cursor, stop);
        self.cursor = stop;
        Some(span)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.begin, self.end)
    }
}
