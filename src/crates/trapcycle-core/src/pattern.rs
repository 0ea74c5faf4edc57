use crate::{Fraction, Hap, TimeSpan, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;

/// A Pattern represents a time-varying sequence of values
///
/// Patterns are queried with a timespan and return the Haps (events) that
/// intersect it. A pattern holds no position of its own: the same span
/// always produces the same events, except for [`Pattern::degrade`].
pub struct Pattern {
    /// The query function that produces events for a given span
    query_func: Arc<dyn Fn(TimeSpan) -> Vec<Hap> + Send + Sync>,
}

impl Pattern {
    /// Create a new Pattern with a query function
    pub fn new<F>(query_func: F) -> Self
    where
        F: Fn(TimeSpan) -> Vec<Hap> + Send + Sync + 'static,
    {
        Pattern {
            query_func: Arc::new(query_func),
        }
    }

    /// Query this pattern over a span
    pub fn query(&self, span: TimeSpan) -> Vec<Hap> {
        if span.is_empty() {
            return Vec::new();
        }
        (self.query_func)(span)
    }

    /// Apply a function to each value in the pattern
    pub fn with_value<F>(self, func: F) -> Pattern
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.with_haps(move |haps| haps.into_iter().map(|hap| hap.with_value(&func)).collect())
    }

    /// Apply a function to query time (before querying)
    pub fn with_query_time<F>(self, func: F) -> Pattern
    where
        F: Fn(Fraction) -> Fraction + Send + Sync + 'static + Copy,
    {
        let query_func = self.query_func;
        Pattern::new(move |span| query_func(TimeSpan::new(func(span.begin), func(span.end))))
    }

    /// Apply a function to hap time (after querying)
    pub fn with_hap_time<F>(self, func: F) -> Pattern
    where
        F: Fn(Fraction) -> Fraction + Send + Sync + 'static + Copy,
    {
        self.with_haps(move |haps| {
            haps.into_iter()
                .map(|hap| hap.with_span(|ts| TimeSpan::new(func(ts.begin), func(ts.end))))
                .collect()
        })
    }

    /// Apply a function to all haps of each query at once
    pub fn with_haps<F>(self, func: F) -> Pattern
    where
        F: Fn(Vec<Hap>) -> Vec<Hap> + Send + Sync + 'static,
    {
        let query_func = self.query_func;
        Pattern::new(move |span| func(query_func(span)))
    }

    /// Split queries at cycle boundaries
    ///
    /// The wrapped query only ever sees spans inside a single cycle.
    pub fn split_queries(self) -> Pattern {
        let query_func = self.query_func;
        Pattern::new(move |span| span.cycles().flat_map(|cycle| query_func(cycle)).collect())
    }

    /// Speed up the pattern by a factor
    ///
    /// A zero or negative factor gives silence.
    pub fn fast(self, factor: Fraction) -> Pattern {
        if factor.is_zero() || factor.is_negative() {
            return crate::silence();
        }
        self.with_query_time(move |t| t * factor)
            .with_hap_time(move |t| t / factor)
    }

    /// Slow down the pattern by a factor, `slow(f) = fast(1/f)`
    pub fn slow(self, factor: Fraction) -> Pattern {
        if factor.is_zero() || factor.is_negative() {
            return crate::silence();
        }
        self.fast(factor.reciprocal())
    }

    /// Repeat each cycle n times before advancing
    ///
    /// Cycle `c` plays source cycle `floor(c / n)`. `n <= 0` gives silence.
    pub fn repeat_cycles(self, n: i64) -> Pattern {
        if n <= 0 {
            return crate::silence();
        }
        if n == 1 {
            return self;
        }

        let query_func = self.query_func;
        Pattern::new(move |span| {
            let cycle = span.begin.floor_int();
            let source_cycle = cycle.div_euclid(n);
            let delta = Fraction::from_int(cycle - source_cycle);

            query_func(span.shift(-delta))
                .into_iter()
                .map(|hap| hap.with_span(|ts| ts.shift(delta)))
                .collect()
        })
        .split_queries()
    }

    /// Replicate pattern n times within same timespan
    ///
    /// Implemented as `repeat_cycles(n).fast(n)`; each repetition plays a
    /// full source cycle squeezed into `1/n` of the slot.
    pub fn replicate(self, n: i64) -> Pattern {
        if n <= 0 {
            return crate::silence();
        }
        if n == 1 {
            return self;
        }
        self.repeat_cycles(n).fast(Fraction::from_int(n))
    }

    /// Keep each event with probability `keep`, using the thread RNG
    ///
    /// Not reproducible across queries; see [`Pattern::degrade_seeded`].
    pub fn degrade(self, keep: f64) -> Pattern {
        let keep = clamp_probability(keep);
        self.with_haps(move |haps| {
            let mut rng = rand::thread_rng();
            haps.into_iter().filter(|_| rng.gen::<f64>() < keep).collect()
        })
    }

    /// Keep each event with probability `keep`, reproducibly
    ///
    /// The decision is derived from `seed` and the event's onset time, so
    /// every fragment of one event shares it and re-querying a span gives
    /// the same result.
    pub fn degrade_seeded(self, keep: f64, seed: u64) -> Pattern {
        let keep = clamp_probability(keep);
        self.with_haps(move |haps| {
            haps.into_iter()
                .filter(|hap| {
                    let onset = hap.whole_or_part().begin;
                    let mut rng = StdRng::seed_from_u64(mix_seed(seed, onset));
                    rng.gen::<f64>() < keep
                })
                .collect()
        })
    }

    /// Shift the pattern later in time by `amount` cycles
    pub fn shift(self, amount: Fraction) -> Pattern {
        self.with_query_time(move |t| t - amount)
            .with_hap_time(move |t| t + amount)
    }

    /// Nudge pattern later in time
    pub fn late(self, amount: Fraction) -> Pattern {
        self.shift(amount)
    }

    /// Nudge pattern earlier in time
    pub fn early(self, amount: Fraction) -> Pattern {
        self.shift(-amount)
    }

    /// Drop events whose value matches the predicate
    pub fn filter_values<F>(self, keep: F) -> Pattern
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.with_haps(move |haps| haps.into_iter().filter(|hap| keep(&hap.value)).collect())
    }
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        return 0.0;
    }
    p.clamp(0.0, 1.0)
}

// splitmix64 finaliser over the seed and the exact onset
fn mix_seed(seed: u64, onset: Fraction) -> u64 {
    let mut z = seed
        ^ (onset.numerator as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (onset.denominator as u64).rotate_left(32);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// Implement Clone for Pattern
impl Clone for Pattern {
    fn clone(&self) -> Self {
        Pattern {
            query_func: self.query_func.clone(),
        }
    }
}

impl Default for Pattern {
    fn default() -> Self {
        crate::silence()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern").finish_non_exhaustive()
    }
}
