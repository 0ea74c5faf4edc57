use crate::{Fraction, Hap, Pattern, TimeSpan, Value};
use std::sync::Arc;

/// Create a pattern with one event per cycle
///
/// The event's whole is the cycle `[n, n+1)`; its part is the slice of that
/// cycle inside the query.
pub fn pure(value: Value) -> Pattern {
    Pattern::new(move |span| {
        span.cycles()
            .map(|part| Hap::new(Some(TimeSpan::cycle_of(part.begin)), part, value))
            .collect()
    })
}

/// Create an empty/silent pattern
///
/// Returns no events for any query
pub fn silence() -> Pattern {
    Pattern::new(|_span| Vec::new())
}

/// Switch between patterns successively per cycle
///
/// Cycle `c` is answered by pattern `c mod n`, queried with the unmodified
/// span, so each child keeps its own position on the time axis.
pub fn slowcat(patterns: Vec<Pattern>) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }

    let pat_count = patterns.len() as i64;
    let patterns_rc = Arc::new(patterns);

    Pattern::new(move |span| {
        let index = span.begin.floor_int().rem_euclid(pat_count) as usize;
        match patterns_rc.get(index) {
            Some(pat) => pat.query(span),
            None => Vec::new(),
        }
    })
    .split_queries()
}

/// Divide each cycle into equal slots, one per pattern
///
/// This is also known as "fastcat".
pub fn sequence(patterns: Vec<Pattern>) -> Pattern {
    if patterns.len() == 1 {
        return patterns.into_iter().next().unwrap_or_default();
    }
    weighted_sequence(
        patterns
            .into_iter()
            .map(|p| (p, Fraction::from_int(1)))
            .collect(),
    )
}

/// Alias for sequence
pub fn fastcat(patterns: Vec<Pattern>) -> Pattern {
    sequence(patterns)
}

/// Divide each cycle into slots proportional to the given weights
///
/// Slot boundaries sit at the cumulative weight fractions of the total.
/// Entries with zero or negative weight take no time and are dropped.
pub fn weighted_sequence(entries: Vec<(Pattern, Fraction)>) -> Pattern {
    let entries: Vec<(Pattern, Fraction)> = entries
        .into_iter()
        .filter(|(_, w)| !w.is_zero() && !w.is_negative())
        .collect();

    let total = entries
        .iter()
        .fold(Fraction::from_int(0), |acc, (_, w)| acc + *w);
    if total.is_zero() {
        return silence();
    }

    // (pattern, slot offset, slot width) within a unit cycle
    let mut slots = Vec::with_capacity(entries.len());
    let mut cumulative = Fraction::from_int(0);
    for (pattern, weight) in entries {
        slots.push((pattern, cumulative / total, weight / total));
        cumulative = cumulative + weight;
    }
    let slots = Arc::new(slots);

    Pattern::new(move |span| {
        let cycle = span.begin.floor();
        let mut haps = Vec::new();

        for (pattern, offset, width) in slots.iter() {
            let (offset, width) = (*offset, *width);
            let slot_begin = cycle + offset;
            let slot = TimeSpan::new(slot_begin, slot_begin + width);
            let Some(active) = span.intersection(&slot) else {
                continue;
            };

            // Child sees its own cycle `cycle`, stretched over the slot
            let to_local = |t: Fraction| cycle + (t - slot_begin) / width;
            let to_parent = |t: Fraction| slot_begin + (t - cycle) * width;

            let local = TimeSpan::new(to_local(active.begin), to_local(active.end));
            haps.extend(pattern.query(local).into_iter().map(|hap| {
                hap.with_span(|ts| TimeSpan::new(to_parent(ts.begin), to_parent(ts.end)))
            }));
        }

        haps
    })
    .split_queries()
}

/// Stack/layer multiple patterns on top of each other
///
/// Every pattern is queried with the same span; results are concatenated in
/// the order given.
pub fn stack(patterns: Vec<Pattern>) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }

    let patterns_rc = Arc::new(patterns);
    Pattern::new(move |span| patterns_rc.iter().flat_map(|pat| pat.query(span)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Pattern {
        pure(Value::Number(n))
    }

    fn wholes(haps: &[Hap]) -> Vec<(Fraction, Fraction)> {
        haps.iter()
            .filter_map(|h| h.whole.map(|w| (w.begin, w.end)))
            .collect()
    }

    #[test]
    fn test_pure_one_event_per_cycle() {
        let haps = num(1.0).query(TimeSpan::new(Fraction::new(1, 2), Fraction::new(5, 2)));
        assert_eq!(haps.len(), 3);
        assert_eq!(haps[0].whole, Some(TimeSpan::from_ints(0, 1)));
        assert_eq!(haps[0].part, TimeSpan::new(Fraction::new(1, 2), Fraction::from_int(1)));
        assert!(!haps[0].has_onset());
        assert!(haps[1].has_onset());
        assert_eq!(haps[2].whole, Some(TimeSpan::from_ints(2, 3)));
    }

    #[test]
    fn test_silence() {
        assert!(silence().query(TimeSpan::from_ints(0, 10)).is_empty());
    }

    #[test]
    fn test_sequence_across_two_cycles() {
        let pattern = sequence(vec![num(1.0), num(2.0)]);
        let haps = pattern.query(TimeSpan::from_ints(0, 2));

        let values: Vec<_> = haps.iter().map(|h| h.value).collect();
        assert_eq!(
            values,
            vec![
                Value::Number(1.0),
                Value::Number(2.0),
                Value::Number(1.0),
                Value::Number(2.0)
            ]
        );
        assert_eq!(
            wholes(&haps),
            vec![
                (Fraction::from_int(0), Fraction::new(1, 2)),
                (Fraction::new(1, 2), Fraction::from_int(1)),
                (Fraction::from_int(1), Fraction::new(3, 2)),
                (Fraction::new(3, 2), Fraction::from_int(2)),
            ]
        );
    }

    #[test]
    fn test_sequence_partial_query() {
        let pattern = sequence(vec![num(0.0), num(1.0), num(2.0), num(3.0)]);
        let haps = pattern.query(TimeSpan::new(Fraction::new(3, 8), Fraction::new(5, 8)));
        assert_eq!(haps.len(), 2);
        assert!(!haps[0].has_onset());
        assert!(haps[1].has_onset());
        assert_eq!(haps[1].part, TimeSpan::new(Fraction::new(1, 2), Fraction::new(5, 8)));
    }

    #[test]
    fn test_weighted_sequence() {
        let pattern = weighted_sequence(vec![
            (num(1.0), Fraction::from_int(3)),
            (num(2.0), Fraction::from_int(1)),
            (num(9.0), Fraction::from_int(0)),
        ]);
        let haps = pattern.query(TimeSpan::from_ints(0, 1));
        assert_eq!(
            wholes(&haps),
            vec![
                (Fraction::from_int(0), Fraction::new(3, 4)),
                (Fraction::new(3, 4), Fraction::from_int(1)),
            ]
        );
        assert!(weighted_sequence(vec![(num(1.0), Fraction::from_int(0))])
            .query(TimeSpan::from_ints(0, 1))
            .is_empty());
    }

    #[test]
    fn test_nested_sequence_sees_parent_cycle() {
        let inner = slowcat(vec![num(1.0), num(2.0)]);
        let pattern = sequence(vec![num(0.0), inner]);
        let second = pattern.query(TimeSpan::from_ints(1, 2));
        assert_eq!(second[1].value, Value::Number(2.0));
    }

    #[test]
    fn test_slowcat_alternates_per_cycle() {
        let pattern = slowcat(vec![num(1.0), num(2.0), num(3.0)]);
        let values: Vec<_> = pattern
            .query(TimeSpan::from_ints(-1, 4))
            .iter()
            .map(|h| h.value)
            .collect();
        assert_eq!(
            values,
            vec![
                Value::Number(3.0),
                Value::Number(1.0),
                Value::Number(2.0),
                Value::Number(3.0),
                Value::Number(1.0)
            ]
        );
    }

    #[test]
    fn test_stack() {
        let combined = stack(vec![num(1.0), num(2.0)]);
        let haps = combined.query(TimeSpan::from_ints(0, 1));
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].value, Value::Number(1.0));
        assert_eq!(haps[1].value, Value::Number(2.0));
        assert_eq!(haps[0].whole, haps[1].whole);
    }
}
