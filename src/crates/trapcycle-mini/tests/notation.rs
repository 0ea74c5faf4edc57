use proptest::prelude::*;
use trapcycle_core::{Fraction, TimeSpan};
use trapcycle_mini::{compile, compile_seeded, parse};

proptest! {
    #[test]
    fn flat_sequence_has_one_onset_per_element(degrees in prop::collection::vec(-20i32..20, 1..12)) {
        let source = degrees.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(" ");
        let pattern = compile(&source).unwrap();
        let haps: Vec<_> = pattern
            .query(TimeSpan::from_ints(0, 1))
            .into_iter()
            .filter(|h| h.has_onset())
            .collect();

        prop_assert_eq!(haps.len(), degrees.len());
        let n = degrees.len() as i64;
        for hap in &haps {
            prop_assert_eq!(hap.part.end - hap.part.begin, Fraction::new(1, n));
        }
    }

    #[test]
    fn slowcat_visits_every_element_in_order(degrees in prop::collection::vec(0i32..10, 1..8), start in 0i64..16) {
        let source = format!(
            "<{}>",
            degrees.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(" ")
        );
        let pattern = compile(&source).unwrap();
        let n = degrees.len() as i64;

        for cycle in start..start + n {
            let haps = pattern.query(TimeSpan::from_ints(cycle, cycle + 1));
            prop_assert_eq!(haps.len(), 1);
            let expected = degrees[cycle.rem_euclid(n) as usize] as f64;
            prop_assert_eq!(haps[0].value.as_number(), Some(expected));
        }
    }

    #[test]
    fn nested_alternation_advances_on_its_own_turns(inner in prop::collection::vec(0i32..10, 1..5), outer in 10i32..20, start in 0i64..16) {
        let source = format!(
            "<<{}> {}>",
            inner.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(" "),
            outer
        );
        let pattern = compile(&source).unwrap();

        for cycle in start..start + 2 * inner.len() as i64 {
            let haps = pattern.query(TimeSpan::from_ints(cycle, cycle + 1));
            prop_assert_eq!(haps.len(), 1);
            let expected = if cycle % 2 == 0 {
                inner[(cycle / 2).rem_euclid(inner.len() as i64) as usize]
            } else {
                outer
            };
            prop_assert_eq!(haps[0].value.as_number(), Some(expected as f64));
        }
    }

    #[test]
    fn seeded_patterns_are_referentially_transparent(seed in any::<u64>(), begin in 0i64..32) {
        let pattern = compile_seeded("[0 1 2 3]? <4 5>*2?0.3, 7", seed).unwrap();
        let span = TimeSpan::from_ints(begin, begin + 1);
        prop_assert_eq!(pattern.query(span), pattern.query(span));
    }

    #[test]
    fn parser_never_panics(source in "[0-9a-g~ \\[\\]<>,*/@!?.#-]{0,24}") {
        let _ = parse(&source);
    }
}
