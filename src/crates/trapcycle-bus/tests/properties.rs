use proptest::prelude::*;
use trapcycle_bus::{BusRegistry, PatternChain, PitchResolver, RecordingTrigger};
use trapcycle_mini::compile;

proptest! {
    #[test]
    fn history_never_exceeds_limit(
        releases in prop::collection::vec(0i64..6, 0..40),
        limit in 0usize..5,
    ) {
        let mut bus = BusRegistry::new("prop");
        bus.set_history_limit(limit);

        let mut step = 0;
        for gap in releases {
            step += gap;
            let id = bus.register(step, step);
            prop_assert!(bus.release(id, step));
            prop_assert!(bus.history().len() <= limit);
        }

        let steps = bus.history_steps();
        prop_assert!(steps.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn chain_fires_each_onset_once(
        degrees in prop::collection::vec(0i32..12, 1..8),
        ppq in 1u32..8,
        cycle in 1u32..5,
        cycles in 1i64..4,
    ) {
        let source = degrees.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(" ");
        let mut chain = PatternChain::new(
            compile(&source).unwrap(),
            PitchResolver::Chromatic { root: 60 },
            cycle as f64,
        );
        chain.start(Some(0));
        let mut rec = RecordingTrigger::new();

        let steps = ppq as i64 * cycle as i64 * cycles;
        for step in 0..steps {
            chain.tick(step, ppq as f64, &mut rec);
        }

        let expected: Vec<i32> = (0..cycles)
            .flat_map(|_| degrees.iter().map(|d| 60 + d))
            .collect();
        prop_assert_eq!(rec.pitches(), expected);
    }
}
