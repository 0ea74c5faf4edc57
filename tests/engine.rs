use proptest::prelude::*;
use trapcycle::{ChainOptions, Engine, EngineConfig, Voice};
use trapcycle_bus::{Control, RecordingTrigger};

fn engine(units_per_beat: f64, history_limit: usize) -> Engine<RecordingTrigger> {
    let config = EngineConfig {
        units_per_beat,
        history_limit,
        seed: Some(3),
        ..EngineConfig::default()
    };
    Engine::new(config, RecordingTrigger::new())
}

#[test]
fn chains_tick_in_registration_order() {
    let mut engine = engine(1.0, 10);
    engine.note("0", ChainOptions::new().cycle(1.0).root(60)).unwrap();
    engine.note("0", ChainOptions::new().cycle(1.0).root(48)).unwrap();
    engine.note("0", ChainOptions::new().cycle(1.0).root(72)).unwrap();

    engine.update();
    assert_eq!(engine.trigger().pitches(), vec![60, 48, 72]);
}

#[test]
fn tempo_change_latches_at_cycle_boundary() {
    let beats = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(4.0f64.to_bits()));
    let source = std::sync::Arc::clone(&beats);
    let cycle = Control::dynamic(move || f64::from_bits(source.load(std::sync::atomic::Ordering::Relaxed)));

    let mut engine = engine(1.0, 10);
    let id = engine.note("0 1 2 3", ChainOptions::new().cycle(cycle)).unwrap();

    // Two steps into a four-beat cycle, ask for two-beat cycles
    engine.update();
    engine.update();
    beats.store(2.0f64.to_bits(), std::sync::atomic::Ordering::Relaxed);
    engine.update();
    engine.update();

    // The first cycle still takes four steps
    assert_eq!(engine.trigger().pitches(), vec![60, 61, 62, 63]);
    let chain = engine.chain(id).unwrap();
    assert_eq!(chain.borrow().state().cycle, 0);

    // Then two steps per cycle: two onsets per step
    engine.update();
    assert_eq!(engine.trigger().len(), 6);
    engine.update();
    assert_eq!(engine.trigger().len(), 8);
    assert_eq!(chain.borrow().state().cycle, 1);
}

#[test]
fn released_batches_are_grouped_and_bounded() {
    let mut engine = engine(4.0, 2);

    for voice_id in 0..3u64 {
        let voice = Voice::new(voice_id, 60).with_cycle(1.0);
        for pattern in ["0", "4", "7"] {
            engine
                .voice_n(&voice, pattern, ChainOptions::new().bus("pad").mute(true))
                .unwrap();
        }
        engine.update();
        assert_eq!(engine.release_voice(voice_id), 3);
    }

    let bus = engine.bus("pad");
    assert_eq!(bus.history().len(), 2);
    assert_eq!(bus.last(0).len(), 3);
    assert_eq!(bus.history_steps(), vec![3, 2]);
}

#[test]
fn chain_stopped_from_another_chains_turn_is_skipped() {
    let mut engine = engine(4.0, 10);
    let first = engine.note("0", ChainOptions::new().cycle(1.0)).unwrap();
    let second = engine.note("7", ChainOptions::new().cycle(1.0)).unwrap();

    engine.chain(second).unwrap().borrow_mut().stop();
    engine.update();

    assert_eq!(engine.trigger().pitches(), vec![60]);
    assert!(engine.chain(first).is_some());
    assert!(engine.chain(second).is_none());
}

proptest! {
    #[test]
    fn every_note_fires_once_per_cycle(ppq in 1u32..12, cycle in 1u32..6, cycles in 1u64..4) {
        let mut engine = engine(ppq as f64, 10);
        engine
            .note("0 [2 4] <5 7>", ChainOptions::new().cycle(cycle as f64))
            .unwrap();

        let ticks = ppq as u64 * cycle as u64 * cycles;
        for _ in 0..ticks {
            engine.update();
        }

        prop_assert_eq!(engine.trigger().len() as u64, 4 * cycles);
        for note in engine.trigger().notes() {
            prop_assert!(note.duration_beats >= 0.01);
        }
    }
}
