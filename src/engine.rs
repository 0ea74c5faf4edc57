//! The driver-owned context holding every running chain
//!
//! An [`Engine`] is created when the host's driver loop starts and dropped
//! (or [`Engine::shutdown`]) when it stops. The host calls
//! [`Engine::update`] once per external tick.

use crate::config::EngineConfig;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info};
use trapcycle_bus::{
    BusRegistry, Control, ParentVoice, PatternChain, PitchResolver, Trigger, VoiceId,
};
use trapcycle_core::{scales, Pattern, Registry, Scale, ScaleError};
use trapcycle_mini::{compile, compile_seeded, ParseError};

/// Shared handle to a chain; buses and the engine point at the same chain
pub type ChainHandle = Rc<RefCell<PatternChain>>;

/// Engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Scale(#[from] ScaleError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Identifier of a chain inside one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain#{}", self.0)
    }
}

/// Per-chain settings; unset fields fall back to the voice or the config
#[derive(Debug, Clone, Default)]
pub struct ChainOptions {
    pub cycle_beats: Option<Control>,
    pub root: Option<Control>,
    /// `root:name`, e.g. `c5:major`
    pub scale: Option<String>,
    pub mute: bool,
    pub bus: Option<String>,
    pub parent: Option<ParentVoice>,
    pub velocity: Option<Control>,
    pub pan: Option<Control>,
    pub length: Option<Control>,
}

impl ChainOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycle(mut self, beats: impl Into<Control>) -> Self {
        self.cycle_beats = Some(beats.into());
        self
    }

    pub fn root(mut self, root: impl Into<Control>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn scale(mut self, scale: impl Into<String>) -> Self {
        self.scale = Some(scale.into());
        self
    }

    pub fn mute(mut self, mute: bool) -> Self {
        self.mute = mute;
        self
    }

    pub fn bus(mut self, name: impl Into<String>) -> Self {
        self.bus = Some(name.into());
        self
    }

    pub fn parent(mut self, parent: ParentVoice) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn velocity(mut self, velocity: impl Into<Control>) -> Self {
        self.velocity = Some(velocity.into());
        self
    }

    pub fn pan(mut self, pan: impl Into<Control>) -> Self {
        self.pan = Some(pan.into());
        self
    }

    pub fn length(mut self, beats: impl Into<Control>) -> Self {
        self.length = Some(beats.into());
        self
    }
}

/// An incoming host voice that patterns can be bound to
#[derive(Debug, Clone)]
pub struct Voice {
    pub id: ParentVoice,
    /// Pitch of the incoming note; the chromatic root of bound patterns
    pub note: i32,
    pub cycle_beats: Control,
    pub scale: Option<String>,
}

impl Voice {
    pub fn new(id: ParentVoice, note: i32) -> Self {
        Voice {
            id,
            note,
            cycle_beats: Control::from(4.0),
            scale: None,
        }
    }

    pub fn with_cycle(mut self, beats: impl Into<Control>) -> Self {
        self.cycle_beats = beats.into();
        self
    }

    pub fn with_scale(mut self, scale: impl Into<String>) -> Self {
        self.scale = Some(scale.into());
        self
    }
}

struct Entry {
    chain: ChainHandle,
    bus: Option<(String, VoiceId)>,
    parent: Option<ParentVoice>,
}

pub struct Engine<T: Trigger> {
    config: EngineConfig,
    scales: Registry<Vec<i32>>,
    tick: i64,
    next_id: u64,
    chains: Vec<(ChainId, Entry)>,
    buses: BTreeMap<String, BusRegistry<ChainHandle>>,
    voice_chains: HashMap<ParentVoice, Vec<ChainId>>,
    trigger: T,
}

impl<T: Trigger> Engine<T> {
    pub fn new(config: EngineConfig, trigger: T) -> Self {
        let config = config.normalized();
        info!(
            units_per_beat = config.units_per_beat,
            history_limit = config.history_limit,
            "engine started"
        );

        Engine {
            config,
            scales: scales(),
            tick: 0,
            next_id: 0,
            chains: Vec::new(),
            buses: BTreeMap::new(),
            voice_chains: HashMap::new(),
            trigger,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Step the next [`Engine::update`] will process
    pub fn tick(&self) -> i64 {
        self.tick
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    pub fn trigger_mut(&mut self) -> &mut T {
        &mut self.trigger
    }

    /// Scale table used for `root:name` lookups; extend it with `add`
    pub fn scales_mut(&mut self) -> &mut Registry<Vec<i32>> {
        &mut self.scales
    }

    /// Start a standalone pattern
    ///
    /// Numbers are offsets from `root` (or the configured default root)
    /// unless a scale is given, in which case they are degrees.
    pub fn note(&mut self, pattern: &str, options: ChainOptions) -> Result<ChainId> {
        let compiled = self.compile(pattern)?;
        let scale = self.parse_scale(options.scale.as_deref())?;
        let root = options
            .root
            .clone()
            .unwrap_or_else(|| Control::from(self.config.default_root));
        let cycle = options
            .cycle_beats
            .clone()
            .unwrap_or_else(|| Control::from(self.config.default_cycle_beats));

        debug!(pattern, scale = ?options.scale, "note chain");
        Ok(self.spawn(compiled, scale, root, cycle, options))
    }

    /// Start a pattern bound to an incoming voice
    ///
    /// Cycle length and scale are inherited from the voice unless the
    /// options override them; in chromatic mode the voice's note is the root.
    pub fn voice_n(&mut self, voice: &Voice, pattern: &str, options: ChainOptions) -> Result<ChainId> {
        let compiled = self.compile(pattern)?;
        let scale_text = options.scale.clone().or_else(|| voice.scale.clone());
        let scale = self.parse_scale(scale_text.as_deref())?;
        let cycle = options
            .cycle_beats
            .clone()
            .unwrap_or_else(|| voice.cycle_beats.clone());
        let root = Control::from(voice.note);

        debug!(
            pattern,
            voice = voice.id,
            root = voice.note,
            scale = scale_text.as_deref().unwrap_or("chromatic"),
            "voice chain"
        );
        let options = ChainOptions {
            parent: Some(voice.id),
            ..options
        };
        Ok(self.spawn(compiled, scale, root, cycle, options))
    }

    fn compile(&self, pattern: &str) -> Result<Pattern> {
        Ok(match self.config.seed {
            Some(seed) => compile_seeded(pattern, seed)?,
            None => compile(pattern)?,
        })
    }

    fn parse_scale(&self, text: Option<&str>) -> Result<Option<Scale>> {
        match text {
            Some(text) => Ok(Some(Scale::parse(text, &self.scales)?)),
            None => Ok(None),
        }
    }

    fn spawn(
        &mut self,
        pattern: Pattern,
        scale: Option<Scale>,
        root: Control,
        cycle: Control,
        options: ChainOptions,
    ) -> ChainId {
        let resolver = match scale {
            Some(scale) => PitchResolver::Scale(scale),
            None => PitchResolver::Chromatic {
                root: root.value().trunc() as i32,
            },
        };

        let mut chain = PatternChain::new(pattern, resolver, cycle)
            .with_root(root)
            .with_mute(options.mute)
            .with_parent(options.parent)
            .with_velocity(
                options
                    .velocity
                    .unwrap_or_else(|| Control::from(self.config.default_velocity)),
            );
        if let Some(pan) = options.pan {
            chain.set_pan(pan);
        }
        if let Some(length) = options.length {
            chain.set_length(length);
        }
        chain.start(Some(self.tick));

        let handle: ChainHandle = Rc::new(RefCell::new(chain));
        self.next_id += 1;
        let id = ChainId(self.next_id);

        let tick = self.tick;
        let bus = match options.bus {
            Some(name) => {
                let voice_id = self.bus(&name).register(Rc::clone(&handle), tick);
                Some((name, voice_id))
            }
            None => None,
        };
        if let Some(parent) = options.parent {
            self.voice_chains.entry(parent).or_default().push(id);
        }

        info!(%id, tick = self.tick, bus = ?bus.as_ref().map(|(n, _)| n), "chain registered");
        self.chains.push((
            id,
            Entry {
                chain: handle,
                bus,
                parent: options.parent,
            },
        ));
        id
    }

    /// Tick every running chain in registration order, then advance the step
    ///
    /// Iterates over a snapshot of ids, so a chain stopped during the pass
    /// is skipped and dropped without disturbing the others.
    pub fn update(&mut self) {
        let ids: Vec<ChainId> = self.chains.iter().map(|(id, _)| *id).collect();

        for id in ids {
            let Some(chain) = self.chain(id) else {
                continue;
            };
            if !chain.borrow().is_running() {
                self.unregister(id);
                continue;
            }
            chain
                .borrow_mut()
                .tick(self.tick, self.config.units_per_beat, &mut self.trigger);
        }

        self.tick += 1;
    }

    pub fn chain(&self, id: ChainId) -> Option<ChainHandle> {
        self.chains
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, entry)| Rc::clone(&entry.chain))
    }

    /// Ids of the registered chains in registration order
    pub fn chain_ids(&self) -> Vec<ChainId> {
        self.chains.iter().map(|(id, _)| *id).collect()
    }

    /// Stop a chain and remove it from its bus
    pub fn stop_chain(&mut self, id: ChainId) -> bool {
        match self.unregister(id) {
            Some(entry) => {
                entry.chain.borrow_mut().stop();
                true
            }
            None => false,
        }
    }

    fn unregister(&mut self, id: ChainId) -> Option<Entry> {
        let index = self.chains.iter().position(|(entry_id, _)| *entry_id == id)?;
        let (_, entry) = self.chains.remove(index);

        if let Some((name, voice_id)) = &entry.bus {
            if let Some(bus) = self.buses.get_mut(name) {
                bus.remove(*voice_id);
            }
        }
        if let Some(parent) = entry.parent {
            if let Some(ids) = self.voice_chains.get_mut(&parent) {
                ids.retain(|chain_id| *chain_id != id);
                if ids.is_empty() {
                    self.voice_chains.remove(&parent);
                }
            }
        }
        Some(entry)
    }

    /// Stop every chain bound to a voice, moving bus entries into history
    ///
    /// Returns the number of chains stopped.
    pub fn release_voice(&mut self, parent: ParentVoice) -> usize {
        let Some(ids) = self.voice_chains.remove(&parent) else {
            return 0;
        };

        let mut stopped = 0;
        for id in ids {
            let Some(index) = self.chains.iter().position(|(entry_id, _)| *entry_id == id) else {
                continue;
            };
            let (_, entry) = self.chains.remove(index);

            if let Some((name, voice_id)) = &entry.bus {
                if let Some(bus) = self.buses.get_mut(name) {
                    bus.release(*voice_id, self.tick);
                }
            }
            entry.chain.borrow_mut().stop();
            stopped += 1;
        }

        info!(voice = parent, stopped, tick = self.tick, "voice released");
        stopped
    }

    /// Get or create a bus
    pub fn bus(&mut self, name: &str) -> &mut BusRegistry<ChainHandle> {
        let limit = self.config.history_limit;
        self.buses.entry(name.to_string()).or_insert_with(|| {
            let mut bus = BusRegistry::new(name);
            bus.set_history_limit(limit);
            bus
        })
    }

    pub fn buses(&self) -> &BTreeMap<String, BusRegistry<ChainHandle>> {
        &self.buses
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Stop everything and return to step zero
    pub fn shutdown(&mut self) {
        for (_, entry) in self.chains.drain(..) {
            entry.chain.borrow_mut().stop();
        }
        self.buses.clear();
        self.voice_chains.clear();
        self.tick = 0;
        info!("engine shut down");
    }
}

impl<T: Trigger> Drop for Engine<T> {
    fn drop(&mut self) {
        if !self.chains.is_empty() {
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trapcycle_bus::RecordingTrigger;

    fn engine(units_per_beat: f64) -> Engine<RecordingTrigger> {
        let config = EngineConfig {
            units_per_beat,
            seed: Some(1),
            ..EngineConfig::default()
        };
        Engine::new(config, RecordingTrigger::new())
    }

    #[test]
    fn test_note_chain_fires_offsets_from_root() {
        let mut engine = engine(4.0);
        engine
            .note("0 3 5 7", ChainOptions::new().cycle(1.0).root(60))
            .unwrap();

        for _ in 0..4 {
            engine.update();
        }
        assert_eq!(engine.trigger().pitches(), vec![60, 63, 65, 67]);
        assert_eq!(engine.tick(), 4);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let mut engine = engine(4.0);
        let err = engine.note("0 [3", ChainOptions::new()).unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_unknown_scale_lists_names() {
        let mut engine = engine(4.0);
        let err = engine
            .note("0", ChainOptions::new().scale("c4:nonsense"))
            .unwrap_err();
        assert!(err.to_string().contains("Unknown scale: nonsense"));
        assert!(err.to_string().contains("major"));
    }

    #[test]
    fn test_voice_inherits_scale_and_cycle() {
        let mut engine = engine(4.0);
        let voice = Voice::new(1, 62).with_cycle(1.0).with_scale("c5:major");
        engine.voice_n(&voice, "0 7", ChainOptions::new()).unwrap();

        for _ in 0..4 {
            engine.update();
        }
        assert_eq!(engine.trigger().pitches(), vec![72, 84]);
        assert!(engine.trigger().notes().iter().all(|n| n.parent == Some(1)));
    }

    #[test]
    fn test_voice_chromatic_root_is_voice_note() {
        let mut engine = engine(4.0);
        let voice = Voice::new(9, 50).with_cycle(1.0);
        engine
            .voice_n(&voice, "0 12", ChainOptions::new().cycle(0.5))
            .unwrap();

        engine.update();
        engine.update();
        assert_eq!(engine.trigger().pitches(), vec![50, 62]);
    }

    #[test]
    fn test_release_voice_moves_chains_to_history() {
        let mut engine = engine(4.0);
        let voice = Voice::new(3, 60).with_cycle(1.0);
        for pattern in ["0", "3", "7"] {
            engine
                .voice_n(&voice, pattern, ChainOptions::new().bus("melody"))
                .unwrap();
        }
        engine.update();
        assert_eq!(engine.bus("melody").len(), 3);

        assert_eq!(engine.release_voice(3), 3);
        assert!(engine.is_empty());
        let bus = engine.bus("melody");
        assert!(bus.is_empty());
        assert_eq!(bus.last(0).len(), 3);
        assert_eq!(bus.history_steps(), vec![1]);
        assert!(bus.last(0).iter().all(|c| !c.borrow().is_running()));

        assert_eq!(engine.release_voice(3), 0);
    }

    #[test]
    fn test_stop_chain_removes_from_bus_without_history() {
        let mut engine = engine(4.0);
        let id = engine
            .note("0", ChainOptions::new().bus("clock").mute(true))
            .unwrap();
        assert_eq!(engine.bus("clock").len(), 1);

        assert!(engine.stop_chain(id));
        assert!(engine.bus("clock").is_empty());
        assert!(engine.bus("clock").history().is_empty());
        assert!(!engine.stop_chain(id));
    }

    #[test]
    fn test_chain_stopped_through_handle_is_dropped_on_update() {
        let mut engine = engine(4.0);
        let id = engine.note("0", ChainOptions::new().bus("clock")).unwrap();
        let handle = engine.chain(id).unwrap();

        handle.borrow_mut().stop();
        engine.update();
        assert!(engine.chain(id).is_none());
        assert!(engine.bus("clock").is_empty());
    }

    #[test]
    fn test_chain_created_mid_run_starts_at_phase_zero() {
        let mut engine = engine(4.0);
        for _ in 0..3 {
            engine.update();
        }
        engine
            .note("0 1", ChainOptions::new().cycle(1.0).root(60))
            .unwrap();

        engine.update();
        engine.update();
        engine.update();
        assert_eq!(engine.trigger().pitches(), vec![60, 61]);
    }

    #[test]
    fn test_bus_state_is_observable() {
        let mut engine = engine(4.0);
        engine
            .note("<0 3>", ChainOptions::new().cycle(1.0).bus("clock").mute(true))
            .unwrap();

        engine.update();
        let newest = engine.bus("clock").newest().map(Rc::clone).unwrap();
        assert_eq!(newest.borrow().state().n, vec![0.0]);
        assert!(newest.borrow().changed(None));
        assert!(engine.trigger().is_empty());
    }

    #[test]
    fn test_shutdown_clears_everything() {
        let mut engine = engine(4.0);
        let id = engine.note("0", ChainOptions::new().bus("a")).unwrap();
        let handle = engine.chain(id).unwrap();
        engine.update();

        engine.shutdown();
        assert!(engine.is_empty());
        assert!(engine.buses().is_empty());
        assert_eq!(engine.tick(), 0);
        assert!(!handle.borrow().is_running());
    }
}
