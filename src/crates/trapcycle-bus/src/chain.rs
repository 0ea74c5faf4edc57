//! A running pattern with observable per-tick state
//!
//! [`PatternChain`] drives a [`Scheduler`], resolves each onset to a pitch,
//! publishes the result as a [`ChainState`] and forwards notes to a
//! [`Trigger`]. Other components read the state through [`PatternChain::dict`],
//! [`PatternChain::get`] and [`PatternChain::changed`].

use crate::control::Control;
use crate::trigger::{NoteOn, ParentVoice, Trigger};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use tracing::{debug, error, info, trace, warn};
use trapcycle_core::state::MIN_CYCLE_BEATS;
use trapcycle_core::{Fraction, Hap, Pattern, PitchResolver, Scheduler, Value};

/// Duration in beats for an event without a whole span
pub const DEFAULT_DURATION_BEATS: f64 = 0.1;

/// Shortest duration handed to the trigger
pub const MIN_DURATION_BEATS: f64 = 0.01;

pub const DEFAULT_VELOCITY: f64 = 0.8;

/// Snapshot published after every tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainState {
    /// Resolved pitches of this tick's onsets
    pub notes: Vec<i32>,
    /// Raw degrees or note numbers before resolution
    pub n: Vec<f64>,
    /// Per-note duration in beats
    pub durations: Vec<f64>,
    /// Position of the current onset among the onsets fired so far in its cycle
    pub step: usize,
    /// External step counter of the last tick
    pub tick: i64,
    /// Fractional position inside the current cycle
    pub phase: f64,
    pub cycle: i64,
    pub onset: bool,
    pub mute: bool,
    pub velocity: f64,
    pub pan: f64,
    /// Fixed note length in beats; 0 uses the event's own length
    pub length: f64,
    pub parent: Option<ParentVoice>,
}

impl ChainState {
    fn new(mute: bool, parent: Option<ParentVoice>) -> Self {
        ChainState {
            notes: Vec::new(),
            n: Vec::new(),
            durations: Vec::new(),
            step: 0,
            tick: 0,
            phase: 0.0,
            cycle: 0,
            onset: false,
            mute,
            velocity: DEFAULT_VELOCITY,
            pan: 0.0,
            length: 0.0,
            parent,
        }
    }
}

pub struct PatternChain {
    scheduler: Scheduler,
    resolver: PitchResolver,
    cycle_beats: Control,
    root: Control,
    velocity: Control,
    pan: Control,
    length: Control,
    mute: bool,
    running: bool,
    parent: Option<ParentVoice>,
    state: ChainState,
    prev_state: ChainState,
    /// Cycle of the last onset and how many onsets it has had
    onset_cycle: Option<i64>,
    onsets_in_cycle: usize,
}

impl PatternChain {
    /// Wrap a pattern; the chain is created stopped, see [`PatternChain::start`]
    pub fn new(pattern: Pattern, resolver: PitchResolver, cycle_beats: impl Into<Control>) -> Self {
        let root = match &resolver {
            PitchResolver::Chromatic { root } => Control::from(*root),
            PitchResolver::Scale(scale) => Control::from(scale.root),
        };
        let state = ChainState::new(false, None);

        PatternChain {
            scheduler: Scheduler::new(pattern),
            resolver,
            cycle_beats: cycle_beats.into(),
            root,
            velocity: Control::from(DEFAULT_VELOCITY),
            pan: Control::from(0.0),
            length: Control::from(0.0),
            mute: false,
            running: false,
            parent: None,
            prev_state: state.clone(),
            state,
            onset_cycle: None,
            onsets_in_cycle: 0,
        }
    }

    /// Live root for chromatic resolution; ignored in scale mode
    pub fn with_root(mut self, root: impl Into<Control>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_velocity(mut self, velocity: impl Into<Control>) -> Self {
        self.velocity = velocity.into();
        self
    }

    pub fn with_pan(mut self, pan: impl Into<Control>) -> Self {
        self.pan = pan.into();
        self
    }

    pub fn with_length(mut self, length: impl Into<Control>) -> Self {
        self.length = length.into();
        self
    }

    /// A muted chain keeps publishing state but never triggers
    pub fn with_mute(mut self, mute: bool) -> Self {
        self.mute = mute;
        self.state.mute = mute;
        self
    }

    pub fn with_parent(mut self, parent: Option<ParentVoice>) -> Self {
        self.parent = parent;
        self.state.parent = parent;
        self
    }

    pub fn set_velocity(&mut self, velocity: impl Into<Control>) {
        self.velocity = velocity.into();
    }

    pub fn set_pan(&mut self, pan: impl Into<Control>) {
        self.pan = pan.into();
    }

    pub fn set_length(&mut self, length: impl Into<Control>) {
        self.length = length.into();
    }

    pub fn set_cycle_beats(&mut self, cycle_beats: impl Into<Control>) {
        self.cycle_beats = cycle_beats.into();
    }

    pub fn set_mute(&mut self, mute: bool) {
        self.mute = mute;
        self.state.mute = mute;
    }

    pub fn start(&mut self, step: Option<i64>) {
        self.scheduler.start(step);
        self.running = true;
        self.onset_cycle = None;
        self.onsets_in_cycle = 0;
        info!(step = ?step, "chain started");
    }

    pub fn stop(&mut self) {
        if self.running {
            info!(tick = self.state.tick, "chain stopped");
        }
        self.running = false;
        self.scheduler.stop();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn parent(&self) -> Option<ParentVoice> {
        self.parent
    }

    pub fn resolver(&self) -> &PitchResolver {
        &self.resolver
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    /// Advance one step and fire this step's notes
    ///
    /// Returns the onset flag. A stopped chain does nothing.
    pub fn tick(&mut self, step: i64, units_per_beat: f64, trigger: &mut dyn Trigger) -> bool {
        if !self.running {
            return false;
        }

        self.prev_state = self.state.clone();
        self.state.onset = false;
        self.state.tick = step;

        let cycle_beats = self.cycle_beats.value();
        if !cycle_beats.is_finite() || cycle_beats < MIN_CYCLE_BEATS {
            warn!(cycle_beats, floor = MIN_CYCLE_BEATS, "cycle length clamped");
        }
        if let PitchResolver::Chromatic { root } = &mut self.resolver {
            *root = self.root.value().trunc() as i32;
        }

        let haps = match self.scheduler.tick(step, units_per_beat, cycle_beats) {
            Ok(haps) => haps,
            Err(e) => {
                error!(error = %e, tick = step, "chain timing failed");
                self.stop();
                return false;
            }
        };

        let phase = self.scheduler.phase();
        self.state.phase = phase.fract().to_float();
        self.state.cycle = self.scheduler.cycle();
        trace!(
            step,
            phase = %phase,
            latched = ?self.scheduler.latched_cycle_beats().map(|c| c.to_float()),
            "chain phase"
        );

        self.state.velocity = clamp_live("velocity", self.velocity.value(), 0.0, 1.0);
        self.state.pan = clamp_live("pan", self.pan.value(), -1.0, 1.0);
        self.state.length = clamp_live("length", self.length.value(), 0.0, f64::MAX);

        if !haps.is_empty() {
            self.publish(&haps);
            debug!(
                tick = step,
                cycle = self.state.cycle,
                events = haps.len(),
                values = ?self.state.n,
                "chain onset"
            );
        }

        if self.state.onset && !self.mute {
            self.fire(trigger);
        }

        self.state.onset
    }

    fn publish(&mut self, haps: &[Hap]) {
        let latched = self
            .scheduler
            .latched_cycle_beats()
            .unwrap_or_else(|| Fraction::from_int(1));

        let mut n = Vec::with_capacity(haps.len());
        let mut notes = Vec::with_capacity(haps.len());
        let mut durations = Vec::with_capacity(haps.len());

        for hap in haps {
            let Some(pitch) = self.resolver.resolve(&hap.value) else {
                continue;
            };
            n.push(match hap.value {
                Value::Number(v) => v,
                Value::Note(note) => note.pitch() as f64,
                Value::Rest => continue,
            });
            notes.push(pitch);
            durations.push(event_duration(hap, latched));
        }

        self.state.onset = true;
        self.state.n = n;
        self.state.notes = notes;
        self.state.durations = durations;

        if let Some(step) = self.count_onsets(haps) {
            self.state.step = step;
        }
    }

    /// Count this tick's distinct onset times into their cycles
    ///
    /// Returns the in-cycle index of the earliest one.
    fn count_onsets(&mut self, haps: &[Hap]) -> Option<usize> {
        let mut begins: Vec<Fraction> = haps.iter().map(|hap| hap.whole_or_part().begin).collect();
        begins.sort();
        begins.dedup();

        let mut first = None;
        for begin in begins {
            let cycle = begin.floor_int();
            if self.onset_cycle != Some(cycle) {
                self.onset_cycle = Some(cycle);
                self.onsets_in_cycle = 0;
            }
            first.get_or_insert(self.onsets_in_cycle);
            self.onsets_in_cycle += 1;
        }
        first
    }

    fn fire(&self, trigger: &mut dyn Trigger) {
        debug!(notes = ?self.state.notes, durations = ?self.state.durations, "fire");

        for (i, &pitch) in self.state.notes.iter().enumerate() {
            let duration_beats = if self.state.length > 0.0 {
                self.state.length
            } else {
                self.state
                    .durations
                    .get(i)
                    .copied()
                    .unwrap_or(DEFAULT_DURATION_BEATS)
            };

            trigger.trigger(NoteOn {
                pitch,
                duration_beats,
                velocity: self.state.velocity,
                pan: self.state.pan,
                parent: self.parent,
            });
        }
    }

    /// The state record as a JSON object
    pub fn dict(&self) -> Map<String, JsonValue> {
        to_map(&self.state)
    }

    pub fn get(&self, key: &str) -> Option<JsonValue> {
        self.dict().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.dict().contains_key(key)
    }

    /// Whether `key` differs from the previous tick; `None` asks for an onset
    pub fn changed(&self, key: Option<&str>) -> bool {
        match key {
            None => self.state.onset,
            Some(key) => to_map(&self.state).get(key) != to_map(&self.prev_state).get(key),
        }
    }

    pub fn onset(&self) -> bool {
        self.state.onset
    }
}

impl fmt::Debug for PatternChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternChain")
            .field("running", &self.running)
            .field("mute", &self.mute)
            .field("resolver", &self.resolver)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PatternChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<PatternChain step={} notes={:?}>", self.state.step, self.state.notes)
    }
}

/// Beats covered by an event at the latched cycle length
pub fn event_duration(hap: &Hap, cycle_beats: Fraction) -> f64 {
    match hap.whole {
        Some(whole) => (whole.duration().to_float() * cycle_beats.to_float()).max(MIN_DURATION_BEATS),
        None => DEFAULT_DURATION_BEATS,
    }
}

fn clamp_live(name: &str, value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        warn!(parameter = name, "non-numeric value replaced by {}", lo);
        return lo;
    }
    let clamped = value.clamp(lo, hi);
    if clamped != value {
        warn!(parameter = name, value, clamped, "parameter clamped");
    }
    clamped
}

fn to_map(state: &ChainState) -> Map<String, JsonValue> {
    match serde_json::to_value(state) {
        Ok(JsonValue::Object(map)) => map,
        _ => Map::new(),
    }
}
