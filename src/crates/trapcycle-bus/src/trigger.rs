//! Note triggering collaborator

use serde::{Deserialize, Serialize};

/// Identifier of the host voice a chain is bound to
pub type ParentVoice = u64;

/// One note handed to the host for playback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteOn {
    /// Pitch number, 0..=127
    pub pitch: i32,
    /// Length in beats
    pub duration_beats: f64,
    /// 0.0 to 1.0
    pub velocity: f64,
    /// -1.0 (left) to 1.0 (right)
    pub pan: f64,
    /// Voice the note is played under, if any
    pub parent: Option<ParentVoice>,
}

impl NoteOn {
    pub fn new(pitch: i32, duration_beats: f64) -> Self {
        NoteOn {
            pitch,
            duration_beats,
            velocity: 0.8,
            pan: 0.0,
            parent: None,
        }
    }

    /// Velocity scaled to the 0..=127 integer range
    pub fn velocity_byte(&self) -> u8 {
        (self.velocity.clamp(0.0, 1.0) * 127.0).round() as u8
    }
}

/// Fire-and-forget sink for resolved notes
pub trait Trigger {
    fn trigger(&mut self, note: NoteOn);
}

impl<F> Trigger for F
where
    F: FnMut(NoteOn),
{
    fn trigger(&mut self, note: NoteOn) {
        self(note)
    }
}

/// Collects every note it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingTrigger {
    notes: Vec<NoteOn>,
}

impl RecordingTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &[NoteOn] {
        &self.notes
    }

    pub fn pitches(&self) -> Vec<i32> {
        self.notes.iter().map(|n| n.pitch).collect()
    }

    /// Take the recorded notes, leaving the recorder empty
    pub fn drain(&mut self) -> Vec<NoteOn> {
        std::mem::take(&mut self.notes)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl Trigger for RecordingTrigger {
    fn trigger(&mut self, note: NoteOn) {
        self.notes.push(note);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_trigger() {
        let mut rec = RecordingTrigger::new();
        rec.trigger(NoteOn::new(60, 1.0));
        rec.trigger(NoteOn::new(64, 0.5));
        assert_eq!(rec.pitches(), vec![60, 64]);
        assert_eq!(rec.drain().len(), 2);
        assert!(rec.is_empty());
    }

    #[test]
    fn test_closure_trigger() {
        let mut seen = Vec::new();
        {
            let mut sink = |note: NoteOn| seen.push(note.pitch);
            sink.trigger(NoteOn::new(72, 0.25));
        }
        assert_eq!(seen, vec![72]);
    }

    #[test]
    fn test_velocity_byte() {
        let mut note = NoteOn::new(60, 1.0);
        assert_eq!(note.velocity_byte(), 102);
        note.velocity = 1.5;
        assert_eq!(note.velocity_byte(), 127);
    }
}
