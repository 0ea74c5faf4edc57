//! Scale tables and pitch resolution
//!
//! Pattern values reach this module as plain numbers (scale degrees, or
//! semitone offsets without a scale) or absolute notes. [`PitchResolver`]
//! turns both into final pitch numbers.

use crate::error::ScaleError;
use crate::note::{clamp_pitch, note_to_midi, DEFAULT_OCTAVE, MAX_PITCH, MIN_PITCH};
use crate::registry::Registry;
use crate::Value;
use std::fmt;

/// Build the default scale table
pub fn scales() -> Registry<Vec<i32>> {
    let mut reg = Registry::new("scales");
    // Modes
    reg.add("major", vec![0, 2, 4, 5, 7, 9, 11]);
    reg.add("minor", vec![0, 2, 3, 5, 7, 8, 10]);
    reg.add("dorian", vec![0, 2, 3, 5, 7, 9, 10]);
    reg.add("phrygian", vec![0, 1, 3, 5, 7, 8, 10]);
    reg.add("lydian", vec![0, 2, 4, 6, 7, 9, 11]);
    reg.add("mixolydian", vec![0, 2, 4, 5, 7, 9, 10]);
    reg.add("locrian", vec![0, 1, 3, 5, 6, 8, 10]);
    // Pentatonic and blues
    reg.add("pentatonic", vec![0, 2, 4, 7, 9]);
    reg.add("minor_pentatonic", vec![0, 3, 5, 7, 10]);
    reg.add("blues", vec![0, 3, 5, 6, 7, 10]);
    reg.add("harmonic_minor", vec![0, 2, 3, 5, 7, 8, 11]);
    reg.add("melodic_minor", vec![0, 2, 3, 5, 7, 9, 11]);
    // Octatonic
    reg.add("diminished", vec![0, 2, 3, 5, 6, 8, 9, 11]);
    reg.add("diminished_hw", vec![0, 1, 3, 4, 6, 7, 9, 10]);
    reg.add("chromatic", (0..12).collect());
    reg
}

/// A set of intervals anchored at a root pitch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scale {
    pub name: String,
    pub root: i32,
    pub intervals: Vec<i32>,
}

impl Scale {
    /// Build a scale from explicit parts
    pub fn new(name: impl Into<String>, root: i32, intervals: Vec<i32>) -> Result<Self, ScaleError> {
        if intervals.is_empty() {
            return Err(ScaleError::Empty);
        }
        Ok(Scale {
            name: name.into(),
            root,
            intervals,
        })
    }

    /// Parse `root:name` (case-insensitive), e.g. `"c5:major"`
    ///
    /// A root without an octave uses [`DEFAULT_OCTAVE`].
    pub fn parse(text: &str, registry: &Registry<Vec<i32>>) -> Result<Self, ScaleError> {
        let lowered = text.trim().to_lowercase();
        let (root_text, name) = match lowered.split_once(':') {
            Some((root, name)) if !name.contains(':') => (root.trim(), name.trim()),
            _ => {
                return Err(ScaleError::UnknownScale {
                    name: text.to_string(),
                    available: registry.names().join(", "),
                })
            }
        };

        let intervals = registry
            .get(name)
            .cloned()
            .ok_or_else(|| ScaleError::UnknownScale {
                name: name.to_string(),
                available: registry.names().join(", "),
            })?;
        let root = note_to_midi(root_text, DEFAULT_OCTAVE)?;

        Scale::new(name, root, intervals)
    }

    /// Pitch of a scale degree; negative degrees descend below the root
    pub fn degree_to_pitch(&self, degree: i64) -> i32 {
        let len = self.intervals.len() as i64;
        let octave = degree.div_euclid(len);
        let index = degree.rem_euclid(len) as usize;
        let pitch = self.root as i64 + self.intervals[index] as i64 + 12 * octave;
        pitch.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    /// Snap a pitch to the nearest scale member in the valid pitch range
    ///
    /// Every octave of the scale that lands in `0..=127` is a candidate.
    /// Candidates are scanned in ascending order and the first one at the
    /// smallest distance wins, so an exact tie resolves downward.
    pub fn quantize(&self, pitch: i32) -> i32 {
        let mut candidates: Vec<i32> = (-11..=11)
            .flat_map(|octave| self.intervals.iter().map(move |i| self.root + i + octave * 12))
            .filter(|p| (MIN_PITCH..=MAX_PITCH).contains(p))
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let mut best = self.root;
        let mut best_diff = i32::MAX;
        for candidate in candidates {
            let diff = (candidate - pitch).abs();
            if diff < best_diff {
                best = candidate;
                best_diff = diff;
            }
        }
        best
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", crate::note::pitch_name(self.root), self.name)
    }
}

/// How raw pattern values become pitches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PitchResolver {
    /// Numbers are scale degrees; absolute notes are quantized to the scale
    Scale(Scale),
    /// Numbers are semitone offsets from `root`; absolute notes pass through
    Chromatic { root: i32 },
}

impl PitchResolver {
    /// Final pitch for a value, or `None` for a rest
    ///
    /// Fractional degrees are truncated toward zero. In chromatic mode the
    /// offset is added to the root first and the sum is truncated.
    pub fn resolve(&self, value: &Value) -> Option<i32> {
        let pitch = match (self, value) {
            (_, Value::Rest) => return None,
            (PitchResolver::Scale(scale), Value::Number(n)) => {
                if !n.is_finite() {
                    return None;
                }
                scale.degree_to_pitch(n.trunc() as i64)
            }
            (PitchResolver::Scale(scale), Value::Note(note)) => scale.quantize(note.pitch()),
            (PitchResolver::Chromatic { root }, Value::Number(n)) => {
                if !n.is_finite() {
                    return None;
                }
                (*root as f64 + n).trunc() as i32
            }
            (PitchResolver::Chromatic { .. }, Value::Note(note)) => note.pitch(),
        };
        Some(clamp_pitch(pitch))
    }

    pub fn scale(&self) -> Option<&Scale> {
        match self {
            PitchResolver::Scale(scale) => Some(scale),
            PitchResolver::Chromatic { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AbsoluteNote;

    fn c5_major() -> Scale {
        Scale::parse("c5:major", &scales()).unwrap()
    }

    #[test]
    fn test_default_table() {
        let table = scales();
        assert_eq!(table.len(), 15);
        assert_eq!(table.get("Harmonic_Minor"), Some(&vec![0, 2, 3, 5, 7, 8, 11]));
        assert_eq!(table.get("chromatic").map(Vec::len), Some(12));
    }

    #[test]
    fn test_parse_scale() {
        let scale = c5_major();
        assert_eq!(scale.root, 72);
        assert_eq!(scale.intervals, vec![0, 2, 4, 5, 7, 9, 11]);
        assert_eq!(Scale::parse("A4:Minor", &scales()).unwrap().root, 69);
        assert_eq!(Scale::parse("f#5:blues", &scales()).unwrap().root, 78);
        // Root without octave uses the default octave
        assert_eq!(Scale::parse("c:major", &scales()).unwrap().root, 48);
    }

    #[test]
    fn test_parse_scale_errors() {
        let err = Scale::parse("c4:nope", &scales()).unwrap_err();
        assert!(matches!(err, ScaleError::UnknownScale { ref name, .. } if name == "nope"));
        assert!(err.to_string().contains("major, minor"));

        assert!(matches!(
            Scale::parse("x4:major", &scales()),
            Err(ScaleError::InvalidRoot(_))
        ));
        assert!(Scale::parse("major", &scales()).is_err());
    }

    #[test]
    fn test_user_scale() {
        let mut table = scales();
        table.add("Whole", vec![0, 2, 4, 6, 8, 10]);
        let scale = Scale::parse("c4:whole", &table).unwrap();
        assert_eq!(scale.degree_to_pitch(6), 72);
    }

    #[test]
    fn test_degree_to_pitch() {
        let scale = c5_major();
        assert_eq!(scale.degree_to_pitch(0), 72);
        assert_eq!(scale.degree_to_pitch(2), 76);
        assert_eq!(scale.degree_to_pitch(7), 84);
        assert_eq!(scale.degree_to_pitch(-1), 71);
        assert_eq!(scale.degree_to_pitch(-7), 60);
    }

    #[test]
    fn test_quantize() {
        let scale = c5_major();
        assert_eq!(scale.quantize(61), 60);
        assert_eq!(scale.quantize(66), 65);
        assert_eq!(scale.quantize(64), 64);
        assert_eq!(scale.quantize(0), 0);
        assert_eq!(scale.quantize(127), 127);
    }

    #[test]
    fn test_resolver_modes() {
        let scaled = PitchResolver::Scale(c5_major());
        assert_eq!(scaled.resolve(&Value::Number(7.0)), Some(84));
        assert_eq!(scaled.resolve(&Value::Number(1.9)), Some(74));
        assert_eq!(scaled.resolve(&Value::Note(AbsoluteNote(61))), Some(60));
        assert_eq!(scaled.resolve(&Value::Rest), None);

        let chromatic = PitchResolver::Chromatic { root: 60 };
        assert_eq!(chromatic.resolve(&Value::Number(3.0)), Some(63));
        assert_eq!(chromatic.resolve(&Value::Number(-2.5)), Some(57));
        assert_eq!(chromatic.resolve(&Value::Number(2.5)), Some(62));
        assert_eq!(chromatic.resolve(&Value::Number(-0.25)), Some(59));
        assert_eq!(chromatic.resolve(&Value::Note(AbsoluteNote(40))), Some(40));
        assert_eq!(chromatic.resolve(&Value::Number(200.0)), Some(127));
    }
}
