//! Note-name parsing
//!
//! A note name is a letter `a`-`g` (any case), a run of accidentals
//! (`#`/`s` raise, `b`/`f` lower, one semitone each) and an optional signed
//! octave: `c4`, `F#3`, `ebb`, `cs-1`.

use crate::error::NoteError;

/// Octave used when a note name carries none, for leaf notes and scale roots alike
pub const DEFAULT_OCTAVE: i32 = 3;

/// Lowest valid pitch number
pub const MIN_PITCH: i32 = 0;

/// Highest valid pitch number
pub const MAX_PITCH: i32 = 127;

const NOTE_NAMES: [&str; 12] = [
    "c", "c#", "d", "d#", "e", "f", "f#", "g", "g#", "a", "a#", "b",
];

/// Pitch class of a note letter
fn chroma(letter: char) -> Option<i32> {
    match letter.to_ascii_lowercase() {
        'c' => Some(0),
        'd' => Some(2),
        'e' => Some(4),
        'f' => Some(5),
        'g' => Some(7),
        'a' => Some(9),
        'b' => Some(11),
        _ => None,
    }
}

/// Clamp a pitch into `MIN_PITCH..=MAX_PITCH`
pub fn clamp_pitch(pitch: i32) -> i32 {
    pitch.clamp(MIN_PITCH, MAX_PITCH)
}

/// Convert a note name to a pitch number
///
/// `pitch = (octave + 1) * 12 + chroma + accidentals`, clamped to the valid
/// range. A missing octave uses `default_octave`.
///
/// ```
/// use trapcycle_core::note::{note_to_midi, DEFAULT_OCTAVE};
///
/// assert_eq!(note_to_midi("c4", DEFAULT_OCTAVE).unwrap(), 60);
/// assert_eq!(note_to_midi("c", DEFAULT_OCTAVE).unwrap(), 48);
/// ```
pub fn note_to_midi(name: &str, default_octave: i32) -> Result<i32, NoteError> {
    let mut chars = name.chars().peekable();

    let letter = chars
        .next()
        .ok_or_else(|| NoteError::InvalidName(name.to_string()))?;
    let base = chroma(letter).ok_or_else(|| NoteError::InvalidName(name.to_string()))?;

    let mut offset = 0;
    while let Some(&c) = chars.peek() {
        match c {
            '#' | 's' | 'S' => offset += 1,
            'b' | 'B' | 'f' | 'F' => offset -= 1,
            _ => break,
        }
        chars.next();
    }

    let rest: String = chars.collect();
    let octave = if rest.is_empty() {
        default_octave
    } else {
        rest.parse::<i32>()
            .map_err(|_| NoteError::InvalidOctave(name.to_string()))?
    };

    let pitch = octave
        .checked_add(1)
        .and_then(|o| o.checked_mul(12))
        .and_then(|p| p.checked_add(base + offset))
        .ok_or_else(|| NoteError::InvalidOctave(name.to_string()))?;

    Ok(clamp_pitch(pitch))
}

/// True when `name` reads as a note name
pub fn is_note_name(name: &str) -> bool {
    note_to_midi(name, DEFAULT_OCTAVE).is_ok()
}

/// Spell a pitch number with sharps, e.g. 61 -> "c#4"
pub fn pitch_name(pitch: i32) -> String {
    let name = NOTE_NAMES[pitch.rem_euclid(12) as usize];
    let octave = pitch.div_euclid(12) - 1;
    format!("{}{}", name, octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_to_midi() {
        assert_eq!(note_to_midi("c4", DEFAULT_OCTAVE), Ok(60));
        assert_eq!(note_to_midi("a4", DEFAULT_OCTAVE), Ok(69));
        assert_eq!(note_to_midi("C#4", DEFAULT_OCTAVE), Ok(61));
        assert_eq!(note_to_midi("db4", DEFAULT_OCTAVE), Ok(61));
        assert_eq!(note_to_midi("cs4", DEFAULT_OCTAVE), Ok(61));
        assert_eq!(note_to_midi("ef4", DEFAULT_OCTAVE), Ok(63));
        assert_eq!(note_to_midi("c##4", DEFAULT_OCTAVE), Ok(62));
        assert_eq!(note_to_midi("bb3", DEFAULT_OCTAVE), Ok(58));
        assert_eq!(note_to_midi("c5", DEFAULT_OCTAVE), Ok(72));
    }

    #[test]
    fn test_default_octave() {
        assert_eq!(note_to_midi("c", DEFAULT_OCTAVE), Ok(48));
        assert_eq!(note_to_midi("e", 5), Ok(76));
    }

    #[test]
    fn test_negative_octave_and_clamping() {
        assert_eq!(note_to_midi("c-1", DEFAULT_OCTAVE), Ok(0));
        assert_eq!(note_to_midi("cb-1", DEFAULT_OCTAVE), Ok(0));
        assert_eq!(note_to_midi("g9", DEFAULT_OCTAVE), Ok(127));
        assert_eq!(note_to_midi("b9", DEFAULT_OCTAVE), Ok(127));
    }

    #[test]
    fn test_invalid_notes() {
        assert!(matches!(note_to_midi("h4", 3), Err(NoteError::InvalidName(_))));
        assert!(matches!(note_to_midi("", 3), Err(NoteError::InvalidName(_))));
        assert!(matches!(note_to_midi("c4x", 3), Err(NoteError::InvalidOctave(_))));
        assert!(!is_note_name("x"));
    }

    #[test]
    fn test_pitch_name() {
        assert_eq!(pitch_name(60), "c4");
        assert_eq!(pitch_name(61), "c#4");
        assert_eq!(pitch_name(0), "c-1");
    }
}
