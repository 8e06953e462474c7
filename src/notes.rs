use std::fmt;

use crate::error::{Error, Result};

const PITCH_NAMES: [&str; 12] = ["C","C#","D","D#","E","F","F#","G","G#","A","A#","B"];

// ── Note identifier ───────────────────────────────────────────────────────────

/// Symbolic pitch + octave such as `C3` or `A#2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NoteId(&'static str);

impl NoteId {
    pub const fn from_static(name: &'static str) -> Self { Self(name) }

    pub fn as_str(&self) -> &'static str { self.0 }

    /// Splits the name into `(pitch class 0-11, octave 0-9)`.
    pub fn parts(&self) -> Result<(u8, u8)> {
        let name = self.as_str();
        let invalid = || Error::InvalidNote(name.to_string());

        let (idx, last) = name.char_indices().last().ok_or_else(invalid)?;
        let octave = last.to_digit(10).ok_or_else(invalid)? as u8;
        let pitch  = &name[..idx];
        let pc = PITCH_NAMES.iter().position(|p| *p == pitch).ok_or_else(invalid)? as u8;
        Ok((pc, octave))
    }

    pub fn octave(&self) -> Option<u8> { self.parts().ok().map(|(_, o)| o) }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.0) }
}

// ── Lookup tables ─────────────────────────────────────────────────────────────

/// Playable range: C2 through E6.
const FREQUENCIES: [(&str, f64); 53] = [
    ("C2", 65.41),   ("C#2", 69.3),    ("D2", 73.42),   ("D#2", 77.78),
    ("E2", 82.41),   ("F2", 87.31),    ("F#2", 92.5),   ("G2", 98.0),
    ("G#2", 103.83), ("A2", 110.0),    ("A#2", 116.54), ("B2", 123.47),
    ("C3", 130.81),  ("C#3", 138.59),  ("D3", 146.83),  ("D#3", 155.56),
    ("E3", 164.81),  ("F3", 174.61),   ("F#3", 185.0),  ("G3", 196.0),
    ("G#3", 207.65), ("A3", 220.0),    ("A#3", 233.08), ("B3", 246.94),
    ("C4", 261.63),  ("C#4", 277.18),  ("D4", 293.66),  ("D#4", 311.13),
    ("E4", 329.63),  ("F4", 349.23),   ("F#4", 369.99), ("G4", 392.0),
    ("G#4", 415.3),  ("A4", 440.0),    ("A#4", 466.16), ("B4", 493.88),
    ("C5", 523.25),  ("C#5", 554.37),  ("D5", 587.33),  ("D#5", 622.25),
    ("E5", 659.25),  ("F5", 698.46),   ("F#5", 739.99), ("G5", 783.99),
    ("G#5", 830.61), ("A5", 880.0),    ("A#5", 932.33), ("B5", 987.77),
    ("C6", 1046.5),  ("C#6", 1108.73), ("D6", 1174.66), ("D#6", 1244.51),
    ("E6", 1318.51),
];

pub fn frequency(note: &NoteId) -> Result<f64> {
    FREQUENCIES.iter()
        .find(|(name, _)| *name == note.as_str())
        .map(|&(_, hz)| hz)
        .ok_or_else(|| Error::UnknownNote(note.to_string()))
}

/// MIDI key number with C4 = 60.
pub fn midi_number(note: &NoteId) -> Result<u8> {
    let (pc, octave) = note.parts()?;
    let key = (octave as u16 + 1) * 12 + pc as u16;
    u8::try_from(key).ok().filter(|k| *k <= 127)
        .ok_or_else(|| Error::InvalidNote(note.to_string()))
}

/// Grid row labels for one octave, highest pitch first.
pub fn octave_rows(octave: u8) -> impl Iterator<Item = String> {
    PITCH_NAMES.iter().rev().map(move |p| format!("{}{}", p, octave))
}

pub fn is_sharp(name: &str) -> bool { name.contains('#') }

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn note_name(note: u8) -> String {
        format!("{}{}", PITCH_NAMES[(note % 12) as usize], (note / 12) as i32 - 1)
    }

    #[test]
    fn test_frequency_lookup() {
        assert_abs_diff_eq!(frequency(&NoteId::from_static("C3")).unwrap(), 130.81);
        assert_abs_diff_eq!(frequency(&NoteId::from_static("A#2")).unwrap(), 116.54);
        assert!(matches!(frequency(&NoteId::from_static("C1")), Err(Error::UnknownNote(_))));
        assert!(matches!(frequency(&NoteId::from_static("H9")), Err(Error::UnknownNote(_))));
    }

    #[test]
    fn test_midi_number() {
        assert_eq!(midi_number(&NoteId::from_static("C4")).unwrap(), 60);
        assert_eq!(midi_number(&NoteId::from_static("C3")).unwrap(), 48);
        assert_eq!(midi_number(&NoteId::from_static("A#2")).unwrap(), 46);
        assert!(midi_number(&NoteId::from_static("X3")).is_err());
        assert!(midi_number(&NoteId::from_static("")).is_err());
        assert!(midi_number(&NoteId::from_static("C#")).is_err());
    }

    #[test]
    fn test_midi_number_matches_frequency_table() {
        for (name, hz) in FREQUENCIES {
            let key = midi_number(&NoteId::from_static(name)).unwrap();
            let from_freq = (12.0 * (hz / 440.0).log2() + 69.0).round() as u8;
            assert_eq!(key, from_freq, "{name}");
            assert_eq!(note_name(key), name);
        }
    }

    #[test]
    fn test_octave_rows_descend() {
        let rows: Vec<String> = octave_rows(3).collect();
        assert_eq!(rows.first().map(String::as_str), Some("B3"));
        assert_eq!(rows.last().map(String::as_str), Some("C3"));
        assert_eq!(rows.len(), 12);
        assert!(is_sharp("A#3"));
    }
}
