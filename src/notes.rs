//! Notes, voice slots and note-name parsing

use std::fmt;
use std::str::FromStr;

use crate::error::{DspError, Result};

/// Number of simultaneously sounding voices
pub const MAX_VOICES: usize = 10;

/// Largest volume value (linear, MIDI velocity scale)
pub const MAX_VOLUME: u8 = 127;

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Equal-tempered frequency of a MIDI note number (A4 = 69 = 440 Hz)
pub fn note_frequency(number: u8) -> f32 {
    440.0 * 2f32.powf((number as f32 - 69.0) / 12.0)
}

/// A target note for resynthesis
///
/// A frequency of exactly `0.0` marks an unused voice slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Note {
    /// MIDI note number
    pub number: u8,
    /// Frequency in Hz
    pub frequency: f32,
    /// Volume 0-127
    pub volume: u8,
}

impl Note {
    /// Unused slot
    pub const EMPTY: Note = Note {
        number: 0,
        frequency: 0.0,
        volume: 0,
    };

    /// Equal-tempered note from its MIDI number
    pub fn from_midi(number: u8, volume: u8) -> Self {
        Self {
            number,
            frequency: note_frequency(number),
            volume: volume.min(MAX_VOLUME),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frequency == 0.0
    }

    /// Linear gain in `[0, 1]`
    pub fn gain(&self) -> f32 {
        self.volume.min(MAX_VOLUME) as f32 / MAX_VOLUME as f32
    }

    /// Scientific pitch name, e.g. `C#4`
    pub fn name(&self) -> String {
        let octave = self.number as i32 / 12 - 1;
        format!("{}{}", NOTE_NAMES[self.number as usize % 12], octave)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        write!(f, "{} ({:.1} Hz, vol {})", self.name(), self.frequency, self.volume)
    }
}

/// Parse a note name (`C4`, `F#3`, `Bb2`, `c-1`) or a bare MIDI number
pub fn parse_note_number(text: &str) -> Result<u8> {
    let text = text.trim();
    let invalid = || DspError::InvalidParameter(format!("invalid note '{}'", text));

    if let Ok(n) = text.parse::<u8>() {
        return if n <= 127 { Ok(n) } else { Err(invalid()) };
    }

    let mut chars = text.chars();
    let letter = chars.next().ok_or_else(invalid)?;
    let pitch_class: i32 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(invalid()),
    };

    let rest = chars.as_str();
    let (accidental, octave_text) = match rest.chars().next() {
        Some('#') => (1, &rest[1..]),
        Some('b') => (-1, &rest[1..]),
        _ => (0, rest),
    };

    let octave: i32 = octave_text.parse().map_err(|_| invalid())?;
    let number = (octave + 1) * 12 + pitch_class + accidental;
    if !(0..=127).contains(&number) {
        return Err(invalid());
    }
    Ok(number as u8)
}

impl FromStr for Note {
    type Err = DspError;

    /// Parses at full volume
    fn from_str(s: &str) -> Result<Self> {
        Ok(Note::from_midi(parse_note_number(s)?, MAX_VOLUME))
    }
}

/// Fixed set of voice slots
///
/// New notes take the first empty slot; a full list drops further notes.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceList {
    slots: [Note; MAX_VOICES],
}

impl Default for VoiceList {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceList {
    pub fn new() -> Self {
        Self {
            slots: [Note::EMPTY; MAX_VOICES],
        }
    }

    /// Voice list holding `notes` in order; notes past capacity are dropped
    pub fn from_notes<I: IntoIterator<Item = Note>>(notes: I) -> Self {
        let mut list = Self::new();
        for note in notes {
            if !list.insert(note) {
                log::warn!("Voice list full, dropping {}", note);
            }
        }
        list
    }

    /// Start a note in the first empty slot. Returns false when every slot
    /// is already in use.
    pub fn note_on(&mut self, number: u8, volume: u8) -> bool {
        self.insert(Note::from_midi(number, volume))
    }

    /// Release the first slot holding `number`. Returns false if the note
    /// was not sounding.
    pub fn note_off(&mut self, number: u8) -> bool {
        match self
            .slots
            .iter_mut()
            .find(|n| !n.is_empty() && n.number == number)
        {
            Some(slot) => {
                *slot = Note::EMPTY;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.slots = [Note::EMPTY; MAX_VOICES];
    }

    /// All slots, empty ones included
    pub fn as_slice(&self) -> &[Note] {
        &self.slots
    }

    /// Sounding voices in slot order
    pub fn sounding(&self) -> impl Iterator<Item = &Note> {
        self.slots.iter().filter(|n| !n.is_empty())
    }

    pub fn sounding_count(&self) -> usize {
        self.sounding().count()
    }

    fn insert(&mut self, note: Note) -> bool {
        if note.is_empty() {
            return false;
        }
        match self.slots.iter_mut().find(|n| n.is_empty()) {
            Some(slot) => {
                *slot = note;
                true
            }
            None => false,
        }
    }
}
