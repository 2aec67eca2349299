//! Note model
//!
//! The smallest timed unit of a song: a beat range, a pitch, a lyric
//! fragment, and a type. Beat bounds keep the `start < end` invariant
//! through every mutation.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{MelismaError, Result};

/// File-format pitch 0 corresponds to this MIDI note (middle C).
pub const TXT_PITCH_MIDI_BASE: i32 = 60;

static NEXT_NOTE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a note.
///
/// Identity survives cloning (deep snapshots keep referring to the same
/// logical note) and is what layer memberships are keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId(u64);

impl NoteId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        NoteId(NEXT_NOTE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The scoring/display type of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    Normal,
    Golden,
    Freestyle,
    Rap,
    RapGolden,
}

impl NoteType {
    /// Map a note-line prefix character to its type.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            ':' => Some(NoteType::Normal),
            '*' => Some(NoteType::Golden),
            'F' => Some(NoteType::Freestyle),
            'R' => Some(NoteType::Rap),
            'G' => Some(NoteType::RapGolden),
            _ => None,
        }
    }

    /// The prefix character used on note lines.
    pub fn prefix(&self) -> char {
        match self {
            NoteType::Normal => ':',
            NoteType::Golden => '*',
            NoteType::Freestyle => 'F',
            NoteType::Rap => 'R',
            NoteType::RapGolden => 'G',
        }
    }
}

/// A timed lyric token.
///
/// `start_beat` is inclusive, `end_beat` exclusive. The pitch is stored
/// as an absolute MIDI note; the file-format pitch is derived from it
/// (and vice versa on construction), so the two encodings never drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    id: NoteId,
    note_type: NoteType,
    start_beat: i32,
    end_beat: i32,
    midi_note: i32,
    text: String,
    editable: bool,
}

impl Note {
    /// Create a note from file-format fields.
    ///
    /// Fails with [`MelismaError::NegativeNoteLength`] if `length < 0`.
    pub fn new(
        note_type: NoteType,
        start_beat: i32,
        length: i32,
        txt_pitch: i32,
        text: impl Into<String>,
    ) -> Result<Self> {
        if length < 0 {
            return Err(MelismaError::NegativeNoteLength { length });
        }
        Ok(Self {
            id: NoteId::next(),
            note_type,
            start_beat,
            end_beat: start_beat + length,
            midi_note: txt_pitch + TXT_PITCH_MIDI_BASE,
            text: text.into(),
            editable: true,
        })
    }

    pub fn id(&self) -> NoteId {
        self.id
    }

    pub fn note_type(&self) -> NoteType {
        self.note_type
    }

    pub fn set_note_type(&mut self, note_type: NoteType) {
        self.note_type = note_type;
    }

    pub fn start_beat(&self) -> i32 {
        self.start_beat
    }

    pub fn end_beat(&self) -> i32 {
        self.end_beat
    }

    pub fn length(&self) -> i32 {
        self.end_beat - self.start_beat
    }

    /// Pitch as an absolute MIDI note number.
    pub fn midi_note(&self) -> i32 {
        self.midi_note
    }

    pub fn set_midi_note(&mut self, midi_note: i32) {
        self.midi_note = midi_note;
    }

    /// Pitch in the file-format encoding (0 = middle C).
    pub fn txt_pitch(&self) -> i32 {
        self.midi_note - TXT_PITCH_MIDI_BASE
    }

    pub fn set_txt_pitch(&mut self, txt_pitch: i32) {
        self.midi_note = txt_pitch + TXT_PITCH_MIDI_BASE;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    /// Move the start bound. Collapses the end bound when the move would
    /// leave the note shorter than one beat.
    pub fn set_start_beat(&mut self, start_beat: i32) {
        self.start_beat = start_beat;
        if self.start_beat >= self.end_beat {
            self.end_beat = self.start_beat + 1;
        }
    }

    /// Move the end bound. Collapses the start bound when the move would
    /// leave the note shorter than one beat.
    pub fn set_end_beat(&mut self, end_beat: i32) {
        self.end_beat = end_beat;
        if self.end_beat <= self.start_beat {
            self.start_beat = self.end_beat - 1;
        }
    }

    /// Resize the note from its start bound, clamping to a minimum
    /// length of 1.
    pub fn set_length(&mut self, length: i32) {
        self.end_beat = self.start_beat + length.max(1);
    }

    /// Shift both bounds atomically.
    pub fn move_horizontal(&mut self, delta_beats: i32) {
        self.start_beat += delta_beats;
        self.end_beat += delta_beats;
    }

    /// A structurally independent copy with a fresh identity, for
    /// clipboard-style duplication. Plain `clone()` keeps the identity
    /// and is what deep snapshots use.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = NoteId::next();
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_new_note_fields() {
        let note = Note::new(NoteType::Normal, 8, 4, 5, "la").unwrap();
        assert_eq!(note.start_beat(), 8);
        assert_eq!(note.end_beat(), 12);
        assert_eq!(note.length(), 4);
        assert_eq!(note.txt_pitch(), 5);
        assert_eq!(note.midi_note(), 65);
        assert_eq!(note.text(), "la");
        assert!(note.is_editable());
    }

    #[test]
    fn test_negative_length_fails() {
        let err = Note::new(NoteType::Normal, 0, -1, 0, "x").unwrap_err();
        assert!(matches!(err, MelismaError::NegativeNoteLength { length: -1 }));
    }

    #[test]
    fn test_set_start_beat_collapses_end() {
        let mut note = Note::new(NoteType::Normal, 0, 4, 0, "x").unwrap();
        note.set_start_beat(10);
        assert_eq!(note.start_beat(), 10);
        assert_eq!(note.end_beat(), 11);
        assert!(note.start_beat() < note.end_beat());
    }

    #[test]
    fn test_set_end_beat_collapses_start() {
        let mut note = Note::new(NoteType::Normal, 4, 4, 0, "x").unwrap();
        note.set_end_beat(-2);
        assert_eq!(note.end_beat(), -2);
        assert_eq!(note.start_beat(), -3);
        assert!(note.start_beat() < note.end_beat());
    }

    #[test]
    fn test_set_length_clamps_to_one() {
        let mut note = Note::new(NoteType::Golden, 2, 4, 0, "x").unwrap();
        note.set_length(0);
        assert_eq!(note.length(), 1);
        note.set_length(7);
        assert_eq!(note.end_beat(), 9);
    }

    #[test]
    fn test_move_horizontal_shifts_both_bounds() {
        let mut note = Note::new(NoteType::Rap, 4, 2, 0, "x").unwrap();
        note.move_horizontal(-6);
        assert_eq!(note.start_beat(), -2);
        assert_eq!(note.end_beat(), 0);
        assert_eq!(note.length(), 2);
    }

    #[test]
    fn test_clone_keeps_id_duplicate_does_not() {
        let note = Note::new(NoteType::Normal, 0, 1, 0, "x").unwrap();
        assert_eq!(note.clone().id(), note.id());
        assert_ne!(note.duplicate().id(), note.id());
    }

    #[test_case(':', NoteType::Normal)]
    #[test_case('*', NoteType::Golden)]
    #[test_case('F', NoteType::Freestyle)]
    #[test_case('R', NoteType::Rap)]
    #[test_case('G', NoteType::RapGolden)]
    fn test_prefix_round_trip(prefix: char, note_type: NoteType) {
        assert_eq!(NoteType::from_prefix(prefix), Some(note_type));
        assert_eq!(note_type.prefix(), prefix);
    }

    #[test]
    fn test_unknown_prefix_rejected() {
        assert_eq!(NoteType::from_prefix('X'), None);
    }
}
