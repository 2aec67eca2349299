//! Song document model
//!
//! Aggregate of voices plus the scalar song tags (tempo, offsets, media
//! references, format version). Created by the format reader or when a
//! new song is authored, mutated by editor actions, and overwritten in
//! place on reload so external holders keep observing the same object.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::note::{Note, NoteId};
use crate::model::sentence::Sentence;
use crate::model::voice::{Voice, VoiceId};

/// Text format versions with differing header keys and units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatVersion {
    #[default]
    V1_0_0,
    V1_1_0,
    V2_0_0,
}

impl FormatVersion {
    /// Parse a `#VERSION` header value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "1.0.0" => Some(FormatVersion::V1_0_0),
            "1.1.0" => Some(FormatVersion::V1_1_0),
            "2.0.0" => Some(FormatVersion::V2_0_0),
            _ => None,
        }
    }

    /// Whether the primary audio reference uses the newer `AUDIO` key
    /// instead of `MP3`.
    pub fn uses_audio_key(&self) -> bool {
        !matches!(self, FormatVersion::V1_0_0)
    }

    /// Whether video gap and medley bounds are expressed in
    /// milliseconds rather than seconds/beats.
    pub fn uses_millisecond_units(&self) -> bool {
        matches!(self, FormatVersion::V2_0_0)
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FormatVersion::V1_0_0 => "1.0.0",
            FormatVersion::V1_1_0 => "1.1.0",
            FormatVersion::V2_0_0 => "2.0.0",
        };
        f.write_str(s)
    }
}

/// Scalar song header tags.
///
/// Numeric fields default to zero; the writer omits zero-valued numeric
/// tags, which makes "explicitly zero" indistinguishable from "unset"
/// (observed behavior of the source format, kept as-is).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongTags {
    pub title: String,
    pub artist: String,
    /// Beats per minute.
    pub bpm: f64,
    /// Offset from audio start to beat zero, in milliseconds.
    pub gap_ms: f64,
    /// Primary audio reference (local path).
    pub audio_file: String,
    pub video_file: Option<String>,
    pub cover_file: Option<String>,
    pub background_file: Option<String>,
    /// URL forms of the media references.
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    pub cover_url: Option<String>,
    /// Delay of the video relative to the audio, in seconds.
    pub video_gap_secs: f64,
    /// Playback start offset in seconds.
    pub start_secs: f64,
    /// Playback end in milliseconds.
    pub end_ms: f64,
    /// Preview window bounds in seconds.
    pub preview_start_secs: f64,
    pub preview_end_secs: f64,
    /// Medley bounds in beats.
    pub medley_start_beat: i32,
    pub medley_end_beat: i32,
    pub version: FormatVersion,
    /// Unrecognized headers, preserved verbatim and in order.
    pub unknown: Vec<(String, String)>,
}

impl SongTags {
    /// Convert a beat position to milliseconds from audio start.
    pub fn beat_to_millis(&self, beat: i32) -> f64 {
        // Beats count quarter-beat ticks: the format's BPM is 4x the
        // musical tempo.
        self.gap_ms + f64::from(beat) * 60_000.0 / (self.bpm * 4.0)
    }

    /// Convert milliseconds from audio start to the nearest beat.
    pub fn millis_to_beat(&self, millis: f64) -> i32 {
        ((millis - self.gap_ms) * self.bpm * 4.0 / 60_000.0).round() as i32
    }
}

/// The in-memory, beat-indexed model of one song.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongDocument {
    voices: Vec<Voice>,
    tags: SongTags,
}

impl SongDocument {
    pub fn new(tags: SongTags) -> Self {
        Self {
            voices: Vec::new(),
            tags,
        }
    }

    pub fn tags(&self) -> &SongTags {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut SongTags {
        &mut self.tags
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voices_mut(&mut self) -> &mut Vec<Voice> {
        &mut self.voices
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.iter().find(|v| v.id() == id)
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|v| v.id() == id)
    }

    pub fn get_or_create_voice(&mut self, id: VoiceId) -> &mut Voice {
        let pos = match self.voices.iter().position(|v| v.id() == id) {
            Some(pos) => pos,
            None => {
                self.voices.push(Voice::new(id));
                self.voices.len() - 1
            }
        };
        &mut self.voices[pos]
    }

    /// Voices ordered by id, as emitted by the writer.
    pub fn sorted_voices(&self) -> Vec<&Voice> {
        let mut sorted: Vec<&Voice> = self.voices.iter().collect();
        sorted.sort_by_key(|v| v.id());
        sorted
    }

    pub fn all_notes(&self) -> impl Iterator<Item = &Note> {
        self.voices.iter().flat_map(|v| v.all_notes())
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.voices.iter().find_map(|v| v.note(id))
    }

    pub fn note_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.voices.iter_mut().find_map(|v| v.note_mut(id))
    }

    /// Detach the given notes from whichever voices hold them and append
    /// them to `target` as a new sentence. Returns the ids that were
    /// actually moved; callers pass those on as a
    /// `SongEvent::NotesMovedToVoice` so layers can purge stale
    /// memberships.
    pub fn move_notes_to_voice(&mut self, ids: &[NoteId], target: VoiceId) -> Vec<NoteId> {
        let mut detached = Vec::new();
        for &id in ids {
            // Skip notes already in the target voice.
            if self.voice(target).is_some_and(|v| v.note(id).is_some()) {
                continue;
            }
            if let Some(note) = self.voices.iter_mut().find_map(|v| v.remove_note(id)) {
                detached.push(note);
            }
        }
        for voice in &mut self.voices {
            voice.remove_empty_sentences();
        }
        if detached.is_empty() {
            return Vec::new();
        }
        let moved: Vec<NoteId> = detached.iter().map(|n| n.id()).collect();
        self.get_or_create_voice(target)
            .add_sentence(Sentence::with_notes(detached));
        moved
    }

    /// Reload in place: overwrite this document's fields with `other`'s
    /// so references to the document keep observing the same object.
    pub fn replace_contents(&mut self, other: SongDocument) {
        self.voices = other.voices;
        self.tags = other.tags;
    }
}
