//! Voice model
//!
//! A named, ordered collection of sentences, one per singer/part.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::note::{Note, NoteId};
use crate::model::sentence::Sentence;

/// 1-based singer index, displayed as `P1`, `P2`, ...
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct VoiceId(pub u32);

impl VoiceId {
    /// The implicit voice used when a file carries no voice markers.
    pub const FIRST: VoiceId = VoiceId(1);

    /// Parse a voice marker such as `P2`.
    pub fn from_marker(marker: &str) -> Option<Self> {
        let digits = marker.strip_prefix('P')?;
        let n: u32 = digits.parse().ok()?;
        if n == 0 {
            return None;
        }
        Some(VoiceId(n))
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// A named track of sentences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    id: VoiceId,
    /// Display-name override from a `#P<n>:` header, if any.
    display_name: Option<String>,
    sentences: Vec<Sentence>,
}

impl Voice {
    pub fn new(id: VoiceId) -> Self {
        Self {
            id,
            display_name: None,
            sentences: Vec::new(),
        }
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = Some(name.into());
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn sentences_mut(&mut self) -> &mut Vec<Sentence> {
        &mut self.sentences
    }

    pub fn add_sentence(&mut self, sentence: Sentence) {
        self.sentences.push(sentence);
    }

    /// Sentences ordered by their minimum beat; empty sentences sort last.
    pub fn sorted_sentences(&self) -> Vec<&Sentence> {
        let mut sorted: Vec<&Sentence> = self.sentences.iter().collect();
        sorted.sort_by_key(|s| s.min_beat().unwrap_or(i32::MAX));
        sorted
    }

    pub fn all_notes(&self) -> impl Iterator<Item = &Note> {
        self.sentences.iter().flat_map(|s| s.notes().iter())
    }

    /// Total note count across all sentences.
    pub fn note_count(&self) -> usize {
        self.sentences.iter().map(|s| s.len()).sum()
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.sentences.iter().find_map(|s| s.note(id))
    }

    pub fn note_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.sentences.iter_mut().find_map(|s| s.note_mut(id))
    }

    /// Detach a note from whichever sentence holds it.
    pub fn remove_note(&mut self, id: NoteId) -> Option<Note> {
        self.sentences.iter_mut().find_map(|s| s.remove_note(id))
    }

    /// Drop sentences that no longer contain notes.
    pub fn remove_empty_sentences(&mut self) {
        self.sentences.retain(|s| !s.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::note::NoteType;

    fn sentence(start: i32) -> Sentence {
        Sentence::with_notes(vec![
            Note::new(NoteType::Normal, start, 2, 0, "x").unwrap(),
        ])
    }

    #[test]
    fn test_voice_marker_parsing() {
        assert_eq!(VoiceId::from_marker("P1"), Some(VoiceId(1)));
        assert_eq!(VoiceId::from_marker("P12"), Some(VoiceId(12)));
        assert_eq!(VoiceId::from_marker("P0"), None);
        assert_eq!(VoiceId::from_marker("P"), None);
        assert_eq!(VoiceId::from_marker("Q1"), None);
        assert_eq!(VoiceId(2).to_string(), "P2");
    }

    #[test]
    fn test_sorted_sentences_by_min_beat() {
        let mut voice = Voice::new(VoiceId::FIRST);
        voice.add_sentence(sentence(16));
        voice.add_sentence(sentence(0));

        let order: Vec<i32> = voice
            .sorted_sentences()
            .iter()
            .map(|s| s.min_beat().unwrap())
            .collect();
        assert_eq!(order, vec![0, 16]);
    }

    #[test]
    fn test_note_lookup_and_removal() {
        let mut voice = Voice::new(VoiceId::FIRST);
        voice.add_sentence(sentence(0));
        voice.add_sentence(sentence(8));
        let id = voice.sentences()[1].notes()[0].id();

        assert!(voice.note(id).is_some());
        assert_eq!(voice.note_count(), 2);

        let removed = voice.remove_note(id).unwrap();
        assert_eq!(removed.id(), id);
        assert_eq!(voice.note_count(), 1);

        voice.remove_empty_sentences();
        assert_eq!(voice.sentences().len(), 1);
    }
}
