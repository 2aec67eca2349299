//! Change events
//!
//! Explicit event values describing a completed document mutation.
//! Callers pass them to [`crate::edit::LayerManager::handle_event`] and
//! [`crate::edit::HistoryManager::record_event`] after the mutation, so
//! ordering is determined by the call site instead of an implicit
//! observer chain.

use crate::model::{NoteId, VoiceId};

/// A completed change to the song document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SongEvent {
    /// Note fields (bounds, pitch, text, type) were changed.
    NotesChanged { note_ids: Vec<NoteId> },
    /// Sentence structure of a voice changed (split, join, reorder).
    SentencesChanged { voice: VoiceId },
    /// Notes were detached from their voices and attached to `target`.
    NotesMovedToVoice {
        note_ids: Vec<NoteId>,
        target: VoiceId,
    },
    /// Scalar song tags changed.
    TagsChanged,
    /// A file was loaded (or reloaded) into the document.
    LoadedFromFile,
    /// The document was overwritten by an undo/redo restore.
    HistoryRestored,
}

impl SongEvent {
    /// Whether this event should (re)start the auto-snapshot timer.
    /// Restores and loads are excluded to prevent feedback loops.
    pub fn is_undoable(&self) -> bool {
        !matches!(
            self,
            SongEvent::LoadedFromFile | SongEvent::HistoryRestored
        )
    }
}
