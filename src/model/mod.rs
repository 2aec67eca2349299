//! Song Document Model
//!
//! Leaf-to-root: notes form sentences, sentences form voices, voices
//! plus scalar tags form the song document.

pub mod note;
pub mod sentence;
pub mod song;
pub mod voice;

pub use note::{Note, NoteId, NoteType};
pub use sentence::Sentence;
pub use song::{FormatVersion, SongDocument, SongTags};
pub use voice::{Voice, VoiceId};
