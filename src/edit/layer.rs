//! Note layers
//!
//! Enum-keyed side collections of notes independent of voice ownership:
//! recording sources, the clipboard, and one implicit layer per voice.
//! Membership is bookkeeping, not ownership — a note is owned by exactly
//! one sentence but may be tracked by several layers, keyed by its
//! identity. When notes move to a different voice their stale layer
//! memberships are purged, since a membership that outlives the note's
//! real location is a dangling reference.

use std::collections::HashSet;

use crate::edit::event::SongEvent;
use crate::model::{Note, NoteId, VoiceId};

/// The closed set of layer keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKey {
    /// Notes produced by pitch-detected microphone recording.
    MicRecording,
    /// Notes produced by manual button-press recording.
    ButtonRecording,
    /// Cut/copied notes awaiting paste.
    Clipboard,
    /// The implicit per-voice layer.
    Voice(VoiceId),
}

/// One keyed bucket of notes.
#[derive(Debug, Clone)]
pub struct Layer {
    key: LayerKey,
    enabled: bool,
    notes: Vec<Note>,
    ids: HashSet<NoteId>,
}

impl Layer {
    fn new(key: LayerKey) -> Self {
        Self {
            key,
            enabled: true,
            notes: Vec::new(),
            ids: HashSet::new(),
        }
    }

    pub fn key(&self) -> LayerKey {
        self.key
    }

    /// Disabled is a display/use hint, not a deletion.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.ids.contains(&id)
    }

    fn add(&mut self, note: Note) {
        if self.ids.insert(note.id()) {
            self.notes.push(note);
        }
    }

    fn remove(&mut self, id: NoteId) -> bool {
        if self.ids.remove(&id) {
            self.notes.retain(|n| n.id() != id);
            true
        } else {
            false
        }
    }

    fn clear(&mut self) {
        self.notes.clear();
        self.ids.clear();
    }
}

/// Deep-cloned state of one layer, as captured in a history snapshot.
#[derive(Debug, Clone)]
pub struct LayerState {
    pub key: LayerKey,
    pub enabled: bool,
    pub notes: Vec<Note>,
}

/// Maintains every layer. The recording and clipboard layers always
/// exist; voice layers are created on first use.
#[derive(Debug, Clone)]
pub struct LayerManager {
    layers: Vec<Layer>,
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerManager {
    pub fn new() -> Self {
        Self {
            layers: vec![
                Layer::new(LayerKey::MicRecording),
                Layer::new(LayerKey::ButtonRecording),
                Layer::new(LayerKey::Clipboard),
            ],
        }
    }

    fn layer(&self, key: LayerKey) -> Option<&Layer> {
        self.layers.iter().find(|l| l.key == key)
    }

    fn layer_mut(&mut self, key: LayerKey) -> &mut Layer {
        let pos = match self.layers.iter().position(|l| l.key == key) {
            Some(pos) => pos,
            None => {
                self.layers.push(Layer::new(key));
                self.layers.len() - 1
            }
        };
        &mut self.layers[pos]
    }

    /// Track a note in a layer. Identity-keyed: re-adding a note already
    /// in the layer is a no-op.
    pub fn add_note(&mut self, key: LayerKey, note: Note) {
        self.layer_mut(key).add(note);
    }

    pub fn clear_layer(&mut self, key: LayerKey) {
        self.layer_mut(key).clear();
    }

    pub fn set_enabled(&mut self, key: LayerKey, enabled: bool) {
        self.layer_mut(key).enabled = enabled;
    }

    pub fn is_enabled(&self, key: LayerKey) -> bool {
        self.layer(key).map_or(true, |l| l.enabled)
    }

    pub fn notes_in_layer(&self, key: LayerKey) -> &[Note] {
        self.layer(key).map(|l| l.notes()).unwrap_or(&[])
    }

    pub fn all_notes(&self) -> impl Iterator<Item = &Note> {
        self.layers.iter().flat_map(|l| l.notes.iter())
    }

    pub fn contains(&self, key: LayerKey, id: NoteId) -> bool {
        self.layer(key).is_some_and(|l| l.contains(id))
    }

    /// Remove a note from every layer that tracks it.
    pub fn remove_note_everywhere(&mut self, id: NoteId) {
        for layer in &mut self.layers {
            layer.remove(id);
        }
    }

    /// React to a completed document change.
    pub fn handle_event(&mut self, event: &SongEvent) {
        if let SongEvent::NotesMovedToVoice { note_ids, .. } = event {
            for &id in note_ids {
                self.remove_note_everywhere(id);
            }
        }
    }

    /// Deep-cloned state of all layers, for history snapshots.
    pub fn snapshot(&self) -> Vec<LayerState> {
        self.layers
            .iter()
            .map(|l| LayerState {
                key: l.key,
                enabled: l.enabled,
                notes: l.notes.clone(),
            })
            .collect()
    }

    /// Clear every layer and refill from a snapshot.
    pub fn restore(&mut self, snapshot: &[LayerState]) {
        self.layers = snapshot
            .iter()
            .map(|state| {
                let mut layer = Layer::new(state.key);
                layer.enabled = state.enabled;
                for note in &state.notes {
                    layer.add(note.clone());
                }
                layer
            })
            .collect();
        // The fixed layers survive even if the snapshot predates them.
        for key in [
            LayerKey::MicRecording,
            LayerKey::ButtonRecording,
            LayerKey::Clipboard,
        ] {
            if self.layer(key).is_none() {
                self.layers.push(Layer::new(key));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NoteType;

    fn note(start: i32) -> Note {
        Note::new(NoteType::Normal, start, 2, 0, "x").unwrap()
    }

    #[test]
    fn test_add_and_membership() {
        let mut layers = LayerManager::new();
        let n = note(0);
        let id = n.id();
        layers.add_note(LayerKey::MicRecording, n.clone());
        layers.add_note(LayerKey::MicRecording, n);

        assert!(layers.contains(LayerKey::MicRecording, id));
        assert!(!layers.contains(LayerKey::Clipboard, id));
        assert_eq!(layers.notes_in_layer(LayerKey::MicRecording).len(), 1);
    }

    #[test]
    fn test_note_tracked_by_multiple_layers() {
        let mut layers = LayerManager::new();
        let n = note(0);
        let id = n.id();
        layers.add_note(LayerKey::MicRecording, n.clone());
        layers.add_note(LayerKey::Voice(VoiceId::FIRST), n);

        assert_eq!(layers.all_notes().count(), 2);

        layers.remove_note_everywhere(id);
        assert_eq!(layers.all_notes().count(), 0);
    }

    #[test]
    fn test_disable_is_a_hint_not_a_deletion() {
        let mut layers = LayerManager::new();
        layers.add_note(LayerKey::ButtonRecording, note(0));
        layers.set_enabled(LayerKey::ButtonRecording, false);

        assert!(!layers.is_enabled(LayerKey::ButtonRecording));
        assert_eq!(layers.notes_in_layer(LayerKey::ButtonRecording).len(), 1);
    }

    #[test]
    fn test_moved_notes_purged_from_all_layers() {
        let mut layers = LayerManager::new();
        let n = note(0);
        let id = n.id();
        layers.add_note(LayerKey::MicRecording, n.clone());
        layers.add_note(LayerKey::Clipboard, n);
        layers.add_note(LayerKey::ButtonRecording, note(4));

        layers.handle_event(&SongEvent::NotesMovedToVoice {
            note_ids: vec![id],
            target: VoiceId(2),
        });

        assert!(!layers.contains(LayerKey::MicRecording, id));
        assert!(!layers.contains(LayerKey::Clipboard, id));
        assert_eq!(layers.notes_in_layer(LayerKey::ButtonRecording).len(), 1);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut layers = LayerManager::new();
        layers.add_note(LayerKey::Clipboard, note(0));
        layers.set_enabled(LayerKey::MicRecording, false);

        let snapshot = layers.snapshot();
        layers.clear_layer(LayerKey::Clipboard);
        layers.set_enabled(LayerKey::MicRecording, true);

        layers.restore(&snapshot);
        assert_eq!(layers.notes_in_layer(LayerKey::Clipboard).len(), 1);
        assert!(!layers.is_enabled(LayerKey::MicRecording));
    }

    #[test]
    fn test_snapshot_is_independent_of_live_state() {
        let mut layers = LayerManager::new();
        layers.add_note(LayerKey::Clipboard, note(0));
        let snapshot = layers.snapshot();

        layers.clear_layer(LayerKey::Clipboard);
        assert_eq!(snapshot[2].notes.len(), 1);
    }
}
