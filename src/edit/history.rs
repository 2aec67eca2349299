//! Undo/Redo History
//!
//! A bounded linear history of deep-cloned snapshots ("mementos")
//! spanning the song document, all layers, and the scalar tags. The
//! history is a list plus an index: adding a state while not at the
//! tail abandons the redo branch, and the buffer evicts from the head
//! when it exceeds the configured maximum.
//!
//! Snapshots are captured automatically after a quiet period of edits —
//! a debounce driven by the caller's clock, not a background thread.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::debug;

use crate::edit::event::SongEvent;
use crate::edit::layer::{LayerManager, LayerState};
use crate::model::{SongDocument, SongTags, Voice};

/// Default maximum number of history states to keep.
pub const DEFAULT_MAX_STATES: usize = 60;

/// Default quiet period before an automatic snapshot fires.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(700);

/// An immutable deep snapshot of the whole editable state.
#[derive(Debug, Clone)]
pub struct Memento {
    captured_at: DateTime<Utc>,
    voices: Vec<Voice>,
    layers: Vec<LayerState>,
    tags: SongTags,
}

impl Memento {
    /// Deep-clone the live state. The memento and the live document
    /// share no mutable leaf state afterwards.
    fn capture(doc: &SongDocument, layers: &LayerManager) -> Self {
        Self {
            captured_at: Utc::now(),
            voices: doc.voices().to_vec(),
            layers: layers.snapshot(),
            tags: doc.tags().clone(),
        }
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

/// History settings.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub max_states: usize,
    pub quiet_period: Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_states: DEFAULT_MAX_STATES,
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

/// Bounded linear undo/redo over mementos.
#[derive(Debug)]
pub struct HistoryManager {
    history: Vec<Memento>,
    index: usize,
    config: HistoryConfig,
    pending_since: Option<Instant>,
}

impl HistoryManager {
    /// Create a history with an initial snapshot of the just-loaded
    /// state at index 0.
    pub fn new(config: HistoryConfig, doc: &SongDocument, layers: &LayerManager) -> Self {
        Self {
            history: vec![Memento::capture(doc, layers)],
            index: 0,
            config,
            pending_since: None,
        }
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.history.len()
    }

    /// Capture times of all states, oldest first (for a history UI).
    pub fn captured_times(&self) -> Vec<DateTime<Utc>> {
        self.history.iter().map(|m| m.captured_at()).collect()
    }

    /// Append a snapshot of the current state.
    ///
    /// Discards the redo branch when the index is not at the tail, then
    /// evicts from the head while the buffer exceeds its maximum.
    pub fn add_undo_state(&mut self, doc: &SongDocument, layers: &LayerManager) {
        self.pending_since = None;
        self.history.truncate(self.index + 1);
        self.history.push(Memento::capture(doc, layers));
        while self.history.len() > self.config.max_states {
            self.history.remove(0);
        }
        self.index = self.history.len() - 1;
        debug!("undo state added ({} states)", self.history.len());
    }

    /// Step back one state. Silent no-op at the beginning.
    /// Returns whether a restore happened.
    pub fn undo(&mut self, doc: &mut SongDocument, layers: &mut LayerManager) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        self.restore(self.index, doc, layers);
        true
    }

    /// Step forward one state. Silent no-op at the tail.
    /// Returns whether a restore happened.
    pub fn redo(&mut self, doc: &mut SongDocument, layers: &mut LayerManager) -> bool {
        if self.index + 1 >= self.history.len() {
            return false;
        }
        self.index += 1;
        self.restore(self.index, doc, layers);
        true
    }

    /// Restart the quiet-period timer for undoable events. Events
    /// produced by a restore or a load never schedule a snapshot.
    pub fn record_event(&mut self, event: &SongEvent, now: Instant) {
        if event.is_undoable() {
            self.pending_since = Some(now);
        }
    }

    /// Fire the pending auto-snapshot once the quiet period has elapsed
    /// with no further undoable event. Returns whether a snapshot was
    /// taken.
    pub fn poll(&mut self, now: Instant, doc: &SongDocument, layers: &LayerManager) -> bool {
        match self.pending_since {
            Some(since) if now.duration_since(since) >= self.config.quiet_period => {
                self.add_undo_state(doc, layers);
                true
            }
            _ => false,
        }
    }

    /// Restore `self.history[index]` into the live state.
    ///
    /// Voices are reconciled by id: matches are updated in place with
    /// their sentences replaced wholesale by clones from the memento,
    /// memento-only voices are created, and live-only voices are
    /// removed. Layers are cleared and refilled; tags are overwritten.
    fn restore(&self, index: usize, doc: &mut SongDocument, layers: &mut LayerManager) {
        let memento = &self.history[index];

        for voice in &memento.voices {
            match doc.voice_mut(voice.id()) {
                Some(live) => {
                    *live.sentences_mut() = voice.sentences().to_vec();
                    if let Some(name) = voice.display_name() {
                        live.set_display_name(name);
                    }
                }
                None => doc.voices_mut().push(voice.clone()),
            }
        }
        doc.voices_mut()
            .retain(|v| memento.voices.iter().any(|mv| mv.id() == v.id()));

        layers.restore(&memento.layers);
        *doc.tags_mut() = memento.tags.clone();
    }
}
