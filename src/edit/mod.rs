//! Editing Support Module
//!
//! Change events, non-owning note layers, and snapshot-based undo/redo.

pub mod event;
pub mod history;
pub mod layer;

pub use event::SongEvent;
pub use history::{HistoryConfig, HistoryManager, Memento};
pub use layer::{Layer, LayerKey, LayerManager, LayerState};
