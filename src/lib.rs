//! Melisma - Karaoke Song Document Engine
//!
//! An in-memory, beat-indexed model of a karaoke song's lyrics and
//! notes, with bidirectional conversion to a line-oriented plain-text
//! format, structural validation, non-owning note layers for editing
//! workflows, and a bounded snapshot-based undo/redo history.
//!
//! # Architecture
//!
//! Leaf-to-root: notes form sentences, sentences form voices, and
//! voices plus scalar tags form the [`model::SongDocument`]. The
//! [`format`] module converts text to and from the document, [`validate`]
//! flags timing defects as a non-fatal issue list, and [`edit`] holds
//! the layer and history managers driven by explicit change events.
//!
//! The engine is single-threaded and cooperative: all mutation,
//! validation, and history operations run on one logical timeline.

pub mod cli;
pub mod edit;
pub mod error;
pub mod format;
pub mod model;
pub mod validate;

pub use error::{MelismaError, Result};
