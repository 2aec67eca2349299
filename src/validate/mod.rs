//! Structural Validation Module
//!
//! Single-pass analysis of a song document that flags timing defects
//! as a non-fatal issue list. Issues carry a stable message key and a
//! beat range; rendering human-readable text is left to the caller's
//! localization layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{SongDocument, VoiceId};

/// Lowest MIDI note considered singable (C2).
pub const SINGABLE_MIDI_MIN: i32 = 36;
/// Highest MIDI note considered singable (C6).
pub const SINGABLE_MIDI_MAX: i32 = 84;

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// The kind of defect found; doubles as the grouping key for capping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    SentenceOverlap,
    NoteOverlap,
    PitchOutOfRange,
    MissingLyric,
}

impl IssueKind {
    /// Stable message key handed to the localization layer.
    pub fn message_key(&self) -> &'static str {
        match self {
            IssueKind::SentenceOverlap => "issue.sentence_overlap",
            IssueKind::NoteOverlap => "issue.note_overlap",
            IssueKind::PitchOutOfRange => "issue.pitch_out_of_range",
            IssueKind::MissingLyric => "issue.missing_lyric",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::SentenceOverlap | IssueKind::NoteOverlap => Severity::Error,
            IssueKind::PitchOutOfRange | IssueKind::MissingLyric => Severity::Warning,
        }
    }
}

/// A non-fatal finding about the document's structural consistency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub voice: VoiceId,
    pub start_beat: i32,
    pub end_beat: i32,
}

impl Issue {
    fn new(kind: IssueKind, voice: VoiceId, start_beat: i32, end_beat: i32) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            voice,
            start_beat,
            end_beat,
        }
    }
}

/// Validator settings.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Issues beyond this count per kind are silently dropped to bound
    /// log/UI volume.
    pub max_issues_per_kind: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_issues_per_kind: 25,
        }
    }
}

struct IssueCollector {
    issues: Vec<Issue>,
    counts: HashMap<IssueKind, usize>,
    cap: usize,
}

impl IssueCollector {
    fn push(&mut self, issue: Issue) {
        let count = self.counts.entry(issue.kind).or_insert(0);
        if *count >= self.cap {
            return;
        }
        *count += 1;
        self.issues.push(issue);
    }
}

/// Validate a document, returning all issues found (subject to the
/// per-kind cap).
pub fn validate(doc: &SongDocument, config: &ValidatorConfig) -> Vec<Issue> {
    let mut collector = IssueCollector {
        issues: Vec::new(),
        counts: HashMap::new(),
        cap: config.max_issues_per_kind,
    };

    for voice in doc.voices() {
        let sentences = voice.sorted_sentences();

        for pair in sentences.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if let (Some(prev_end), Some(next_min)) =
                (prev.extended_max_beat(), next.min_beat())
            {
                if next_min < prev_end {
                    collector.push(Issue::new(
                        IssueKind::SentenceOverlap,
                        voice.id(),
                        next_min,
                        prev_end,
                    ));
                }
            }
        }

        for sentence in sentences {
            let notes = sentence.sorted_notes();
            for pair in notes.windows(2) {
                let (prev, next) = (pair[0], pair[1]);
                if next.start_beat() < prev.end_beat() {
                    collector.push(Issue::new(
                        IssueKind::NoteOverlap,
                        voice.id(),
                        next.start_beat(),
                        prev.end_beat(),
                    ));
                }
            }
            for note in notes {
                if note.midi_note() < SINGABLE_MIDI_MIN || note.midi_note() > SINGABLE_MIDI_MAX {
                    collector.push(Issue::new(
                        IssueKind::PitchOutOfRange,
                        voice.id(),
                        note.start_beat(),
                        note.end_beat(),
                    ));
                }
                if note.text().trim().is_empty() {
                    collector.push(Issue::new(
                        IssueKind::MissingLyric,
                        voice.id(),
                        note.start_beat(),
                        note.end_beat(),
                    ));
                }
            }
        }
    }

    collector.issues
}
