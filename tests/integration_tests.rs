//! Integration Tests
//!
//! End-to-end tests for the Melisma song document engine: parse,
//! validate, edit, snapshot, and write back.

use std::path::{Path, PathBuf};
use std::time::Instant;

use pretty_assertions::assert_eq;

use melisma::edit::{HistoryConfig, HistoryManager, LayerKey, LayerManager, SongEvent};
use melisma::format::{parse_file, parse_str, write_file, write_string};
use melisma::model::{FormatVersion, NoteType, SongDocument, VoiceId};
use melisma::validate::{validate, IssueKind, Severity, ValidatorConfig};
use melisma::MelismaError;

const FIXTURE: &str = "\
#TITLE:Round Trip
#ARTIST:The Testers
#MP3:round_trip.ogg
#BPM:300
#GAP:1000
#GENRE:Pop
: 0 4 0 One
: 4 4 2 two
- 10
* 12 4 4 Three
F 16 2 0 four
- 20
E
";

const DUET_FIXTURE: &str = "\
#TITLE:Duet
#ARTIST:Two Singers
#MP3:duet.ogg
#BPM:240
#P1:Alice
#P2:Bob
P1
: 0 4 0 mine
- 6
P2
: 8 4 0 yours
- 14
E
";

fn path() -> PathBuf {
    PathBuf::from("fixture.txt")
}

/// The value-level shape of a document, independent of note identities.
fn note_shapes(doc: &SongDocument) -> Vec<(u32, i32, i32, i32, NoteType, String)> {
    let mut shapes = Vec::new();
    for voice in doc.sorted_voices() {
        for sentence in voice.sorted_sentences() {
            for note in sentence.sorted_notes() {
                shapes.push((
                    voice.id().0,
                    note.start_beat(),
                    note.length(),
                    note.txt_pitch(),
                    note.note_type(),
                    note.text().to_string(),
                ));
            }
        }
    }
    shapes
}

// === Round-trip Law ===

#[test]
fn test_write_parse_round_trip_is_stable() {
    let doc = parse_str(FIXTURE, &path()).unwrap();
    let first = write_string(&doc, doc.tags().version);
    let reparsed = parse_str(&first, &path()).unwrap();
    let second = write_string(&reparsed, reparsed.tags().version);

    assert_eq!(first, second);
    assert_eq!(note_shapes(&doc), note_shapes(&reparsed));
    assert_eq!(doc.tags().title, reparsed.tags().title);
    assert_eq!(doc.tags().gap_ms, reparsed.tags().gap_ms);
    assert_eq!(doc.tags().unknown, reparsed.tags().unknown);
}

#[test]
fn test_duet_round_trip_keeps_voices_and_names() {
    let doc = parse_str(DUET_FIXTURE, &path()).unwrap();
    let out = write_string(&doc, doc.tags().version);
    let reparsed = parse_str(&out, &path()).unwrap();

    assert_eq!(note_shapes(&doc), note_shapes(&reparsed));
    assert_eq!(
        reparsed.voice(VoiceId(1)).unwrap().display_name(),
        Some("Alice")
    );
    assert_eq!(
        reparsed.voice(VoiceId(2)).unwrap().display_name(),
        Some("Bob")
    );
    // Break beats survive the trip.
    assert_eq!(
        reparsed.voice(VoiceId(1)).unwrap().sentences()[0].extended_max_beat(),
        Some(6)
    );
}

#[test]
fn test_version_upgrade_round_trip() {
    let doc = parse_str(FIXTURE, &path()).unwrap();
    let upgraded = write_string(&doc, FormatVersion::V1_1_0);
    assert!(upgraded.starts_with("#VERSION:1.1.0\n"));
    assert!(upgraded.contains("#AUDIO:round_trip.ogg"));

    let reparsed = parse_str(&upgraded, &path()).unwrap();
    assert_eq!(reparsed.tags().version, FormatVersion::V1_1_0);
    assert_eq!(note_shapes(&doc), note_shapes(&reparsed));
}

// === File I/O ===

#[test]
fn test_parse_and_write_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("song.txt");
    std::fs::write(&input, FIXTURE).unwrap();

    let doc = parse_file(&input).unwrap();
    assert_eq!(doc.tags().title, "Round Trip");

    let output = dir.path().join("out.txt");
    write_file(&doc, doc.tags().version, &output).unwrap();
    let reparsed = parse_file(&output).unwrap();
    assert_eq!(note_shapes(&doc), note_shapes(&reparsed));
}

#[test]
fn test_parse_error_names_file_and_line() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.txt");
    std::fs::write(&input, "#TITLE:T\n#ARTIST:A\n#BPM:nope\n#MP3:a.ogg\nE\n").unwrap();

    let err = parse_file(&input).unwrap_err();
    match err {
        MelismaError::InvalidNumericField { path, line, value } => {
            assert_eq!(path, input);
            assert_eq!(line, 3);
            assert_eq!(value, "nope");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_missing_tempo_header_is_fatal() {
    let err = parse_str(
        "#TITLE:T\n#ARTIST:A\n#MP3:a.ogg\n: 0 4 0 Hi\nE\n",
        Path::new("no_bpm.txt"),
    )
    .unwrap_err();
    match err {
        MelismaError::MissingRequiredHeader { path, key } => {
            assert_eq!(path, Path::new("no_bpm.txt"));
            assert_eq!(key, "BPM");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// === Validation ===

#[test]
fn test_validator_on_parsed_fixture() {
    // Second note starts before the first ends.
    let text = "\
#TITLE:Overlap
#ARTIST:A
#MP3:a.ogg
#BPM:300
: 0 4 0 A
: 2 4 0 B
E
";
    let doc = parse_str(text, &path()).unwrap();
    let issues = validate(&doc, &ValidatorConfig::default());

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::NoteOverlap);
    assert_eq!(issues[0].severity, Severity::Error);
    assert_eq!(issues[0].start_beat, 2);
    assert_eq!(issues[0].end_beat, 4);

    let clean = parse_str(FIXTURE, &path()).unwrap();
    assert!(validate(&clean, &ValidatorConfig::default()).is_empty());
}

// === Editing, Layers, and History ===

#[test]
fn test_moving_notes_between_voices_purges_layers() {
    let mut doc = parse_str(FIXTURE, &path()).unwrap();
    let mut layers = LayerManager::new();

    let ids: Vec<_> = doc.all_notes().map(|n| n.id()).collect();
    let moved_id = ids[0];
    let kept_id = ids[1];
    let note = doc.note(moved_id).unwrap().clone();
    layers.add_note(LayerKey::MicRecording, note);
    layers.add_note(
        LayerKey::MicRecording,
        doc.note(kept_id).unwrap().clone(),
    );

    let moved = doc.move_notes_to_voice(&[moved_id], VoiceId(2));
    let event = SongEvent::NotesMovedToVoice {
        note_ids: moved,
        target: VoiceId(2),
    };
    layers.handle_event(&event);

    assert!(!layers.contains(LayerKey::MicRecording, moved_id));
    assert!(layers.contains(LayerKey::MicRecording, kept_id));
    assert!(doc.voice(VoiceId(2)).unwrap().note(moved_id).is_some());
}

#[test]
fn test_undo_redo_across_document_and_layers() {
    let mut doc = parse_str(FIXTURE, &path()).unwrap();
    let mut layers = LayerManager::new();
    let mut history = HistoryManager::new(HistoryConfig::default(), &doc, &layers);
    let t0 = Instant::now();
    let quiet = HistoryConfig::default().quiet_period;

    let before = doc.clone();

    // Edit 1: retitle, snapshotted via the debounce.
    doc.tags_mut().title = "Renamed".to_string();
    history.record_event(&SongEvent::TagsChanged, t0);
    assert!(history.poll(t0 + quiet, &doc, &layers));

    // Edit 2: clipboard gains a note, another snapshot.
    let copied = doc.all_notes().next().unwrap().duplicate();
    layers.add_note(LayerKey::Clipboard, copied);
    history.record_event(
        &SongEvent::SentencesChanged {
            voice: VoiceId::FIRST,
        },
        t0 + quiet * 2,
    );
    assert!(history.poll(t0 + quiet * 3, &doc, &layers));

    // Walk all the way back, then all the way forward.
    let undone = history.undo(&mut doc, &mut layers);
    assert!(undone);
    assert!(history.undo(&mut doc, &mut layers));
    assert!(!history.undo(&mut doc, &mut layers));

    assert_eq!(doc, before);
    assert!(layers.notes_in_layer(LayerKey::Clipboard).is_empty());

    assert!(history.redo(&mut doc, &mut layers));
    assert!(history.redo(&mut doc, &mut layers));
    assert!(!history.redo(&mut doc, &mut layers));

    assert_eq!(doc.tags().title, "Renamed");
    assert_eq!(layers.notes_in_layer(LayerKey::Clipboard).len(), 1);
}

#[test]
fn test_history_never_exceeds_configured_maximum() {
    let mut doc = parse_str(FIXTURE, &path()).unwrap();
    let layers = LayerManager::new();
    let config = HistoryConfig {
        max_states: 8,
        ..HistoryConfig::default()
    };
    let mut history = HistoryManager::new(config, &doc, &layers);

    for i in 0..50 {
        doc.tags_mut().title = format!("Title {i}");
        history.add_undo_state(&doc, &layers);
        assert!(history.len() <= 8);
    }
}

#[test]
fn test_reload_in_place_after_external_edit() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("song.txt");
    std::fs::write(&input, FIXTURE).unwrap();

    let mut doc = parse_file(&input).unwrap();
    doc.tags_mut().title = "Scratch".to_string();

    // Reload overwrites the same document object.
    let reloaded = parse_file(&input).unwrap();
    doc.replace_contents(reloaded);
    assert_eq!(doc.tags().title, "Round Trip");
}
