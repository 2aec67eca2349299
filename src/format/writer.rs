//! Song file writer
//!
//! Emits a [`SongDocument`] back to the line-oriented text format. The
//! emitted header keys and units are gated on the target format
//! version. Numeric tags whose value equals the type default are
//! omitted, matching the observed behavior of existing files.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{MelismaError, Result};
use crate::model::{FormatVersion, SongDocument, Voice};

/// Serialize a document at the given target version.
pub fn write_string(doc: &SongDocument, version: FormatVersion) -> String {
    let mut out = String::new();
    write_headers(doc, version, &mut out);
    write_body(doc, &mut out);
    out
}

/// Serialize and write to disk. I/O failures propagate unchanged; no
/// temp-file/rename step is performed.
pub fn write_file(doc: &SongDocument, version: FormatVersion, path: &Path) -> Result<()> {
    let content = write_string(doc, version);
    fs::write(path, content).map_err(|e| MelismaError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn push_tag(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "#{key}:{value}");
}

fn write_headers(doc: &SongDocument, version: FormatVersion, out: &mut String) {
    let tags = doc.tags();

    if version != FormatVersion::V1_0_0 {
        push_tag(out, "VERSION", &version.to_string());
    }
    push_tag(out, "TITLE", &tags.title);
    push_tag(out, "ARTIST", &tags.artist);

    let audio_key = if version.uses_audio_key() { "AUDIO" } else { "MP3" };
    push_tag(out, audio_key, &tags.audio_file);
    if let Some(url) = &tags.audio_url {
        push_tag(out, "AUDIOURL", url);
    }
    if let Some(video) = &tags.video_file {
        push_tag(out, "VIDEO", video);
    }
    if let Some(url) = &tags.video_url {
        push_tag(out, "VIDEOURL", url);
    }
    if let Some(cover) = &tags.cover_file {
        push_tag(out, "COVER", cover);
    }
    if let Some(url) = &tags.cover_url {
        push_tag(out, "COVERURL", url);
    }
    if let Some(background) = &tags.background_file {
        push_tag(out, "BACKGROUND", background);
    }

    if tags.bpm != 0.0 {
        push_tag(out, "BPM", &fmt_number(tags.bpm));
    }
    if tags.gap_ms != 0.0 {
        push_tag(out, "GAP", &fmt_number(tags.gap_ms));
    }
    if tags.video_gap_secs != 0.0 {
        if version.uses_millisecond_units() {
            push_tag(out, "VIDEOGAP", &fmt_number((tags.video_gap_secs * 1000.0).round()));
        } else {
            push_tag(out, "VIDEOGAP", &fmt_number(tags.video_gap_secs));
        }
    }
    if tags.start_secs != 0.0 {
        push_tag(out, "START", &fmt_number(tags.start_secs));
    }
    if tags.end_ms != 0.0 {
        push_tag(out, "END", &fmt_number(tags.end_ms));
    }
    if tags.preview_start_secs != 0.0 {
        push_tag(out, "PREVIEWSTART", &fmt_number(tags.preview_start_secs));
    }
    if tags.preview_end_secs != 0.0 {
        push_tag(out, "PREVIEWEND", &fmt_number(tags.preview_end_secs));
    }
    if tags.medley_start_beat != 0 {
        if version.uses_millisecond_units() {
            let ms = tags.beat_to_millis(tags.medley_start_beat).round();
            push_tag(out, "MEDLEYSTART", &fmt_number(ms));
        } else {
            push_tag(out, "MEDLEYSTARTBEAT", &tags.medley_start_beat.to_string());
        }
    }
    if tags.medley_end_beat != 0 {
        if version.uses_millisecond_units() {
            let ms = tags.beat_to_millis(tags.medley_end_beat).round();
            push_tag(out, "MEDLEYEND", &fmt_number(ms));
        } else {
            push_tag(out, "MEDLEYENDBEAT", &tags.medley_end_beat.to_string());
        }
    }

    for voice in doc.sorted_voices() {
        if let Some(name) = voice.display_name() {
            if voice.note_count() > 0 {
                push_tag(out, &voice.id().to_string(), name);
            }
        }
    }

    for (key, value) in &tags.unknown {
        push_tag(out, key, value);
    }
}

fn write_body(doc: &SongDocument, out: &mut String) {
    let voices: Vec<&Voice> = doc
        .sorted_voices()
        .into_iter()
        .filter(|v| v.note_count() > 0)
        .collect();
    let emit_markers = voices.len() > 1;

    for voice in voices {
        if emit_markers {
            let _ = writeln!(out, "{}", voice.id());
        }
        for sentence in voice.sorted_sentences().into_iter().filter(|s| !s.is_empty()) {
            for note in sentence.sorted_notes() {
                let _ = writeln!(
                    out,
                    "{} {} {} {} {}",
                    note.note_type().prefix(),
                    note.start_beat(),
                    note.length(),
                    note.txt_pitch(),
                    note.text()
                );
            }
            if let Some(beat) = sentence.extended_max_beat() {
                let _ = writeln!(out, "- {beat}");
            }
        }
    }
    out.push_str("E\n");
}

/// Format a numeric tag: integral values print without a fraction.
fn fmt_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
