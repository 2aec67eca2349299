//! Song file reader
//!
//! Parses the line-oriented `#KEY:VALUE` song format into a
//! [`SongDocument`]. Parsing is all-or-nothing: the caller receives a
//! fully parsed document or a typed error carrying the file path and
//! offending line number, never a partially usable document.
//!
//! Header values are collected verbatim first and only interpreted once
//! the header block ends, so unit interpretation can honor a `#VERSION`
//! header appearing anywhere in the block. A declared `#ENCODING` that
//! differs from the encoding used to decode the stream restarts the
//! whole parse with the declared encoding.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{MelismaError, Result};
use crate::format::encoding::TextEncoding;
use crate::model::{FormatVersion, Note, NoteType, Sentence, SongDocument, SongTags, VoiceId};

enum ParseOutcome {
    Document(SongDocument),
    Restart(TextEncoding),
}

/// Read and parse a song file from disk.
pub fn parse_file(path: &Path) -> Result<SongDocument> {
    let bytes = fs::read(path).map_err(|e| MelismaError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_bytes(&bytes, path)
}

/// Parse a song file from raw bytes, honoring a declared `#ENCODING`.
pub fn parse_bytes(bytes: &[u8], path: &Path) -> Result<SongDocument> {
    let text = TextEncoding::default().decode(bytes);
    match parse_inner(&text, path, Some(TextEncoding::default()))? {
        ParseOutcome::Document(doc) => Ok(doc),
        ParseOutcome::Restart(declared) => {
            debug!(
                "{}: restarting parse with declared encoding {:?}",
                path.display(),
                declared
            );
            let text = declared.decode(bytes);
            match parse_inner(&text, path, None)? {
                ParseOutcome::Document(doc) => Ok(doc),
                ParseOutcome::Restart(_) => {
                    unreachable!("restart is only requested while an encoding is active")
                }
            }
        }
    }
}

/// Parse already-decoded text. An `#ENCODING` header is validated but
/// cannot trigger a restart here, since the original bytes are gone.
pub fn parse_str(text: &str, path: &Path) -> Result<SongDocument> {
    match parse_inner(text, path, None)? {
        ParseOutcome::Document(doc) => Ok(doc),
        ParseOutcome::Restart(_) => {
            unreachable!("restart is only requested while an encoding is active")
        }
    }
}

fn parse_inner(
    text: &str,
    path: &Path,
    active_encoding: Option<TextEncoding>,
) -> Result<ParseOutcome> {
    let lines: Vec<&str> = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();

    let mut headers: Vec<(usize, String, String)> = Vec::new();
    let mut body_start = lines.len();

    // Header phase: '#' lines up to the first line that is not one.
    for (idx, &line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        if !line.starts_with('#') {
            if idx == 0 {
                return Err(MelismaError::NotASongFile {
                    path: path.to_path_buf(),
                });
            }
            body_start = idx;
            break;
        }
        let (key, value) = parse_header_line(line, path, line_no)?;

        if key == "ENCODING" {
            let declared = TextEncoding::from_label(&value).ok_or_else(|| {
                MelismaError::UnsupportedEncoding {
                    path: path.to_path_buf(),
                    line: line_no,
                    label: value.clone(),
                }
            })?;
            if let Some(active) = active_encoding {
                if declared != active {
                    return Ok(ParseOutcome::Restart(declared));
                }
            }
            continue;
        }
        headers.push((line_no, key, value));
    }

    let tags = interpret_headers(&headers, path)?;
    let mut doc = SongDocument::new(tags);
    parse_body(&lines[body_start..], body_start, path, &mut doc)?;
    apply_voice_names(&headers, &mut doc);

    Ok(ParseOutcome::Document(doc))
}

fn parse_header_line(line: &str, path: &Path, line_no: usize) -> Result<(String, String)> {
    let malformed = |reason: &str| MelismaError::MalformedHeader {
        path: path.to_path_buf(),
        line: line_no,
        reason: reason.to_string(),
    };
    let content = &line[1..];
    let (key, value) = content
        .split_once(':')
        .ok_or_else(|| malformed("missing ':' separator"))?;
    let key = key.trim().to_ascii_uppercase();
    let value = value.trim().to_string();
    if key.is_empty() {
        return Err(malformed("empty header key"));
    }
    if value.is_empty() {
        return Err(malformed("empty header value"));
    }
    Ok((key, value))
}

fn interpret_headers(headers: &[(usize, String, String)], path: &Path) -> Result<SongTags> {
    let mut tags = SongTags::default();

    // Version, tempo, and gap first: unit interpretation and medley
    // conversion below depend on them regardless of header order.
    for (line_no, key, value) in headers {
        match key.as_str() {
            "VERSION" => {
                tags.version = FormatVersion::parse(value).ok_or_else(|| {
                    MelismaError::UnknownFormatVersion {
                        path: path.to_path_buf(),
                        version: value.clone(),
                    }
                })?;
            }
            "BPM" => tags.bpm = parse_f64(value, path, *line_no)?,
            "GAP" => tags.gap_ms = parse_f64(value, path, *line_no)?,
            _ => {}
        }
    }

    let mut audio = None;
    let mut mp3 = None;
    let mut medley_start_ms = None;
    let mut medley_end_ms = None;

    for (line_no, key, value) in headers {
        let line = *line_no;
        match key.as_str() {
            "VERSION" | "BPM" | "GAP" => {}
            "TITLE" => tags.title = value.clone(),
            "ARTIST" => tags.artist = value.clone(),
            "MP3" => mp3 = Some(value.clone()),
            "AUDIO" => audio = Some(value.clone()),
            "VIDEO" => tags.video_file = Some(value.clone()),
            "COVER" => tags.cover_file = Some(value.clone()),
            "BACKGROUND" => tags.background_file = Some(value.clone()),
            "AUDIOURL" => tags.audio_url = Some(value.clone()),
            "VIDEOURL" => tags.video_url = Some(value.clone()),
            "COVERURL" => tags.cover_url = Some(value.clone()),
            "VIDEOGAP" => {
                let raw = parse_f64(value, path, line)?;
                tags.video_gap_secs = if tags.version.uses_millisecond_units() {
                    raw / 1000.0
                } else {
                    raw
                };
            }
            "START" => tags.start_secs = parse_f64(value, path, line)?,
            "END" => tags.end_ms = parse_f64(value, path, line)?,
            "PREVIEWSTART" => tags.preview_start_secs = parse_f64(value, path, line)?,
            "PREVIEWEND" => tags.preview_end_secs = parse_f64(value, path, line)?,
            "MEDLEYSTARTBEAT" => tags.medley_start_beat = parse_i32(value, path, line)?,
            "MEDLEYENDBEAT" => tags.medley_end_beat = parse_i32(value, path, line)?,
            "MEDLEYSTART" => medley_start_ms = Some(parse_f64(value, path, line)?),
            "MEDLEYEND" => medley_end_ms = Some(parse_f64(value, path, line)?),
            _ if is_voice_name_key(key) => {}
            _ => tags.unknown.push((key.clone(), value.clone())),
        }
    }

    // Millisecond medley tags are normalized to beats in the model.
    if let Some(ms) = medley_start_ms {
        tags.medley_start_beat = tags.millis_to_beat(ms);
    }
    if let Some(ms) = medley_end_ms {
        tags.medley_end_beat = tags.millis_to_beat(ms);
    }

    tags.audio_file = match (audio, mp3) {
        (Some(audio), _) => audio,
        (None, Some(mp3)) => mp3,
        (None, None) => String::new(),
    };

    let missing_key = if tags.artist.is_empty() {
        Some("ARTIST")
    } else if tags.title.is_empty() {
        Some("TITLE")
    } else if !headers.iter().any(|(_, k, _)| k == "BPM") {
        Some("BPM")
    } else if tags.audio_file.is_empty() {
        Some(if tags.version.uses_audio_key() {
            "AUDIO"
        } else {
            "MP3"
        })
    } else {
        None
    };
    if let Some(key) = missing_key {
        return Err(MelismaError::MissingRequiredHeader {
            path: path.to_path_buf(),
            key: key.to_string(),
        });
    }

    Ok(tags)
}

fn parse_body(
    lines: &[&str],
    offset: usize,
    path: &Path,
    doc: &mut SongDocument,
) -> Result<()> {
    let mut current_voice = VoiceId::FIRST;
    let mut open_sentences: HashMap<VoiceId, Sentence> = HashMap::new();

    for (idx, &raw) in lines.iter().enumerate() {
        let line_no = offset + idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "E" {
            break;
        }
        if let Some(voice_id) = VoiceId::from_marker(trimmed) {
            current_voice = voice_id;
            doc.get_or_create_voice(voice_id);
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix('-') {
            let beat = parse_i32(rest.trim(), path, line_no)?;
            let mut sentence = open_sentences.remove(&current_voice).unwrap_or_default();
            if sentence.is_empty() {
                return Err(MelismaError::InvalidBodyLine {
                    path: path.to_path_buf(),
                    line: line_no,
                    content: raw.to_string(),
                });
            }
            sentence.set_linebreak_beat(beat);
            doc.get_or_create_voice(current_voice).add_sentence(sentence);
            continue;
        }
        let mut chars = raw.chars();
        let note_type = chars.next().and_then(NoteType::from_prefix);
        if let Some(note_type) = note_type {
            let note = parse_note_line(note_type, chars.as_str(), raw, path, line_no)?;
            doc.get_or_create_voice(current_voice);
            open_sentences.entry(current_voice).or_default().add_note(note);
            continue;
        }
        return Err(MelismaError::InvalidBodyLine {
            path: path.to_path_buf(),
            line: line_no,
            content: raw.to_string(),
        });
    }

    // Sentences still open at the end of the body have no break line.
    for (voice_id, sentence) in open_sentences {
        if !sentence.is_empty() {
            doc.get_or_create_voice(voice_id).add_sentence(sentence);
        }
    }
    Ok(())
}

/// Parse the fields after the type prefix of a note line:
/// `<start> <length> <pitch> <text>`. The lyric starts after exactly one
/// space so that leading spaces inside the lyric survive.
fn parse_note_line(
    note_type: NoteType,
    rest: &str,
    raw_line: &str,
    path: &Path,
    line_no: usize,
) -> Result<Note> {
    let mut rest = rest;
    let mut fields = [0i32; 3];
    for field in &mut fields {
        let trimmed = rest.trim_start_matches(' ');
        if trimmed.is_empty() {
            return Err(MelismaError::InvalidBodyLine {
                path: path.to_path_buf(),
                line: line_no,
                content: raw_line.to_string(),
            });
        }
        let end = trimmed.find(' ').unwrap_or(trimmed.len());
        let (token, after) = trimmed.split_at(end);
        *field = parse_i32(token, path, line_no)?;
        rest = after;
    }
    let text = rest.strip_prefix(' ').unwrap_or(rest);

    let [start, length, pitch] = fields;
    if length < 0 {
        // Surface as a parse error: the file, not the caller, is wrong.
        return Err(MelismaError::InvalidBodyLine {
            path: path.to_path_buf(),
            line: line_no,
            content: raw_line.to_string(),
        });
    }
    Note::new(note_type, start, length, pitch, text)
}

fn apply_voice_names(headers: &[(usize, String, String)], doc: &mut SongDocument) {
    for (_, key, value) in headers {
        if !is_voice_name_key(key) {
            continue;
        }
        if let Some(id) = VoiceId::from_marker(key) {
            if let Some(voice) = doc.voice_mut(id) {
                voice.set_display_name(value.clone());
            }
        }
    }
}

/// `P<n>` header keys carry voice display-name overrides.
fn is_voice_name_key(key: &str) -> bool {
    key.len() > 1 && key.starts_with('P') && key[1..].bytes().all(|b| b.is_ascii_digit())
}

/// Parse a float field, accepting a decimal comma.
fn parse_f64(value: &str, path: &Path, line: usize) -> Result<f64> {
    value.trim().replace(',', ".").parse().map_err(|_| {
        MelismaError::InvalidNumericField {
            path: path.to_path_buf(),
            line,
            value: value.to_string(),
        }
    })
}

fn parse_i32(value: &str, path: &Path, line: usize) -> Result<i32> {
    value.trim().parse().map_err(|_| MelismaError::InvalidNumericField {
        path: path.to_path_buf(),
        line,
        value: value.to_string(),
    })
}
