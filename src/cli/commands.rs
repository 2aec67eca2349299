//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::info;

use crate::error::{MelismaError, Result};
use crate::format::{parse_file, write_file};
use crate::model::FormatVersion;
use crate::validate::{validate, Severity, ValidatorConfig};

/// Parse a song file and print its validation issues.
pub fn check(file: &Path, json: bool, max_per_kind: usize) -> Result<()> {
    info!("Checking song file: {}", file.display());

    let doc = parse_file(file)?;
    let config = ValidatorConfig {
        max_issues_per_kind: max_per_kind,
    };
    let issues = validate(&doc, &config);

    if json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
        return Ok(());
    }

    if issues.is_empty() {
        println!("No issues found in {}", file.display());
        return Ok(());
    }

    for issue in &issues {
        let severity = match issue.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!(
            "{}: {} [{}] beats {}..{}",
            severity,
            issue.kind.message_key(),
            issue.voice,
            issue.start_beat,
            issue.end_beat
        );
    }
    println!("{} issue(s) in {}", issues.len(), file.display());

    Ok(())
}

/// Convert a song file to another format version.
pub fn convert(input: &Path, output: &Path, to_version: Option<&str>) -> Result<()> {
    info!("Converting {} -> {}", input.display(), output.display());

    let doc = parse_file(input)?;
    let version = match to_version {
        Some(v) => FormatVersion::parse(v).ok_or_else(|| MelismaError::UnknownFormatVersion {
            path: input.to_path_buf(),
            version: v.to_string(),
        })?,
        None => doc.tags().version,
    };

    write_file(&doc, version, output)?;
    println!("Wrote {} ({})", output.display(), version);

    Ok(())
}

/// Print the parsed header tags of a song file.
pub fn tags(file: &Path, json: bool) -> Result<()> {
    info!("Reading tags from: {}", file.display());

    let doc = parse_file(file)?;
    let tags = doc.tags();

    if json {
        println!("{}", serde_json::to_string_pretty(tags)?);
        return Ok(());
    }

    println!("Title:   {}", tags.title);
    println!("Artist:  {}", tags.artist);
    println!("BPM:     {}", tags.bpm);
    println!("Gap:     {} ms", tags.gap_ms);
    println!("Audio:   {}", tags.audio_file);
    println!("Version: {}", tags.version);
    for voice in doc.sorted_voices() {
        if let Some(name) = voice.display_name() {
            println!("{}:      {}", voice.id(), name);
        }
    }
    for (key, value) in &tags.unknown {
        println!("{key}: {value}");
    }

    Ok(())
}

/// Rewrite a song file in canonical form at its own version.
pub fn normalize(file: &Path, output: Option<&Path>) -> Result<()> {
    let target = output.unwrap_or(file);
    info!(
        "Normalizing {} -> {}",
        file.display(),
        target.display()
    );

    let doc = parse_file(file)?;
    write_file(&doc, doc.tags().version, target)?;
    println!("Wrote {}", target.display());

    Ok(())
}
