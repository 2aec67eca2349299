//! Error types for Melisma.
//!
//! Parse errors are fatal for the file being read and always carry the
//! file path plus the offending line number. Model contract violations
//! are reported separately from parse errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Melisma operations.
pub type Result<T> = std::result::Result<T, MelismaError>;

/// Errors that can occur in the Melisma song document engine.
#[derive(Error, Debug)]
pub enum MelismaError {
    // Parse Errors
    #[error("Not a recognized song file (first line is not a header): {path}")]
    NotASongFile { path: PathBuf },

    #[error("Malformed header in {path} at line {line}: {reason}")]
    MalformedHeader {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Missing required header #{key} in {path}")]
    MissingRequiredHeader { path: PathBuf, key: String },

    #[error("Invalid numeric field {value:?} in {path} at line {line}")]
    InvalidNumericField {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("Invalid line in {path} at line {line}: {content:?}")]
    InvalidBodyLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("Unsupported encoding {label:?} declared in {path} at line {line}")]
    UnsupportedEncoding {
        path: PathBuf,
        line: usize,
        label: String,
    },

    #[error("Unknown format version {version:?} in {path}")]
    UnknownFormatVersion { path: PathBuf, version: String },

    // Model Contract Errors
    #[error("Note length must not be negative, got {length}")]
    NegativeNoteLength { length: i32 },

    // File Errors
    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Generic Errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerializationError(#[from] serde_json::Error),
}

impl MelismaError {
    /// Returns true if this error was produced while parsing a song file.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            MelismaError::NotASongFile { .. }
                | MelismaError::MalformedHeader { .. }
                | MelismaError::MissingRequiredHeader { .. }
                | MelismaError::InvalidNumericField { .. }
                | MelismaError::InvalidBodyLine { .. }
                | MelismaError::UnsupportedEncoding { .. }
                | MelismaError::UnknownFormatVersion { .. }
        )
    }

    /// The file the error refers to, if it is tied to one.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            MelismaError::NotASongFile { path }
            | MelismaError::MalformedHeader { path, .. }
            | MelismaError::MissingRequiredHeader { path, .. }
            | MelismaError::InvalidNumericField { path, .. }
            | MelismaError::InvalidBodyLine { path, .. }
            | MelismaError::UnsupportedEncoding { path, .. }
            | MelismaError::UnknownFormatVersion { path, .. }
            | MelismaError::FileReadError { path, .. }
            | MelismaError::FileWriteError { path, .. } => Some(path),
            _ => None,
        }
    }
}
