//! Text Format Module
//!
//! Bidirectional conversion between the line-oriented song text format
//! and the in-memory document model.

pub mod encoding;
pub mod reader;
pub mod writer;

pub use encoding::TextEncoding;
pub use reader::{parse_bytes, parse_file, parse_str};
pub use writer::{write_file, write_string};
