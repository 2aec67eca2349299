//! Text encodings for song files
//!
//! Song files predate widespread UTF-8 and may declare their encoding
//! in an `#ENCODING:` header. The set of supported encodings is a
//! closed enum so the reader's restart logic stays exhaustively
//! checkable.

/// Mapping for CP1252 bytes 0x80..=0x9F; 0 marks an unassigned byte,
/// decoded as U+FFFD.
const CP1252_HIGH: [u32; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, //
    0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0, 0x017D, 0, //
    0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, //
    0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0, 0x017E, 0x0178,
];

/// A supported text encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
    Cp1252,
}

impl TextEncoding {
    /// Resolve an `#ENCODING:` header value. Labels are matched
    /// case-insensitively; unknown labels yield None.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "UTF8" | "UTF-8" => Some(TextEncoding::Utf8),
            "LATIN1" | "ISO-8859-1" | "ISO8859-1" => Some(TextEncoding::Latin1),
            "CP1252" | "WINDOWS-1252" | "ANSI" => Some(TextEncoding::Cp1252),
            _ => None,
        }
    }

    /// Decode a byte stream. A UTF-8 BOM is honored regardless of the
    /// selected encoding; invalid UTF-8 sequences are replaced rather
    /// than failing, since the declared encoding header may follow.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            TextEncoding::Cp1252 => bytes
                .iter()
                .map(|&b| match b {
                    0x80..=0x9F => match CP1252_HIGH[(b - 0x80) as usize] {
                        0 => char::REPLACEMENT_CHARACTER,
                        cp => char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER),
                    },
                    _ => char::from(b),
                })
                .collect(),
        }
    }
}
