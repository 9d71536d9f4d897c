//! Text encodings of MQO documents.
//!
//! Documents from version 1.2 on declare a `CodePage`; older ones are
//! sniffed statistically. Decoding goes through `encoding_rs` except for
//! UTF-32, which it does not implement.

use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, EUC_JP, SHIFT_JIS, UTF_16LE, UTF_8};
use log::{debug, trace};

use crate::error::{MqoError, Result};

/// Window size used when feeding the statistical detector.
pub const DETECTION_WINDOW: usize = 16;

/// A resolved document encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Any encoding `encoding_rs` knows about.
    Whatwg(&'static Encoding),
    Utf32Le,
    Utf32Be,
}

impl TextEncoding {
    pub const UTF_8: TextEncoding = TextEncoding::Whatwg(UTF_8);

    /// Map a `CodePage` token to its encoding.
    ///
    /// | token   | encoding                |
    /// |---------|-------------------------|
    /// | `utf8`  | UTF-8                   |
    /// | `65001` | UTF-8                   |
    /// | `1200`  | UTF-16LE                |
    /// | `12000` | UTF-32LE                |
    /// | `12001` | UTF-32BE                |
    /// | `932`   | Shift_JIS (windows-31j) |
    /// | `20932` | EUC-JP                  |
    pub fn from_code_page(token: &str) -> Result<Self> {
        match token {
            "utf8" | "65001" => Ok(TextEncoding::Whatwg(UTF_8)),
            "1200" => Ok(TextEncoding::Whatwg(UTF_16LE)),
            "12000" => Ok(TextEncoding::Utf32Le),
            "12001" => Ok(TextEncoding::Utf32Be),
            // encoding_rs implements Shift_JIS as the windows-31j superset.
            "932" => Ok(TextEncoding::Whatwg(SHIFT_JIS)),
            "20932" => Ok(TextEncoding::Whatwg(EUC_JP)),
            other => Err(MqoError::Charset(format!("unknown code page '{other}'"))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Whatwg(encoding) => encoding.name(),
            TextEncoding::Utf32Le => "UTF-32LE",
            TextEncoding::Utf32Be => "UTF-32BE",
        }
    }

    /// Decode `bytes`, replacing malformed sequences with U+FFFD.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Whatwg(encoding) => {
                let (text, actual, had_errors) = encoding.decode(bytes);
                if had_errors {
                    debug!("Malformed {} sequences replaced", actual.name());
                }
                text.into_owned()
            }
            TextEncoding::Utf32Le => decode_utf32::<LittleEndian>(bytes),
            TextEncoding::Utf32Be => decode_utf32::<BigEndian>(bytes),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn decode_utf32<B: ByteOrder>(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len() / 4);
    for (index, unit) in bytes.chunks(4).enumerate() {
        if unit.len() < 4 {
            text.push(char::REPLACEMENT_CHARACTER);
            break;
        }
        let ch = char::from_u32(B::read_u32(unit)).unwrap_or(char::REPLACEMENT_CHARACTER);
        // Leading byte order mark
        if index == 0 && ch == '\u{FEFF}' {
            continue;
        }
        text.push(ch);
    }
    text
}

/// Incremental statistical charset guesser.
pub trait CharsetDetector {
    /// Feed the next window of input. Returns true once the detector is confident.
    fn feed(&mut self, window: &[u8]) -> bool;

    /// Finish detection. `None` means no opinion.
    fn finish(self) -> Option<&'static Encoding>;
}

/// [`CharsetDetector`] backed by `chardetng`.
///
/// chardetng only commits after seeing all input, so it never reports
/// confidence early. Pure ASCII input yields no opinion.
pub struct ChardetngDetector {
    inner: EncodingDetector,
    saw_non_ascii: bool,
}

impl ChardetngDetector {
    pub fn new() -> Self {
        Self {
            inner: EncodingDetector::new(),
            saw_non_ascii: false,
        }
    }
}

impl Default for ChardetngDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CharsetDetector for ChardetngDetector {
    fn feed(&mut self, window: &[u8]) -> bool {
        self.saw_non_ascii |= !window.is_ascii();
        self.inner.feed(window, false);
        false
    }

    fn finish(mut self) -> Option<&'static Encoding> {
        self.inner.feed(&[], true);
        if !self.saw_non_ascii {
            return None;
        }
        Some(self.inner.guess(None, true))
    }
}

/// Run `detector` over `bytes` in [`DETECTION_WINDOW`]-sized windows.
///
/// Stops early when the detector reports confidence; falls back to UTF-8
/// when it has no opinion.
pub fn detect_with<D: CharsetDetector>(mut detector: D, bytes: &[u8]) -> TextEncoding {
    for (index, window) in bytes.chunks(DETECTION_WINDOW).enumerate() {
        if detector.feed(window) {
            trace!("Charset detector confident after {} windows", index + 1);
            break;
        }
    }

    match detector.finish() {
        Some(encoding) => TextEncoding::Whatwg(encoding),
        None => TextEncoding::UTF_8,
    }
}

/// Guess the encoding of an undeclared document.
pub fn detect(bytes: &[u8]) -> TextEncoding {
    detect_with(ChardetngDetector::new(), bytes)
}
