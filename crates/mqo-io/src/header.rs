//! Document header: banner, format version and optional code page.
//!
//! ```text
//! Metasequoia Document
//! Format Text Ver 1.2
//! CodePage utf8
//! ```

use log::debug;

use crate::charset::{self, TextEncoding};
use crate::cursor::{Cursor, Fail, PResult};
use crate::error::{MqoError, Result};

/// Only this many leading bytes are inspected for the header.
pub const HEADER_PROBE_LEN: usize = 64;

pub const BANNER: &str = "Metasequoia Document";
pub const VERSION_PREFIX: &str = "Format Text Ver ";
const CODE_PAGE_KEYWORD: &str = "CodePage";

/// First version that declares its code page.
const CODE_PAGE_VERSION: f32 = 1.2;

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: f32,
    pub code_page: Option<String>,
}

impl Header {
    /// Parse the header from the start of a document.
    pub fn parse(document: &[u8]) -> Result<Self> {
        let probe = &document[..document.len().min(HEADER_PROBE_LEN)];
        let text = String::from_utf8_lossy(probe);
        let mut cursor = Cursor::new(&text);

        let version = match header_line(&mut cursor) {
            Ok(version) => version,
            Err(Fail::Fatal(err)) => return Err(err),
            Err(Fail::Backtrack) => return Err(cursor.furthest_error()),
        };
        let code_page = match cursor.optional(code_page_line) {
            Ok(code_page) => code_page,
            Err(Fail::Fatal(err)) => return Err(err),
            Err(Fail::Backtrack) => None,
        };

        Ok(Self { version, code_page })
    }

    /// Check the version range and work out the document encoding.
    ///
    /// Declared code pages are looked up in the fixed table; documents that
    /// predate code pages are sniffed.
    pub fn resolve_encoding(&self, document: &[u8]) -> Result<TextEncoding> {
        if !(1.0..2.0).contains(&self.version) {
            return Err(MqoError::Format(format!(
                "Unsupported version of MQO: {}",
                self.version
            )));
        }

        let encoding = if self.version >= CODE_PAGE_VERSION {
            let token = self.code_page.as_deref().ok_or_else(|| {
                MqoError::Charset(format!(
                    "version {} document has no CodePage line",
                    self.version
                ))
            })?;
            TextEncoding::from_code_page(token)?
        } else {
            charset::detect(document)
        };

        debug!("MQO version {} decoded as {}", self.version, encoding);
        Ok(encoding)
    }
}

fn header_line(c: &mut Cursor<'_>) -> PResult<f32> {
    c.literal(BANNER)?;
    c.line_end()?;
    c.literal(VERSION_PREFIX)?;
    let version = c.decimal()?;
    c.line_end()?;
    Ok(version)
}

fn code_page_line(c: &mut Cursor<'_>) -> PResult<String> {
    c.skip_whitespace();
    c.keyword(CODE_PAGE_KEYWORD)?;
    c.separator();
    let token = match c.optional(|c| c.keyword("utf8"))? {
        Some(()) => "utf8".to_string(),
        None => c.integer()?.to_string(),
    };
    c.separator();
    c.line_end()?;
    Ok(token)
}

/// Drop the header lines from decoded text.
///
/// Returns the body and the number of lines removed. When the text mentions
/// `CodePage`, everything through the end of that line goes; otherwise the
/// banner and version lines do.
pub fn strip_header(text: &str) -> (&str, usize) {
    if let Some(at) = text.find(CODE_PAGE_KEYWORD) {
        let after = &text[at + CODE_PAGE_KEYWORD.len()..];
        return match after.find('\n') {
            Some(newline) => {
                let body = &after[newline + 1..];
                let skipped = text[..text.len() - body.len()].matches('\n').count();
                (body, skipped)
            }
            None => (text, 0),
        };
    }

    let mut body = text;
    let mut skipped = 0;
    for _ in 0..2 {
        match body.find('\n') {
            Some(newline) => {
                body = &body[newline + 1..];
                skipped += 1;
            }
            None => break,
        }
    }
    (body, skipped)
}
