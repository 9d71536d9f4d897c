//! Container sniffing for `.mqo` / `.mqoz` payloads.
//!
//! An MQOZ file is an ordinary zip archive whose first entry ending in
//! `.mqo` holds the text document. Anything that does not start with the zip
//! local-file-header magic is treated as a bare document.

use std::borrow::Cow;
use std::io::{Cursor, Read};

use log::debug;
use zip::ZipArchive;

use crate::error::{MqoError, Result};

/// Zip local file header signature: "PK\x03\x04"
const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// Suffix of the archive entry that holds the document.
const MQO_ENTRY_SUFFIX: &str = ".mqo";

/// How the document was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerKind {
    /// Plain `.mqo` text.
    Bare,
    /// Zip archive; carries the name of the entry that was extracted.
    Zipped { entry: String },
}

/// Whether `bytes` starts with the zip local-file-header magic.
pub fn is_zip(bytes: &[u8]) -> bool {
    bytes.len() >= ZIP_MAGIC.len() && &bytes[..ZIP_MAGIC.len()] == ZIP_MAGIC
}

/// Unwrap the document bytes from `bytes`.
///
/// Bare documents are borrowed as-is. Zip archives are scanned in entry
/// order and the first `.mqo` entry is returned; an archive without one, or
/// one that cannot be read to the end, is a format error.
pub fn extract_document(bytes: &[u8]) -> Result<(Cow<'_, [u8]>, ContainerKind)> {
    if !is_zip(bytes) {
        debug!("Treating {} bytes as a bare MQO document", bytes.len());
        return Ok((Cow::Borrowed(bytes), ContainerKind::Bare));
    }

    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    debug!("MQOZ container with {} entries", archive.len());

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if !entry.name().ends_with(MQO_ENTRY_SUFFIX) {
            continue;
        }

        let name = entry.name().to_string();
        let mut document = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut document)
            .map_err(|e| MqoError::Format(format!("Corrupt MQOZ file: {e}")))?;
        debug!("Extracted '{}' ({} bytes)", name, document.len());
        return Ok((Cow::Owned(document), ContainerKind::Zipped { entry: name }));
    }

    Err(MqoError::Format(
        "Corrupt MQOZ file: no .mqo entry in archive".to_string(),
    ))
}
