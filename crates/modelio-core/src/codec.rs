//! The interface between a model codec and whatever hosts it.
//!
//! A host keeps a table of codecs keyed by file extension and hands each one
//! raw bytes. Codecs never touch the file system here; path-based helpers
//! live in the individual codec crates.
//!
//! ```ignore
//! use modelio_core::{Model, ModelCodec};
//!
//! fn load<C: ModelCodec>(codec: &C, ext: &str, bytes: &[u8]) -> Option<Model> {
//!     if !codec.handles_extension(ext) {
//!         return None;
//!     }
//!     codec.parse(bytes).ok()
//! }
//! ```

use crate::model::Model;

/// Bidirectional conversion between a file format and [`Model`].
pub trait ModelCodec {
    /// Error reported by [`ModelCodec::parse`] and [`ModelCodec::export`].
    type Error: std::error::Error + Send + Sync + 'static;

    /// File extensions (without the leading dot) this codec is registered for.
    fn extensions(&self) -> &'static [&'static str];

    /// Decode a complete file image into a model.
    fn parse(&self, bytes: &[u8]) -> Result<Model, Self::Error>;

    /// Encode a model into a complete file image.
    fn export(&self, model: &Model) -> Result<Vec<u8>, Self::Error>;

    /// Whether `extension` (case-insensitive, leading dot optional) belongs to this codec.
    fn handles_extension(&self, extension: &str) -> bool {
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        self.extensions()
            .iter()
            .any(|known| known.eq_ignore_ascii_case(extension))
    }
}
