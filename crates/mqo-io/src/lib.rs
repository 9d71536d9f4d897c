//! Metasequoia model I/O.
//!
//! Reads and writes the text-based MQO format and its zipped MQOZ variant,
//! converting to and from the format-neutral [`modelio_core::Model`].
//!
//! # Supported Formats
//!
//! | Format | Read | Write | Notes                                   |
//! |--------|------|-------|-----------------------------------------|
//! | MQO    | ✓    | ✓     | versions 1.0 - 1.x, triangles only      |
//! | MQOZ   | ✓    | ✓     | first `.mqo` entry of the zip archive    |
//!
//! Output is always `Format Text Ver 1.2` with `CodePage utf8`. Input may
//! declare any code page in the table of [`charset::TextEncoding`]; older
//! documents have their encoding guessed.
//!
//! # Pipeline
//!
//! ```text
//! bytes -> container -> header/charset -> parser -> chunk tree -> assembler -> Model
//! Model -> exporter -> text -> bytes (optionally zipped by the writer)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mqo_io::{MqoReader, MqoWriter};
//!
//! let model = MqoReader::open("input.mqoz")?.read_model()?;
//! let mut writer = MqoWriter::new();
//! writer.add_model(&model);
//! writer.write("output.mqo")?;
//! ```
//!
//! Hosts that dispatch on file extension can use the [`Mqo`] codec through
//! [`modelio_core::ModelCodec`] instead.

pub mod error;
pub mod traits;

// Reader modules (require decoder feature)
#[cfg(feature = "decoder")]
mod assembler;
#[cfg(feature = "decoder")]
pub mod charset;
#[cfg(feature = "decoder")]
mod chunk;
#[cfg(feature = "decoder")]
pub mod container;
#[cfg(feature = "decoder")]
mod cursor;
#[cfg(feature = "decoder")]
pub mod header;
#[cfg(feature = "decoder")]
mod parser;
#[cfg(feature = "decoder")]
pub mod reader;

// Writer modules (require encoder feature)
#[cfg(feature = "encoder")]
pub mod exporter;
#[cfg(feature = "encoder")]
pub mod writer;

pub use error::{MqoError, Result};
pub use traits::{ModelReader, ModelWriter};

#[cfg(feature = "decoder")]
pub use charset::TextEncoding;
#[cfg(feature = "decoder")]
pub use container::ContainerKind;
#[cfg(feature = "decoder")]
pub use reader::{parse, DecodedDocument, MqoReader};

#[cfg(feature = "encoder")]
pub use exporter::export;
#[cfg(feature = "encoder")]
pub use writer::MqoWriter;

/// File extensions handled by [`Mqo`].
pub const EXTENSIONS: &[&str] = &["mqo", "mqoz"];

/// The MQO codec as seen by an extension-keyed host.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mqo;

#[cfg(all(feature = "decoder", feature = "encoder"))]
impl modelio_core::ModelCodec for Mqo {
    type Error = MqoError;

    fn extensions(&self) -> &'static [&'static str] {
        EXTENSIONS
    }

    fn parse(&self, bytes: &[u8]) -> Result<modelio_core::Model> {
        reader::parse(bytes)
    }

    fn export(&self, model: &modelio_core::Model) -> Result<Vec<u8>> {
        exporter::export(model)
    }
}
