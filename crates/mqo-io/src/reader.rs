//! MQO / MQOZ reader.
//!
//! # Example
//!
//! ```ignore
//! use mqo_io::MqoReader;
//!
//! let reader = MqoReader::open("model.mqoz")?;
//! let model = reader.read_model()?;
//! for object in &model.objects {
//!     println!("{}: {} faces", object.name, object.num_faces());
//! }
//! ```

use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use modelio_core::Model;

use crate::assembler::assemble;
use crate::charset::TextEncoding;
use crate::container::{extract_document, ContainerKind};
use crate::error::Result;
use crate::header::{strip_header, Header};
use crate::parser::parse_body;
use crate::traits::ModelReader;

/// Reader over an in-memory MQO or MQOZ payload.
#[derive(Debug, Clone)]
pub struct MqoReader {
    data: Vec<u8>,
}

/// A document after container unwrapping and charset decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDocument {
    pub header: Header,
    pub encoding: TextEncoding,
    pub container: ContainerKind,
    /// Full document text, header included.
    pub text: String,
}

impl DecodedDocument {
    /// Text after the header lines, and the number of lines skipped.
    pub fn body(&self) -> (&str, usize) {
        strip_header(&self.text)
    }
}

impl MqoReader {
    /// Read a `.mqo` or `.mqoz` file. The container is detected from its
    /// content, not its extension.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        debug!("Read {} bytes from {}", data.len(), path.display());
        Ok(Self { data })
    }

    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Unwrap and decode the document without parsing its body.
    pub fn decode(&self) -> Result<DecodedDocument> {
        let (document, container) = extract_document(&self.data)?;
        let header = Header::parse(&document)?;
        let encoding = header.resolve_encoding(&document)?;
        let text = encoding.decode(&document);

        Ok(DecodedDocument {
            header,
            encoding,
            container,
            text,
        })
    }

    /// Parse the payload into a model. Empty input gives an empty model.
    pub fn read_model(&self) -> Result<Model> {
        if self.data.is_empty() {
            debug!("Empty input, returning an empty model");
            return Ok(Model::default());
        }

        let document = self.decode()?;
        let (body, header_lines) = document.body();
        let tree = parse_body(body, header_lines)?;
        let model = assemble(&tree)?;

        debug!(
            "Read {} objects with {} faces ({}, {:?})",
            model.objects.len(),
            model.num_faces(),
            document.encoding,
            document.container
        );
        Ok(model)
    }
}

impl ModelReader for MqoReader {
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        MqoReader::open(path).map_err(|e| io::Error::other(e.to_string()))
    }

    fn read_models(&mut self) -> io::Result<Vec<Model>> {
        MqoReader::read_model(self)
            .map(|model| vec![model])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }
}

/// Parse MQO or MQOZ bytes into a model.
pub fn parse(bytes: &[u8]) -> Result<Model> {
    MqoReader::from_bytes(bytes).read_model()
}
