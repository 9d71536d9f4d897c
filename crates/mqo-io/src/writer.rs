//! MQO / MQOZ writer.
//!
//! # Example
//!
//! ```ignore
//! use mqo_io::MqoWriter;
//!
//! let mut writer = MqoWriter::new();
//! writer.add_model(&model);
//! writer.write("output.mqo")?;
//!
//! // Zipped
//! let mut writer = MqoWriter::new().with_zip_entry("model.mqo");
//! writer.add_model(&model);
//! writer.write("output.mqoz")?;
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Cursor, Write};
use std::path::Path;

use log::debug;
use modelio_core::{Model, Object};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::exporter::export;
use crate::traits::ModelWriter;

/// Builder-style MQO writer.
///
/// Objects are queued with `add_object()` / `add_model()` and serialized in
/// one go by `to_bytes()`, `write_to()` or `write()`.
#[derive(Debug, Clone, Default)]
pub struct MqoWriter {
    model: Model,
    /// When set, output is an MQOZ archive holding one entry of this name.
    zip_entry: Option<String>,
}

impl MqoWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the document in a zip archive (MQOZ) under `entry`.
    pub fn with_zip_entry(mut self, entry: impl Into<String>) -> Self {
        self.zip_entry = Some(entry.into());
        self
    }

    pub fn add_object(&mut self, object: &Object) {
        self.model.objects.push(object.clone());
    }

    pub fn add_model(&mut self, model: &Model) {
        self.model.objects.extend(model.objects.iter().cloned());
    }

    pub fn object_count(&self) -> usize {
        self.model.objects.len()
    }

    pub fn face_count(&self) -> usize {
        self.model.num_faces()
    }

    /// Serialize everything queued.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let document = export(&self.model)?;
        match &self.zip_entry {
            None => Ok(document),
            Some(entry) => {
                let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
                let options =
                    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
                zip.start_file(entry.as_str(), options)?;
                zip.write_all(&document)?;
                let archive = zip.finish()?.into_inner();
                debug!(
                    "Zipped {} byte document into {} bytes",
                    document.len(),
                    archive.len()
                );
                Ok(archive)
            }
        }
    }

    /// Write the document to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    /// Write the document to a file.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl ModelWriter for MqoWriter {
    fn new() -> Self {
        MqoWriter::new()
    }

    fn add_model(&mut self, model: &Model) -> io::Result<()> {
        MqoWriter::add_model(self, model);
        Ok(())
    }

    fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        MqoWriter::write(self, path).map_err(|e| io::Error::other(e.to_string()))
    }

    fn object_count(&self) -> usize {
        MqoWriter::object_count(self)
    }

    fn face_count(&self) -> usize {
        MqoWriter::face_count(self)
    }
}
