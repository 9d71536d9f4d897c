//! Common traits for model readers and writers.
//!
//! Importing a trait brings its methods into scope and lets callers stay
//! generic over the format:
//!
//! ```ignore
//! use mqo_io::{ModelReader, ModelWriter, MqoReader, MqoWriter};
//!
//! fn convert<R: ModelReader, W: ModelWriter>(input: &str, output: &str) -> io::Result<()> {
//!     let model = R::open(input)?.read_model()?;
//!     let mut writer = W::new();
//!     writer.add_model(&model)?;
//!     writer.write(output)
//! }
//!
//! convert::<MqoReader, MqoWriter>("in.mqoz", "out.mqo")?;
//! ```

use std::io;
use std::path::Path;

use modelio_core::Model;

/// Common interface for model readers.
pub trait ModelReader: Sized {
    /// Open a file for reading.
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self>;

    /// Read every model in the source.
    fn read_models(&mut self) -> io::Result<Vec<Model>>;

    /// Read a single model.
    ///
    /// Default implementation returns the first model from `read_models()`.
    fn read_model(&mut self) -> io::Result<Model> {
        self.read_models()?
            .into_iter()
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "No model found"))
    }
}

/// Common interface for model writers.
pub trait ModelWriter: Sized {
    /// Create a new writer instance.
    fn new() -> Self;

    /// Queue a model to be written.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err` if the format cannot represent this model
    fn add_model(&mut self, model: &Model) -> io::Result<()>;

    /// Write everything queued so far to a file.
    fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()>;

    /// Number of objects queued.
    fn object_count(&self) -> usize;

    /// Number of faces queued.
    fn face_count(&self) -> usize {
        0
    }
}
