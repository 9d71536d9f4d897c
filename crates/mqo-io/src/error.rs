//! Errors reported by the MQO codec.

use std::io;

use thiserror::Error;

/// Errors that can occur when reading or writing MQO/MQOZ files.
///
/// Every failure is final: a parse or export either produces a complete
/// result or one of these.
#[derive(Error, Debug)]
pub enum MqoError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The declared or inferred code page is not one the codec can decode.
    #[error("Unsupported charset: {0}")]
    Charset(String),

    /// Unsupported version, corrupt container or a missing mandatory chunk.
    #[error("Invalid MQO file: {0}")]
    Format(String),

    #[error("Corrupt MQOZ container: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The grammar could not match the document.
    #[error("Failed to parse: {reason} (at line {line}, column {column})")]
    Parser {
        reason: String,
        line: usize,
        column: usize,
    },

    /// The document parsed but its contents are inconsistent.
    #[error("Illegal state: {0}")]
    State(String),

    /// The document uses a feature this codec deliberately does not handle.
    #[error("Unsupported feature: {0}")]
    Unsupported(String),
}

impl MqoError {
    /// True for the container/format class, including zip failures.
    pub fn is_format(&self) -> bool {
        matches!(self, MqoError::Format(_) | MqoError::Zip(_))
    }
}

pub type Result<T> = std::result::Result<T, MqoError>;
