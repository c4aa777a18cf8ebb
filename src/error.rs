//! Error taxonomy for loading and decoding documents.
//!
//! Everything raised during the resolution pass aborts the load; a caller
//! never sees a partially linked [`Document`]. Byte-level errors surface
//! later, on first access to the affected buffer or accessor, and are local
//! to that entity.
//!
//! [`Document`]: crate::document::Document

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The document is structurally invalid JSON or violates the schema.
    #[error("malformed document: {0}")]
    Parse(String),

    /// An index field points outside the target collection.
    #[error("{entity}.{field} references index {index}, but the collection holds {len} entries")]
    DanglingReference {
        entity: &'static str,
        field: &'static str,
        index: usize,
        len: usize,
    },

    /// A name in `extensionsRequired` has no registered support.
    #[error("required extension `{0}` is not supported")]
    UnsupportedExtension(String),

    /// A buffer with no URI needs the embedded chunk, but none was supplied.
    #[error("buffer has no URI and no embedded binary chunk was provided")]
    MissingEmbeddedChunk,

    /// An inline `data:` payload could not be decoded.
    #[error("invalid inline encoding: {0}")]
    InvalidEncoding(String),

    /// Reading an external byte source failed. Carries the resolved location.
    #[error("failed to read `{}`", location.display())]
    Io {
        location: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A byte region does not match its declared length.
    #[error("byte length mismatch: declared {declared}, actual {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// A decode request reaches past the end of its byte region.
    #[error("buffer underrun: need {needed} bytes at offset {offset}, region holds {len}")]
    BufferUnderrun {
        needed: usize,
        offset: usize,
        len: usize,
    },

    /// A component-type/shape combination the codec cannot service.
    #[error("unsupported accessor layout: {0}")]
    UnsupportedAccessorType(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
