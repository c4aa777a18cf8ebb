//! A glTF 2.0 ingestion core.
//!
//! Parses a document's JSON into typed records, resolves every
//! cross-reference into checked handles in one pass, and decodes accessor
//! payloads (sparse overlays included) on demand. Buffer bytes load lazily
//! and are cached behind the [`Document`], so a resolved document can be
//! consumed from multiple threads.

pub mod assets;
pub mod document;
pub mod error;
pub mod utils;

pub use document::{Asset, Document, LoadOptions};
pub use error::{Error, Result};
