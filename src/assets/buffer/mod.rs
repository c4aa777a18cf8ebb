//! Byte sources backing a document.
//!
//! A buffer declares a byte length and where its bytes come from: an external
//! location, an inline `data:` URI, or, when it has no URI at all, the
//! embedded binary chunk the host unpacked from a GLB container. Bytes are
//! loaded on first access and memoized for the buffer's lifetime.

use crate::error::{Error, Result};
use base64::Engine;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// How to reach a buffer's bytes, decided once at resolution time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ByteSource {
    /// No URI: the single embedded binary chunk supplied with the document.
    Embedded,
    /// A `data:` URI; the payload is decoded on first access.
    Inline(String),
    /// A location already resolved against the document base directory.
    External(PathBuf),
}

impl ByteSource {
    /// Classify a raw URI field. Relative external paths are joined to
    /// `base_dir` here so later loads need no context; percent-escapes in
    /// file paths ("Box%20With%20Spaces.bin") are unescaped first. URIs
    /// with a scheme other than `data:` (e.g. `http://`) are handed to the
    /// [`ByteReader`] untouched; the default filesystem reader will fail on
    /// them, a host with a network reader can serve them.
    pub(crate) fn parse(uri: Option<&str>, base_dir: &Path) -> Result<ByteSource> {
        let Some(uri) = uri else {
            return Ok(ByteSource::Embedded);
        };
        if uri.starts_with("data:") {
            return Ok(ByteSource::Inline(uri.to_owned()));
        }
        if has_scheme(uri) {
            return Ok(ByteSource::External(PathBuf::from(uri)));
        }
        let decoded = percent_encoding::percent_decode_str(uri)
            .decode_utf8()
            .map_err(|err| Error::InvalidEncoding(format!("URI `{}`: {}", uri, err)))?;
        let path = Path::new(decoded.as_ref());
        if path.is_absolute() {
            Ok(ByteSource::External(path.to_owned()))
        } else {
            Ok(ByteSource::External(base_dir.join(path)))
        }
    }
}

/// RFC 3986 scheme: one letter, then letters, digits, `+`, `-`, `.`, up to
/// the first `:`.
fn has_scheme(uri: &str) -> bool {
    let Some((scheme, _)) = uri.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars
        .next()
        .map_or(false, |first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Host hook for turning an external location into bytes.
///
/// The default implementation reads the filesystem; tests and embedded hosts
/// swap in their own. Byte-order and length policy stay with the caller.
pub trait ByteReader: Send + Sync {
    fn read(&self, location: &Path) -> std::io::Result<Vec<u8>>;
}

/// Filesystem-backed [`ByteReader`].
pub struct FsReader;

impl ByteReader for FsReader {
    fn read(&self, location: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(location)
    }
}

/// A named byte source of declared length with lazily memoized contents.
pub struct Buffer {
    pub name: Option<String>,
    /// Declared length; the loaded region is truncated or rejected to match.
    pub byte_length: usize,
    pub source: ByteSource,

    /// Memoized bytes. Guarded check-or-load: concurrent first access runs
    /// the underlying read exactly once and every caller gets the same Arc.
    cache: Mutex<Option<Arc<[u8]>>>,
}

impl Buffer {
    pub(crate) fn new(name: Option<String>, byte_length: usize, source: ByteSource) -> Self {
        Self {
            name,
            byte_length,
            source,
            cache: Mutex::new(None),
        }
    }

    /// Whether the bytes have been loaded yet.
    pub fn is_loaded(&self) -> bool {
        self.cache.lock().unwrap().is_some()
    }

    /// Load-or-return the buffer's bytes.
    ///
    /// `embedded` is the GLB binary chunk when the host supplied one. Loaded
    /// regions shorter than the declared length fail with
    /// [`Error::LengthMismatch`]; longer regions are truncated to the
    /// declared length (GLB chunks are padded to 4 bytes).
    pub(crate) fn bytes(
        &self,
        reader: &dyn ByteReader,
        embedded: Option<&Arc<[u8]>>,
    ) -> Result<Arc<[u8]>> {
        let mut cache = self.cache.lock().unwrap();
        if let Some(data) = cache.as_ref() {
            return Ok(data.clone());
        }
        let mut raw = match &self.source {
            ByteSource::Embedded => embedded.ok_or(Error::MissingEmbeddedChunk)?.to_vec(),
            ByteSource::Inline(uri) => decode_data_uri(uri)?,
            ByteSource::External(location) => {
                debug!("reading buffer bytes from {}", location.display());
                reader.read(location).map_err(|source| Error::Io {
                    location: location.clone(),
                    source,
                })?
            }
        };
        if raw.len() < self.byte_length {
            return Err(Error::LengthMismatch {
                declared: self.byte_length,
                actual: raw.len(),
            });
        }
        raw.truncate(self.byte_length);
        let data: Arc<[u8]> = raw.into();
        *cache = Some(data.clone());
        Ok(data)
    }
}

/// Decode a `data:[<media>][;base64],<payload>` URI into bytes.
pub(crate) fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::InvalidEncoding(format!("`{}` is not a data URI", uri)))?;
    let (media, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::InvalidEncoding("data URI has no payload".to_owned()))?;
    if !media.ends_with(";base64") {
        return Err(Error::InvalidEncoding(format!(
            "unsupported data URI encoding `{}`",
            media
        )));
    }
    let payload = percent_encoding::percent_decode_str(payload)
        .decode_utf8()
        .map_err(|err| Error::InvalidEncoding(err.to_string()))?;
    base64::engine::general_purpose::STANDARD
        .decode(payload.as_ref())
        .map_err(|err| Error::InvalidEncoding(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts underlying reads so tests can observe load-once behavior.
    struct CountingReader {
        loads: AtomicUsize,
        payload: Vec<u8>,
    }

    impl ByteReader for CountingReader {
        fn read(&self, _location: &Path) -> std::io::Result<Vec<u8>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.payload.clone())
        }
    }

    #[test]
    fn parses_the_three_source_kinds() {
        let base = Path::new("/models");
        assert_eq!(
            ByteSource::parse(None, base).unwrap(),
            ByteSource::Embedded
        );
        assert!(matches!(
            ByteSource::parse(Some("data:application/octet-stream;base64,AA=="), base).unwrap(),
            ByteSource::Inline(_)
        ));
        assert_eq!(
            ByteSource::parse(Some("mesh%20data.bin"), base).unwrap(),
            ByteSource::External(PathBuf::from("/models/mesh data.bin"))
        );
        assert_eq!(
            ByteSource::parse(Some("/abs/path.bin"), base).unwrap(),
            ByteSource::External(PathBuf::from("/abs/path.bin"))
        );
    }

    #[test]
    fn scheme_uris_are_not_joined_to_the_base() {
        let base = Path::new("/models");
        assert_eq!(
            ByteSource::parse(Some("http://host/mesh.bin"), base).unwrap(),
            ByteSource::External(PathBuf::from("http://host/mesh.bin"))
        );
        assert_eq!(
            ByteSource::parse(Some("file+archive://bundle/mesh.bin"), base).unwrap(),
            ByteSource::External(PathBuf::from("file+archive://bundle/mesh.bin"))
        );
        // A colon later in a plain file name is not a scheme.
        assert_eq!(
            ByteSource::parse(Some("12:30.bin"), base).unwrap(),
            ByteSource::External(PathBuf::from("/models/12:30.bin"))
        );
    }

    #[test]
    fn decodes_base64_data_uris() {
        let bytes =
            decode_data_uri("data:application/octet-stream;base64,AAECAwQFBgcICQoL").unwrap();
        assert_eq!(bytes, (0u8..12).collect::<Vec<u8>>());
    }

    #[test]
    fn rejects_malformed_data_uris() {
        assert!(matches!(
            decode_data_uri("data:application/octet-stream;base64,!!!"),
            Err(Error::InvalidEncoding(_))
        ));
        assert!(matches!(
            decode_data_uri("data:text/plain,hello"),
            Err(Error::InvalidEncoding(_))
        ));
        assert!(matches!(
            decode_data_uri("data:nopayload"),
            Err(Error::InvalidEncoding(_))
        ));
    }

    #[test]
    fn missing_embedded_chunk_is_an_error() {
        let buffer = Buffer::new(None, 4, ByteSource::Embedded);
        assert!(matches!(
            buffer.bytes(&FsReader, None),
            Err(Error::MissingEmbeddedChunk)
        ));
    }

    #[test]
    fn embedded_chunk_padding_is_truncated() {
        let chunk: Arc<[u8]> = vec![1u8, 2, 3, 0, 0].into();
        let buffer = Buffer::new(None, 3, ByteSource::Embedded);
        let bytes = buffer.bytes(&FsReader, Some(&chunk)).unwrap();
        assert_eq!(&bytes[..], &[1, 2, 3]);
    }

    #[test]
    fn short_payload_is_a_length_mismatch() {
        let chunk: Arc<[u8]> = vec![1u8, 2].into();
        let buffer = Buffer::new(None, 3, ByteSource::Embedded);
        assert!(matches!(
            buffer.bytes(&FsReader, Some(&chunk)),
            Err(Error::LengthMismatch {
                declared: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn concurrent_first_access_loads_exactly_once() {
        let reader = Arc::new(CountingReader {
            loads: AtomicUsize::new(0),
            payload: vec![9u8; 64],
        });
        let buffer = Arc::new(Buffer::new(
            None,
            64,
            ByteSource::External(PathBuf::from("probe.bin")),
        ));
        let mut joins = Vec::new();
        for _ in 0..8 {
            let buffer = buffer.clone();
            let reader = reader.clone();
            joins.push(std::thread::spawn(move || {
                buffer.bytes(reader.as_ref(), None).unwrap()
            }));
        }
        let regions: Vec<Arc<[u8]>> = joins.into_iter().map(|j| j.join().unwrap()).collect();
        assert_eq!(reader.loads.load(Ordering::SeqCst), 1);
        for region in &regions {
            assert_eq!(&region[..], &regions[0][..]);
        }
    }
}
