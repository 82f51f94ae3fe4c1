//! Opaque binary container with a MIME type.

use bytes::Bytes;

/// Immutable bytes tagged with a content type.
///
/// The type is lowercased; a type containing anything other than printable
/// ASCII is replaced by the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    bytes: Bytes,
    content_type: String,
}

impl Blob {
    pub fn new(bytes: impl Into<Bytes>, content_type: &str) -> Self {
        let content_type = if content_type.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
            content_type.to_ascii_lowercase()
        } else {
            String::new()
        };
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}
