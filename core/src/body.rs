//! The single-consumption body shared by `Request` and `Response`.
//!
//! # Design
//! A `Body` owns an immutable payload (`None` is a null body) and a consumed
//! flag. Every decode method swaps the flag *before* building its future, so
//! the second call fails even if the first future has not been polled yet.
//! The returned futures own everything they need and are `'static`.
//!
//! `blob` and `form_data` depend on the owner's Content-Type header, which
//! the owning `Request` or `Response` passes in when it delegates.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use mime::Mime;
use serde::de::DeserializeOwned;

use crate::blob::Blob;
use crate::error::FetchError;
use crate::form::FormData;

/// Anything that can be used as a request or response body.
#[derive(Debug, Clone)]
pub enum BodyInit {
    Text(String),
    Bytes(Bytes),
    Blob(Blob),
    Form(FormData),
    UrlEncoded(Vec<(String, String)>),
}

impl BodyInit {
    /// Serialize into payload bytes and the Content-Type the body implies.
    pub(crate) fn extract(self) -> (Bytes, Option<String>) {
        match self {
            BodyInit::Text(text) => (Bytes::from(text), Some("text/plain;charset=UTF-8".to_string())),
            BodyInit::Bytes(bytes) => (bytes, None),
            BodyInit::Blob(blob) => {
                let content_type = Some(blob.content_type().to_string()).filter(|t| !t.is_empty());
                (blob.bytes(), content_type)
            }
            BodyInit::Form(form) => {
                let (bytes, content_type) = form.to_multipart();
                (bytes, Some(content_type))
            }
            BodyInit::UrlEncoded(pairs) => {
                let encoded = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish();
                (
                    Bytes::from(encoded),
                    Some("application/x-www-form-urlencoded;charset=UTF-8".to_string()),
                )
            }
        }
    }
}

impl From<&str> for BodyInit {
    fn from(value: &str) -> Self {
        BodyInit::Text(value.to_string())
    }
}

impl From<String> for BodyInit {
    fn from(value: String) -> Self {
        BodyInit::Text(value)
    }
}

impl From<Vec<u8>> for BodyInit {
    fn from(value: Vec<u8>) -> Self {
        BodyInit::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for BodyInit {
    fn from(value: Bytes) -> Self {
        BodyInit::Bytes(value)
    }
}

impl From<Blob> for BodyInit {
    fn from(value: Blob) -> Self {
        BodyInit::Blob(value)
    }
}

impl From<FormData> for BodyInit {
    fn from(value: FormData) -> Self {
        BodyInit::Form(value)
    }
}

#[derive(Debug, Default)]
pub struct Body {
    payload: Option<Bytes>,
    used: AtomicBool,
}

impl Body {
    pub(crate) fn new(payload: Option<Bytes>) -> Self {
        Self {
            payload,
            used: AtomicBool::new(false),
        }
    }

    pub(crate) fn null() -> Self {
        Self::new(None)
    }

    /// Whether a decode has been started on this body.
    pub fn is_used(&self) -> bool {
        self.used.load(Ordering::Acquire)
    }

    /// Whether there is no payload at all (as opposed to an empty one).
    pub fn is_null(&self) -> bool {
        self.payload.is_none()
    }

    /// A fresh body over the same payload with its own consumed flag.
    pub(crate) fn try_clone(&self) -> Result<Body, FetchError> {
        if self.is_used() {
            return Err(FetchError::BodyUsed);
        }
        Ok(Body::new(self.payload.clone()))
    }

    /// Mark the body consumed and hand out its payload.
    ///
    /// Fails if another decode already claimed it.
    pub(crate) fn claim(&self) -> Result<Option<Bytes>, FetchError> {
        if self.used.swap(true, Ordering::AcqRel) {
            return Err(FetchError::BodyUsed);
        }
        Ok(self.payload.clone())
    }

    pub(crate) fn bytes(&self) -> impl Future<Output = Result<Bytes, FetchError>> + Send + 'static {
        let claimed = self.claim();
        async move { Ok(claimed?.unwrap_or_default()) }
    }

    pub(crate) fn text(&self) -> impl Future<Output = Result<String, FetchError>> + Send + 'static {
        let claimed = self.claim();
        async move { Ok(claimed?.map(|b| decode_utf8(&b)).unwrap_or_default()) }
    }

    pub(crate) fn json<T: DeserializeOwned + 'static>(
        &self,
    ) -> impl Future<Output = Result<T, FetchError>> + Send + 'static {
        let claimed = self.claim();
        async move {
            let payload = claimed?.unwrap_or_default();
            let text = decode_utf8(&payload);
            serde_json::from_str(&text).map_err(|e| FetchError::Syntax(format!("invalid JSON body: {e}")))
        }
    }

    pub(crate) fn blob(
        &self,
        content_type: Option<String>,
    ) -> impl Future<Output = Result<Blob, FetchError>> + Send + 'static {
        let claimed = self.claim();
        async move {
            let payload = claimed?.unwrap_or_default();
            Ok(Blob::new(payload, content_type.as_deref().unwrap_or("")))
        }
    }

    pub(crate) fn form_data(
        &self,
        content_type: Option<String>,
    ) -> impl Future<Output = Result<FormData, FetchError>> + Send + 'static {
        let claimed = self.claim();
        async move {
            let Some(payload) = claimed? else {
                return Ok(FormData::new());
            };
            let content_type = content_type.unwrap_or_default();
            let Ok(parsed) = content_type.parse::<Mime>() else {
                return Err(FetchError::UnsupportedFormat(content_type));
            };
            match parsed.essence_str() {
                "application/x-www-form-urlencoded" => Ok(FormData::parse_urlencoded(&payload)),
                "multipart/form-data" => {
                    let boundary = parsed.get_param(mime::BOUNDARY).ok_or_else(|| {
                        FetchError::MalformedForm("missing boundary parameter".to_string())
                    })?;
                    FormData::parse_multipart(&payload, boundary.as_str())
                }
                _ => Err(FetchError::UnsupportedFormat(content_type)),
            }
        }
    }
}

/// UTF-8 decode with replacement, dropping a leading byte order mark.
fn decode_utf8(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
