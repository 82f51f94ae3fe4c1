//! Immutable response objects.
//!
//! # Design
//! A `Response` is built once, either by the fetch client from a terminal
//! transport result or by one of the public constructors, and exposes its
//! metadata only through getters. Headers cannot be modified after
//! construction; the body can only be consumed.

use std::future::Future;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use url::Url;

use crate::blob::Blob;
use crate::body::{Body, BodyInit};
use crate::error::FetchError;
use crate::form::FormData;
use crate::headers::Headers;

/// Statuses that never carry a body.
pub fn is_null_body_status(status: u16) -> bool {
    matches!(status, 204 | 205 | 304)
}

/// Statuses the client treats as redirects.
pub fn is_redirect_status(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// Built by the caller through `Response::new` or `Response::redirect`.
    Default,
    /// Produced by a completed network exchange.
    Basic,
    /// A network error placeholder from `Response::error`.
    Error,
}

/// Options for `Response::new`.
#[derive(Debug, Clone)]
pub struct ResponseInit {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
}

impl Default for ResponseInit {
    fn default() -> Self {
        Self {
            status: 200,
            status_text: String::new(),
            headers: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct Response {
    response_type: ResponseType,
    status: u16,
    status_text: String,
    url: String,
    redirected: bool,
    headers: Headers,
    body: Body,
}

impl Response {
    /// Build a response by hand.
    ///
    /// `status` must be within 200..=599 and must not be a null-body status
    /// when a body is given.
    pub fn new(body: Option<BodyInit>, init: ResponseInit) -> Result<Response, FetchError> {
        if !(200..=599).contains(&init.status) {
            return Err(FetchError::InvalidStatus(init.status));
        }
        let mut headers = Headers::from_pairs(init.headers.iter().map(|(k, v)| (k, v)))?;
        let body = match body {
            Some(_) if is_null_body_status(init.status) => {
                return Err(FetchError::NullBodyStatus(init.status));
            }
            Some(body) => {
                let (bytes, content_type) = body.extract();
                if let Some(content_type) = content_type {
                    if !headers.has("content-type") {
                        headers.set("content-type", &content_type)?;
                    }
                }
                Body::new(Some(bytes))
            }
            None => Body::null(),
        };
        Ok(Response {
            response_type: ResponseType::Default,
            status: init.status,
            status_text: init.status_text,
            url: String::new(),
            redirected: false,
            headers,
            body,
        })
    }

    /// A network error response: status 0, no headers, no body.
    pub fn error() -> Response {
        Response {
            response_type: ResponseType::Error,
            status: 0,
            status_text: String::new(),
            url: String::new(),
            redirected: false,
            headers: Headers::new(),
            body: Body::null(),
        }
    }

    /// A redirect to `url` with a redirect-class `status`.
    pub fn redirect(url: &str, status: u16) -> Result<Response, FetchError> {
        if !is_redirect_status(status) {
            return Err(FetchError::InvalidStatus(status));
        }
        let location = Url::parse(url).map_err(|e| FetchError::invalid_url(url, e))?;
        let mut headers = Headers::new();
        headers.set("location", location.as_str())?;
        Ok(Response {
            response_type: ResponseType::Default,
            status,
            status_text: String::new(),
            url: String::new(),
            redirected: false,
            headers,
            body: Body::null(),
        })
    }

    /// Assemble a response from a completed exchange. Null-body statuses
    /// drop whatever payload the transport delivered.
    pub(crate) fn from_exchange(
        status: u16,
        status_text: String,
        url: String,
        redirected: bool,
        headers: Headers,
        payload: Bytes,
    ) -> Response {
        let body = if is_null_body_status(status) {
            Body::null()
        } else {
            Body::new(Some(payload))
        };
        Response {
            response_type: ResponseType::Basic,
            status,
            status_text,
            url,
            redirected,
            headers,
            body,
        }
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// True for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// The final URL after redirects, or empty for constructed responses.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn redirected(&self) -> bool {
        self.redirected
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body_used(&self) -> bool {
        self.body.is_used()
    }

    /// A copy with an independent body. Fails once the body has been read.
    pub fn try_clone(&self) -> Result<Response, FetchError> {
        Ok(Response {
            response_type: self.response_type,
            status: self.status,
            status_text: self.status_text.clone(),
            url: self.url.clone(),
            redirected: self.redirected,
            headers: self.headers.clone(),
            body: self.body.try_clone()?,
        })
    }

    pub fn text(&self) -> impl Future<Output = Result<String, FetchError>> + Send + 'static {
        self.body.text()
    }

    pub fn json<T: DeserializeOwned + 'static>(
        &self,
    ) -> impl Future<Output = Result<T, FetchError>> + Send + 'static {
        self.body.json::<T>()
    }

    pub fn bytes(&self) -> impl Future<Output = Result<Bytes, FetchError>> + Send + 'static {
        self.body.bytes()
    }

    /// The payload as a `Blob` typed with this response's Content-Type.
    pub fn blob(&self) -> impl Future<Output = Result<Blob, FetchError>> + Send + 'static {
        self.body.blob(self.headers.get("content-type"))
    }

    pub fn form_data(&self) -> impl Future<Output = Result<FormData, FetchError>> + Send + 'static {
        self.body.form_data(self.headers.get("content-type"))
    }
}
