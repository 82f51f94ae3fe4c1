//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe a single HTTP exchange as plain data. The fetch
//! client builds `HttpRequest` values and turns `HttpResponse` values into
//! `Response` objects without ever touching the network; a [`Transport`]
//! supplied by the host performs the actual I/O. This keeps redirect
//! handling, header parsing and body decoding deterministic and easy to test
//! with a scripted transport.
//!
//! All fields use owned types (`String`, `Vec`, `Bytes`) so values can move
//! across threads and into blocking executors without lifetime concerns.

use std::fmt;
use std::future::Future;

use bytes::Bytes;
use thiserror::Error;

/// HTTP method for a request.
///
/// The well-known methods get their own variants; anything else that is a
/// valid token is carried verbatim in `Extension`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Patch,
    Extension(String),
}

impl HttpMethod {
    /// Normalize a caller-supplied method name.
    ///
    /// `DELETE`, `GET`, `HEAD`, `OPTIONS`, `POST` and `PUT` are matched
    /// case-insensitively and uppercased. Every other token is kept exactly
    /// as written, so `PATCH` stays `PATCH` and `patch` stays `patch`.
    /// Returns `None` for non-token input and for `CONNECT`, `TRACE` and
    /// `TRACK`.
    pub fn normalize(method: &str) -> Option<HttpMethod> {
        if method.is_empty() || !method.bytes().all(is_token_byte) {
            return None;
        }
        let upper = method.to_ascii_uppercase();
        match upper.as_str() {
            "CONNECT" | "TRACE" | "TRACK" => None,
            "DELETE" => Some(HttpMethod::Delete),
            "GET" => Some(HttpMethod::Get),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            _ if method == "PATCH" => Some(HttpMethod::Patch),
            _ => Some(HttpMethod::Extension(method.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Extension(m) => m,
        }
    }

    /// GET and HEAD requests may not carry a body.
    pub fn forbids_body(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RFC 9110 `tchar`.
pub(crate) fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// An HTTP request described as plain data.
///
/// Built by `FetchClient::build_request` for every hop of a fetch. The
/// transport executes it and reports back exactly one terminal result.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

/// The terminal state of a completed HTTP exchange.
///
/// `raw_headers` is the header block exactly as the transport saw it
/// (`Name: value` lines separated by CRLF). `url` is the final URL and
/// `redirected` tells whether the transport followed redirects on its own.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub raw_headers: String,
    pub url: String,
    pub redirected: bool,
    pub body: Bytes,
}

/// Failures where the transport never completed an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// DNS resolution, connection refused, TLS failure and the like.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The transport gave up following redirects on its own.
    #[error("too many redirects")]
    TooManyRedirects,

    /// The request could not be expressed for the underlying client.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The exchange started but the response could not be read.
    #[error("failed to read response: {0}")]
    Read(String),
}

/// The transport primitive the fetch client drives.
///
/// Implementations perform exactly one HTTP exchange per call and report a
/// terminal result. They should not treat 4xx/5xx statuses as errors, and
/// may either follow redirects themselves (reporting the final URL with
/// `redirected = true`) or return 3xx responses for the client to follow.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}
