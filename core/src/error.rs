//! Error types for the fetch layer.
//!
//! # Design
//! Only transport failures, redirect policy violations and aborts reject a
//! `fetch` call. An HTTP status, however severe, always produces a
//! `Response`. Decode errors are local to a single body read and leave the
//! owning `Request`/`Response` intact.
//!
//! Each variant maps to the exception class a browser would raise through
//! [`FetchError::kind`], so callers can branch on the coarse category
//! without matching every variant.

use thiserror::Error;

use crate::http::TransportError;

/// Coarse error category, mirroring the exception classes of the fetch API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failures, misuse of a consumed body, invalid arguments.
    Type,
    /// A payload that is not valid for the requested structured format.
    Syntax,
    /// A numeric argument outside its permitted range.
    Range,
    /// The request was cancelled through its abort signal.
    Abort,
}

/// Errors produced by requests, responses, bodies and the fetch client.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The transport never produced a response.
    #[error("network request failed: {0}")]
    Network(#[from] TransportError),

    /// The redirect chain exceeded the configured limit.
    #[error("redirect limit of {0} exceeded")]
    TooManyRedirects(u32),

    /// A redirect was received while the redirect mode is `Error`.
    #[error("unexpected redirect to {0}")]
    UnexpectedRedirect(String),

    /// The request was aborted before the transport settled.
    #[error("the operation was aborted")]
    Aborted,

    /// A decode was attempted on a body that has already been read.
    #[error("body has already been consumed")]
    BodyUsed,

    /// The payload could not be parsed as JSON.
    #[error("{0}")]
    Syntax(String),

    /// `form_data()` was called on a body whose Content-Type is not a form
    /// encoding.
    #[error("could not parse content as FormData: unsupported content type {0:?}")]
    UnsupportedFormat(String),

    /// A multipart payload did not follow the declared structure.
    #[error("malformed multipart body: {0}")]
    MalformedForm(String),

    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header name {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid value for header {0:?}")]
    InvalidHeaderValue(String),

    #[error("invalid request method {0:?}")]
    InvalidMethod(String),

    /// GET and HEAD requests cannot carry a body.
    #[error("body not allowed for {0} requests")]
    BodyNotAllowed(String),

    /// A body was supplied for a status that must not have one.
    #[error("response with status {0} cannot have a body")]
    NullBodyStatus(u16),

    /// The status code is outside the range permitted for the constructor.
    #[error("status {0} is out of range")]
    InvalidStatus(u16),
}

impl FetchError {
    /// The exception class this error corresponds to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Syntax(_) => ErrorKind::Syntax,
            FetchError::InvalidStatus(_) => ErrorKind::Range,
            FetchError::Aborted => ErrorKind::Abort,
            _ => ErrorKind::Type,
        }
    }

    /// True when the error means no response was ever received.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            FetchError::Network(_)
                | FetchError::TooManyRedirects(_)
                | FetchError::UnexpectedRedirect(_)
        )
    }

    pub(crate) fn invalid_url(url: &str, err: url::ParseError) -> Self {
        FetchError::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_are_type_errors() {
        let err = FetchError::from(TransportError::Connect("refused".to_string()));
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(err.is_network());
        assert_eq!(err.to_string(), "network request failed: connection failed: refused");
    }

    #[test]
    fn body_used_is_a_type_error_but_not_network() {
        let err = FetchError::BodyUsed;
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(!err.is_network());
    }

    #[test]
    fn kinds_for_special_variants() {
        assert_eq!(FetchError::Syntax("bad".into()).kind(), ErrorKind::Syntax);
        assert_eq!(FetchError::InvalidStatus(99).kind(), ErrorKind::Range);
        assert_eq!(FetchError::Aborted.kind(), ErrorKind::Abort);
        assert!(!FetchError::Aborted.is_network());
    }
}
