//! Outgoing requests and the options used to build them.

use std::future::Future;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::abort::AbortSignal;
use crate::blob::Blob;
use crate::body::{Body, BodyInit};
use crate::error::FetchError;
use crate::form::FormData;
use crate::headers::Headers;
use crate::http::HttpMethod;

/// What the client does when a response is a redirect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectMode {
    /// Follow the `Location` header transparently.
    #[default]
    Follow,
    /// Fail the fetch with a network error.
    Error,
    /// Return the 3xx response to the caller as-is.
    Manual,
}

/// Options for a single fetch, the equivalent of the `init` dictionary.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub method: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<BodyInit>,
    pub redirect: RedirectMode,
    pub signal: Option<AbortSignal>,
}

impl RequestInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = Some(method.to_string());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Add every pair from a mapping, or from an existing `Headers`.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn body(mut self, body: impl Into<BodyInit>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn redirect(mut self, redirect: RedirectMode) -> Self {
        self.redirect = redirect;
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

#[derive(Debug)]
pub struct Request {
    method: HttpMethod,
    url: Url,
    headers: Headers,
    body: Body,
    redirect: RedirectMode,
    signal: Option<AbortSignal>,
}

impl Request {
    /// Build a request for an absolute `url`.
    ///
    /// The body's implied Content-Type is added unless the headers already
    /// carry one.
    pub fn new(url: &str, init: RequestInit) -> Result<Request, FetchError> {
        let url = Url::parse(url).map_err(|e| FetchError::invalid_url(url, e))?;

        let method = match init.method.as_deref() {
            Some(m) => HttpMethod::normalize(m).ok_or_else(|| FetchError::InvalidMethod(m.to_string()))?,
            None => HttpMethod::Get,
        };

        let mut headers = Headers::from_pairs(init.headers.iter().map(|(k, v)| (k, v)))?;

        let body = match init.body {
            Some(_) if method.forbids_body() => {
                return Err(FetchError::BodyNotAllowed(method.to_string()));
            }
            Some(init_body) => {
                let (bytes, content_type) = init_body.extract();
                if let Some(content_type) = content_type {
                    if !headers.has("content-type") {
                        headers.set("content-type", &content_type)?;
                    }
                }
                Body::new(Some(bytes))
            }
            None => Body::null(),
        };

        Ok(Request {
            method,
            url,
            headers,
            body,
            redirect: init.redirect,
            signal: init.signal,
        })
    }

    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn redirect(&self) -> RedirectMode {
        self.redirect
    }

    pub fn signal(&self) -> Option<&AbortSignal> {
        self.signal.as_ref()
    }

    pub fn body_used(&self) -> bool {
        self.body.is_used()
    }

    /// A copy with an independent body. Fails once the body has been read.
    pub fn try_clone(&self) -> Result<Request, FetchError> {
        Ok(Request {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.try_clone()?,
            redirect: self.redirect,
            signal: self.signal.clone(),
        })
    }

    /// Claim the payload for sending. The request body counts as read.
    pub(crate) fn take_payload(&self) -> Result<Option<Bytes>, FetchError> {
        self.body.claim()
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

    pub fn blob(&self) -> impl Future<Output = Result<Blob, FetchError>> + Send + 'static {
        self.body.blob(self.headers.get("content-type"))
    }

    pub fn form_data(&self) -> impl Future<Output = Result<FormData, FetchError>> + Send + 'static {
        self.body.form_data(self.headers.get("content-type"))
    }
}
