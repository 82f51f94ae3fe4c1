//! The fetch orchestrator.
//!
//! # Design
//! `FetchClient` owns a [`Transport`] and a [`FetchConfig`] and carries no
//! other state between calls. Each hop of a fetch is split into
//! `build_request`, which produces a plain-data `HttpRequest`, and
//! [`FetchClient::parse_response`], which turns the
//! transport's `HttpResponse` into a `Response`. The transport call between
//! the two is the only suspension point of a hop.
//!
//! A fetch moves through `BUILDING → SENT → (REDIRECTING → SENT)* →
//! SETTLED`. Only a transport failure, a redirect policy violation or an
//! abort produces an error; every HTTP status settles as a `Response`.

use bytes::Bytes;
use log::{debug, trace, warn};
use url::Url;

use crate::abort::AbortSignal;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::headers::{Headers, REQUEST_BODY_HEADERS};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
use crate::request::{RedirectMode, Request, RequestInit};
use crate::response::{is_redirect_status, Response};

#[derive(Debug, Clone)]
pub struct FetchClient<T> {
    transport: T,
    config: FetchConfig,
    default_headers: Headers,
}

/// The request as it stands for the current hop. Redirects rewrite it.
#[derive(Debug, Clone)]
struct Hop {
    method: HttpMethod,
    url: Url,
    headers: Headers,
    body: Option<Bytes>,
}

impl<T: Transport> FetchClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: FetchConfig::default(),
            default_headers: Headers::new(),
        }
    }

    /// Fails if one of the configured default headers is invalid.
    pub fn with_config(transport: T, config: FetchConfig) -> Result<Self, FetchError> {
        let default_headers = Headers::from_pairs(config.default_headers.iter().map(|(k, v)| (k, v)))?;
        Ok(Self {
            transport,
            config,
            default_headers,
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch `url`, resolved against the configured base URL.
    pub async fn fetch(&self, url: &str, init: RequestInit) -> Result<Response, FetchError> {
        let url = self.config.resolve(url)?;
        let request = Request::new(url.as_str(), init)?;
        self.send(request).await
    }

    /// Send a prepared request. Its body is marked as read.
    pub async fn send(&self, request: Request) -> Result<Response, FetchError> {
        let body = request.take_payload()?;
        let mut headers = request.headers().clone();
        headers.fill_from(&self.default_headers);
        trace!("request headers after defaults: {headers:?}");

        let mut hop = Hop {
            method: request.method().clone(),
            url: request.url().clone(),
            headers,
            body,
        };
        let mut redirects = 0;
        let mut redirected = false;

        loop {
            let http_request = self.build_request(&hop);
            debug!("{} {}", http_request.method, http_request.url);

            let exchange = self.dispatch(http_request, request.signal()).await?;
            debug!("{} {} -> {}", hop.method, hop.url, exchange.status);

            let headers = Headers::from_raw(&exchange.raw_headers);
            let Some(location) = redirect_location(exchange.status, &headers) else {
                return Ok(settle(exchange, headers, redirected));
            };

            match request.redirect() {
                RedirectMode::Manual => return Ok(settle(exchange, headers, redirected)),
                RedirectMode::Error => return Err(FetchError::UnexpectedRedirect(location)),
                RedirectMode::Follow => {}
            }

            if redirects >= self.config.max_redirects {
                warn!("giving up on {} after {redirects} redirects", request.url());
                return Err(FetchError::TooManyRedirects(self.config.max_redirects));
            }
            redirects += 1;
            redirected = true;
            hop = hop.follow(exchange.status, &location)?;
        }
    }

    /// Describe the current hop as plain data for the transport.
    fn build_request(&self, hop: &Hop) -> HttpRequest {
        HttpRequest {
            method: hop.method.clone(),
            url: hop.url.to_string(),
            headers: hop.headers.to_pairs(),
            body: hop.body.clone(),
        }
    }

    /// Turn a terminal exchange into a `Response`.
    ///
    /// `redirected` records redirects followed by this client; redirects the
    /// transport followed on its own are taken from the exchange.
    pub fn parse_response(&self, response: HttpResponse, redirected: bool) -> Response {
        let headers = Headers::from_raw(&response.raw_headers);
        settle(response, headers, redirected)
    }

    /// Run one exchange, racing it against the abort signal if there is one.
    async fn dispatch(
        &self,
        request: HttpRequest,
        signal: Option<&AbortSignal>,
    ) -> Result<HttpResponse, FetchError> {
        let Some(signal) = signal else {
            return Ok(self.transport.execute(request).await?);
        };
        if signal.is_aborted() {
            return Err(FetchError::Aborted);
        }
        let target = format!("{} {}", request.method, request.url);
        tokio::select! {
            biased;
            _ = signal.aborted() => {
                debug!("{target} aborted");
                Err(FetchError::Aborted)
            }
            result = self.transport.execute(request) => Ok(result?),
        }
    }
}

impl Hop {
    /// Rewrite the request for the next hop of a redirect.
    ///
    /// * 303: GET (HEAD stays HEAD), body dropped.
    /// * 301/302: POST becomes GET with the body dropped; other methods are
    ///   kept as they are.
    /// * 307/308: method and body kept verbatim.
    fn follow(mut self, status: u16, location: &str) -> Result<Hop, FetchError> {
        let next = self.url.join(location).map_err(|e| {
            TransportError::InvalidRequest(format!("bad redirect location {location:?}: {e}"))
        })?;
        if !matches!(next.scheme(), "http" | "https") {
            return Err(TransportError::InvalidRequest(format!("redirect to unsupported URL {next}")).into());
        }

        let drop_body = match status {
            303 => {
                if self.method != HttpMethod::Head {
                    self.method = HttpMethod::Get;
                }
                true
            }
            301 | 302 if self.method == HttpMethod::Post => {
                self.method = HttpMethod::Get;
                true
            }
            _ => false,
        };
        if drop_body {
            self.body = None;
            for name in REQUEST_BODY_HEADERS {
                self.headers.delete(name);
            }
        }

        if next.origin() != self.url.origin() {
            self.headers.delete("authorization");
        }

        self.url = next;
        Ok(self)
    }
}

/// Build the `Response` for an exchange whose header block is already parsed.
fn settle(response: HttpResponse, headers: Headers, redirected: bool) -> Response {
    Response::from_exchange(
        response.status,
        response.status_text,
        response.url,
        redirected || response.redirected,
        headers,
        response.body,
    )
}

/// The `Location` of a redirect-class response, if it has one. A redirect
/// status without a location settles like any other response.
fn redirect_location(status: u16, headers: &Headers) -> Option<String> {
    if !is_redirect_status(status) {
        return None;
    }
    headers.get("location")
}
