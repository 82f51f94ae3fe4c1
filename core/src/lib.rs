//! A `fetch`-style request/response layer over a pluggable HTTP transport.
//!
//! # Overview
//! Provides `Headers`, `Request`, `Response` and a single-consumption `Body`
//! with `text`, `json`, `bytes`, `blob` and `form_data` decoders. The
//! `FetchClient` drives a host-supplied [`Transport`] (host-does-IO
//! pattern), follows redirects and settles every HTTP status as a
//! `Response`; only transport failures, redirect policy violations and
//! aborts are errors.
//!
//! # Design
//! - The core performs no I/O. A `Transport` executes one plain-data
//!   `HttpRequest` per hop and reports a terminal `HttpResponse`.
//! - A body's consumed flag flips when a decode method is called, before the
//!   returned future runs, so two overlapping reads cannot both succeed.
//! - Responses are immutable once built; only their body can be consumed.

pub mod abort;
pub mod blob;
pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod headers;
pub mod http;
pub mod request;
pub mod response;

pub use abort::{AbortController, AbortSignal};
pub use blob::Blob;
pub use body::{Body, BodyInit};
pub use client::FetchClient;
pub use config::FetchConfig;
pub use error::{ErrorKind, FetchError};
pub use form::{FormData, FormValue};
pub use headers::Headers;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use request::{RedirectMode, Request, RequestInit};
pub use response::{Response, ResponseInit, ResponseType};
