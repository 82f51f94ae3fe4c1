use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Boundary used by the `/multipart` fixture.
pub const MULTIPART_BOUNDARY: &str = "mock-server-boundary";

/// What `/request` reports back about the request it received.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EchoedRequest {
    pub method: String,
    pub url: String,
    /// Lowercase header names; repeated headers joined with `", "`.
    pub headers: BTreeMap<String, String>,
    pub data: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/hello", get(hello))
        .route("/request", any(echo_request))
        .route("/headers", get(fixed_headers))
        .route("/boom", get(boom))
        .route("/empty", get(empty))
        .route("/form", get(form))
        .route("/multipart", get(multipart))
        .route("/json", get(json))
        .route("/json-error", get(json_error))
        .route("/redirect/{code}", any(redirect))
        .route("/redirect-loop", any(redirect_loop))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn hello() -> &'static str {
    "hi"
}

async fn echo_request(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<EchoedRequest> {
    let mut echoed: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        echoed
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    debug!("echoing {method} {uri} ({} bytes)", body.len());
    Json(EchoedRequest {
        method: method.to_string(),
        url: uri.to_string(),
        headers: echoed,
        data: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn fixed_headers() -> impl IntoResponse {
    (
        [
            (header::DATE, "Mon, 13 Oct 2014 21:02:27 GMT"),
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
        ],
        "hi",
    )
}

async fn boom() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn empty() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn form() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/x-www-form-urlencoded")],
        "number=1&space=one+two&empty=&encoded=a%2Bb&",
    )
}

async fn multipart() -> impl IntoResponse {
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"name\"\r\n\r\n\
         Hubot\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"avatar\"; filename=\"hubot.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         beep boop\r\n\
         --{b}--\r\n",
        b = MULTIPART_BOUNDARY
    );
    (
        [(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )],
        body,
    )
}

async fn json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"name":"Hubot","login":"hubot"}"#,
    )
}

async fn json_error() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        "not json {",
    )
}

async fn redirect(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) if status.is_redirection() => {
            (status, [(header::LOCATION, "/hello")]).into_response()
        }
        _ => (StatusCode::BAD_REQUEST, "not a redirect status").into_response(),
    }
}

async fn redirect_loop() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/redirect-loop")])
}
