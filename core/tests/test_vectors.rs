//! Check header parsing and redirect rewriting against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Vectors drive the public API only: raw header blocks go through
//! `FetchClient::parse_response`, and redirects are replayed by a scripted
//! transport that records the request each hop produces.

use std::collections::VecDeque;
use std::sync::Mutex;

use bytes::Bytes;
use fetch_core::{
    FetchClient, HttpRequest, HttpResponse, RequestInit, Transport, TransportError,
};
use serde_json::Value;

/// Replays canned responses in order and keeps every request it was sent.
#[derive(Default)]
struct Replay {
    responses: Mutex<VecDeque<HttpResponse>>,
    sent: Mutex<Vec<HttpRequest>>,
}

impl Replay {
    fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for Replay {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Connect("no response left to replay".to_string()))
    }
}

fn response(status: u16, url: &str, raw_headers: &str) -> HttpResponse {
    HttpResponse {
        status,
        status_text: String::new(),
        raw_headers: raw_headers.to_string(),
        url: url.to_string(),
        redirected: false,
        body: Bytes::new(),
    }
}

fn strings(value: &Value) -> Vec<&str> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

#[test]
fn header_test_vectors() {
    let raw = include_str!("../../test-vectors/headers.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let client = FetchClient::new(Replay::default());
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let block = case["raw"].as_str().unwrap();

        let res = client.parse_response(response(200, "http://localhost:3000/", block), false);

        let entries: Vec<(String, String)> = res
            .headers()
            .iter()
            .map(|(n, v)| (n.to_string(), v))
            .collect();
        let expected: Vec<(String, String)> = case["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|pair| {
                (
                    pair[0].as_str().unwrap().to_string(),
                    pair[1].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(entries, expected, "{name}: entries");

        for (lookup, want) in case["lookups"].as_object().unwrap() {
            assert_eq!(
                res.headers().get(lookup).as_deref(),
                want.as_str(),
                "{name}: get({lookup})"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Redirects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn redirect_test_vectors() {
    let raw = include_str!("../../test-vectors/redirects.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let start = vectors["start"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let status = case["status"].as_u64().unwrap() as u16;
        let location = case["location"].as_str().unwrap();
        let request = &case["request"];
        let expected = &case["expected"];

        let transport = Replay::new(vec![
            response(status, start, &format!("Location: {location}\r\n")),
            response(200, expected["url"].as_str().unwrap(), ""),
        ]);
        let client = FetchClient::new(transport);

        let mut init = RequestInit::new().method(request["method"].as_str().unwrap());
        for pair in request["headers"].as_array().unwrap() {
            init = init.header(pair[0].as_str().unwrap(), pair[1].as_str().unwrap());
        }
        if let Some(body) = request["body"].as_str() {
            init = init.body(body);
        }

        let res = client.fetch(start, init).await.unwrap();
        assert_eq!(res.status(), 200, "{name}: status");
        assert!(res.redirected(), "{name}: redirected");

        let sent = client.transport().sent();
        assert_eq!(sent.len(), 2, "{name}: hops");
        let next = &sent[1];
        assert_eq!(next.method.as_str(), expected["method"].as_str().unwrap(), "{name}: method");
        assert_eq!(next.url, expected["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(
            next.body.as_deref(),
            expected["body"].as_str().map(str::as_bytes),
            "{name}: body"
        );

        let has = |header: &str| next.headers.iter().any(|(n, _)| n == header);
        for header in strings(&expected["present"]) {
            assert!(has(header), "{name}: expected {header} to be sent");
        }
        for header in strings(&expected["absent"]) {
            assert!(!has(header), "{name}: expected {header} to be dropped");
        }
    }
}
