use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, EchoedRequest, MULTIPART_BOUNDARY};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn header<'a>(response: &'a axum::response::Response, name: http::HeaderName) -> &'a str {
    response.headers().get(name).unwrap().to_str().unwrap()
}

// --- fixed bodies ---

#[tokio::test]
async fn hello_says_hi() {
    let resp = app().oneshot(get("/hello")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"hi");
}

#[tokio::test]
async fn boom_is_a_500_with_body() {
    let resp = app().oneshot(get("/boom")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body_bytes(resp).await[..], b"boom");
}

#[tokio::test]
async fn empty_is_204_without_body() {
    let resp = app().oneshot(get("/empty")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn headers_endpoint_sets_fixed_values() {
    let resp = app().oneshot(get("/headers")).await.unwrap();
    assert_eq!(header(&resp, http::header::DATE), "Mon, 13 Oct 2014 21:02:27 GMT");
    assert_eq!(header(&resp, http::header::CONTENT_TYPE), "text/html; charset=utf-8");
}

#[tokio::test]
async fn json_and_json_error() {
    let resp = app().oneshot(get("/json")).await.unwrap();
    assert_eq!(header(&resp, http::header::CONTENT_TYPE), "application/json");
    let value: serde_json::Value = body_json(resp).await;
    assert_eq!(value["login"], "hubot");

    let resp = app().oneshot(get("/json-error")).await.unwrap();
    let bytes = body_bytes(resp).await;
    assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_err());
}

#[tokio::test]
async fn form_fixtures_declare_their_encoding() {
    let resp = app().oneshot(get("/form")).await.unwrap();
    assert_eq!(
        header(&resp, http::header::CONTENT_TYPE),
        "application/x-www-form-urlencoded"
    );

    let resp = app().oneshot(get("/multipart")).await.unwrap();
    assert_eq!(
        header(&resp, http::header::CONTENT_TYPE),
        format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}")
    );
    let body = body_bytes(resp).await;
    assert!(body.ends_with(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes()));
}

// --- echo ---

#[tokio::test]
async fn request_echoes_method_headers_and_body() {
    let req = Request::builder()
        .method("PUT")
        .uri("/request?x=1")
        .header("X-Test", "42")
        .header("Accept", "application/json")
        .body("name=Hubot".to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let echoed: EchoedRequest = body_json(resp).await;
    assert_eq!(echoed.method, "PUT");
    assert_eq!(echoed.url, "/request?x=1");
    assert_eq!(echoed.headers["x-test"], "42");
    assert_eq!(echoed.headers["accept"], "application/json");
    assert_eq!(echoed.data, "name=Hubot");
}

#[tokio::test]
async fn request_joins_repeated_headers() {
    let req = Request::builder()
        .uri("/request")
        .header("X-Multi", "a")
        .header("X-Multi", "b")
        .body(String::new())
        .unwrap();
    let echoed: EchoedRequest = body_json(app().oneshot(req).await.unwrap()).await;
    assert_eq!(echoed.method, "GET");
    assert_eq!(echoed.headers["x-multi"], "a, b");
    assert_eq!(echoed.data, "");
}

// --- redirects ---

#[tokio::test]
async fn redirect_codes_point_at_hello() {
    for code in [301u16, 302, 303, 307, 308] {
        let resp = app().oneshot(get(&format!("/redirect/{code}"))).await.unwrap();
        assert_eq!(resp.status().as_u16(), code);
        assert_eq!(header(&resp, http::header::LOCATION), "/hello");
    }
}

#[tokio::test]
async fn redirect_rejects_non_redirect_codes() {
    let resp = app().oneshot(get("/redirect/200")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app().oneshot(get("/redirect/abc")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn redirect_loop_points_at_itself() {
    let resp = app().oneshot(get("/redirect-loop")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(header(&resp, http::header::LOCATION), "/redirect-loop");
}
