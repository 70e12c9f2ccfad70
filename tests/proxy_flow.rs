//! End-to-end tests: client → proxy → mock backend.

use axum::http::header;
use flate2::read::GzDecoder;
use serde_json::Value;
use std::io::Read;
use std::net::SocketAddr;

mod common;

use common::PUBLIC_HOST;

/// Start a backend and a proxy in front of it.
///
/// The returned `Shutdown` must be held for the proxy to keep running.
async fn setup() -> (SocketAddr, SocketAddr, host_rewrite_proxy::Shutdown) {
    let backend = common::start_backend().await;
    let (proxy, shutdown) = common::start_proxy(&format!("http://{}", backend)).await;
    (backend, proxy, shutdown)
}

async fn get(proxy: SocketAddr, path: &str) -> reqwest::Response {
    common::client()
        .get(format!("http://{}{}", proxy, path))
        .header(header::HOST, PUBLIC_HOST)
        .send()
        .await
        .expect("Proxy unreachable")
}

#[tokio::test]
async fn test_request_identity_rewritten() {
    let (backend, proxy, _shutdown) = setup().await;

    let res = common::client()
        .get(format!("http://{}/echo?x=1", proxy))
        .header(header::HOST, PUBLIC_HOST)
        .header(header::REFERER, "http://public.example.com/page")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let seen: Value = res.json().await.unwrap();
    assert_eq!(seen["host"], backend.to_string());
    assert_eq!(seen["referer"], "http://127.0.0.1/page");
    assert_eq!(seen["path"], "/echo");
    assert_eq!(seen["query"], "x=1");
    assert_eq!(seen["user_agent"], "");
    assert!(seen["forwarded_for"].is_null());
}

#[tokio::test]
async fn test_client_user_agent_and_method_forwarded() {
    let (_backend, proxy, _shutdown) = setup().await;

    let res = common::client()
        .post(format!("http://{}/echo", proxy))
        .header(header::HOST, PUBLIC_HOST)
        .header(header::USER_AGENT, "integration-test/1.0")
        .body("payload")
        .send()
        .await
        .unwrap();

    let seen: Value = res.json().await.unwrap();
    assert_eq!(seen["method"], "POST");
    assert_eq!(seen["user_agent"], "integration-test/1.0");
    assert!(seen["referer"].is_null());
}

#[tokio::test]
async fn test_html_body_and_cookie_rewritten() {
    let (backend, proxy, _shutdown) = setup().await;

    let res = get(proxy, "/page").await;
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()[header::SET_COOKIE],
        "session=abc; Domain=public.example.com; Path=/"
    );
    assert!(res.headers().get(header::CONTENT_ENCODING).is_none());

    let body = res.text().await.unwrap();
    let public_base = format!("http://{}:{}", PUBLIC_HOST, backend.port());
    assert!(body.contains(&format!("href=\"{}/next\"", public_base)));
    assert!(body.contains(&format!("src=\"{}/logo.png\"", public_base)));
    assert!(!body.contains("127.0.0.1"));
}

#[tokio::test]
async fn test_redirect_location_rewritten() {
    let (backend, proxy, _shutdown) = setup().await;

    let res = get(proxy, "/redirect").await;

    assert_eq!(res.status(), 302);
    assert_eq!(
        res.headers()[header::LOCATION],
        format!("http://{}:{}/login", PUBLIC_HOST, backend.port()).as_str()
    );
}

#[tokio::test]
async fn test_binary_and_unlisted_text_pass_through() {
    let (backend, proxy, _shutdown) = setup().await;

    let res = get(proxy, "/image").await;
    assert_eq!(res.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(res.bytes().await.unwrap().to_vec(), common::image_bytes());

    let res = get(proxy, "/plain").await;
    assert_eq!(res.text().await.unwrap(), format!("http://{}", backend));
}

#[tokio::test]
async fn test_gzip_json_decoded_and_rewritten() {
    let (backend, proxy, _shutdown) = setup().await;

    let res = get(proxy, "/gzip-json").await;
    assert_eq!(res.status(), 200);
    assert!(res.headers().get(header::CONTENT_ENCODING).is_none());

    let body: Value = res.json().await.expect("body should be plain JSON");
    assert_eq!(
        body["self"],
        format!("http://{}:{}/api", PUBLIC_HOST, backend.port())
    );
    assert_eq!(body["host"], PUBLIC_HOST);
}

#[tokio::test]
async fn test_rewritten_body_recompressed_for_gzip_clients() {
    let (_backend, proxy, _shutdown) = setup().await;

    let res = common::client()
        .get(format!("http://{}/page", proxy))
        .header(header::HOST, PUBLIC_HOST)
        .header(header::ACCEPT_ENCODING, "gzip")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()[header::CONTENT_ENCODING], "gzip");

    let compressed = res.bytes().await.unwrap();
    let mut body = String::new();
    GzDecoder::new(&compressed[..])
        .read_to_string(&mut body)
        .unwrap();
    assert!(body.contains(PUBLIC_HOST));
    assert!(!body.contains("127.0.0.1"));
}

#[tokio::test]
async fn test_corrupt_gzip_is_bad_gateway() {
    let (_backend, proxy, _shutdown) = setup().await;

    let res = get(proxy, "/broken-gzip").await;
    assert_eq!(res.status(), 502);

    // Other requests are unaffected.
    let res = get(proxy, "/redirect").await;
    assert_eq!(res.status(), 302);
}

#[tokio::test]
async fn test_slow_backend_is_gateway_timeout() {
    let backend = common::start_backend().await;
    let mut config = common::proxy_config(&format!("http://{}", backend));
    config.timeouts.request_secs = 1;
    let (proxy, _shutdown) = common::start_proxy_with(config).await;

    let started = std::time::Instant::now();
    let res = get(proxy, "/slow").await;
    assert_eq!(res.status(), 504);
    assert!(started.elapsed() < common::SLOW_RESPONSE);

    // Fast routes still answer within the limit.
    let res = get(proxy, "/redirect").await;
    assert_eq!(res.status(), 302);
}

#[tokio::test]
async fn test_unreachable_backend_is_bad_gateway() {
    // Reserve a port, then free it so nothing listens there.
    let unused = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = unused.local_addr().unwrap();
    drop(unused);

    let (proxy, _shutdown) = common::start_proxy(&format!("http://{}", dead)).await;

    let res = get(proxy, "/anything").await;
    assert_eq!(res.status(), 502);
}

#[tokio::test]
async fn test_trigger_stops_proxy() {
    let (_backend, proxy, shutdown) = setup().await;
    assert_eq!(get(proxy, "/redirect").await.status(), 302);

    shutdown.trigger();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let result = common::client()
        .get(format!("http://{}/redirect", proxy))
        .header(header::HOST, PUBLIC_HOST)
        .timeout(std::time::Duration::from_secs(2))
        .send()
        .await;
    assert!(result.is_err());
}
