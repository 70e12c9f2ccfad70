//! Shared utilities for integration testing.

use axum::{
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use flate2::{write::GzEncoder, Compression};
use host_rewrite_proxy::{HttpServer, ProxyConfig, Shutdown};
use serde_json::json;
use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

/// Host clients address the proxy by.
pub const PUBLIC_HOST: &str = "public.example.com";

/// How long the `/slow` route stalls before answering.
pub const SLOW_RESPONSE: Duration = Duration::from_secs(3);

/// Start a mock backend on an ephemeral port.
///
/// Every route embeds the backend's own `http://127.0.0.1:<port>` address
/// somewhere the proxy is expected to rewrite (or leave alone).
pub async fn start_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base = format!("http://{}", addr);

    let app = Router::new()
        .route("/echo", any(echo))
        .route("/page", get({
            let base = base.clone();
            move || async move {
                (
                    [
                        (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
                        (header::SET_COOKIE, "session=abc; Domain=127.0.0.1; Path=/".to_string()),
                    ],
                    format!(
                        "<html><body><a href=\"{base}/next\">next</a><img src=\"{base}/logo.png\"></body></html>"
                    ),
                )
            }
        }))
        .route("/redirect", get({
            let base = base.clone();
            move || async move {
                (StatusCode::FOUND, [(header::LOCATION, format!("{base}/login"))])
            }
        }))
        .route("/image", get(|| async {
            ([(header::CONTENT_TYPE, "image/png")], image_bytes())
        }))
        .route("/plain", get({
            let base = base.clone();
            move || async move { ([(header::CONTENT_TYPE, "text/plain")], base) }
        }))
        .route("/gzip-json", get({
            let base = base.clone();
            move || async move {
                let body = json!({ "self": format!("{base}/api"), "host": "127.0.0.1" }).to_string();
                (
                    [
                        (header::CONTENT_TYPE, "application/json"),
                        (header::CONTENT_ENCODING, "gzip"),
                    ],
                    gzip(body.as_bytes()),
                )
            }
        }))
        .route("/slow", get(|| async {
            tokio::time::sleep(SLOW_RESPONSE).await;
            "finally"
        }))
        .route("/broken-gzip", get(|| async {
            (
                [
                    (header::CONTENT_TYPE, "text/html"),
                    (header::CONTENT_ENCODING, "gzip"),
                ],
                "this is not gzip at all",
            )
        }));

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

/// Report what the backend saw.
async fn echo(method: Method, uri: Uri, headers: HeaderMap) -> impl IntoResponse {
    let value_of = |name: header::HeaderName| {
        headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    };

    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "host": value_of(header::HOST),
        "referer": value_of(header::REFERER),
        "user_agent": value_of(header::USER_AGENT),
        "forwarded_for": value_of(header::HeaderName::from_static("x-forwarded-for")),
    }))
}

/// PNG-looking payload that happens to contain the backend host.
pub fn image_bytes() -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(b"http://127.0.0.1/");
    bytes.extend_from_slice(&[0, 255, 17, 42]);
    bytes
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Default proxy configuration in front of `backend_url`.
pub fn proxy_config(backend_url: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.backend.url = backend_url.to_string();
    config.listener.bind_address = "127.0.0.1:0".into();
    config
}

/// Start the proxy in front of `backend_url` on an ephemeral port.
pub async fn start_proxy(backend_url: &str) -> (SocketAddr, Shutdown) {
    start_proxy_with(proxy_config(backend_url)).await
}

/// Start the proxy with `config` on an ephemeral port.
pub async fn start_proxy_with(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    assert_eq!(server.target().scheme().as_str(), "http");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

/// Client that never follows redirects and never uses a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
