//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (tracing, timeout, compression)
//! - Bind server to listener
//! - Forward requests to the backend and rewrite what comes back
//! - Translate backend and rewrite failures into 502 responses, and slow
//!   backends into 504

use axum::{
    body::Body,
    extract::State,
    http::{uri::Scheme, Request, StatusCode, Version},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper::body::Incoming;
use hyper_rustls::{ConfigBuilderExt, HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};
use rustls::{crypto::ring, ClientConfig, RootCertStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{BackendTarget, ProxyConfig, TargetError};
use crate::http::headers::strip_hop_by_hop;
use crate::lifecycle::shutdown_signal;
use crate::observability::metrics;
use crate::rewrite::{direct_request, rewrite_response};

/// Error building the proxy server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("failed to set up TLS for backend connections: {0}")]
    Tls(#[from] rustls::Error),

    #[error("failed to load root certificates for an https backend: {0}")]
    RootCertificates(#[source] std::io::Error),
}

/// Client used to reach the backend over `http` or `https`.
pub type BackendClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub target: Arc<BackendTarget>,
    pub client: BackendClient,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    target: Arc<BackendTarget>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails if the backend URL is not a usable target or the platform
    /// root certificates cannot be loaded.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let target = Arc::new(BackendTarget::parse(config.backend.url.trim())?);
        let client = build_client(&config, &target)?;

        let state = AppState {
            target: target.clone(),
            client,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            target,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state);

        let router = if config.compression.enabled {
            router.layer(CompressionLayer::new())
        } else {
            router
        };

        router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::GATEWAY_TIMEOUT,
                    Duration::from_secs(config.timeouts.request_secs),
                )),
        )
    }

    /// Run the server until an OS stop signal or a trigger on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.target,
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The backend requests are forwarded to.
    pub fn target(&self) -> &BackendTarget {
        &self.target
    }
}

/// Build the pooled backend client.
///
/// Certificates of an `https` backend are verified against the platform
/// roots. Roots are only loaded for `https` targets, so a plain-http backend
/// works on hosts without a CA bundle.
fn build_client(config: &ProxyConfig, target: &BackendTarget) -> Result<BackendClient, ServerError> {
    let mut http = HttpConnector::new();
    http.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
    http.enforce_http(false);

    let tls = ClientConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()?;
    let tls = if *target.scheme() == Scheme::HTTPS {
        tls.with_native_roots().map_err(ServerError::RootCertificates)?
    } else {
        tls.with_root_certificates(RootCertStore::empty())
    };

    let connector = HttpsConnectorBuilder::new()
        .with_tls_config(tls.with_no_client_auth())
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Ok(Client::builder(TokioExecutor::new())
        .pool_timer(TokioTimer::new())
        .pool_idle_timeout(Duration::from_secs(config.timeouts.idle_secs))
        .build(connector))
}

/// Main proxy handler.
/// Retargets the request, forwards it, and rewrites the response.
async fn proxy_handler(State(state): State<AppState>, mut request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // 1. Retarget at the backend
    strip_hop_by_hop(request.headers_mut());
    let public = direct_request(&mut request, &state.target);
    *request.version_mut() = Version::HTTP_11;

    tracing::debug!(
        method = %method,
        path = %path,
        public_host = %public.as_str(),
        backend = %state.target,
        "Proxying request"
    );

    // 2. Forward
    let response: Response<Incoming> = match state.client.request(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(method = %method, path = %path, error = %e, "Upstream error");
            metrics::record_request(method.as_str(), 502, start_time);
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    // 3. Rewrite for the client
    let mut response = response.map(Body::new);
    strip_hop_by_hop(response.headers_mut());

    match rewrite_response(response, &public, &state.target).await {
        Ok(response) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
            response
        }
        Err(e) => {
            tracing::warn!(method = %method, path = %path, error = %e, "Failed to rewrite backend response");
            metrics::record_rewrite_failure(e.kind());
            metrics::record_request(method.as_str(), 502, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream response could not be rewritten").into_response()
        }
    }
}
