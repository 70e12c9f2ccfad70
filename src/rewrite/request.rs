//! Request direction: retarget a client request at the backend.
//!
//! # Responsibilities
//! - Point the request URI at the backend scheme and authority
//! - Send the backend authority as the wire `Host`
//! - Keep the transport from announcing its own user agent
//! - Rewrite the client host inside `Referer`
//!
//! # Design Decisions
//! - Path and query are preserved exactly
//! - Hosts are compared without ports, since the public and backend ports
//!   rarely match
//! - Total: no step can fail the request

use axum::http::header::{HeaderValue, HOST, REFERER, USER_AGENT};
use axum::http::uri::{PathAndQuery, Uri};
use axum::http::Request;

use crate::config::BackendTarget;
use crate::rewrite::headers::rewrite_header;
use crate::rewrite::host::{replace_host, strip_port};

/// The host the client addressed, as it appeared in the request.
///
/// Captured before the request is retargeted and handed to the response
/// side so the backend host can be mapped back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicHost(String);

impl PublicHost {
    pub fn new(host: impl Into<String>) -> Self {
        Self(host.into())
    }

    /// Read the addressed host from the `Host` header, falling back to the
    /// URI authority (HTTP/2 `:authority`).
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let from_header = request
            .headers()
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .filter(|h| !h.is_empty());

        let host = from_header
            .or_else(|| request.uri().authority().map(|a| a.as_str()))
            .unwrap_or_default();

        Self(host.to_string())
    }

    /// Host and port as addressed.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host without port.
    pub fn host(&self) -> &str {
        strip_port(&self.0)
    }
}

/// Retarget `request` at `target` in place.
///
/// Returns the host the client originally addressed.
pub fn direct_request<B>(request: &mut Request<B>, target: &BackendTarget) -> PublicHost {
    let public = PublicHost::from_request(request);

    // 1. URI scheme and authority
    let path_and_query = request
        .uri()
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));
    let mut parts = request.uri().clone().into_parts();
    parts.scheme = Some(target.scheme().clone());
    parts.authority = Some(target.authority().clone());
    parts.path_and_query = Some(path_and_query);
    match Uri::from_parts(parts) {
        Ok(uri) => *request.uri_mut() = uri,
        Err(e) => tracing::warn!(error = %e, "Could not rebuild request URI"),
    }

    // 2. Wire host
    let headers = request.headers_mut();
    match HeaderValue::from_str(target.authority().as_str()) {
        Ok(host) => {
            headers.insert(HOST, host);
        }
        Err(e) => tracing::warn!(error = %e, "Backend authority is not a valid Host value"),
    }

    // 3. Empty user agent instead of a transport default
    if !headers.contains_key(USER_AGENT) {
        headers.insert(USER_AGENT, HeaderValue::from_static(""));
    }

    // 4. Referer
    let client_host = public.host().to_string();
    let backend_host = target.host().to_string();
    rewrite_header(headers, REFERER, |value| {
        replace_host(value, &client_host, &backend_host)
    });

    public
}
