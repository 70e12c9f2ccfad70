//! Response rewriting: map the backend host back to the public host.
//!
//! # Responsibilities
//! - Rewrite redirect targets (`Location`)
//! - Rewrite cookie scoping (`Set-Cookie`)
//! - Rewrite textual bodies (HTML, CSS, JavaScript, JSON)
//!
//! # Design Decisions
//! - Eligible bodies are read fully into memory before substitution, so
//!   memory use grows with response size; a match can straddle any chunk
//!   boundary and buffering avoids an overlap window
//! - Substitution is plain substring replacement and also hits the backend
//!   host where it appears in unrelated text
//! - Framing headers are dropped after a body rewrite; the compression
//!   layer re-encodes downstream
//! - Read and decode failures are returned, never papered over

use axum::body::Body;
use axum::http::header::{
    HeaderMap, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, LOCATION, SET_COOKIE,
};
use axum::http::Response;
use bytes::Bytes;
use flate2::read::MultiGzDecoder;
use std::io::Read;
use thiserror::Error;

use crate::config::BackendTarget;
use crate::observability::metrics;
use crate::rewrite::body::BufferBody;
use crate::rewrite::headers::rewrite_header;
use crate::rewrite::host::replace_host;
use crate::rewrite::request::PublicHost;

/// Content-Type prefixes whose bodies are rewritten.
pub const REWRITABLE_CONTENT_TYPES: [&str; 4] = [
    "text/html",
    "text/css",
    "application/javascript",
    "application/json",
];

/// Failure while rewriting a response body.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("failed to read backend response body: {0}")]
    BodyRead(#[source] axum::Error),

    #[error("failed to decompress gzip response body: {0}")]
    Decompress(#[source] std::io::Error),
}

impl RewriteError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RewriteError::BodyRead(_) => "body_read",
            RewriteError::Decompress(_) => "decompress",
        }
    }
}

/// Content-Encoding of a response, as far as rewriting cares.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Coding {
    Identity,
    Gzip,
    Other(String),
}

impl Coding {
    fn from_headers(headers: &HeaderMap) -> Self {
        let Some(value) = headers.get(CONTENT_ENCODING) else {
            return Coding::Identity;
        };
        let value = String::from_utf8_lossy(value.as_bytes()).trim().to_string();
        if value.is_empty() || value.eq_ignore_ascii_case("identity") {
            Coding::Identity
        } else if value.eq_ignore_ascii_case("gzip") {
            Coding::Gzip
        } else {
            Coding::Other(value)
        }
    }
}

/// Whether a Content-Type value selects body rewriting.
pub fn is_rewritable(content_type: &str) -> bool {
    REWRITABLE_CONTENT_TYPES
        .iter()
        .any(|prefix| content_type.starts_with(prefix))
}

/// Rewrite a backend response for the client that addressed `public`.
pub async fn rewrite_response(
    response: Response<Body>,
    public: &PublicHost,
    target: &BackendTarget,
) -> Result<Response<Body>, RewriteError> {
    let backend_host = target.host();
    let public_host = public.host();
    let (mut parts, body) = response.into_parts();

    rewrite_header(&mut parts.headers, LOCATION, |value| {
        replace_host(value, backend_host, public_host)
    });
    rewrite_header(&mut parts.headers, SET_COOKIE, |value| {
        replace_host(value, backend_host, public_host)
    });

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !is_rewritable(content_type) {
        return Ok(Response::from_parts(parts, body));
    }
    let content_type = content_type.to_string();

    let coding = Coding::from_headers(&parts.headers);
    if let Coding::Other(name) = &coding {
        tracing::debug!(
            content_type = %content_type,
            content_encoding = %name,
            "Unsupported content encoding, passing body through"
        );
        return Ok(Response::from_parts(parts, body));
    }

    // The original body is consumed here and dropped on every path below.
    let raw = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(RewriteError::BodyRead)?;

    let decoded = match coding {
        Coding::Gzip if !raw.is_empty() => Bytes::from(decode_gzip(&raw)?),
        _ => raw,
    };

    let rewritten = replace_host(&decoded, backend_host, public_host);

    tracing::debug!(
        content_type = %content_type,
        gzip = coding == Coding::Gzip,
        original_len = decoded.len(),
        rewritten_len = rewritten.len(),
        "Rewrote response body"
    );
    metrics::record_body_rewrite(&content_type);

    parts.headers.remove(CONTENT_LENGTH);
    parts.headers.remove(CONTENT_ENCODING);

    Ok(Response::from_parts(parts, Body::new(BufferBody::new(rewritten))))
}

/// Decode a (possibly multi-member) gzip stream.
fn decode_gzip(input: &[u8]) -> Result<Vec<u8>, RewriteError> {
    let mut decoder = MultiGzDecoder::new(input);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(RewriteError::Decompress)?;
    Ok(out)
}
