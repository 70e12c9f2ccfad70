//! The backend every request is forwarded to.
//!
//! # Design Decisions
//! - Parsed once at startup; a parse failure is fatal
//! - Immutable afterwards and shared read-only via `Arc`
//! - `http` and `https` backends; any other scheme is rejected
//! - The authority is kept as configured, including a port equal to the
//!   scheme default

use axum::http::uri::{Authority, Scheme, Uri};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::rewrite::host::strip_port;

/// Error produced when a backend URL cannot be used as a target.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("invalid backend URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported backend scheme {0:?} (expected \"http\" or \"https\")")]
    UnsupportedScheme(String),

    #[error("backend URL {0:?} has no host")]
    MissingHost(String),
}

/// Parsed backend URL: scheme, `host[:port]` authority and bare host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    scheme: Scheme,
    authority: Authority,
    host: String,
}

impl BackendTarget {
    /// Parse a backend URL such as `http://svc-internal:8080`.
    ///
    /// Any path, query or credentials in the URL are ignored; requests keep
    /// their own path and query.
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        let url = Url::parse(raw).map_err(|e| TargetError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => return Err(TargetError::UnsupportedScheme(other.to_string())),
        };

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h,
            _ => return Err(TargetError::MissingHost(raw.to_string())),
        };

        // `Url` drops a port equal to the scheme default.
        let authority_str = match url.port().or_else(|| explicit_port(raw)) {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority_str).map_err(|e| TargetError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            scheme,
            host: strip_port(authority.as_str()).to_string(),
            authority,
        })
    }

    /// Scheme used to reach the backend.
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// `host[:port]` as sent in the wire `Host` header.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Host without port, used for substitution.
    pub fn host(&self) -> &str {
        &self.host
    }
}

fn explicit_port(raw: &str) -> Option<u16> {
    raw.parse::<Uri>().ok()?.authority()?.port_u16()
}

impl FromStr for BackendTarget {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}
