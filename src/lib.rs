//! Transparent reverse proxy that rewrites the backend's host identity.
//!
//! Requests addressed to the public host are forwarded to a single backend;
//! responses have the backend host replaced by the public host in
//! `Location`, `Set-Cookie` and textual bodies.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;

pub use config::{BackendTarget, ProxyConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use rewrite::{direct_request, rewrite_response, PublicHost, RewriteError};
