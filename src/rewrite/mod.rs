//! Host identity rewriting.
//!
//! # Data Flow
//! ```text
//! client request
//!     → request.rs (retarget URI + Host, scrub Referer)  → PublicHost
//!     → [harness forwards to backend]
//! backend response
//!     → response.rs (Location, Set-Cookie, textual body) ← PublicHost
//!         → body.rs (rewritten bytes as a response body)
//!     → client
//! ```
//!
//! `host.rs` and `headers.rs` are the shared helpers used on both sides.
//!
//! # Design Decisions
//! - Pure transformations: no shared mutable state, the only shared input is
//!   the immutable `BackendTarget`
//! - Each function owns (or exclusively borrows) the message it rewrites

pub mod body;
pub mod headers;
pub mod host;
pub mod request;
pub mod response;

pub use body::BufferBody;
pub use headers::rewrite_header;
pub use host::{replace_host, strip_port};
pub use request::{direct_request, PublicHost};
pub use response::{is_rewritable, rewrite_response, RewriteError, REWRITABLE_CONTENT_TYPES};
