//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → headers.rs (drop hop-by-hop headers)
//!     → rewrite::request (retarget at backend)
//!     → hyper-util client (http or rustls) → backend
//!     → headers.rs (drop hop-by-hop headers)
//!     → rewrite::response (Location, Set-Cookie, body)
//!     → compression layer → client
//! ```

pub mod headers;
pub mod server;

pub use headers::strip_hop_by_hop;
pub use server::{AppState, BackendClient, HttpServer, ServerError};
