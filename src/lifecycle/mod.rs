//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Parse backend → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal or trigger received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: a bad backend URL is fatal before anything binds
//! - Shutdown is shared through a broadcast channel so tests can trigger it

pub mod shutdown;
pub mod signals;

pub use shutdown::{shutdown_signal, Shutdown};
