#![deny(clippy::all)]
// Module naming: common pattern in domain-driven code
#![allow(clippy::module_name_repetitions)]
// API ergonomics: prefer simplicity over must_use annotations
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
// Format strings: allow non-inlined for readability
#![allow(clippy::uninlined_format_args)]

//! Beacon - real-time event distribution for the cluster dashboard.
//!
//! Clients open a long-lived server-pushed event stream and declare, via
//! topic strings, which categories of domain events they want to receive.
//! Beacon authorizes each requested topic, maintains the streaming session
//! (heartbeat, credential expiry, graceful shutdown), and fans domain events
//! out to exactly the sessions whose authorized scope matches.
//!
//! # Module Organization
//!
//! ## Core
//! - `core::config` - Configuration parsing and validation
//! - `core::time` - Deterministic time utilities
//!
//! ## Stream
//! - `stream::topic` - Topic string parsing and scope metadata
//! - `stream::authorize` - Per-topic authorization against the permission engine
//! - `stream::session` - Streaming session lifecycle (heartbeat, expiry, teardown)
//! - `stream::channels` - Named broadcast channels with per-call filters
//! - `stream::handler` - Handshake handling and subscription derivation
//!
//! ## Tickets
//! - `tickets::bridge` - Poll-to-publish bridge for the external ticket source
//! - `tickets::retry` - Transient-error retry policy with capped backoff
//!
//! ## Operations
//! - `ops::telemetry` - Structured logging setup
//!
//! ## CLI
//! - `cli` - Command-line surface for the beacon binary

// Core infrastructure
pub mod core;

// Event stream
pub mod stream;

// Ticket poll bridge
pub mod tickets;

// Operations
pub mod ops;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, time};
pub use ops::telemetry;
pub use stream::{authorize, channels, handler, session, topic};
pub use tickets::{bridge, retry};
