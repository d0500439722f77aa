//! Ticket poll bridge: imports external ticket events into the channel fabric.

pub mod bridge;
pub mod error;
pub mod retry;

pub use bridge::{TicketBridge, TicketEvent, TicketEventKind, TicketSource};
pub use error::SourceError;
pub use retry::{is_transient, retry_transient, RetryPolicy, TRANSIENT_STATUS_CODES};
