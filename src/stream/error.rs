use thiserror::Error;

/// Request-level failures of the stream handshake.
///
/// These abort the whole request before any session exists, unlike per-topic
/// authorization denials which only shape the `ready` event.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The topic key names no known event category. A malformed request,
    /// not a per-topic rejection.
    #[error("invalid topic {topic:?}")]
    InvalidTopic { topic: String },
    /// The handshake used anything other than the stream-open verb.
    #[error("request method {method} is not allowed for the event stream endpoint")]
    MethodNotAllowed { method: String },
}

impl StreamError {
    /// HTTP-style status code for the response that carries this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidTopic { .. } => 400,
            Self::MethodNotAllowed { .. } => 405,
        }
    }
}

/// Failure reported by the permission engine while evaluating a check.
///
/// Carries the HTTP-style status of the underlying permission service so the
/// rejection surfaced on the `ready` event preserves it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AccessError {
    pub status: u16,
    pub message: String,
}

impl AccessError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}
