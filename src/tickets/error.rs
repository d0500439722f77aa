use thiserror::Error;

/// Failure reported by the external ticket source.
///
/// Carries the HTTP-style status when the source produced one; errors without
/// a status (timeouts, transport faults) are treated as permanent by the
/// retry policy unless the status says otherwise.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SourceError {
    pub status: Option<u16>,
    pub message: String,
}

impl SourceError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}
