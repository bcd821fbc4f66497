use thiserror::Error;

/// Result type for collaborator calls.
pub type CollabResult<T> = Result<T, CollabError>;

/// Failures reported by external collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollabError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("rejected by ledger: {0}")]
    RejectedByLedger(String),

    #[error("collaborator returned empty output")]
    EmptyOutput,

    #[error("invalid data: {0}")]
    Invalid(String),
}

impl CollabError {
    /// Only transport-level unavailability is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, CollabError::Unavailable(_))
    }
}

impl From<std::io::Error> for CollabError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => CollabError::NotFound(err.to_string()),
            _ => CollabError::Unavailable(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for CollabError {
    fn from(err: serde_json::Error) -> Self {
        CollabError::Invalid(err.to_string())
    }
}
