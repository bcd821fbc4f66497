//! Runtime error types

use sault_collab::CollabError;
use sault_types::{ErrorKind, SigningError};

/// Error class, following the signing protocol's taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rejected locally, never retried
    Validation,
    /// Benign no-op against committed state
    Conflict,
    /// Referenced document is not visible
    NotFound,
    /// An external collaborator failed
    Collaborator,
    /// Component used outside its lifecycle, or misconfigured
    Usage,
}

/// Errors surfaced by the runtime components
#[derive(Debug, thiserror::Error)]
pub enum SaultError {
    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error("{operation} failed: {source}")]
    Collaborator {
        operation: &'static str,
        #[source]
        source: CollabError,
    },

    #[error("Registry has been disposed")]
    Disposed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Question is empty")]
    EmptyQuestion,
}

impl SaultError {
    pub fn collaborator(operation: &'static str, source: CollabError) -> Self {
        SaultError::Collaborator { operation, source }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            SaultError::Signing(err) => match err.kind() {
                ErrorKind::Validation => ErrorClass::Validation,
                ErrorKind::Conflict => ErrorClass::Conflict,
                ErrorKind::NotFound => ErrorClass::NotFound,
            },
            SaultError::Collaborator { .. } => ErrorClass::Collaborator,
            SaultError::Disposed | SaultError::Config(_) | SaultError::EmptyQuestion => {
                ErrorClass::Usage
            }
        }
    }

    /// Conflicts (`AlreadySigned`, `DocumentAlreadyCompleted`) are informational.
    pub fn is_benign(&self) -> bool {
        self.class() == ErrorClass::Conflict
    }

    pub fn signing(&self) -> Option<&SigningError> {
        match self {
            SaultError::Signing(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for runtime operations
pub type SaultResult<T> = Result<T, SaultError>;
