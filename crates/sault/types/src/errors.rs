//! Error types for the signing protocol

use crate::{DocumentId, Identity};

/// Broad class of a signing error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request; rejected before any network call and never retried.
    Validation,
    /// Request conflicts with committed state; a benign no-op for the caller.
    Conflict,
    /// The referenced document is not in the visible state.
    NotFound,
}

/// Errors raised by the signing state machine
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("Signer set is empty")]
    EmptySignerSet,

    #[error("Signer listed more than once: {0}")]
    DuplicateSigner(Identity),

    #[error("{actor} is not a required signer of document {document}")]
    NotASigner { document: DocumentId, actor: Identity },

    #[error("{actor} has already signed document {document}")]
    AlreadySigned { document: DocumentId, actor: Identity },

    #[error("Document {0} is already completed")]
    DocumentAlreadyCompleted(DocumentId),

    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("Malformed document record {document}: {reason}")]
    MalformedRecord { document: DocumentId, reason: String },
}

impl SigningError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SigningError::EmptySignerSet
            | SigningError::DuplicateSigner(_)
            | SigningError::NotASigner { .. }
            | SigningError::MalformedRecord { .. } => ErrorKind::Validation,
            SigningError::AlreadySigned { .. } | SigningError::DocumentAlreadyCompleted(_) => {
                ErrorKind::Conflict
            }
            SigningError::DocumentNotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Conflicts are reported as informational no-ops, not failures.
    pub fn is_benign(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

/// Result type alias for signing operations
pub type SigningResult<T> = Result<T, SigningError>;
