//! CLI error types

use sault_collab::CollabError;
use sault_runtime::SaultError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Runtime(#[from] SaultError),

    #[error(transparent)]
    Collaborator(#[from] CollabError),

    #[error("Invalid state file {path}: {reason}")]
    State { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid identity: {0:?}")]
    InvalidIdentity(String),

    #[error("{0}")]
    Usage(String),
}

pub type CliResult<T> = Result<T, CliError>;
