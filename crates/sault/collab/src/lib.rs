//! Sault collaborator contracts.
//!
//! The signing engine consumes four external services through narrow traits:
//! - `ContentStore`: content-addressed blob storage
//! - `Ledger`: append-only, externally ordered record of creations and signatures
//! - `Summarizer` / `Classifier`: AI analysis of document bytes
//! - `Answerer`: question answering over an aggregated context
//!
//! Reference adapters are provided for tests and local use. Production
//! deployments plug real network clients in behind the same traits.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod directory;
mod error;
pub mod memory;
mod retry;
mod traits;

pub use error::{CollabError, CollabResult};
pub use retry::{retry_read, RetryPolicy};
pub use traits::{Answerer, Classifier, ContentStore, Ledger, Summarizer};

/// Content reference for `bytes`: hex blake3 digest.
pub fn content_ref_for(bytes: &[u8]) -> sault_types::ContentRef {
    sault_types::ContentRef::new(blake3::hash(bytes).to_hex().to_string())
}
