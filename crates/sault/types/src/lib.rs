//! Sault domain types
//!
//! Core records for multi-party document signing:
//! - **Identity / DocumentId / ContentRef**: opaque principals and identifiers
//! - **Document**: creator, required signers and the signatures collected so far
//! - **SigningState**: completion derived from signers and signatures, never stored
//! - **Insights**: summary and category side tables keyed by document id
//! - **LedgerRecord**: a document with the category label the ledger holds
//!
//! The signing rules live here as pure functions so that the ledger adapters
//! and the coordinator enforce exactly the same transitions.

#![deny(unsafe_code)]

pub mod category;
pub mod document;
pub mod errors;
pub mod identity;
pub mod insight;
pub mod record;

pub use category::Category;
pub use document::{validate_signer_set, Document, Signature, SigningProgress, SigningState};
pub use errors::{ErrorKind, SigningError, SigningResult};
pub use identity::{ContentRef, DocumentId, Identity};
pub use insight::DocumentInsights;
pub use record::LedgerRecord;
