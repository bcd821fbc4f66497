use crate::CollabResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sault_types::{ContentRef, DocumentId, Identity, LedgerRecord};

/// Content-addressed blob storage.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store bytes and return their content reference.
    async fn put(&self, bytes: Vec<u8>) -> CollabResult<ContentRef>;

    /// Fetch bytes by reference. Fails with `NotFound` or `Unavailable`.
    async fn get(&self, content_ref: &ContentRef) -> CollabResult<Vec<u8>>;
}

/// Append-only ledger holding the committed document state.
///
/// Writes are never retried by callers; a rejected write carries the
/// provider's reason in `CollabError::RejectedByLedger`.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Request creation of a document and return the ledger-issued id.
    async fn create_document(
        &self,
        creator: &Identity,
        content_ref: &ContentRef,
        signers: &[Identity],
    ) -> CollabResult<DocumentId>;

    /// Record `actor`'s signature on a document.
    async fn sign_document(
        &self,
        document_id: DocumentId,
        actor: &Identity,
        signed_at: DateTime<Utc>,
    ) -> CollabResult<()>;

    /// Every document `visible_to` can see, with the label the ledger holds for it.
    async fn list_documents(&self, visible_to: &Identity) -> CollabResult<Vec<LedgerRecord>>;
}

/// AI summarizer over raw document bytes.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize. May fail with `EmptyOutput` or `Unavailable`.
    async fn summarize(&self, bytes: &[u8], mime_type: &str) -> CollabResult<String>;
}

/// Classifier assigning a category label to document text.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> CollabResult<String>;
}

/// Question-answering collaborator fed with an aggregated prompt.
#[async_trait]
pub trait Answerer: Send + Sync {
    async fn answer(&self, prompt: &str) -> CollabResult<String>;
}
