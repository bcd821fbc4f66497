//! In-memory reference implementations of the collaborator traits.
//!
//! These adapters are deterministic and test-friendly. The ledger enforces the
//! same signing rules a real ledger program would, so coordinator behaviour can
//! be exercised end to end without a network.

use crate::traits::{Classifier, ContentStore, Ledger, Summarizer};
use crate::{content_ref_for, CollabError, CollabResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sault_types::{Category, ContentRef, Document, DocumentId, Identity, LedgerRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::debug;

/// In-memory content-addressed blob store.
#[derive(Default)]
pub struct InMemoryContentStore {
    blobs: RwLock<HashMap<ContentRef, Vec<u8>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, bytes: Vec<u8>) -> CollabResult<ContentRef> {
        let content_ref = content_ref_for(&bytes);
        let mut guard = self
            .blobs
            .write()
            .map_err(|_| CollabError::Unavailable("content lock poisoned".to_string()))?;
        guard.entry(content_ref.clone()).or_insert(bytes);
        Ok(content_ref)
    }

    async fn get(&self, content_ref: &ContentRef) -> CollabResult<Vec<u8>> {
        let guard = self
            .blobs
            .read()
            .map_err(|_| CollabError::Unavailable("content lock poisoned".to_string()))?;
        guard
            .get(content_ref)
            .cloned()
            .ok_or_else(|| CollabError::NotFound(format!("content {} not found", content_ref)))
    }
}

/// Serializable ledger state, used to persist the in-memory ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub documents: Vec<LedgerRecord>,
}

/// In-memory ledger.
///
/// Ids are issued from 1 upward. Requests that break the signing rules are
/// rejected with `RejectedByLedger`, carrying the rule violation as reason.
#[derive(Default)]
pub struct InMemoryLedger {
    records: RwLock<BTreeMap<DocumentId, LedgerRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a ledger from a persisted snapshot. Malformed records are refused.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> CollabResult<Self> {
        let mut records = BTreeMap::new();
        for record in snapshot.documents {
            record
                .document
                .validate()
                .map_err(|e| CollabError::Invalid(e.to_string()))?;
            if records.insert(record.document.id, record).is_some() {
                return Err(CollabError::Invalid("duplicate document id".to_string()));
            }
        }
        Ok(Self {
            records: RwLock::new(records),
        })
    }

    pub fn snapshot(&self) -> CollabResult<LedgerSnapshot> {
        let guard = self.read()?;
        Ok(LedgerSnapshot {
            documents: guard.values().cloned().collect(),
        })
    }

    pub fn document(&self, id: DocumentId) -> CollabResult<Option<Document>> {
        let guard = self.read()?;
        Ok(guard.get(&id).map(|record| record.document.clone()))
    }

    /// Set the label the ledger holds for a document.
    pub fn set_category(&self, id: DocumentId, category: Category) -> CollabResult<()> {
        let mut guard = self.write()?;
        let record = guard
            .get_mut(&id)
            .ok_or_else(|| CollabError::NotFound(format!("document {} does not exist", id)))?;
        record.category = Some(category);
        Ok(())
    }

    fn read(
        &self,
    ) -> CollabResult<std::sync::RwLockReadGuard<'_, BTreeMap<DocumentId, LedgerRecord>>> {
        self.records
            .read()
            .map_err(|_| CollabError::Unavailable("ledger lock poisoned".to_string()))
    }

    fn write(
        &self,
    ) -> CollabResult<std::sync::RwLockWriteGuard<'_, BTreeMap<DocumentId, LedgerRecord>>> {
        self.records
            .write()
            .map_err(|_| CollabError::Unavailable("ledger lock poisoned".to_string()))
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn create_document(
        &self,
        creator: &Identity,
        content_ref: &ContentRef,
        signers: &[Identity],
    ) -> CollabResult<DocumentId> {
        let mut guard = self.write()?;

        let next = match guard.keys().next_back() {
            Some(last) => last.value().checked_add(1).ok_or_else(|| {
                CollabError::RejectedByLedger("document id space exhausted".to_string())
            })?,
            None => 1,
        };
        let id = DocumentId::new(next);
        let document = Document::create(id, creator.clone(), content_ref.clone(), signers.to_vec())
            .map_err(|e| CollabError::RejectedByLedger(e.to_string()))?;

        guard.insert(id, LedgerRecord::from(document));
        debug!(document_id = %id, creator = %creator, "Ledger created document");
        Ok(id)
    }

    async fn sign_document(
        &self,
        document_id: DocumentId,
        actor: &Identity,
        signed_at: DateTime<Utc>,
    ) -> CollabResult<()> {
        let mut guard = self.write()?;
        let record = guard.get_mut(&document_id).ok_or_else(|| {
            CollabError::RejectedByLedger(format!("document {} does not exist", document_id))
        })?;

        record
            .document
            .apply_signature(actor, signed_at)
            .map_err(|e| CollabError::RejectedByLedger(e.to_string()))?;
        debug!(document_id = %document_id, signer = %actor, "Ledger recorded signature");
        Ok(())
    }

    async fn list_documents(&self, visible_to: &Identity) -> CollabResult<Vec<LedgerRecord>> {
        let guard = self.read()?;
        Ok(guard
            .values()
            .filter(|record| {
                &record.document.creator == visible_to || record.document.is_signer(visible_to)
            })
            .cloned()
            .collect())
    }
}

/// Summarizer returning a plain-text excerpt of the document.
///
/// Stands in for an AI summarizer. Non-text or blank content yields `EmptyOutput`.
#[derive(Debug, Clone)]
pub struct ExcerptSummarizer {
    max_chars: usize,
}

impl ExcerptSummarizer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Default for ExcerptSummarizer {
    fn default() -> Self {
        Self::new(280)
    }
}

#[async_trait]
impl Summarizer for ExcerptSummarizer {
    async fn summarize(&self, bytes: &[u8], mime_type: &str) -> CollabResult<String> {
        if !mime_type.starts_with("text/") {
            return Err(CollabError::EmptyOutput);
        }
        let text = std::str::from_utf8(bytes).map_err(|_| CollabError::EmptyOutput)?;
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            return Err(CollabError::EmptyOutput);
        }
        Ok(collapsed.chars().take(self.max_chars).collect())
    }
}

/// Keyword-table classifier over the stock category set.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    table: Vec<(Category, Vec<String>)>,
}

impl KeywordClassifier {
    pub fn new(table: Vec<(Category, Vec<String>)>) -> Self {
        Self { table }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        let entry = |category: Category, words: &[&str]| {
            (category, words.iter().map(|w| w.to_string()).collect())
        };
        Self::new(vec![
            entry(
                Category::Legal,
                &["agreement", "contract", "party", "parties", "clause", "hereby", "nda"],
            ),
            entry(
                Category::Bills,
                &["invoice", "bill", "amount due", "receipt", "total", "payment"],
            ),
            entry(
                Category::Business,
                &["proposal", "quarterly", "revenue", "client", "vendor", "meeting"],
            ),
            entry(Category::Books, &["chapter", "isbn", "author", "edition"]),
            entry(
                Category::Personal,
                &["dear", "family", "birthday", "passport", "resume"],
            ),
        ])
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> CollabResult<String> {
        let haystack = text.to_lowercase();
        let best = self
            .table
            .iter()
            .map(|(category, words)| {
                let hits = words.iter().filter(|w| haystack.contains(w.as_str())).count();
                (category, hits)
            })
            .filter(|(_, hits)| *hits > 0)
            .fold(None::<(&Category, usize)>, |best, candidate| match best {
                Some((_, top)) if top >= candidate.1 => best,
                _ => Some(candidate),
            });

        Ok(best
            .map(|(category, _)| category.label().to_string())
            .unwrap_or_else(|| Category::Others.label().to_string()))
    }
}
