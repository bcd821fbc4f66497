//! Document Registry: the locally visible projection of ledger state.
//!
//! The projection is an immutable `RegistrySnapshot` behind an `Arc`. A
//! successful refresh builds a complete new snapshot and swaps it in with a
//! single assignment, so readers always see either the old or the new set,
//! never a mix. One refresh runs at a time. A caller waiting on the gate
//! reuses a result only when that refresh read the ledger after the caller
//! asked; otherwise it reads again, so a refresh requested after a ledger
//! write always observes that write.

use crate::config::RegistryConfig;
use crate::{SaultError, SaultResult};
use chrono::{DateTime, Utc};
use sault_collab::{retry_read, Ledger};
use sault_types::{Category, Document, DocumentId, Identity, LedgerRecord};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// One immutable projection of the visible documents.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    documents: BTreeMap<DocumentId, Document>,
    /// Labels the ledger holds, keyed by document
    categories: BTreeMap<DocumentId, Category>,
    generation: u64,
    synced_at: Option<DateTime<Utc>>,
}

impl RegistrySnapshot {
    pub fn new(documents: impl IntoIterator<Item = Document>, generation: u64) -> Self {
        Self {
            documents: documents.into_iter().map(|d| (d.id, d)).collect(),
            categories: BTreeMap::new(),
            generation,
            synced_at: Some(Utc::now()),
        }
    }

    /// Build a snapshot from ledger records, keeping their labels.
    pub fn from_records(records: impl IntoIterator<Item = LedgerRecord>, generation: u64) -> Self {
        let mut snapshot = Self::new(std::iter::empty(), generation);
        for record in records {
            if let Some(category) = record.category {
                snapshot.categories.insert(record.document.id, category);
            }
            snapshot.documents.insert(record.document.id, record.document);
        }
        snapshot
    }

    /// Incremented on every successful refresh; 0 means never synced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.synced_at
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id)
    }

    /// Label the ledger record carries for `id`, if any.
    pub fn category(&self, id: DocumentId) -> Option<&Category> {
        self.categories.get(&id)
    }

    /// All documents, by id ascending.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    fn select(&self, predicate: impl Fn(&Document) -> bool) -> Vec<Document> {
        self.documents
            .values()
            .filter(|doc| predicate(doc))
            .cloned()
            .collect()
    }

    pub fn created_by(&self, identity: &Identity) -> Vec<Document> {
        self.select(|doc| &doc.creator == identity)
    }

    /// Documents still waiting on `identity`'s signature.
    pub fn pending_for(&self, identity: &Identity) -> Vec<Document> {
        self.select(|doc| doc.is_pending_for(identity))
    }

    /// Documents `identity` must sign but did not create.
    pub fn shared_with(&self, identity: &Identity) -> Vec<Document> {
        self.select(|doc| doc.is_signer(identity) && &doc.creator != identity)
    }

    pub fn signed_by(&self, identity: &Identity) -> Vec<Document> {
        self.select(|doc| doc.has_signed(identity))
    }

    /// Documents created by or shared with `identity`.
    pub fn visible_to(&self, identity: &Identity) -> Vec<Document> {
        self.select(|doc| &doc.creator == identity || doc.is_signer(identity))
    }
}

/// How current the registry's view is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Freshness {
    pub generation: u64,
    pub synced_at: Option<DateTime<Utc>>,
    /// Error of the most recent refresh attempt, cleared by the next success
    pub last_error: Option<String>,
}

impl Freshness {
    /// Never synced, or the last refresh failed and data is last-known state.
    pub fn is_stale(&self) -> bool {
        self.synced_at.is_none() || self.last_error.is_some()
    }
}

/// Result of a refresh call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub generation: u64,
    pub document_count: usize,
    /// Ledger records dropped for violating document invariants
    pub dropped: usize,
    /// True when this call reused a refresh that started after it asked
    pub joined: bool,
}

#[derive(Debug, Default)]
struct RegistryState {
    snapshot: Arc<RegistrySnapshot>,
    /// Start epoch of the refresh that installed `snapshot`
    installed_epoch: u64,
    last_error: Option<String>,
}

/// Projection of the ledger documents visible to one identity.
pub struct DocumentRegistry {
    ledger: Arc<dyn Ledger>,
    viewer: Identity,
    config: RegistryConfig,
    state: RwLock<RegistryState>,
    refresh_gate: tokio::sync::Mutex<()>,
    /// Bumped by each refresh as it takes the gate, before reading the ledger
    started: AtomicU64,
    disposed: AtomicBool,
}

impl DocumentRegistry {
    /// Create an empty, never-synced registry. Call `init` to load it.
    pub fn new(ledger: Arc<dyn Ledger>, viewer: Identity, config: RegistryConfig) -> Self {
        Self {
            ledger,
            viewer,
            config,
            state: RwLock::new(RegistryState::default()),
            refresh_gate: tokio::sync::Mutex::new(()),
            started: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn viewer(&self) -> &Identity {
        &self.viewer
    }

    /// First load of the projection.
    pub async fn init(&self) -> SaultResult<RefreshOutcome> {
        info!(viewer = %self.viewer, "Initializing document registry");
        self.refresh().await
    }

    /// Drop the projection. Later refreshes fail with `Disposed`.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        let mut state = self.write_state();
        state.snapshot = Arc::new(RegistrySnapshot::default());
        state.last_error = None;
        info!(viewer = %self.viewer, "Document registry disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Current snapshot. Never blocks on I/O.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.read_state().snapshot)
    }

    pub fn freshness(&self) -> Freshness {
        let state = self.read_state();
        Freshness {
            generation: state.snapshot.generation(),
            synced_at: state.snapshot.synced_at(),
            last_error: state.last_error.clone(),
        }
    }

    pub fn is_stale(&self) -> bool {
        self.freshness().is_stale()
    }

    /// Reload the visible documents from the ledger.
    ///
    /// The installed snapshot reflects a ledger read that began after this
    /// call was made. On failure the previous snapshot stays in place and the
    /// error is recorded in `freshness()`.
    pub async fn refresh(&self) -> SaultResult<RefreshOutcome> {
        if self.is_disposed() {
            return Err(SaultError::Disposed);
        }

        let asked_at = self.started.load(Ordering::SeqCst);
        let _gate = self.refresh_gate.lock().await;

        if self.is_disposed() {
            return Err(SaultError::Disposed);
        }
        let (current, installed_epoch) = {
            let state = self.read_state();
            (Arc::clone(&state.snapshot), state.installed_epoch)
        };
        if installed_epoch > asked_at {
            debug!(
                viewer = %self.viewer,
                generation = current.generation(),
                epoch = installed_epoch,
                "Joined refresh that started while waiting"
            );
            return Ok(RefreshOutcome {
                generation: current.generation(),
                document_count: current.len(),
                dropped: 0,
                joined: true,
            });
        }

        let epoch = self.started.fetch_add(1, Ordering::SeqCst) + 1;

        let fetched = retry_read(&self.config.retry, "list_documents", || {
            self.ledger.list_documents(&self.viewer)
        })
        .await;

        let records = match fetched {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    viewer = %self.viewer,
                    generation = current.generation(),
                    error = %err,
                    "Registry refresh failed, keeping last known state"
                );
                self.write_state().last_error = Some(err.to_string());
                return Err(SaultError::collaborator("list_documents", err));
            }
        };

        if self.is_disposed() {
            return Err(SaultError::Disposed);
        }

        let mut accepted: BTreeMap<DocumentId, LedgerRecord> = BTreeMap::new();
        let mut dropped = 0;
        for record in records {
            let doc_id = record.document.id;
            if let Err(err) = record.document.validate() {
                warn!(document_id = %doc_id, error = %err, "Dropping malformed ledger record");
                dropped += 1;
                continue;
            }
            if accepted.contains_key(&doc_id) {
                warn!(document_id = %doc_id, "Dropping duplicate ledger record");
                dropped += 1;
                continue;
            }
            accepted.insert(doc_id, record);
        }

        let generation = current.generation() + 1;
        let snapshot = Arc::new(RegistrySnapshot::from_records(accepted.into_values(), generation));
        let document_count = snapshot.len();

        {
            let mut state = self.write_state();
            state.snapshot = snapshot;
            state.installed_epoch = epoch;
            state.last_error = None;
        }

        info!(
            viewer = %self.viewer,
            generation,
            documents = document_count,
            dropped,
            "Registry refreshed"
        );

        Ok(RefreshOutcome {
            generation,
            document_count,
            dropped,
            joined: false,
        })
    }

    // State is only ever replaced wholesale, so a poisoned lock still holds a
    // consistent value.
    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
