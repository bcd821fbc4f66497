//! Signing Coordinator: create/sign commands and the read views over the
//! registry snapshot.
//!
//! Commands validate locally against the document rules before touching the
//! ledger. Ledger writes are never retried here; a retried `sign` that already
//! committed comes back as `AlreadySigned`.

use crate::config::LinkConfig;
use crate::registry::DocumentRegistry;
use crate::{SaultError, SaultResult};
use chrono::{DateTime, Utc};
use sault_collab::Ledger;
use sault_types::{
    validate_signer_set, ContentRef, Document, DocumentId, Identity, SigningError, SigningState,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Completed vs pending counts over the documents shared with an identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedStats {
    pub completed: usize,
    pub pending: usize,
}

impl SharedStats {
    pub fn total(&self) -> usize {
        self.completed + self.pending
    }
}

/// Coordinates document creation and signature collection against the ledger.
pub struct SigningCoordinator {
    ledger: Arc<dyn Ledger>,
    registry: Arc<DocumentRegistry>,
    links: LinkConfig,
}

impl SigningCoordinator {
    pub fn new(ledger: Arc<dyn Ledger>, registry: Arc<DocumentRegistry>, links: LinkConfig) -> Self {
        Self {
            ledger,
            registry,
            links,
        }
    }

    pub fn registry(&self) -> &Arc<DocumentRegistry> {
        &self.registry
    }

    /// Create a document requiring `signers`.
    ///
    /// The signer set is checked before the ledger is contacted. Once the
    /// ledger confirms, the registry is refreshed; a failed refresh is logged
    /// and does not fail the creation.
    pub async fn create(
        &self,
        creator: &Identity,
        content_ref: &ContentRef,
        signers: Vec<Identity>,
    ) -> SaultResult<DocumentId> {
        if let Err(err) = validate_signer_set(&signers) {
            warn!(creator = %creator, error = %err, "Document creation rejected");
            return Err(err.into());
        }

        let id = self
            .ledger
            .create_document(creator, content_ref, &signers)
            .await
            .map_err(|e| SaultError::collaborator("create_document", e))?;

        info!(
            document_id = %id,
            creator = %creator,
            signers = signers.len(),
            content_ref = %content_ref,
            "Document created"
        );

        if let Err(err) = self.registry.refresh().await {
            warn!(document_id = %id, error = %err, "Registry refresh after create failed");
        }

        Ok(id)
    }

    /// Record `actor`'s signature on `document_id` at `signed_at`.
    ///
    /// Returns the committed document. If the registry cannot be refreshed
    /// after the ledger accepts, or the refreshed copy does not yet carry the
    /// signature, the locally applied copy is returned instead.
    pub async fn sign(
        &self,
        document_id: DocumentId,
        actor: &Identity,
        signed_at: DateTime<Utc>,
    ) -> SaultResult<Document> {
        let snapshot = self.registry.snapshot();
        let mut document = snapshot
            .get(document_id)
            .cloned()
            .ok_or(SigningError::DocumentNotFound(document_id))?;

        if let Err(err) = document.check_sign(actor) {
            if err.is_benign() {
                info!(document_id = %document_id, signer = %actor, reason = %err, "Sign was a no-op");
            } else {
                warn!(document_id = %document_id, signer = %actor, error = %err, "Sign rejected");
            }
            return Err(err.into());
        }

        if let Err(err) = self
            .ledger
            .sign_document(document_id, actor, signed_at)
            .await
        {
            warn!(document_id = %document_id, signer = %actor, error = %err, "Ledger rejected signature");
            if let Some(conflict) = self.conflict_after_rejection(document_id, actor).await {
                info!(
                    document_id = %document_id,
                    signer = %actor,
                    reason = %conflict,
                    "Ledger rejection explained by committed state"
                );
                return Err(conflict.into());
            }
            return Err(SaultError::collaborator("sign_document", err));
        }

        let state = document.apply_signature(actor, signed_at)?;
        let progress = document.progress();
        match state {
            SigningState::Completed => info!(
                document_id = %document_id,
                signer = %actor,
                progress = %progress,
                "Document completed"
            ),
            SigningState::PartiallySigned => debug!(
                document_id = %document_id,
                signer = %actor,
                progress = %progress,
                "Signature recorded"
            ),
        }

        match self.registry.refresh().await {
            Ok(_) => match self.registry.snapshot().get(document_id) {
                Some(committed) if committed.has_signed(actor) => return Ok(committed.clone()),
                Some(_) => {
                    warn!(document_id = %document_id, signer = %actor, "Refreshed copy lags the signature")
                }
                None => warn!(document_id = %document_id, "Signed document missing after refresh"),
            },
            Err(err) => {
                warn!(document_id = %document_id, error = %err, "Registry refresh after sign failed");
            }
        }
        Ok(document)
    }

    async fn conflict_after_rejection(
        &self,
        document_id: DocumentId,
        actor: &Identity,
    ) -> Option<SigningError> {
        if let Err(err) = self.registry.refresh().await {
            debug!(document_id = %document_id, error = %err, "Could not refresh to classify rejection");
            return None;
        }
        let snapshot = self.registry.snapshot();
        let fresh = snapshot.get(document_id)?;
        match fresh.check_sign(actor) {
            Err(conflict) if conflict.is_benign() => Some(conflict),
            _ => None,
        }
    }

    /// One document from the current snapshot.
    pub fn document(&self, document_id: DocumentId) -> SaultResult<Document> {
        self.registry
            .snapshot()
            .get(document_id)
            .cloned()
            .ok_or_else(|| SigningError::DocumentNotFound(document_id).into())
    }

    pub fn documents_created_by(&self, identity: &Identity) -> Vec<Document> {
        self.registry.snapshot().created_by(identity)
    }

    pub fn documents_pending_for(&self, identity: &Identity) -> Vec<Document> {
        self.registry.snapshot().pending_for(identity)
    }

    pub fn documents_shared_with(&self, identity: &Identity) -> Vec<Document> {
        self.registry.snapshot().shared_with(identity)
    }

    pub fn documents_signed_by(&self, identity: &Identity) -> Vec<Document> {
        self.registry.snapshot().signed_by(identity)
    }

    pub fn shared_stats(&self, identity: &Identity) -> SharedStats {
        self.documents_shared_with(identity)
            .iter()
            .fold(SharedStats::default(), |mut stats, doc| {
                if doc.is_completed() {
                    stats.completed += 1;
                } else {
                    stats.pending += 1;
                }
                stats
            })
    }

    /// Shareable link where signers open the document.
    pub fn signing_link(&self, document_id: DocumentId) -> String {
        format!(
            "{}/sign/{}",
            self.links.app_origin.trim_end_matches('/'),
            document_id
        )
    }

    /// Gateway URL serving the document's content.
    pub fn content_url(&self, document: &Document) -> String {
        document.content_ref.gateway_url(&self.links.gateway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::ErrorClass;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use sault_collab::memory::InMemoryLedger;
    use sault_collab::{CollabError, CollabResult, RetryPolicy};
    use sault_types::LedgerRecord;
    use std::time::Duration;

    fn id(s: &str) -> Identity {
        Identity::new(s)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn setup(viewer: &str) -> (Arc<InMemoryLedger>, SigningCoordinator) {
        let ledger = Arc::new(InMemoryLedger::new());
        let coordinator = coordinator_over(ledger.clone(), viewer);
        (ledger, coordinator)
    }

    fn coordinator_over(ledger: Arc<dyn Ledger>, viewer: &str) -> SigningCoordinator {
        let config = RegistryConfig {
            retry: RetryPolicy::no_retry(),
        };
        let registry = Arc::new(DocumentRegistry::new(ledger.clone(), id(viewer), config));
        SigningCoordinator::new(ledger, registry, LinkConfig::default())
    }

    async fn create(coordinator: &SigningCoordinator, creator: &str, signers: &[&str]) -> DocumentId {
        coordinator
            .create(
                &id(creator),
                &ContentRef::new("bafy"),
                signers.iter().map(|s| id(s)).collect(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_sign_to_completion() {
        let (_, coordinator) = setup("A");
        let doc_id = create(&coordinator, "A", &["A", "B"]).await;

        let doc = coordinator.document(doc_id).unwrap();
        assert_eq!(doc.state(), SigningState::PartiallySigned);
        assert_eq!(doc.progress().to_string(), "0/2");

        let doc = coordinator.sign(doc_id, &id("A"), at(1)).await.unwrap();
        assert!(!doc.is_completed());
        let doc = coordinator.sign(doc_id, &id("B"), at(2)).await.unwrap();
        assert!(doc.is_completed());

        assert!(coordinator.documents_pending_for(&id("A")).is_empty());
        assert!(coordinator.documents_pending_for(&id("B")).is_empty());
    }

    #[tokio::test]
    async fn test_create_with_empty_signers_leaves_everything_unchanged() {
        let (ledger, coordinator) = setup("A");
        let err = coordinator
            .create(&id("A"), &ContentRef::new("bafy"), vec![])
            .await
            .unwrap_err();

        assert_eq!(err.signing(), Some(&SigningError::EmptySignerSet));
        assert_eq!(err.class(), ErrorClass::Validation);
        assert!(ledger.snapshot().unwrap().documents.is_empty());
        assert_eq!(coordinator.registry().snapshot().generation(), 0);
    }

    #[tokio::test]
    async fn test_create_with_duplicate_signers_is_rejected() {
        let (ledger, coordinator) = setup("A");
        let err = coordinator
            .create(&id("A"), &ContentRef::new("bafy"), vec![id("B"), id("B")])
            .await
            .unwrap_err();

        assert_eq!(err.signing(), Some(&SigningError::DuplicateSigner(id("B"))));
        assert!(ledger.snapshot().unwrap().documents.is_empty());
    }

    #[tokio::test]
    async fn test_non_signer_cannot_sign() {
        let (ledger, coordinator) = setup("A");
        let doc_id = create(&coordinator, "A", &["A", "B"]).await;

        let err = coordinator.sign(doc_id, &id("C"), at(1)).await.unwrap_err();
        assert!(matches!(err.signing(), Some(SigningError::NotASigner { .. })));
        assert!(ledger.document(doc_id).unwrap().unwrap().signatures.is_empty());
    }

    #[tokio::test]
    async fn test_resign_is_benign_and_keeps_first_timestamp() {
        let (_, coordinator) = setup("A");
        let doc_id = create(&coordinator, "A", &["A", "B"]).await;
        coordinator.sign(doc_id, &id("A"), at(1)).await.unwrap();

        let err = coordinator.sign(doc_id, &id("A"), at(99)).await.unwrap_err();
        assert!(err.is_benign());
        assert!(matches!(err.signing(), Some(SigningError::AlreadySigned { .. })));

        let doc = coordinator.document(doc_id).unwrap();
        assert_eq!(doc.signatures.len(), 1);
        assert_eq!(doc.signature_of(&id("A")).unwrap().signed_at, at(1));
    }

    #[tokio::test]
    async fn test_completed_document_rejects_everyone() {
        let (_, coordinator) = setup("A");
        let doc_id = create(&coordinator, "A", &["A"]).await;
        coordinator.sign(doc_id, &id("A"), at(1)).await.unwrap();

        for actor in ["A", "Z"] {
            let err = coordinator.sign(doc_id, &id(actor), at(2)).await.unwrap_err();
            assert_eq!(
                err.signing(),
                Some(&SigningError::DocumentAlreadyCompleted(doc_id))
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_document() {
        let (_, coordinator) = setup("A");
        let err = coordinator
            .sign(DocumentId::new(42), &id("A"), at(1))
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::NotFound);
        assert!(coordinator.document(DocumentId::new(42)).is_err());
    }

    #[tokio::test]
    async fn test_ledger_rejection_of_committed_retry_is_already_signed() {
        let (ledger, coordinator) = setup("A");
        let doc_id = create(&coordinator, "A", &["A", "B"]).await;

        // An earlier attempt committed but the registry never saw it.
        ledger.sign_document(doc_id, &id("A"), at(1)).await.unwrap();
        assert!(!coordinator.document(doc_id).unwrap().has_signed(&id("A")));

        let err = coordinator.sign(doc_id, &id("A"), at(5)).await.unwrap_err();
        assert!(matches!(err.signing(), Some(SigningError::AlreadySigned { .. })));
        assert!(coordinator.document(doc_id).unwrap().has_signed(&id("A")));
    }

    struct RejectingLedger {
        inner: InMemoryLedger,
    }

    #[async_trait]
    impl Ledger for RejectingLedger {
        async fn create_document(
            &self,
            creator: &Identity,
            content_ref: &ContentRef,
            signers: &[Identity],
        ) -> CollabResult<DocumentId> {
            self.inner.create_document(creator, content_ref, signers).await
        }

        async fn sign_document(
            &self,
            _document_id: DocumentId,
            _actor: &Identity,
            _signed_at: DateTime<Utc>,
        ) -> CollabResult<()> {
            Err(CollabError::RejectedByLedger("insufficient gas".into()))
        }

        async fn list_documents(&self, visible_to: &Identity) -> CollabResult<Vec<LedgerRecord>> {
            self.inner.list_documents(visible_to).await
        }
    }

    #[tokio::test]
    async fn test_unexplained_ledger_rejection_is_surfaced() {
        let ledger = Arc::new(RejectingLedger {
            inner: InMemoryLedger::new(),
        });
        let coordinator = coordinator_over(ledger, "A");
        let doc_id = create(&coordinator, "A", &["A"]).await;

        let err = coordinator.sign(doc_id, &id("A"), at(1)).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Collaborator);
        assert!(matches!(
            err,
            SaultError::Collaborator {
                operation: "sign_document",
                source: CollabError::RejectedByLedger(_)
            }
        ));
        assert!(coordinator.document(doc_id).unwrap().signatures.is_empty());
    }

    /// Ledger whose listing is answered `delay` after it was read, optionally
    /// from a replica that has not caught up with signatures yet.
    struct ListingLedger {
        inner: InMemoryLedger,
        delay: Duration,
        lag_signatures: bool,
    }

    #[async_trait]
    impl Ledger for ListingLedger {
        async fn create_document(
            &self,
            creator: &Identity,
            content_ref: &ContentRef,
            signers: &[Identity],
        ) -> CollabResult<DocumentId> {
            self.inner.create_document(creator, content_ref, signers).await
        }

        async fn sign_document(
            &self,
            document_id: DocumentId,
            actor: &Identity,
            signed_at: DateTime<Utc>,
        ) -> CollabResult<()> {
            self.inner.sign_document(document_id, actor, signed_at).await
        }

        async fn list_documents(&self, visible_to: &Identity) -> CollabResult<Vec<LedgerRecord>> {
            let mut records = self.inner.list_documents(visible_to).await?;
            if self.lag_signatures {
                for record in &mut records {
                    record.document.signatures.clear();
                }
            }
            tokio::time::sleep(self.delay).await;
            Ok(records)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_during_inflight_refresh_returns_own_signature() {
        let ledger = Arc::new(ListingLedger {
            inner: InMemoryLedger::new(),
            delay: Duration::from_millis(50),
            lag_signatures: false,
        });
        let coordinator = coordinator_over(ledger, "A");
        let registry = coordinator.registry().clone();
        let doc_id = create(&coordinator, "A", &["A"]).await;

        // The background refresh reads before the signature lands.
        let (_, signed) = tokio::join!(registry.refresh(), async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            coordinator.sign(doc_id, &id("A"), at(1)).await
        });

        let signed = signed.unwrap();
        assert_eq!(signed.signatures.len(), 1);
        assert!(signed.is_completed());
        assert!(registry.snapshot().get(doc_id).unwrap().has_signed(&id("A")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_falls_back_to_local_copy_when_listing_lags() {
        let ledger = Arc::new(ListingLedger {
            inner: InMemoryLedger::new(),
            delay: Duration::from_millis(5),
            lag_signatures: true,
        });
        let coordinator = coordinator_over(ledger.clone(), "A");
        let doc_id = create(&coordinator, "A", &["A", "B"]).await;

        let signed = coordinator.sign(doc_id, &id("A"), at(1)).await.unwrap();
        assert!(signed.has_signed(&id("A")));
        assert_eq!(signed.signature_of(&id("A")).unwrap().signed_at, at(1));
        assert!(ledger.inner.document(doc_id).unwrap().unwrap().has_signed(&id("A")));
        assert!(!coordinator.document(doc_id).unwrap().has_signed(&id("A")));
    }

    #[tokio::test]
    async fn test_views_and_stats() {
        let (_, coordinator) = setup("A");
        let own = create(&coordinator, "A", &["B"]).await;
        let shared_done = create(&coordinator, "B", &["A"]).await;
        let shared_open = create(&coordinator, "C", &["A", "B"]).await;
        coordinator.sign(shared_done, &id("A"), at(1)).await.unwrap();

        let ids = |docs: Vec<Document>| docs.into_iter().map(|d| d.id).collect::<Vec<_>>();
        assert_eq!(ids(coordinator.documents_created_by(&id("A"))), vec![own]);
        assert_eq!(
            ids(coordinator.documents_shared_with(&id("A"))),
            vec![shared_done, shared_open]
        );
        assert_eq!(ids(coordinator.documents_pending_for(&id("A"))), vec![shared_open]);
        assert_eq!(ids(coordinator.documents_signed_by(&id("A"))), vec![shared_done]);

        let stats = coordinator.shared_stats(&id("A"));
        assert_eq!(stats, SharedStats { completed: 1, pending: 1 });
        assert_eq!(stats.total(), 2);
    }

    #[tokio::test]
    async fn test_links() {
        let (_, coordinator) = setup("A");
        let doc_id = create(&coordinator, "A", &["A"]).await;

        assert_eq!(coordinator.signing_link(doc_id), "http://localhost:5173/sign/1");
        let doc = coordinator.document(doc_id).unwrap();
        assert_eq!(
            coordinator.content_url(&doc),
            "https://gateway.pinata.cloud/ipfs/bafy"
        );
    }
}
