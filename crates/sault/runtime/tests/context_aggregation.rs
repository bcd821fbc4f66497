//! End-to-end test: files on disk -> ledger documents -> aggregated context -> assistant.

use async_trait::async_trait;
use chrono::Utc;
use sault_collab::directory::DirectoryContentStore;
use sault_collab::memory::{ExcerptSummarizer, InMemoryLedger, KeywordClassifier};
use sault_collab::{Answerer, CollabResult, ContentStore, Ledger};
use sault_runtime::{
    AggregatorConfig, AssistantReply, ContextAggregator, ContextScope, DocumentAssistant,
    DocumentRegistry, RegistryConfig, CONTEXT_DELIMITER,
};
use sault_types::Identity;
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingAnswerer {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl Answerer for RecordingAnswerer {
    async fn answer(&self, prompt: &str) -> CollabResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("Two documents, one awaiting signatures.".to_string())
    }
}

struct World {
    _dir: tempfile::TempDir,
    aggregator: Arc<ContextAggregator>,
}

async fn world(scope: ContextScope) -> World {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirectoryContentStore::new(dir.path()));
    let ledger = Arc::new(InMemoryLedger::new());
    let alice = Identity::new("alice");
    let bob = Identity::new("bob");

    let lease = store
        .put(b"Lease agreement between the parties for flat 2".to_vec())
        .await
        .unwrap();
    let invoice = store.put(b"Invoice: amount due 120 EUR".to_vec()).await.unwrap();
    let scan = store.put(vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0]).await.unwrap();
    let from_bob = store.put(b"Chapter one of the draft".to_vec()).await.unwrap();

    let lease_id = ledger
        .create_document(&alice, &lease, &[alice.clone(), bob.clone()])
        .await
        .unwrap();
    let invoice_id = ledger.create_document(&alice, &invoice, &[bob.clone()]).await.unwrap();
    ledger.sign_document(invoice_id, &bob, Utc::now()).await.unwrap();
    ledger.create_document(&alice, &scan, &[bob.clone()]).await.unwrap();
    ledger.create_document(&bob, &from_bob, &[alice.clone()]).await.unwrap();
    ledger.sign_document(lease_id, &alice, Utc::now()).await.unwrap();

    let registry = Arc::new(DocumentRegistry::new(ledger, alice, RegistryConfig::default()));
    registry.init().await.unwrap();

    let aggregator = ContextAggregator::new(
        registry,
        store,
        Arc::new(ExcerptSummarizer::default()),
        Some(Arc::new(KeywordClassifier::default())),
        AggregatorConfig {
            scope,
            ..AggregatorConfig::default()
        },
    );
    World {
        _dir: dir,
        aggregator: Arc::new(aggregator),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn owned_context_renders_each_summarizable_document() {
    let world = world(ContextScope::Owned).await;
    let context = world.aggregator.build_context(&Identity::new("alice")).await;

    let blocks: Vec<&str> = context.split(CONTEXT_DELIMITER).collect();
    // The PNG scan has no text summary and is skipped.
    assert_eq!(blocks.len(), 2);
    assert_eq!(
        blocks[0],
        "Document ID: 1\n\
         Summary: Lease agreement between the parties for flat 2\n\
         Signers: alice, bob\n\
         Signatures Completed: 1/2\n\
         Category: legal\n\
         Status: pending"
    );
    assert!(blocks[1].starts_with("Document ID: 2\n"));
    assert!(blocks[1].contains("Category: bills"));
    assert!(blocks[1].ends_with("Status: completed"));

    let again = world.aggregator.build_context(&Identity::new("alice")).await;
    assert_eq!(context, again);
}

#[tokio::test]
async fn visible_context_includes_shared_documents() {
    let world = world(ContextScope::Visible).await;
    let entries = world.aggregator.entries(&Identity::new("alice")).await;

    let ids: Vec<u64> = entries.iter().map(|e| e.id.value()).collect();
    assert_eq!(ids, vec![1, 2, 4]);
    assert_eq!(entries[2].summary, "Chapter one of the draft");
}

#[tokio::test]
async fn assistant_answers_from_owned_context() {
    let world = world(ContextScope::Owned).await;
    let answerer = Arc::new(RecordingAnswerer::default());
    let assistant = DocumentAssistant::new(world.aggregator.clone(), answerer.clone());

    let reply = assistant
        .ask(&Identity::new("alice"), "Which documents still need signatures?")
        .await
        .unwrap();
    assert_eq!(
        reply,
        AssistantReply::Answer("Two documents, one awaiting signatures.".into())
    );

    let prompts = answerer.prompts.lock().unwrap();
    assert!(prompts[0].contains("User Query: \"Which documents still need signatures?\""));
    assert!(prompts[0].contains("Document ID: 2"));

    drop(prompts);
    let nobody = assistant.ask(&Identity::new("zoe"), "Anything?").await.unwrap();
    assert_eq!(nobody, AssistantReply::NoDocuments);
}
