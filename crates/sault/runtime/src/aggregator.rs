//! Context Aggregator: joins per-document summaries with signing status into
//! one deterministic text context.

use crate::config::AggregatorConfig;
use crate::registry::{DocumentRegistry, RegistrySnapshot};
use futures::stream::{self, StreamExt};
use sault_collab::{retry_read, Classifier, ContentStore, Summarizer};
use sault_types::{
    Category, Document, DocumentId, DocumentInsights, Identity, SigningProgress, SigningState,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Separator placed between rendered document blocks.
pub const CONTEXT_DELIMITER: &str = "\n\n==========\n\n";

/// Which documents feed an identity's context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextScope {
    /// Documents the identity created
    #[default]
    Owned,
    /// Documents the identity created or must sign
    Visible,
}

/// One rendered block of the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub id: DocumentId,
    pub summary: String,
    pub signers: Vec<Identity>,
    pub progress: SigningProgress,
    pub category: Option<Category>,
    pub state: SigningState,
}

impl ContextEntry {
    pub fn from_document(document: &Document, summary: String, category: Option<Category>) -> Self {
        Self {
            id: document.id,
            summary,
            signers: document.signers.clone(),
            progress: document.progress(),
            category,
            state: document.state(),
        }
    }

    pub fn render(&self) -> String {
        let signers = self
            .signers
            .iter()
            .map(Identity::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Document ID: {}\nSummary: {}\nSigners: {}\nSignatures Completed: {}\nCategory: {}\nStatus: {}",
            self.id,
            self.summary,
            signers,
            self.progress,
            self.category.as_ref().map_or("uncategorized", Category::label),
            self.state.label(),
        )
    }
}

/// Render entries in document id order, joined by `CONTEXT_DELIMITER`.
pub fn render_context(entries: &[ContextEntry]) -> String {
    let mut ordered: Vec<&ContextEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.id);
    ordered
        .into_iter()
        .map(ContextEntry::render)
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}

/// Guess a MIME type from leading bytes.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"%PDF-", "application/pdf"),
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xFF\xD8\xFF", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
    ];

    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, mime)| *mime)
        .unwrap_or_else(|| {
            if std::str::from_utf8(bytes).is_ok() {
                "text/plain"
            } else {
                "application/octet-stream"
            }
        })
}

struct Analysis {
    id: DocumentId,
    summary: String,
    category: Option<Category>,
}

/// Builds the text context the assistant answers from.
pub struct ContextAggregator {
    registry: Arc<DocumentRegistry>,
    content: Arc<dyn ContentStore>,
    summarizer: Arc<dyn Summarizer>,
    classifier: Option<Arc<dyn Classifier>>,
    config: AggregatorConfig,
    assigned: RwLock<BTreeMap<DocumentId, Category>>,
}

impl ContextAggregator {
    pub fn new(
        registry: Arc<DocumentRegistry>,
        content: Arc<dyn ContentStore>,
        summarizer: Arc<dyn Summarizer>,
        classifier: Option<Arc<dyn Classifier>>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            registry,
            content,
            summarizer,
            classifier,
            config,
            assigned: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn scope(&self) -> ContextScope {
        self.config.scope
    }

    /// Pin a category for a document. Takes precedence over the ledger's label
    /// and the classifier.
    pub fn assign_category(&self, id: DocumentId, category: Category) {
        self.assigned
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, category);
    }

    fn assigned_category(&self, id: DocumentId) -> Option<Category> {
        self.assigned
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
            .cloned()
    }

    /// Documents feeding `identity`'s context, by id ascending.
    pub fn documents_in_scope(&self, identity: &Identity) -> Vec<Document> {
        self.select(&self.registry.snapshot(), identity)
    }

    fn select(&self, snapshot: &RegistrySnapshot, identity: &Identity) -> Vec<Document> {
        match self.config.scope {
            ContextScope::Owned => snapshot.created_by(identity),
            ContextScope::Visible => snapshot.visible_to(identity),
        }
    }

    /// Summaries and categories for every in-scope document that could be
    /// analysed. Failed documents are absent.
    pub async fn gather_insights(&self, identity: &Identity) -> DocumentInsights {
        let snapshot = self.registry.snapshot();
        let documents = self.select(&snapshot, identity);
        self.analyse_all(&snapshot, &documents).await
    }

    /// Context entries for `identity`, ordered by id.
    pub async fn entries(&self, identity: &Identity) -> Vec<ContextEntry> {
        let snapshot = self.registry.snapshot();
        let documents = self.select(&snapshot, identity);
        let mut insights = self.analyse_all(&snapshot, &documents).await;

        documents
            .iter()
            .filter_map(|doc| {
                let summary = insights.summaries.remove(&doc.id)?;
                let category = insights.categories.remove(&doc.id);
                Some(ContextEntry::from_document(doc, summary, category))
            })
            .collect()
    }

    /// Render `identity`'s context. Empty when nothing is in scope or every
    /// document failed.
    pub async fn build_context(&self, identity: &Identity) -> String {
        let entries = self.entries(identity).await;
        info!(identity = %identity, documents = entries.len(), "Built document context");
        render_context(&entries)
    }

    async fn analyse_all(&self, snapshot: &RegistrySnapshot, documents: &[Document]) -> DocumentInsights {
        let results: Vec<Option<Analysis>> = stream::iter(documents)
            .map(|doc| self.analyse(doc, snapshot.category(doc.id)))
            .buffer_unordered(self.config.max_concurrent_fetches.max(1))
            .collect()
            .await;

        let mut insights = DocumentInsights::new();
        for analysis in results.into_iter().flatten() {
            insights.record_summary(analysis.id, analysis.summary);
            if let Some(category) = analysis.category {
                insights.record_category(analysis.id, category);
            }
        }

        let skipped = documents.len() - insights.summaries.len();
        if skipped > 0 {
            warn!(skipped, total = documents.len(), "Context built from partial results");
        }
        insights
    }

    async fn analyse(&self, document: &Document, ledger_label: Option<&Category>) -> Option<Analysis> {
        let retry = &self.config.retry;

        let bytes = match retry_read(retry, "content_get", || self.content.get(&document.content_ref)).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(document_id = %document.id, content_ref = %document.content_ref, error = %err, "Skipping document, content fetch failed");
                return None;
            }
        };

        let mime = sniff_mime(&bytes);
        let summary = match retry_read(retry, "summarize", || self.summarizer.summarize(&bytes, mime)).await {
            Ok(summary) => summary,
            Err(err) => {
                warn!(document_id = %document.id, mime, error = %err, "Skipping document, summarization failed");
                return None;
            }
        };

        let category = match self
            .assigned_category(document.id)
            .or_else(|| ledger_label.cloned())
        {
            Some(category) => Some(category),
            None => self.classify(document.id, &summary).await,
        };

        debug!(document_id = %document.id, mime, "Document analysed");
        Some(Analysis {
            id: document.id,
            summary,
            category,
        })
    }

    async fn classify(&self, id: DocumentId, summary: &str) -> Option<Category> {
        if !self.config.classify_missing {
            return None;
        }
        let classifier = self.classifier.as_ref()?;
        match classifier.classify(summary).await {
            Ok(label) => Some(Category::from_label(&label)),
            Err(err) => {
                debug!(document_id = %id, error = %err, "Classification failed, leaving category unset");
                None
            }
        }
    }
}
