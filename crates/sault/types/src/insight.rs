//! Side tables joined onto documents only where needed

use crate::{Category, DocumentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// AI-derived facts about documents, keyed by document id.
///
/// Kept apart from `Document` so signing records never carry analysis state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInsights {
    pub summaries: BTreeMap<DocumentId, String>,
    pub categories: BTreeMap<DocumentId, Category>,
}

impl DocumentInsights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self, id: DocumentId) -> Option<&str> {
        self.summaries.get(&id).map(String::as_str)
    }

    pub fn category(&self, id: DocumentId) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn record_summary(&mut self, id: DocumentId, summary: impl Into<String>) {
        self.summaries.insert(id, summary.into());
    }

    pub fn record_category(&mut self, id: DocumentId, category: Category) {
        self.categories.insert(id, category);
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty() && self.categories.is_empty()
    }
}
