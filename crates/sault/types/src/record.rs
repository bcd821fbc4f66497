//! Documents as the ledger reports them

use crate::{Category, Document};
use serde::{Deserialize, Serialize};

/// A ledger entry: the document plus the label the ledger holds for it.
///
/// The label never takes part in the signing rules; it only seeds the
/// category side table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    #[serde(flatten)]
    pub document: Document,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl LedgerRecord {
    pub fn new(document: Document, category: Option<Category>) -> Self {
        Self { document, category }
    }
}

impl From<Document> for LedgerRecord {
    fn from(document: Document) -> Self {
        Self::new(document, None)
    }
}
