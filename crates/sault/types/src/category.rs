//! Document categories assigned by an external classifier

use serde::{Deserialize, Serialize};

/// Category label for a document.
///
/// The named variants are the labels the stock classifier emits; anything else
/// an external classifier returns is kept verbatim in `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Business,
    Personal,
    Legal,
    Bills,
    Books,
    Others,
    #[serde(untagged)]
    Other(String),
}

impl Category {
    pub fn label(&self) -> &str {
        match self {
            Category::Business => "business",
            Category::Personal => "personal",
            Category::Legal => "legal",
            Category::Bills => "bills",
            Category::Books => "books",
            Category::Others => "others",
            Category::Other(label) => label,
        }
    }

    /// Normalize a free-form label; known labels map onto their variant.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "business" => Category::Business,
            "personal" => Category::Personal,
            "legal" => Category::Legal,
            "bills" | "bill" => Category::Bills,
            "books" | "book" => Category::Books,
            "others" | "other" => Category::Others,
            _ => Category::Other(raw.trim().to_string()),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
