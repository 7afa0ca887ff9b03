use crate::error::UnknownCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Closed set of labels a document can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    General,
    Legal,
    Technical,
    Scientific,
    Financial,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::General,
        Category::Legal,
        Category::Technical,
        Category::Scientific,
        Category::Financial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Legal => "legal",
            Category::Technical => "technical",
            Category::Scientific => "scientific",
            Category::Financial => "financial",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

pub type CategoryCounts = BTreeMap<Category, usize>;

/// A classified document ready for the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub text: String,
    pub category: Category,
    pub filename: Option<String>,
    /// blake3 hex digest of filename and text.
    pub digest: String,
}

impl Document {
    pub fn new(text: String, category: Category, filename: Option<String>) -> Self {
        let (id, digest) = document_identity(filename.as_deref().unwrap_or(""), &text);
        Self {
            id,
            text,
            category,
            filename,
            digest,
        }
    }
}

/// Derives `(id, digest)` from content. The id is the leading 63 bits of the
/// digest so it fits SQLite INTEGER and Qdrant point ids alike.
pub fn document_identity(filename: &str, text: &str) -> (u64, String) {
    let mut hasher = blake3::Hasher::new();
    hasher.update(filename.as_bytes());
    hasher.update(&[0]);
    hasher.update(text.as_bytes());
    let hash = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    let id = u64::from_be_bytes(head) & (i64::MAX as u64);
    (id, hash.to_hex().to_string())
}

/// One file of an ingestion batch.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub path: PathBuf,
    pub filename: String,
}

impl FileInput {
    pub fn new(path: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filename: filename.into(),
        }
    }

    /// Uses the path's final component as the filename.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, filename }
    }
}

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub category: Option<Category>,
    pub filename: Option<String>,
    pub limit: usize,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
            filename: None,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: u64,
    pub text: String,
    pub category: Category,
    pub filename: Option<String>,
    /// Lower is more relevant.
    pub score: f32,
}

/// Cuts `text` to at most `max_chars` characters, marking the cut with `...`.
pub fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestError {
    pub filename: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionReport {
    pub total_processed: usize,
    pub by_category: CategoryCounts,
    pub errors: Vec<IngestError>,
    pub added_to_store: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_str() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
        assert_eq!("  LEGAL ".parse::<Category>().unwrap(), Category::Legal);
        assert!("medical".parse::<Category>().is_err());
    }

    #[test]
    fn category_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Category::Scientific).unwrap(),
            "\"scientific\""
        );
        let mut counts = CategoryCounts::new();
        counts.insert(Category::Legal, 2);
        assert_eq!(serde_json::to_string(&counts).unwrap(), r#"{"legal":2}"#);
    }

    #[test]
    fn identity_depends_on_filename_and_text() {
        let (a, da) = document_identity("a.txt", "hello");
        let (b, db) = document_identity("b.txt", "hello");
        let (a2, da2) = document_identity("a.txt", "hello");
        assert_ne!(a, b);
        assert_ne!(da, db);
        assert_eq!((a, da), (a2, da2));
        assert!(a <= i64::MAX as u64);
    }

    #[test]
    fn filename_and_text_boundary_is_unambiguous() {
        let (a, _) = document_identity("ab", "c");
        let (b, _) = document_identity("a", "bc");
        assert_ne!(a, b);
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        assert_eq!(snippet("short", 500), "short");
        assert_eq!(snippet("абвгд", 3), "абв...");
        let long = "x".repeat(501);
        let cut = snippet(&long, 500);
        assert_eq!(cut.len(), 503);
        assert!(cut.ends_with("..."));
        assert_eq!(snippet(&"y".repeat(500), 500), "y".repeat(500));
    }

    #[test]
    fn file_input_from_path_uses_file_name() {
        let input = FileInput::from_path("/tmp/uploads/contract.docx");
        assert_eq!(input.filename, "contract.docx");
    }

    #[test]
    fn report_omits_store_error_when_absent() {
        let report = IngestionReport::default();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("store_error").is_none());
        assert_eq!(json["added_to_store"], 0);
    }
}
