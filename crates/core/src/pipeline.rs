//! Ingestion: extract, classify and store a batch of files.

use crate::classifier::{Classifier, KeywordClassifier};
use crate::config::AppConfig;
use crate::error::ExtractError;
use crate::extractor::{FileExtractor, TextExtractor};
use crate::models::{Document, FileInput, IngestError, IngestionReport};
use crate::vectorstore::{self, DocumentStore};
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Long-lived collaborators shared by ingestion, search and the HTTP layer.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn DocumentStore>,
    pub extractor: Arc<dyn TextExtractor>,
    pub classifier: Arc<dyn Classifier>,
    pub max_parallel_extractions: usize,
    pub default_limit: usize,
}

impl Services {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            extractor: Arc::new(FileExtractor),
            classifier: Arc::new(KeywordClassifier::new()),
            max_parallel_extractions: 4,
            default_limit: crate::models::DEFAULT_LIMIT,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<Services> {
    let store = vectorstore::build_store(config).await?;
    let extra = config
        .classification
        .parsed_keywords()
        .context("classification keywords")?;
    let classifier = KeywordClassifier::new().with_extra_keywords(&extra);
    Ok(Services {
        store,
        extractor: Arc::new(FileExtractor),
        classifier: Arc::new(classifier),
        max_parallel_extractions: config.ingest.max_parallel_extractions.max(1),
        default_limit: config.search.default_limit,
    })
}

/// Extracts every file on the blocking pool, classifies the survivors and
/// submits them to the store in one call. Per-file failures land in the report
/// in batch order; a store failure is reported, not returned.
pub async fn ingest(services: &Services, batch: Vec<FileInput>) -> IngestionReport {
    let mut report = IngestionReport::default();
    if batch.is_empty() {
        return report;
    }
    info!(files = batch.len(), "starting ingestion");

    let permits = Arc::new(Semaphore::new(services.max_parallel_extractions.max(1)));
    let mut handles = Vec::with_capacity(batch.len());
    for file in batch {
        let permits = Arc::clone(&permits);
        let extractor = Arc::clone(&services.extractor);
        let filename = file.filename.clone();
        let handle = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            tokio::task::spawn_blocking(move || extractor.extract_text(&file.path, &file.filename))
                .await
        });
        handles.push((filename, handle));
    }

    let mut documents = Vec::new();
    for (filename, handle) in handles {
        let extracted = match handle.await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) | Err(e) => Err(ExtractError::failed(&filename, task_failure(&e))),
        };
        match extracted {
            Ok(text) if text.trim().is_empty() => {
                let error = ExtractError::failed(&filename, "no text extracted");
                record_error(&mut report, &filename, error);
            }
            Ok(text) => {
                let category = services.classifier.classify(&text, &filename);
                debug!(%filename, %category, chars = text.len(), "classified");
                *report.by_category.entry(category).or_default() += 1;
                report.total_processed += 1;
                documents.push(Document::new(text, category, Some(filename)));
            }
            Err(e) => record_error(&mut report, &filename, e),
        }
    }

    if !documents.is_empty() {
        match services.store.add_documents(documents).await {
            Ok(accepted) => report.added_to_store = accepted,
            Err(e) => {
                warn!(error = %e, "bulk add to store failed");
                report.store_error = Some(e.to_string());
            }
        }
    }
    info!(
        processed = report.total_processed,
        failed = report.errors.len(),
        added = report.added_to_store,
        "ingestion complete"
    );
    report
}

fn task_failure(e: &tokio::task::JoinError) -> &'static str {
    if e.is_panic() {
        "extraction task panicked"
    } else {
        "extraction task cancelled"
    }
}

fn record_error(report: &mut IngestionReport, filename: &str, error: ExtractError) {
    warn!(%filename, error = %error, "file skipped");
    report.errors.push(IngestError {
        filename: filename.to_string(),
        error: error.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;
    use crate::error::StoreError;
    use crate::models::{Category, CategoryCounts, QueryRequest, SearchResult};
    use crate::vectorstore::SqliteStore;
    use std::path::Path;

    /// Returns the file's name as its text, failing for names starting with `bad`.
    struct NameExtractor;

    impl TextExtractor for NameExtractor {
        fn extract_text(&self, _path: &Path, filename: &str) -> Result<String, ExtractError> {
            if filename.starts_with("bad") {
                return Err(ExtractError::failed(filename, "corrupt"));
            }
            Ok(format!("{filename} contract"))
        }
    }

    struct DownStore;

    #[async_trait::async_trait]
    impl DocumentStore for DownStore {
        async fn ensure_collection(&self, _c: Category) -> Result<String, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn add_documents(&self, _d: Vec<Document>) -> Result<usize, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn search_documents(
            &self,
            _r: &QueryRequest,
        ) -> Result<Vec<SearchResult>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn get_stats(&self) -> Result<CategoryCounts, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        fn backend(&self) -> &'static str {
            "down"
        }
    }

    async fn sqlite_services() -> Services {
        let store = SqliteStore::open("sqlite::memory:", DuplicatePolicy::Replace, 500)
            .await
            .unwrap();
        Services::new(Arc::new(store)).with_extractor(Arc::new(NameExtractor))
    }

    fn batch(names: &[&str]) -> Vec<FileInput> {
        names
            .iter()
            .map(|n| FileInput::new(format!("/nowhere/{n}"), *n))
            .collect()
    }

    #[tokio::test]
    async fn one_bad_file_does_not_sink_the_batch() {
        let services = sqlite_services().await;
        let report = ingest(&services, batch(&["a.txt", "bad.txt", "c.txt"])).await;
        assert_eq!(report.total_processed, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].filename, "bad.txt");
        assert!(report.errors[0].error.contains("corrupt"));
        assert_eq!(report.added_to_store, 2);
        assert_eq!(report.by_category.get(&Category::Legal), Some(&2));
        assert!(report.store_error.is_none());
    }

    #[tokio::test]
    async fn errors_keep_batch_order() {
        let services = sqlite_services().await;
        let names = ["bad1.txt", "ok.txt", "bad2.txt", "bad3.txt"];
        let report = ingest(&services, batch(&names)).await;
        let names: Vec<_> = report.errors.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, vec!["bad1.txt", "bad2.txt", "bad3.txt"]);
        assert_eq!(report.total_processed + report.errors.len(), 4);
    }

    #[tokio::test]
    async fn store_failure_is_reported_not_raised() {
        let services = Services::new(Arc::new(DownStore)).with_extractor(Arc::new(NameExtractor));
        let report = ingest(&services, batch(&["a.txt", "b.txt"])).await;
        assert_eq!(report.total_processed, 2);
        assert_eq!(report.added_to_store, 0);
        assert!(report.store_error.unwrap().contains("down"));
    }

    #[tokio::test]
    async fn all_failed_skips_the_store() {
        // DownStore would set store_error if it were called.
        let services = Services::new(Arc::new(DownStore)).with_extractor(Arc::new(NameExtractor));
        let report = ingest(&services, batch(&["bad.txt"])).await;
        assert_eq!(report.total_processed, 0);
        assert_eq!(report.added_to_store, 0);
        assert!(report.store_error.is_none());
    }

    #[tokio::test]
    async fn empty_file_is_an_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.txt");
        let full = dir.path().join("notes.txt");
        std::fs::write(&empty, "  \n").unwrap();
        std::fs::write(&full, "the experiment hypothesis held").unwrap();

        let store = SqliteStore::open("sqlite::memory:", DuplicatePolicy::Replace, 500)
            .await
            .unwrap();
        let services = Services::new(Arc::new(store));
        let report = ingest(
            &services,
            vec![FileInput::from_path(&empty), FileInput::from_path(&full)],
        )
        .await;
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].filename, "empty.txt");
        assert!(report.errors[0].error.contains("no text extracted"));
        assert_eq!(report.by_category.get(&Category::Scientific), Some(&1));
        assert_eq!(report.added_to_store, 1);
    }

    #[tokio::test]
    async fn ingested_documents_are_searchable() {
        let services = sqlite_services().await;
        ingest(&services, batch(&["lease.txt"])).await;
        let hits = services
            .store
            .search_documents(&QueryRequest::new("lease.txt contract"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].filename.as_deref(), Some("lease.txt"));
    }

    #[tokio::test]
    async fn empty_batch_is_a_noop() {
        let services = Services::new(Arc::new(DownStore));
        let report = ingest(&services, Vec::new()).await;
        assert_eq!(report, IngestionReport::default());
    }
}
