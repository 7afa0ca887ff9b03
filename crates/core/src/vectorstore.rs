//! Document store capability and its two backends.
//!
//! [`SqliteStore`] answers queries with a substring scan and a constant score;
//! [`QdrantStore`] embeds text and ranks by Euclidean distance, one Qdrant
//! collection per category. Callers only see `Arc<dyn DocumentStore>`.

use crate::config::{AppConfig, DuplicatePolicy, StoreBackend};
use crate::embeddings::{self, embed_batched};
use crate::error::StoreError;
use crate::indexer::{plan_write, Indexer, UpsertOutcome, WritePlan};
use crate::models::{snippet, Category, CategoryCounts, Document, QueryRequest, SearchResult};
use anyhow::Context;
use providers::qdrant::{
    match_filter, Distance, QdrantClient, QdrantConfig, QdrantPoint, ScoredPoint,
};
use providers::EmbeddingProvider;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use storage::models::DocumentRow;
use tracing::{debug, info, warn};

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Idempotently prepares the partition holding `category` and returns its name.
    async fn ensure_collection(&self, category: Category) -> Result<String, StoreError>;

    /// Bulk insert/replace by id. Returns how many documents were written.
    async fn add_documents(&self, documents: Vec<Document>) -> Result<usize, StoreError>;

    async fn search_documents(
        &self,
        request: &QueryRequest,
    ) -> Result<Vec<SearchResult>, StoreError>;

    async fn get_stats(&self) -> Result<CategoryCounts, StoreError>;

    fn backend(&self) -> &'static str;

    async fn close(&self) {}
}

fn parse_category(raw: &str) -> Result<Category, StoreError> {
    raw.parse()
        .map_err(|e: crate::error::UnknownCategory| StoreError::OperationFailed(e.to_string()))
}

pub struct SqliteStore {
    indexer: Indexer,
    duplicates: DuplicatePolicy,
    snippet_chars: usize,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, duplicates: DuplicatePolicy, snippet_chars: usize) -> Self {
        Self {
            indexer: Indexer::new(pool),
            duplicates,
            snippet_chars,
        }
    }

    /// Connects and runs migrations.
    pub async fn open(
        database_path: &str,
        duplicates: DuplicatePolicy,
        snippet_chars: usize,
    ) -> anyhow::Result<Self> {
        let pool = storage::connect(database_path).await.context("db connect")?;
        storage::migrate(&pool).await.context("db migrate")?;
        Ok(Self::new(pool, duplicates, snippet_chars))
    }

    fn row_to_result(&self, row: DocumentRow) -> Result<SearchResult, StoreError> {
        Ok(SearchResult {
            id: row.id as u64,
            text: snippet(&row.text, self.snippet_chars),
            category: parse_category(&row.category)?,
            filename: row.filename,
            score: 0.0,
        })
    }
}

#[async_trait::async_trait]
impl DocumentStore for SqliteStore {
    async fn ensure_collection(&self, category: Category) -> Result<String, StoreError> {
        // Single table partitioned by the category column.
        Ok(category.as_str().to_string())
    }

    async fn add_documents(&self, documents: Vec<Document>) -> Result<usize, StoreError> {
        let outcome = self
            .indexer
            .upsert_documents(&documents, self.duplicates)
            .await?;
        info!(
            inserted = outcome.inserted,
            replaced = outcome.replaced,
            skipped = outcome.skipped,
            collisions = outcome.collisions,
            "sqlite bulk add complete"
        );
        Ok(outcome.accepted())
    }

    async fn search_documents(
        &self,
        request: &QueryRequest,
    ) -> Result<Vec<SearchResult>, StoreError> {
        let rows = self.indexer.search(request).await?;
        debug!(hits = rows.len(), "sqlite substring search");
        rows.into_iter().map(|r| self.row_to_result(r)).collect()
    }

    async fn get_stats(&self) -> Result<CategoryCounts, StoreError> {
        let mut stats = CategoryCounts::new();
        for row in self.indexer.category_counts().await? {
            stats.insert(parse_category(&row.category)?, row.count as usize);
        }
        Ok(stats)
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn close(&self) {
        self.indexer.pool().close().await;
    }
}

#[derive(Debug, Clone)]
pub struct QdrantSettings {
    pub collection_prefix: String,
    pub dimension: usize,
    pub batch_size: usize,
    pub duplicates: DuplicatePolicy,
    pub snippet_chars: usize,
}

#[derive(Debug, Clone)]
struct StoredPoint {
    collection: String,
    digest: String,
}

struct PendingWrite {
    doc: Document,
    /// Collection still holding an older copy under another category.
    stale: Option<String>,
}

fn to_point(doc: Document, vector: Vec<f32>) -> QdrantPoint {
    let mut payload = HashMap::new();
    payload.insert("text".to_string(), serde_json::json!(doc.text));
    payload.insert("category".to_string(), serde_json::json!(doc.category));
    payload.insert("filename".to_string(), serde_json::json!(doc.filename));
    payload.insert("digest".to_string(), serde_json::json!(doc.digest));
    QdrantPoint {
        id: doc.id,
        vector,
        payload,
    }
}

pub struct QdrantStore {
    client: QdrantClient,
    embedder: Arc<dyn EmbeddingProvider>,
    settings: QdrantSettings,
}

impl QdrantStore {
    pub fn new(
        client: QdrantClient,
        embedder: Arc<dyn EmbeddingProvider>,
        settings: QdrantSettings,
    ) -> Self {
        Self {
            client,
            embedder,
            settings,
        }
    }

    pub fn collection_name(&self, category: Category) -> String {
        format!("{}_{}", self.settings.collection_prefix, category)
    }

    /// Inverse of [`Self::collection_name`]; `None` for foreign collections.
    pub fn category_of(&self, collection: &str) -> Option<Category> {
        collection
            .strip_prefix(self.settings.collection_prefix.as_str())?
            .strip_prefix('_')?
            .parse()
            .ok()
    }

    async fn category_collections(&self) -> Result<Vec<(Category, String)>, StoreError> {
        let names = self.client.list_collections().await?;
        Ok(names
            .into_iter()
            .filter_map(|name| self.category_of(&name).map(|c| (c, name)))
            .collect())
    }

    /// Where each of `ids` is currently stored, across every category collection.
    async fn stored_points(&self, ids: &[u64]) -> Result<HashMap<u64, StoredPoint>, StoreError> {
        let mut known = HashMap::new();
        for (_, collection) in self.category_collections().await? {
            for point in self.client.retrieve(&collection, ids).await? {
                let digest = point
                    .payload
                    .as_ref()
                    .and_then(|p| p.get("digest"))
                    .and_then(|d| d.as_str());
                if let (Some(id), Some(digest)) = (point.id.as_u64(), digest) {
                    known.insert(
                        id,
                        StoredPoint {
                            collection: collection.clone(),
                            digest: digest.to_string(),
                        },
                    );
                }
            }
        }
        Ok(known)
    }

    async fn write_group(
        &self,
        category: Category,
        writes: Vec<PendingWrite>,
    ) -> Result<usize, StoreError> {
        let collection = self.ensure_collection(category).await?;
        let texts: Vec<String> = writes.iter().map(|w| w.doc.text.clone()).collect();
        let vectors = embed_batched(self.embedder.as_ref(), &texts, self.settings.batch_size).await?;
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.settings.dimension) {
            return Err(StoreError::OperationFailed(format!(
                "embedding has {} dimensions, collection expects {}",
                bad.len(),
                self.settings.dimension
            )));
        }

        let mut stale: BTreeMap<String, Vec<u64>> = BTreeMap::new();
        let mut points = Vec::with_capacity(writes.len());
        for (write, vector) in writes.into_iter().zip(vectors) {
            if let Some(previous) = write.stale {
                stale.entry(previous).or_default().push(write.doc.id);
            }
            points.push(to_point(write.doc, vector));
        }
        let written = points.len();
        self.client.upsert(&collection, points).await?;

        // Documents that changed category leave a copy behind in the old collection.
        for (previous, ids) in stale {
            match self.client.delete_points(&previous, &ids).await {
                Ok(()) => debug!(from = %previous, to = %collection, moved = ids.len(), "moved documents"),
                Err(e) => warn!(collection = %previous, error = %e, "stale copies not removed"),
            }
        }
        info!(%collection, written, "qdrant upsert complete");
        Ok(written)
    }

    fn point_to_result(&self, point: ScoredPoint) -> Result<SearchResult, StoreError> {
        let id = point.id.as_u64().ok_or_else(|| {
            StoreError::OperationFailed(format!("non-numeric point id {}", point.id))
        })?;
        let payload = point.payload.unwrap_or_default();
        let text = payload.get("text").and_then(|v| v.as_str()).unwrap_or("");
        let category = payload
            .get("category")
            .and_then(|v| v.as_str())
            .ok_or_else(|| StoreError::OperationFailed(format!("point {} has no category", id)))?;
        Ok(SearchResult {
            id,
            text: snippet(text, self.settings.snippet_chars),
            category: parse_category(category)?,
            filename: payload
                .get("filename")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            score: point.score,
        })
    }
}

#[async_trait::async_trait]
impl DocumentStore for QdrantStore {
    async fn ensure_collection(&self, category: Category) -> Result<String, StoreError> {
        let name = self.collection_name(category);
        if self.client.collection_exists(&name).await? {
            return Ok(name);
        }
        match self
            .client
            .create_collection(&name, self.settings.dimension, Distance::Euclid)
            .await
        {
            Ok(()) => {
                info!(collection = %name, dimension = self.settings.dimension, "created collection")
            }
            // Another writer created it between the check and the create.
            Err(e) => {
                if !self.client.collection_exists(&name).await? {
                    return Err(e.into());
                }
                debug!(collection = %name, "collection created concurrently");
            }
        }
        Ok(name)
    }

    /// Duplicates are resolved against every category collection, so a
    /// document whose category changed moves instead of being stored twice.
    /// Writes are grouped by category; a failing group is logged and excluded
    /// from the count. Fails only when nothing could be written.
    async fn add_documents(&self, documents: Vec<Document>) -> Result<usize, StoreError> {
        let ids: Vec<u64> = documents.iter().map(|d| d.id).collect();
        let mut known = self.stored_points(&ids).await?;

        let mut outcome = UpsertOutcome::default();
        let mut groups: BTreeMap<Category, Vec<PendingWrite>> = BTreeMap::new();
        for doc in documents {
            let existing = known.get(&doc.id).cloned();
            let plan = plan_write(
                existing.as_ref().map(|p| p.digest.as_str()),
                &doc.digest,
                self.settings.duplicates,
            );
            outcome.record(plan);
            match plan {
                WritePlan::Insert | WritePlan::Replace => {
                    let target = self.collection_name(doc.category);
                    let stale = existing
                        .map(|p| p.collection)
                        .filter(|previous| *previous != target);
                    known.insert(
                        doc.id,
                        StoredPoint {
                            collection: target,
                            digest: doc.digest.clone(),
                        },
                    );
                    groups
                        .entry(doc.category)
                        .or_default()
                        .push(PendingWrite { doc, stale });
                }
                WritePlan::Skip => debug!(id = doc.id, "duplicate skipped"),
                WritePlan::Collision => {
                    warn!(id = doc.id, filename = ?doc.filename, "id collision with different content, document rejected")
                }
            }
        }
        debug!(
            inserted = outcome.inserted,
            replaced = outcome.replaced,
            skipped = outcome.skipped,
            collisions = outcome.collisions,
            "qdrant write plan"
        );

        let mut accepted = 0;
        let mut first_error = None;
        for (category, writes) in groups {
            let size = writes.len();
            match self.write_group(category, writes).await {
                Ok(n) => accepted += n,
                Err(e) => {
                    warn!(%category, documents = size, error = %e, "bulk add failed for category");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) if accepted == 0 => Err(e),
            _ => Ok(accepted),
        }
    }

    async fn search_documents(
        &self,
        request: &QueryRequest,
    ) -> Result<Vec<SearchResult>, StoreError> {
        let collections: Vec<String> = match request.category {
            Some(category) => {
                let name = self.collection_name(category);
                if self.client.collection_exists(&name).await? {
                    vec![name]
                } else {
                    Vec::new()
                }
            }
            None => self
                .category_collections()
                .await?
                .into_iter()
                .map(|(_, name)| name)
                .collect(),
        };
        if collections.is_empty() {
            return Ok(Vec::new());
        }

        let vector = embed_batched(self.embedder.as_ref(), &[request.query.clone()], 1)
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();
        let filter = request
            .filename
            .as_deref()
            .and_then(|f| match_filter(&[("filename", f)]));

        let mut results = Vec::new();
        for name in &collections {
            let points = self
                .client
                .search(name, vector.clone(), request.limit as u64, filter.clone())
                .await?;
            for point in points {
                results.push(self.point_to_result(point)?);
            }
        }
        sort_by_distance(&mut results);
        results.truncate(request.limit);
        Ok(results)
    }

    async fn get_stats(&self) -> Result<CategoryCounts, StoreError> {
        let mut stats = CategoryCounts::new();
        for (category, name) in self.category_collections().await? {
            let count = self.client.count(&name).await? as usize;
            if count > 0 {
                *stats.entry(category).or_default() += count;
            }
        }
        Ok(stats)
    }

    fn backend(&self) -> &'static str {
        "qdrant"
    }
}

/// Ascending score: lower distance first.
pub fn sort_by_distance(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Builds the configured store. The returned handle is the process-wide store;
/// call [`DocumentStore::close`] at shutdown.
pub async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.store.backend {
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(
                &config.database.path,
                config.ingest.duplicates,
                config.search.snippet_chars,
            )
            .await?;
            info!(path = %config.database.path, "using sqlite document store");
            Ok(Arc::new(store))
        }
        StoreBackend::Qdrant => {
            let url = config
                .store
                .url
                .clone()
                .context("store.url is required for the qdrant backend")?;
            let registry = embeddings::build_registry(config);
            let embedder = registry.embedding(None).with_context(|| {
                format!(
                    "embedding provider {:?} unavailable (registered: {:?})",
                    config.embeddings.provider,
                    registry.names()
                )
            })?;
            if config.embeddings.provider == "noop" {
                warn!("noop embeddings produce empty vectors; qdrant writes will be rejected");
            }
            let client = QdrantClient::new(QdrantConfig {
                url: url.clone(),
                api_key: config
                    .store
                    .api_key
                    .clone()
                    .or_else(|| std::env::var("QDRANT_API_KEY").ok()),
            });
            info!(%url, prefix = %config.store.collection_prefix, "using qdrant document store");
            Ok(Arc::new(QdrantStore::new(
                client,
                embedder,
                QdrantSettings {
                    collection_prefix: config.store.collection_prefix.clone(),
                    dimension: config.store.dimension,
                    batch_size: config.embeddings.batch_size,
                    duplicates: config.ingest.duplicates,
                    snippet_chars: config.search.snippet_chars,
                },
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::noop::NoopProvider;

    async fn sqlite_store(duplicates: DuplicatePolicy) -> SqliteStore {
        SqliteStore::open("sqlite::memory:", duplicates, 500)
            .await
            .unwrap()
    }

    fn doc(text: &str, category: Category, filename: &str) -> Document {
        Document::new(text.to_string(), category, Some(filename.to_string()))
    }

    #[tokio::test]
    async fn round_trip_by_substring() {
        let store = sqlite_store(DuplicatePolicy::Replace).await;
        let d = doc("The lease agreement is binding.", Category::Legal, "lease.txt");
        assert_eq!(store.add_documents(vec![d.clone()]).await.unwrap(), 1);

        let hits = store
            .search_documents(&QueryRequest::new("agreement is"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, d.id);
        assert_eq!(hits[0].category, Category::Legal);
        assert_eq!(hits[0].filename.as_deref(), Some("lease.txt"));
        assert_eq!(hits[0].score, 0.0);
    }

    #[tokio::test]
    async fn substring_match_ignores_ascii_case() {
        let store = sqlite_store(DuplicatePolicy::Replace).await;
        store
            .add_documents(vec![doc("Budget Review", Category::Financial, "b.txt")])
            .await
            .unwrap();
        let hits = store
            .search_documents(&QueryRequest::new("budget review"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn category_filter_is_exact() {
        let store = sqlite_store(DuplicatePolicy::Replace).await;
        store
            .add_documents(vec![
                doc("shared words one", Category::Legal, "a.txt"),
                doc("shared words two", Category::Technical, "b.txt"),
                doc("shared words three", Category::Legal, "c.txt"),
            ])
            .await
            .unwrap();
        let hits = store
            .search_documents(&QueryRequest::new("shared").category(Category::Legal))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.category == Category::Legal));
    }

    #[tokio::test]
    async fn filters_are_conjunctive() {
        let store = sqlite_store(DuplicatePolicy::Replace).await;
        store
            .add_documents(vec![
                doc("alpha text", Category::Legal, "same.txt"),
                doc("alpha text too", Category::Technical, "same.txt"),
                doc("alpha other", Category::Legal, "other.txt"),
            ])
            .await
            .unwrap();
        let hits = store
            .search_documents(
                &QueryRequest::new("alpha")
                    .category(Category::Legal)
                    .filename("same.txt"),
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "alpha text");
    }

    #[tokio::test]
    async fn limit_caps_results_in_insertion_order() {
        let store = sqlite_store(DuplicatePolicy::Replace).await;
        let docs: Vec<Document> = (0..10)
            .map(|i| doc(&format!("match number {i}"), Category::General, &format!("{i}.txt")))
            .collect();
        store.add_documents(docs).await.unwrap();
        let hits = store
            .search_documents(&QueryRequest::new("match").limit(3))
            .await
            .unwrap();
        let names: Vec<_> = hits.iter().filter_map(|h| h.filename.clone()).collect();
        assert_eq!(names, vec!["0.txt", "1.txt", "2.txt"]);

        let all = store
            .search_documents(&QueryRequest::new("match").limit(50))
            .await
            .unwrap();
        assert_eq!(all.len(), 10);
    }

    #[tokio::test]
    async fn like_wildcards_in_query_are_literal() {
        let store = sqlite_store(DuplicatePolicy::Replace).await;
        store
            .add_documents(vec![
                doc("save 50% today", Category::General, "a.txt"),
                doc("save 50 dollars", Category::General, "b.txt"),
            ])
            .await
            .unwrap();
        let hits = store
            .search_documents(&QueryRequest::new("50%"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].filename.as_deref(), Some("a.txt"));
    }

    #[tokio::test]
    async fn long_text_is_truncated_in_results() {
        let store = SqliteStore::open("sqlite::memory:", DuplicatePolicy::Replace, 10)
            .await
            .unwrap();
        store
            .add_documents(vec![doc("abcdefghijklmnop", Category::General, "l.txt")])
            .await
            .unwrap();
        let hits = store.search_documents(&QueryRequest::new("abc")).await.unwrap();
        assert_eq!(hits[0].text, "abcdefghij...");
    }

    #[tokio::test]
    async fn stats_sum_to_distinct_documents() {
        let store = sqlite_store(DuplicatePolicy::Replace).await;
        let a = doc("contract one", Category::Legal, "1.txt");
        store
            .add_documents(vec![
                a.clone(),
                doc("contract two", Category::Legal, "2.txt"),
                doc("algorithm", Category::Technical, "3.txt"),
            ])
            .await
            .unwrap();
        // Re-adding the same content replaces instead of duplicating.
        assert_eq!(store.add_documents(vec![a]).await.unwrap(), 1);

        let stats = store.get_stats().await.unwrap();
        assert_eq!(stats.get(&Category::Legal), Some(&2));
        assert_eq!(stats.get(&Category::Technical), Some(&1));
        assert_eq!(stats.values().sum::<usize>(), 3);
    }

    #[tokio::test]
    async fn skip_policy_does_not_count_duplicates() {
        let store = sqlite_store(DuplicatePolicy::Skip).await;
        let a = doc("profit report", Category::Financial, "p.txt");
        assert_eq!(store.add_documents(vec![a.clone()]).await.unwrap(), 1);
        assert_eq!(store.add_documents(vec![a]).await.unwrap(), 0);
        assert_eq!(store.get_stats().await.unwrap()[&Category::Financial], 1);
    }

    #[tokio::test]
    async fn id_collision_never_overwrites() {
        let store = sqlite_store(DuplicatePolicy::Replace).await;
        let original = doc("original text", Category::General, "o.txt");
        let mut impostor = doc("different text", Category::General, "i.txt");
        impostor.id = original.id;
        assert_eq!(store.add_documents(vec![original]).await.unwrap(), 1);
        assert_eq!(store.add_documents(vec![impostor]).await.unwrap(), 0);
        let hits = store.search_documents(&QueryRequest::new("text")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "original text");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_batches_on_a_file_database_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("documents.db");
        let store = Arc::new(
            SqliteStore::open(&path.to_string_lossy(), DuplicatePolicy::Replace, 500)
                .await
                .unwrap(),
        );

        let mut tasks = Vec::new();
        for worker in 0..8 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                let mut accepted = 0;
                for round in 0..10 {
                    let docs: Vec<Document> = (0..5)
                        .map(|i| {
                            doc(
                                &format!("worker {worker} round {round} doc {i}"),
                                Category::General,
                                &format!("{worker}-{round}-{i}.txt"),
                            )
                        })
                        .collect();
                    accepted += store.add_documents(docs).await.unwrap();
                }
                accepted
            }));
        }
        let mut total = 0;
        for task in tasks {
            total += task.await.unwrap();
        }
        assert_eq!(total, 400);
        assert_eq!(store.get_stats().await.unwrap()[&Category::General], 400);
    }

    #[tokio::test]
    async fn ensure_collection_is_idempotent() {
        let store = sqlite_store(DuplicatePolicy::Replace).await;
        let first = store.ensure_collection(Category::Legal).await.unwrap();
        let second = store.ensure_collection(Category::Legal).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.backend(), "sqlite");
    }

    #[tokio::test]
    async fn closed_store_reports_unavailable() {
        let store = sqlite_store(DuplicatePolicy::Replace).await;
        store.close().await;
        let err = store.get_stats().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)), "{err}");
    }

    fn qdrant_store() -> QdrantStore {
        QdrantStore::new(
            QdrantClient::new(QdrantConfig {
                url: "http://127.0.0.1:1".into(),
                api_key: None,
            }),
            Arc::new(NoopProvider),
            QdrantSettings {
                collection_prefix: "documents".into(),
                dimension: 4,
                batch_size: 8,
                duplicates: DuplicatePolicy::Replace,
                snippet_chars: 5,
            },
        )
    }

    #[test]
    fn collection_names_round_trip() {
        let store = qdrant_store();
        assert_eq!(store.collection_name(Category::Legal), "documents_legal");
        assert_eq!(store.category_of("documents_legal"), Some(Category::Legal));
        assert_eq!(store.category_of("documents_medical"), None);
        assert_eq!(store.category_of("other_legal"), None);
        assert_eq!(store.category_of("documentslegal"), None);
    }

    #[test]
    fn scored_points_become_results() {
        let store = qdrant_store();
        let point = ScoredPoint {
            id: serde_json::json!(7),
            score: 1.25,
            payload: Some(serde_json::json!({
                "text": "abcdefgh",
                "category": "scientific",
                "filename": "paper.pdf"
            })),
        };
        let result = store.point_to_result(point).unwrap();
        assert_eq!(result.id, 7);
        assert_eq!(result.text, "abcde...");
        assert_eq!(result.category, Category::Scientific);
        assert_eq!(result.filename.as_deref(), Some("paper.pdf"));
        assert_eq!(result.score, 1.25);
    }

    #[test]
    fn results_sort_ascending_by_distance() {
        let mk = |id, score| SearchResult {
            id,
            text: String::new(),
            category: Category::General,
            filename: None,
            score,
        };
        let mut results = vec![mk(1, 0.9), mk(2, 0.1), mk(3, 0.5)];
        sort_by_distance(&mut results);
        let ids: Vec<u64> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn unreachable_qdrant_is_unavailable() {
        let store = qdrant_store();
        let err = store.get_stats().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)), "{err}");
    }
}
