//! SQL access to the `documents` table.

use crate::config::DuplicatePolicy;
use crate::models::{Document, QueryRequest};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tokio::sync::Mutex;
use storage::models::{CategoryCount, DocumentRow};
use tracing::{debug, warn};

/// How a single incoming document is written, given what is already stored
/// under its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePlan {
    Insert,
    Replace,
    Skip,
    /// Same id, different content: never overwrite.
    Collision,
}

pub fn plan_write(existing_digest: Option<&str>, incoming: &str, policy: DuplicatePolicy) -> WritePlan {
    match existing_digest {
        None => WritePlan::Insert,
        Some(d) if d != incoming => WritePlan::Collision,
        Some(_) => match policy {
            DuplicatePolicy::Replace => WritePlan::Replace,
            DuplicatePolicy::Skip => WritePlan::Skip,
        },
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub inserted: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub collisions: usize,
}

impl UpsertOutcome {
    pub fn record(&mut self, plan: WritePlan) {
        match plan {
            WritePlan::Insert => self.inserted += 1,
            WritePlan::Replace => self.replaced += 1,
            WritePlan::Skip => self.skipped += 1,
            WritePlan::Collision => self.collisions += 1,
        }
    }

    pub fn accepted(&self) -> usize {
        self.inserted + self.replaced
    }
}

/// Escapes `%`, `_` and `\` so the query matches literally under `ESCAPE '\'`.
pub fn like_pattern(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 2);
    out.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

pub struct Indexer {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl Indexer {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Writes all documents in one transaction; any SQL error rolls back the batch.
    /// The write lock (`BEGIN IMMEDIATE`) is taken before the first digest read,
    /// so concurrent batches queue instead of failing with `SQLITE_BUSY`.
    pub async fn upsert_documents(
        &self,
        docs: &[Document],
        policy: DuplicatePolicy,
    ) -> Result<UpsertOutcome, sqlx::Error> {
        let _writer = self.write_lock.lock().await;
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        let result = match write_batch(&mut *conn, docs, policy).await {
            Ok(outcome) => sqlx::query("COMMIT")
                .execute(&mut *conn)
                .await
                .map(|_| outcome),
            Err(e) => Err(e),
        };
        if result.is_err() {
            if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                warn!(error = %e, "rollback after failed bulk write");
            }
        }
        result
    }

    /// Substring match on `text` with conjunctive filters, in insertion order.
    pub async fn search(&self, request: &QueryRequest) -> Result<Vec<DocumentRow>, sqlx::Error> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, text, category, filename, digest FROM documents WHERE text LIKE ",
        );
        qb.push_bind(like_pattern(&request.query));
        qb.push(" ESCAPE '\\'");
        if let Some(category) = request.category {
            qb.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(filename) = &request.filename {
            qb.push(" AND filename = ").push_bind(filename.clone());
        }
        qb.push(" ORDER BY seq LIMIT ")
            .push_bind(request.limit.min(i64::MAX as usize) as i64);
        qb.build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await
    }

    pub async fn category_counts(&self) -> Result<Vec<CategoryCount>, sqlx::Error> {
        sqlx::query_as::<_, CategoryCount>(
            "SELECT category, COUNT(*) AS count FROM documents GROUP BY category ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await
    }
}

async fn write_batch(
    conn: &mut SqliteConnection,
    docs: &[Document],
    policy: DuplicatePolicy,
) -> Result<UpsertOutcome, sqlx::Error> {
    let mut outcome = UpsertOutcome::default();
    for doc in docs {
        let existing: Option<String> =
            sqlx::query_scalar("SELECT digest FROM documents WHERE id = ?1")
                .bind(doc.id as i64)
                .fetch_optional(&mut *conn)
                .await?;
        let plan = plan_write(existing.as_deref(), &doc.digest, policy);
        match plan {
            WritePlan::Insert | WritePlan::Replace => {
                sqlx::query(
                    r#"
                    INSERT INTO documents (id, text, category, filename, digest)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(id) DO UPDATE SET
                        text = excluded.text,
                        category = excluded.category,
                        filename = excluded.filename,
                        digest = excluded.digest
                    "#,
                )
                .bind(doc.id as i64)
                .bind(&doc.text)
                .bind(doc.category.as_str())
                .bind(&doc.filename)
                .bind(&doc.digest)
                .execute(&mut *conn)
                .await?;
            }
            WritePlan::Skip => {
                debug!(id = doc.id, filename = ?doc.filename, "duplicate skipped");
            }
            WritePlan::Collision => {
                warn!(id = doc.id, filename = ?doc.filename, "id collision with different content, document rejected");
            }
        }
        outcome.record(plan);
    }
    Ok(outcome)
}
