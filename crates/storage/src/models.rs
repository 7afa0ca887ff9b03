/// One row of the `documents` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: i64,
    pub text: String,
    pub category: String,
    pub filename: Option<String>,
    pub digest: String,
}

/// Per-category aggregate returned by `GROUP BY category`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}
