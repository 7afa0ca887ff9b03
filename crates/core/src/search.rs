use crate::error::SearchError;
use crate::models::{QueryRequest, SearchResult};
use crate::vectorstore::DocumentStore;
use tracing::debug;

/// Validates the request and delegates to the store. Results come back in the
/// store's order, cut to `limit`.
pub async fn search(
    store: &dyn DocumentStore,
    request: &QueryRequest,
) -> Result<Vec<SearchResult>, SearchError> {
    if request.limit == 0 {
        return Err(SearchError::InvalidRequest(
            "limit must be a positive integer".into(),
        ));
    }
    let mut results = store.search_documents(request).await?;
    results.truncate(request.limit);
    debug!(
        query = %request.query,
        category = ?request.category,
        hits = results.len(),
        "search complete"
    );
    Ok(results)
}

/// Resolves a user-supplied limit, falling back to `default` when absent.
pub fn parse_limit(raw: Option<i64>, default: usize) -> Result<usize, SearchError> {
    match raw {
        None => Ok(default),
        Some(n) if n > 0 => Ok(n as usize),
        Some(n) => Err(SearchError::InvalidRequest(format!(
            "limit must be a positive integer, got {n}"
        ))),
    }
}
