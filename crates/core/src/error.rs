//! Error taxonomy for extraction, storage and querying.

use providers::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to extract text from {filename}: {reason}")]
    ExtractionFailed { filename: String, reason: String },
}

impl ExtractError {
    pub fn failed(filename: &str, reason: impl std::fmt::Display) -> Self {
        ExtractError::ExtractionFailed {
            filename: filename.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store operation failed: {0}")]
    OperationFailed(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(e.to_string())
            }
            other => StoreError::OperationFailed(other.to_string()),
        }
    }
}

impl From<ProviderError> for StoreError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Unreachable(msg) => StoreError::Unavailable(msg),
            other => StoreError::OperationFailed(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("search failed: {0}")]
    SearchFailed(#[from] StoreError),
}

#[derive(Debug, Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);
