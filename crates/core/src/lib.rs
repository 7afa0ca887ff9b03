//! Core library: extraction, classification, document stores, ingestion and search.

pub mod classifier;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod indexer;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod vectorstore;
