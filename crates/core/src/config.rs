use crate::models::Category;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub embeddings: EmbeddingConfig,
    pub search: SearchConfig,
    pub ingest: IngestConfig,
    pub classification: ClassificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/documents.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Qdrant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub collection_prefix: String,
    pub dimension: usize,
    pub api_key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            url: None,
            collection_prefix: "documents".to_string(),
            dimension: 768,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "noop".to_string(),
            model: "text-embedding-3-small".to_string(),
            batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub snippet_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: crate::models::DEFAULT_LIMIT,
            snippet_chars: 500,
        }
    }
}

/// What to do when an ingested document's id and digest are already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    #[default]
    Replace,
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub max_parallel_extractions: usize,
    pub duplicates: DuplicatePolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_parallel_extractions: 4,
            duplicates: DuplicatePolicy::Replace,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Category label -> additional keywords.
    pub extra_keywords: HashMap<String, Vec<String>>,
}

impl ClassificationConfig {
    pub fn parsed_keywords(&self) -> anyhow::Result<HashMap<Category, Vec<String>>> {
        let mut out = HashMap::new();
        for (label, keywords) in &self.extra_keywords {
            let category: Category = label
                .parse()
                .with_context(|| format!("classification.extra_keywords.{}", label))?;
            out.insert(category, keywords.clone());
        }
        Ok(out)
    }
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store.backend == StoreBackend::Qdrant && self.store.url.is_none() {
            bail!("store.url is required when store.backend = \"qdrant\"");
        }
        if self.store.dimension == 0 {
            bail!("store.dimension must be positive");
        }
        if self.embeddings.batch_size == 0 {
            bail!("embeddings.batch_size must be positive");
        }
        if self.search.default_limit == 0 {
            bail!("search.default_limit must be positive");
        }
        self.classification.parsed_keywords()?;
        Ok(())
    }
}

/// Loads config from `path` (or `config/default` when present), then applies
/// `DOCSEARCH_<SECTION>__<KEY>` environment overrides.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("DOCSEARCH")
            .prefix_separator("_")
            .separator("__"),
    );
    let cfg: AppConfig = settings
        .build()
        .context("reading configuration")?
        .try_deserialize()
        .context("parsing configuration")?;
    cfg.validate()?;
    Ok(cfg)
}
