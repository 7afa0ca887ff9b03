use crate::config::AppConfig;
use providers::noop::NoopProvider;
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::{EmbeddingProvider, ProviderError, ProviderRegistry};
use std::sync::Arc;

/// Embeds `texts` in batches of `batch_size`, preserving input order.
pub async fn embed_batched(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, ProviderError> {
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        let resp = provider.embed(batch).await?;
        if resp.vectors.len() != batch.len() {
            return Err(ProviderError::BadResponse(format!(
                "expected {} vectors, got {}",
                batch.len(),
                resp.vectors.len()
            )));
        }
        vectors.extend(resp.vectors);
    }
    Ok(vectors)
}

pub fn build_registry(config: &AppConfig) -> ProviderRegistry {
    let mut reg = ProviderRegistry::new().with_embedding("noop", Arc::new(NoopProvider));

    if let (Some(key), Some(base)) = (
        std::env::var_os("OPENAI_API_KEY"),
        std::env::var_os("OPENAI_BASE_URL"),
    ) {
        let provider = OpenAiProvider::new(OpenAiConfig {
            api_key: key.to_string_lossy().into_owned(),
            base_url: base.to_string_lossy().into_owned(),
            embedding_model: config.embeddings.model.clone(),
        });
        reg = reg.with_embedding("openai", Arc::new(provider));
    }

    reg.set_preferred_embedding(&config.embeddings.provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::EmbedResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for CountingProvider {
        async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(EmbedResponse {
                vectors: texts.iter().map(|t| vec![t.len() as f32]).collect(),
            })
        }
    }

    #[tokio::test]
    async fn batches_preserve_order() {
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
        };
        let texts: Vec<String> = ["a", "bb", "ccc", "dddd", "eeeee"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let vectors = embed_batched(&provider, &texts, 2).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        let lens: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(lens, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn registry_prefers_configured_provider() {
        let cfg = AppConfig::default();
        let reg = build_registry(&cfg);
        assert_eq!(reg.preferred_embedding.as_deref(), Some("noop"));
        assert!(reg.embedding(None).is_ok());
    }
}
