//! Minimal Qdrant REST client: collections, upsert, delete, search and count.

use crate::ProviderError;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
}

#[derive(Clone)]
pub struct QdrantClient {
    client: Client,
    cfg: QdrantConfig,
}

impl QdrantClient {
    pub fn new(cfg: QdrantConfig) -> Self {
        Self {
            client: Client::new(),
            cfg,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.cfg.url.trim_end_matches('/'), path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.cfg.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ProviderError> {
        let resp = self.authed(builder).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.bytes().await.unwrap_or(Bytes::from_static(b""));
            return Err(ProviderError::RequestFailed(format!(
                "status {} body {:?}",
                status, body
            )));
        }
        Ok(resp)
    }

    pub async fn collection_exists(&self, collection: &str) -> Result<bool, ProviderError> {
        let url = self.url(&format!("/collections/{}", collection));
        let resp = self.authed(self.client.get(url)).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => Err(ProviderError::RequestFailed(format!(
                "status {} checking collection {}",
                s, collection
            ))),
        }
    }

    pub async fn create_collection(
        &self,
        collection: &str,
        size: usize,
        distance: Distance,
    ) -> Result<(), ProviderError> {
        #[derive(Serialize)]
        struct VectorParams {
            size: usize,
            distance: Distance,
        }
        #[derive(Serialize)]
        struct CreateCollection {
            vectors: VectorParams,
        }
        let url = self.url(&format!("/collections/{}", collection));
        let body = CreateCollection {
            vectors: VectorParams { size, distance },
        };
        self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }

    pub async fn list_collections(&self) -> Result<Vec<String>, ProviderError> {
        #[derive(Deserialize)]
        struct Description {
            name: String,
        }
        #[derive(Deserialize)]
        struct Collections {
            collections: Vec<Description>,
        }
        let resp = self.send(self.client.get(self.url("/collections"))).await?;
        let parsed: QdrantResponse<Collections> = resp
            .json()
            .await
            .map_err(|e| ProviderError::BadResponse(e.to_string()))?;
        Ok(parsed
            .result
            .collections
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    pub async fn upsert(
        &self,
        collection: &str,
        points: Vec<QdrantPoint>,
    ) -> Result<(), ProviderError> {
        let url = self.url(&format!("/collections/{}/points?wait=true", collection));
        let req = QdrantUpsert { points };
        self.send(self.client.put(url).json(&req)).await?;
        Ok(())
    }

    pub async fn delete_points(&self, collection: &str, ids: &[u64]) -> Result<(), ProviderError> {
        let url = self.url(&format!("/collections/{}/points/delete?wait=true", collection));
        let body = serde_json::json!({ "points": ids });
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    /// Fetches payloads (no vectors) for the given point ids; missing ids are omitted.
    pub async fn retrieve(
        &self,
        collection: &str,
        ids: &[u64],
    ) -> Result<Vec<RetrievedPoint>, ProviderError> {
        #[derive(Serialize)]
        struct RetrieveRequest<'a> {
            ids: &'a [u64],
            with_payload: bool,
            with_vector: bool,
        }
        let url = self.url(&format!("/collections/{}/points", collection));
        let body = RetrieveRequest {
            ids,
            with_payload: true,
            with_vector: false,
        };
        let resp = self.send(self.client.post(url).json(&body)).await?;
        let parsed: QdrantResponse<Vec<RetrievedPoint>> = resp
            .json()
            .await
            .map_err(|e| ProviderError::BadResponse(e.to_string()))?;
        Ok(parsed.result)
    }

    pub async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<serde_json::Value>,
    ) -> Result<Vec<ScoredPoint>, ProviderError> {
        #[derive(Serialize)]
        struct SearchRequest {
            vector: Vec<f32>,
            limit: u64,
            with_payload: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            filter: Option<serde_json::Value>,
        }
        let url = self.url(&format!("/collections/{}/points/search", collection));
        let body = SearchRequest {
            vector,
            limit,
            with_payload: true,
            filter,
        };
        let resp = self.send(self.client.post(url).json(&body)).await?;
        let parsed: QdrantResponse<Vec<ScoredPoint>> = resp
            .json()
            .await
            .map_err(|e| ProviderError::BadResponse(e.to_string()))?;
        Ok(parsed.result)
    }

    pub async fn count(&self, collection: &str) -> Result<u64, ProviderError> {
        #[derive(Deserialize)]
        struct Count {
            count: u64,
        }
        let url = self.url(&format!("/collections/{}/points/count", collection));
        let body = serde_json::json!({ "exact": true });
        let resp = self.send(self.client.post(url).json(&body)).await?;
        let parsed: QdrantResponse<Count> = resp
            .json()
            .await
            .map_err(|e| ProviderError::BadResponse(e.to_string()))?;
        Ok(parsed.result.count)
    }
}

/// Builds a `must` filter matching every `(key, value)` pair exactly.
pub fn match_filter(conditions: &[(&str, &str)]) -> Option<serde_json::Value> {
    if conditions.is_empty() {
        return None;
    }
    let must: Vec<serde_json::Value> = conditions
        .iter()
        .map(|(key, value)| serde_json::json!({ "key": key, "match": { "value": value } }))
        .collect();
    Some(serde_json::json!({ "must": must }))
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum Distance {
    Cosine,
    Euclid,
    Dot,
}

#[derive(Debug, Serialize)]
pub struct QdrantUpsert {
    pub points: Vec<QdrantPoint>,
}

#[derive(Debug, Serialize)]
pub struct QdrantPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct QdrantResponse<T> {
    pub result: T,
}

#[derive(Debug, Deserialize)]
pub struct RetrievedPoint {
    pub id: serde_json::Value,
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ScoredPoint {
    pub id: serde_json::Value,
    pub score: f32,
    pub payload: Option<serde_json::Value>,
}
