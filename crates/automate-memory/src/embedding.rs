//! Embedding generation: an OpenAI-compatible HTTP client, plus a
//! deterministic hash-based test double for environments without network
//! access or an API key.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{MemoryError, Result};

/// Deadline for a single embedding HTTP request.
pub const EMBEDDING_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum texts batched into one embedding request.
pub const MAX_BATCH_SIZE: usize = 20;

/// A source of embeddings for chunk/query text. Implementations must be
/// cheap to clone/share (`Arc<dyn EmbeddingClient>`).
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in the same
    /// order the inputs were supplied (callers must not assume the
    /// underlying transport preserves order; implementations re-sort by the
    /// server-reported index before returning).
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimensionality of vectors this client produces.
    fn dimension(&self) -> usize;
}

/// OpenAI-compatible embeddings client: `POST <api_base>/embeddings` with
/// `{model, input: [texts]}`, bearer auth, response `{data: [{embedding,
/// index}]}`.
pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl HttpEmbeddingClient {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
            dimension,
        }
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.api_base.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(EMBEDDING_REQUEST_TIMEOUT)
            .json(&serde_json::json!({
                "model": self.model,
                "input": texts,
            }))
            .send()
            .await
            .map_err(|e| MemoryError::Embedding(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::Embedding(format!("embedding API error {status}: {body}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MemoryError::Embedding(e.to_string()))?;

        parse_batch_response(&json, texts.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn parse_batch_response(json: &serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let data = json["data"]
        .as_array()
        .ok_or_else(|| MemoryError::Embedding("missing data array in response".into()))?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for item in data {
        let index = item["index"]
            .as_u64()
            .ok_or_else(|| MemoryError::Embedding("missing index in response item".into()))? as usize;
        let embedding = item["embedding"]
            .as_array()
            .ok_or_else(|| MemoryError::Embedding("missing embedding in response item".into()))?
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32).ok_or_else(|| MemoryError::Embedding("non-numeric embedding value".into())))
            .collect::<Result<Vec<f32>>>()?;
        indexed.push((index, embedding));
    }

    indexed.sort_by_key(|(idx, _)| *idx);
    let result: Vec<Vec<f32>> = indexed.into_iter().map(|(_, v)| v).collect();

    if result.len() != expected {
        return Err(MemoryError::Embedding(format!(
            "expected {expected} embeddings, got {}",
            result.len()
        )));
    }

    Ok(result)
}

/// Deterministic hash-based embedding generator. Never calls the network;
/// used as a test double and as the basis for BM25-only fallback paths that
/// still want a fixed-dimension vector to satisfy shape invariants.
pub struct HashEmbeddingClient {
    dimension: usize,
}

impl HashEmbeddingClient {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingClient for HashEmbeddingClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!(count = texts.len(), "generating hash-based embeddings (no API key configured)");
        Ok(texts.iter().map(|t| hash_based_embedding(t, self.dimension)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn hash_based_embedding(text: &str, dimension: usize) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut embedding = Vec::with_capacity(dimension);
    for i in 0..dimension {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        i.hash(&mut hasher);
        let hash = hasher.finish();
        let value = ((hash as f64 / u64::MAX as f64) * 2.0 - 1.0) as f32;
        embedding.push(value);
    }

    let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in &mut embedding {
            *x /= magnitude;
        }
    }
    embedding
}

/// Cosine similarity. Zero magnitude on either side yields `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_self_is_one() {
        let v = vec![0.5, 0.5, 0.5, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn cosine_orthogonal_is_zero() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 0.0001);
    }

    #[test]
    fn cosine_opposite_is_negative_one() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 0.0001);
    }

    #[test]
    fn cosine_zero_vector_is_zero() {
        let a = vec![1.0, 0.0, 0.0];
        let zero = vec![0.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
    }

    #[test]
    fn cosine_bounded_in_range() {
        let a = vec![3.0, -1.0, 2.0];
        let b = vec![-2.0, 4.0, 1.0];
        let sim = cosine_similarity(&a, &b);
        assert!((-1.0..=1.0).contains(&sim));
    }

    #[tokio::test]
    async fn hash_embedding_is_deterministic_and_normalized() {
        let client = HashEmbeddingClient::new(16);
        let a = client.embed_batch(&["hello".to_string()]).await.unwrap();
        let b = client.embed_batch(&["hello".to_string()]).await.unwrap();
        assert_eq!(a, b);

        let magnitude: f32 = a[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.0001);
    }

    #[tokio::test]
    async fn hash_embedding_differs_by_text() {
        let client = HashEmbeddingClient::new(16);
        let results = client
            .embed_batch(&["hello".to_string(), "world".to_string()])
            .await
            .unwrap();
        assert_ne!(results[0], results[1]);
    }

    #[test]
    fn parse_batch_response_sorts_by_index() {
        let json = serde_json::json!({
            "data": [
                {"embedding": [2.0], "index": 1},
                {"embedding": [1.0], "index": 0},
            ]
        });
        let result = parse_batch_response(&json, 2).unwrap();
        assert_eq!(result, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn parse_batch_response_rejects_count_mismatch() {
        let json = serde_json::json!({ "data": [{"embedding": [1.0], "index": 0}] });
        assert!(parse_batch_response(&json, 2).is_err());
    }
}
