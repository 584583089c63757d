//! Embedding service client.
//!
//! Wraps an external embedding HTTP service behind the
//! [`EmbeddingProvider`] trait so pipeline stages can be exercised with a
//! deterministic mock. All requests ask the service for normalized
//! vectors. Queries are embedded through an instruction-prefixed template
//! so they land in the same region of the vector space as plain indexed
//! passages (asymmetric instruct-style retrieval).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::warn;
use url::Url;

use crate::types::PipelineError;

/// Task description prepended to retrieval queries.
pub const QUERY_TASK: &str =
    "Given a web search query, retrieve relevant passages related to the query";

/// Builds the instruction-prefixed form of a retrieval query.
pub fn detailed_instruct(query: &str) -> String {
    format!("Instruct: {QUERY_TASK}\nQuery:{query}")
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a single text. Empty input is a contract violation and
    /// fails fast.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError>;

    /// Embeds a batch of texts. An empty batch is a contract violation.
    ///
    /// On service failure the result is a same-length list of `None`
    /// placeholders so callers keep positional alignment with the input
    /// instead of losing the whole batch shape.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Option<Vec<f32>>>, PipelineError>;

    /// Embeds a retrieval query through the instruct template.
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, PipelineError> {
        self.embed(&detailed_instruct(query)).await
    }
}

/// HTTP client for the embedding service.
#[derive(Clone)]
pub struct HttpEmbeddingClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl HttpEmbeddingClient {
    pub fn new(client: Client, endpoint: Url, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key: api_key.into(),
        }
    }

    async fn request(&self, inputs: serde_json::Value) -> Result<reqwest::Response, reqwest::Error> {
        let payload = json!({
            "inputs": inputs,
            "parameters": { "normalize_embeddings": true }
        });
        self.client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        if text.is_empty() {
            return Err(PipelineError::EmptyInput("embedding input"));
        }
        let response = self.request(json!(text)).await?;
        let vector = response
            .json::<Vec<f32>>()
            .await
            .map_err(|err| PipelineError::Embedding(format!("unexpected response shape: {err}")))?;
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Option<Vec<f32>>>, PipelineError> {
        if texts.is_empty() {
            return Err(PipelineError::EmptyInput("embedding batch"));
        }

        let response = match self.request(json!(texts)).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, batch = texts.len(), "embedding batch failed");
                return Ok(vec![None; texts.len()]);
            }
        };

        match response.json::<Vec<Vec<f32>>>().await {
            Ok(vectors) if vectors.len() == texts.len() => {
                Ok(vectors.into_iter().map(Some).collect())
            }
            Ok(vectors) => {
                warn!(
                    expected = texts.len(),
                    received = vectors.len(),
                    "embedding batch came back misaligned"
                );
                Ok(vec![None; texts.len()])
            }
            Err(err) => {
                warn!(error = %err, "embedding batch response unparsable");
                Ok(vec![None; texts.len()])
            }
        }
    }
}

/// Deterministic hash-based embedding provider for tests and offline runs.
///
/// Identical text always yields the identical vector; differing text
/// yields differing vectors with overwhelming probability.
#[derive(Clone, Debug, Default)]
pub struct MockEmbeddingProvider {
    /// When set, batch calls behave like a failing service: a same-length
    /// list of `None` placeholders.
    pub fail_batches: bool,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail_batches: true }
    }

    fn hash_to_vec(text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();
        (0..8)
            .map(|i| {
                let bits = seed.rotate_left((i * 8) as u32) ^ ((i as u64) << 24);
                (bits as f32) / u32::MAX as f32
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        if text.is_empty() {
            return Err(PipelineError::EmptyInput("embedding input"));
        }
        Ok(Self::hash_to_vec(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Option<Vec<f32>>>, PipelineError> {
        if texts.is_empty() {
            return Err(PipelineError::EmptyInput("embedding batch"));
        }
        if self.fail_batches {
            return Ok(vec![None; texts.len()]);
        }
        Ok(texts.iter().map(|t| Some(Self::hash_to_vec(t))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruct_template_wraps_query() {
        let instructed = detailed_instruct("resultados de la banca española");
        assert!(instructed.starts_with("Instruct: Given a web search query"));
        assert!(instructed.ends_with("Query:resultados de la banca española"));
    }

    #[tokio::test]
    async fn empty_input_fails_fast() {
        let provider = MockEmbeddingProvider::new();
        assert!(matches!(
            provider.embed("").await,
            Err(PipelineError::EmptyInput(_))
        ));
        assert!(matches!(
            provider.embed_batch(&[]).await,
            Err(PipelineError::EmptyInput(_))
        ));
    }

    #[tokio::test]
    async fn mock_embeddings_are_deterministic() {
        let provider = MockEmbeddingProvider::new();
        let a = provider.embed("hola mundo").await.unwrap();
        let b = provider.embed("hola mundo").await.unwrap();
        let c = provider.embed("adiós mundo").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn failing_batch_keeps_positional_alignment() {
        let provider = MockEmbeddingProvider::failing();
        let texts: Vec<String> = (0..5).map(|i| format!("texto {i}")).collect();
        let result = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(result.len(), 5);
        assert!(result.iter().all(Option::is_none));
    }

    #[tokio::test]
    async fn query_embedding_differs_from_passage_embedding() {
        let provider = MockEmbeddingProvider::new();
        let passage = provider.embed("la inflación sube").await.unwrap();
        let query = provider.embed_query("la inflación sube").await.unwrap();
        assert_ne!(passage, query);
    }
}
