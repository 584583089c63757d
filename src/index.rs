//! Vector index HTTP client.
//!
//! Point ids are derived deterministically from fragment text (UUIDv5 in
//! the URL namespace), which makes upsert idempotent across runs and
//! deduplicates re-scraped paragraphs naturally. Equal text reached from
//! different URLs collides on the same id and the last writer wins; that
//! trade-off is deliberate.

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::embeddings::EmbeddingProvider;
use crate::types::{PipelineError, PointPayload, TextFragment, VectorPoint};

/// Counts from a batch embed-and-upsert pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOutcome {
    /// Points written to the index.
    pub indexed: usize,
    /// Fragments dropped for missing embeddings or failed batches.
    pub skipped: usize,
}

/// A search hit with its similarity score.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredPoint {
    #[serde(default)]
    pub score: f32,
    pub payload: PointPayload,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: QueryResult,
}

#[derive(Deserialize, Default)]
struct QueryResult {
    #[serde(default)]
    points: Vec<ScoredPoint>,
}

/// Client for the vector index's collection-scoped HTTP API.
#[derive(Clone)]
pub struct VectorIndex {
    client: Client,
    base_url: Url,
    collection: String,
    api_key: String,
}

impl VectorIndex {
    pub fn new(
        client: Client,
        mut base_url: Url,
        collection: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        // Url::join treats a path without a trailing slash as a file.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        Self {
            client,
            base_url,
            collection: collection.into(),
            api_key: api_key.into(),
        }
    }

    /// Deterministic content-derived point id: stable across runs and
    /// processes for identical text.
    pub fn point_id(text: &str) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_URL, text.as_bytes())
    }

    fn points_url(&self, suffix: &str) -> Result<Url, PipelineError> {
        Ok(self
            .base_url
            .join(&format!("collections/{}/points{suffix}", self.collection))?)
    }

    /// Removes every point from the collection (match-all delete), used to
    /// fully refresh the index before a new ingestion run.
    pub async fn delete_all(&self) -> Result<(), PipelineError> {
        let url = self.points_url("/delete")?;
        let payload = json!({ "filter": { "must": [] } });
        self.client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        info!(collection = %self.collection, "cleared all points");
        Ok(())
    }

    /// Writes `points` in a single request. Idempotent: a point whose id
    /// already exists is overwritten in place.
    ///
    /// Same-batch id collisions are logged but do not block the write.
    pub async fn upsert(&self, points: &[VectorPoint]) -> Result<(), PipelineError> {
        if points.is_empty() {
            return Ok(());
        }

        let duplicates = duplicate_ids(points);
        if !duplicates.is_empty() {
            warn!(?duplicates, "duplicate point ids within batch; last writer wins");
        }

        let url = self.points_url("")?;
        let payload = json!({ "points": points });
        self.client
            .put(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        info!(count = points.len(), "upserted points");
        Ok(())
    }

    /// Returns the `limit` nearest points with payload. Empty on service
    /// failure.
    pub async fn search(&self, vector: &[f32], limit: usize) -> Vec<ScoredPoint> {
        let url = match self.points_url("/query") {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "invalid index url");
                return Vec::new();
            }
        };
        let payload = json!({
            "limit": limit,
            "with_payload": true,
            "query": vector,
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "vector search failed");
                return Vec::new();
            }
        };

        match response.json::<QueryResponse>().await {
            Ok(parsed) => parsed.result.points,
            Err(err) => {
                warn!(error = %err, "vector search response unparsable");
                Vec::new()
            }
        }
    }

    /// Chunks `fragments`, embeds each chunk, drops fragments whose
    /// embedding came back as a placeholder, and upserts the survivors.
    ///
    /// A failed chunk (embedding or upsert) never blocks subsequent
    /// chunks.
    pub async fn embed_and_upsert(
        &self,
        provider: &dyn EmbeddingProvider,
        fragments: &[TextFragment],
        batch_size: usize,
    ) -> IndexOutcome {
        let mut outcome = IndexOutcome::default();

        for chunk in fragments.chunks(batch_size.max(1)) {
            let texts: Vec<String> = chunk.iter().map(|f| f.text.clone()).collect();
            let embeddings = match provider.embed_batch(&texts).await {
                Ok(embeddings) => embeddings,
                Err(err) => {
                    warn!(error = %err, size = chunk.len(), "embedding chunk failed; continuing");
                    outcome.skipped += chunk.len();
                    continue;
                }
            };

            let timestamp = Utc::now();
            let points: Vec<VectorPoint> = chunk
                .iter()
                .zip(embeddings)
                .filter_map(|(fragment, embedding)| {
                    let vector = embedding?;
                    Some(VectorPoint {
                        id: Self::point_id(&fragment.text),
                        vector,
                        payload: PointPayload {
                            text: fragment.text.clone(),
                            url: fragment.url.clone(),
                            language: fragment.language.clone(),
                            category: fragment.category,
                            timestamp,
                        },
                    })
                })
                .collect();

            outcome.skipped += chunk.len() - points.len();
            if points.is_empty() {
                continue;
            }

            match self.upsert(&points).await {
                Ok(()) => outcome.indexed += points.len(),
                Err(err) => {
                    warn!(error = %err, size = points.len(), "upsert chunk failed; continuing");
                    outcome.skipped += points.len();
                }
            }
        }

        outcome
    }
}

/// Ids appearing more than once in a batch.
fn duplicate_ids(points: &[VectorPoint]) -> Vec<Uuid> {
    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for point in points {
        *counts.entry(point.id).or_default() += 1;
    }
    let mut duplicates: Vec<Uuid> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect();
    duplicates.sort();
    duplicates
}
