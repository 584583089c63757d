//! Semantic retrieval: query embedding, top-k search, and collapse of the
//! hits into generation-ready context.

use tracing::debug;

use crate::embeddings::EmbeddingProvider;
use crate::index::{ScoredPoint, VectorIndex};
use crate::types::{PipelineError, RetrievalContext};

/// Embeds `query` through the instruct template, searches the index, and
/// collapses the hits into texts (rank order) and deduplicated URLs.
pub async fn retrieve_context(
    index: &VectorIndex,
    provider: &dyn EmbeddingProvider,
    query: &str,
    top_k: usize,
) -> Result<RetrievalContext, PipelineError> {
    let vector = provider.embed_query(query).await?;
    let points = index.search(&vector, top_k).await;
    debug!(query, hits = points.len(), "semantic search completed");
    Ok(collapse(points))
}

/// Collapses scored points into fragment texts in rank order plus their
/// source URLs, deduplicated preserving first occurrence.
pub fn collapse(points: Vec<ScoredPoint>) -> RetrievalContext {
    let mut context = RetrievalContext::default();
    let mut seen_urls = std::collections::HashSet::new();

    for point in points {
        if !point.payload.text.is_empty() {
            context.texts.push(point.payload.text);
        }
        if !point.payload.url.is_empty() && seen_urls.insert(point.payload.url.clone()) {
            context.urls.push(point.payload.url);
        }
    }

    context
}
