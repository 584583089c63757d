//! Boundary interface for the article document store.
//!
//! The pipeline only ever batch-inserts generated articles; it issues no
//! updates or deletes. An in-memory implementation backs tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::types::{GeneratedArticle, PipelineError};

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Persists a batch of generated articles in one write.
    async fn insert_articles(&self, articles: &[GeneratedArticle]) -> Result<(), PipelineError>;
}

/// In-memory store double that records every inserted article.
#[derive(Default)]
pub struct MemoryArticleStore {
    articles: Mutex<Vec<GeneratedArticle>>,
    batches: Mutex<Vec<usize>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn inserted(&self) -> Vec<GeneratedArticle> {
        self.articles.lock().await.clone()
    }

    /// Sizes of the insert batches received, in order.
    pub async fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().await.clone()
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn insert_articles(&self, articles: &[GeneratedArticle]) -> Result<(), PipelineError> {
        self.batches.lock().await.push(articles.len());
        self.articles.lock().await.extend_from_slice(articles);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use chrono::Utc;

    fn article(title: &str) -> GeneratedArticle {
        GeneratedArticle {
            title: title.to_string(),
            summary: "resumen".to_string(),
            body: "cuerpo".to_string(),
            language: "es".to_string(),
            category: Category::Politica,
            urls: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn memory_store_records_batches() {
        let store = MemoryArticleStore::new();
        store
            .insert_articles(&[article("uno"), article("dos")])
            .await
            .unwrap();
        store.insert_articles(&[article("tres")]).await.unwrap();

        assert_eq!(store.inserted().await.len(), 3);
        assert_eq!(store.batch_sizes().await, vec![2, 1]);
    }
}
