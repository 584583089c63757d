//! Boundary interfaces for the external generation service.
//!
//! The service is consumed in two modes: topic discovery (free-form text
//! expected to parse as a category → topic-queries mapping) and article
//! generation (schema-constrained structured output). This module defines
//! the trait seams and the parsing helpers implementations can share; it
//! does not reimplement the LLM client itself.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::Deserialize;

use crate::types::{Category, GeneratedArticle, PipelineError, RetrievalContext};

/// Topic queries per category, as produced by topic discovery.
pub type TopicMap = BTreeMap<Category, Vec<String>>;

/// Yields the current most relevant topic queries per category.
#[async_trait]
pub trait TopicSource: Send + Sync {
    async fn most_relevant_topics(&self) -> Result<TopicMap, PipelineError>;
}

/// Drafts an article in `language` from retrieved fragment texts.
#[async_trait]
pub trait ArticleGenerator: Send + Sync {
    async fn generate_article(
        &self,
        texts: &[String],
        language: &str,
    ) -> Result<ArticleDraft, PipelineError>;
}

/// Structured output of the generation service for one article.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub summary: String,
    pub body: String,
    /// ISO 639-1 code reported by the model.
    pub language: String,
    pub category: Category,
}

impl ArticleDraft {
    /// Finalizes a draft into a persistable article. The category comes
    /// from the pipeline's loop, overriding whatever the model reported,
    /// and the retrieval context contributes the evidence URLs.
    pub fn into_article(self, category: Category, context: &RetrievalContext) -> GeneratedArticle {
        GeneratedArticle {
            title: self.title,
            summary: self.summary,
            body: self.body,
            language: self.language,
            category,
            urls: context.urls.clone(),
            created_at: chrono::Utc::now(),
        }
    }
}

/// Strips a ```json fence if the model wrapped its output in one.
pub fn strip_json_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed
        .strip_prefix("```json")
        .and_then(|rest| rest.strip_suffix("```"))
    {
        return inner.trim();
    }
    trimmed
}

/// Parses free-form topic-discovery output into a [`TopicMap`].
///
/// Unknown category keys are ignored; a result with no topics under any
/// known category is malformed (an empty discovery round is
/// indistinguishable from a failed one and gets retried).
pub fn parse_topic_map(raw: &str) -> Result<TopicMap, PipelineError> {
    let cleaned = strip_json_fence(raw);
    let parsed: HashMap<String, Vec<String>> =
        serde_json::from_str(cleaned).map_err(|err| PipelineError::Malformed {
            operation: "topic discovery",
            detail: err.to_string(),
        })?;

    let mut topics = TopicMap::new();
    for (key, queries) in parsed {
        if let Ok(category) = key.parse::<Category>() {
            if !queries.is_empty() {
                topics.insert(category, queries);
            }
        }
    }

    if topics.is_empty() {
        return Err(PipelineError::Malformed {
            operation: "topic discovery",
            detail: "no topics under any known category".to_string(),
        });
    }
    Ok(topics)
}

/// Parses schema-constrained article output into a draft. Any deviation
/// from the schema, including an out-of-set category, is malformed and the
/// item is dropped by the caller.
pub fn parse_article_draft(raw: &str) -> Result<ArticleDraft, PipelineError> {
    serde_json::from_str(strip_json_fence(raw)).map_err(|err| PipelineError::Malformed {
        operation: "article generation",
        detail: err.to_string(),
    })
}
