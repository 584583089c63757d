//! Domain types shared across the ingestion and retrieval pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Closed set of article categories handled by the pipeline.
///
/// Serialized lowercase and accent-free, matching both the index payloads
/// and the structured output contract of the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Internacional,
    Politica,
    Economia,
    Deportes,
    Sociedad,
    Tecnologia,
}

impl Category {
    /// All categories in the order the generation stage iterates them.
    /// This ordering is a contract, not an accident of a map type.
    pub const ALL: &'static [Category] = &[
        Category::Economia,
        Category::Tecnologia,
        Category::Deportes,
        Category::Sociedad,
        Category::Politica,
        Category::Internacional,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Internacional => "internacional",
            Category::Politica => "politica",
            Category::Economia => "economia",
            Category::Deportes => "deportes",
            Category::Sociedad => "sociedad",
            Category::Tecnologia => "tecnologia",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "internacional" => Ok(Category::Internacional),
            "politica" => Ok(Category::Politica),
            "economia" => Ok(Category::Economia),
            "deportes" => Ok(Category::Deportes),
            "sociedad" => Ok(Category::Sociedad),
            "tecnologia" => Ok(Category::Tecnologia),
            other => Err(PipelineError::Malformed {
                operation: "category parsing",
                detail: format!("unknown category '{other}'"),
            }),
        }
    }
}

/// One front-page section of a news source. Static configuration,
/// immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct SourceSection {
    pub base_url: Url,
    pub path: String,
    pub language: String,
    pub category: Category,
}

impl SourceSection {
    pub fn new(
        base_url: Url,
        path: impl Into<String>,
        language: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            base_url,
            path: path.into(),
            language: language.into(),
            category,
        }
    }

    /// Absolute URL of the section front page.
    pub fn section_url(&self) -> Result<Url, PipelineError> {
        Ok(self.base_url.join(&self.path)?)
    }
}

/// A bounded-length, sentence-aligned chunk of article text. The unit of
/// embedding and indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub url: String,
    pub language: String,
    pub category: Category,
}

/// Payload stored alongside the vector in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointPayload {
    pub text: String,
    pub url: String,
    pub language: String,
    pub category: Category,
    pub timestamp: DateTime<Utc>,
}

/// An indexed (id, vector, payload) triple.
///
/// The id is derived deterministically from the fragment text, so
/// re-indexing identical text overwrites the existing point instead of
/// accumulating duplicates. Equal text under different URLs collides on
/// purpose; the last writer wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

/// Collapsed retrieval output handed to the generation service: fragment
/// texts in rank order plus their source URLs, deduplicated first-seen.
#[derive(Debug, Clone, Default)]
pub struct RetrievalContext {
    pub texts: Vec<String>,
    pub urls: Vec<String>,
}

impl RetrievalContext {
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// A generated article ready for persistence. Created once per
/// (topic, language) pair and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedArticle {
    pub title: String,
    pub summary: String,
    pub body: String,
    pub language: String,
    pub category: Category,
    pub urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Crate-level error type.
///
/// Transport failures are always skippable or retryable; `EmptyInput` is a
/// programming-contract violation surfaced to the immediate caller; only
/// `ExhaustedRetries` on topic discovery aborts a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{operation} returned malformed output: {detail}")]
    Malformed {
        operation: &'static str,
        detail: String,
    },

    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error("{operation} failed after {attempts} attempts")]
    ExhaustedRetries { operation: String, attempts: u32 },

    #[error("embedding service error: {0}")]
    Embedding(String),

    #[error("vector index error: {0}")]
    Index(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("document store error: {0}")]
    Store(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Internacional).unwrap();
        assert_eq!(json, "\"internacional\"");
        let parsed: Category = serde_json::from_str("\"deportes\"").unwrap();
        assert_eq!(parsed, Category::Deportes);
    }

    #[test]
    fn category_parses_from_str() {
        assert_eq!(
            "Economia".parse::<Category>().unwrap(),
            Category::Economia
        );
        assert!("gastronomia".parse::<Category>().is_err());
    }

    #[test]
    fn section_url_joins_base_and_path() {
        let section = SourceSection::new(
            Url::parse("https://elpais.com/").unwrap(),
            "economia/",
            "es",
            Category::Economia,
        );
        assert_eq!(
            section.section_url().unwrap().as_str(),
            "https://elpais.com/economia/"
        );
    }
}
