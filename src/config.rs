//! Run configuration: source/section records, environment-derived service
//! settings, and tunable limits.
//!
//! Sources are stored as an explicitly ordered list so iteration order is
//! part of the contract rather than an accident of a map type.

use std::env;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::types::{Category, PipelineError, SourceSection};

/// Target languages for generated articles, in generation order.
pub const TARGET_LANGUAGES: &[&str] = &["español", "inglés"];

/// Tunable limits with defaults matching the production configuration.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum article links collected per front page.
    pub max_links: usize,
    /// Minimum trimmed character count for a paragraph to be kept.
    pub min_paragraph_len: usize,
    /// Hard upper bound on fragment word count (oversized single
    /// sentences excepted).
    pub max_words: usize,
    /// Soft lower bound on fragment word count.
    pub min_words: usize,
    /// Fragments embedded and upserted per index batch.
    pub batch_size: usize,
    /// Points returned per semantic search.
    pub top_k: usize,
    /// Timeout applied to every outbound request.
    pub request_timeout: Duration,
    /// Attempt bound for retried operations.
    pub retry_attempts: u32,
    /// Pause between retry attempts.
    pub retry_backoff: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_links: 15,
            min_paragraph_len: 100,
            max_words: 340,
            min_words: 80,
            batch_size: 30,
            top_k: 9,
            request_timeout: Duration::from_secs(10),
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Service endpoints and credentials loaded from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub embeddings_url: Url,
    pub embeddings_api_key: String,
    pub index_url: Url,
    pub index_api_key: String,
    pub collection: String,
}

impl Settings {
    /// Reads settings from the environment, honoring a `.env` file when
    /// present. Missing required variables produce an explicit error.
    pub fn from_env() -> Result<Self, PipelineError> {
        dotenvy::dotenv().ok();
        Ok(Self {
            embeddings_url: parse_url(&require("EMBEDDINGS_API_URL")?)?,
            embeddings_api_key: require("EMBEDDINGS_API_KEY")?,
            index_url: parse_url(&require("VECTOR_INDEX_URL")?)?,
            index_api_key: require("VECTOR_INDEX_API_KEY")?,
            collection: env::var("VECTOR_INDEX_COLLECTION")
                .unwrap_or_else(|_| "articles".to_string()),
        })
    }
}

fn require(name: &str) -> Result<String, PipelineError> {
    env::var(name).map_err(|_| PipelineError::Config(format!("missing environment variable {name}")))
}

fn parse_url(raw: &str) -> Result<Url, PipelineError> {
    Url::parse(raw).map_err(|err| PipelineError::Config(format!("invalid url '{raw}': {err}")))
}

/// Builds the shared HTTP client: browser-like user agent, rustls, and a
/// mandatory request timeout.
pub fn http_client(timeout: Duration) -> Result<Client, PipelineError> {
    Ok(Client::builder()
        .user_agent("Mozilla/5.0")
        .use_rustls_tls()
        .timeout(timeout)
        .build()?)
}

/// The configured Spanish news sources and their sections, in ingestion
/// order.
pub fn default_sources() -> Result<Vec<SourceSection>, PipelineError> {
    let mut sources = Vec::new();
    for (base, sections) in [
        (
            "https://www.elmundo.es/",
            &[
                ("internacional", Category::Internacional),
                ("espana", Category::Politica),
                ("deportes", Category::Deportes),
                ("economia", Category::Economia),
            ][..],
        ),
        (
            "https://elpais.com/",
            &[
                ("internacional/", Category::Internacional),
                ("espana/", Category::Politica),
                ("sociedad/", Category::Sociedad),
                ("deportes/", Category::Deportes),
                ("tecnologia/", Category::Tecnologia),
                ("economia/", Category::Economia),
            ][..],
        ),
        (
            "https://www.lavanguardia.com/",
            &[
                ("internacional", Category::Internacional),
                ("politica", Category::Politica),
                ("vida", Category::Sociedad),
                ("deportes", Category::Deportes),
                ("tecnologia", Category::Tecnologia),
                ("economia", Category::Economia),
            ][..],
        ),
        (
            "https://www.abc.es/",
            &[
                ("internacional/", Category::Internacional),
                ("espana/", Category::Politica),
                ("sociedad/", Category::Sociedad),
                ("deportes/", Category::Deportes),
                ("tecnologia/", Category::Tecnologia),
                ("economia/", Category::Economia),
            ][..],
        ),
        (
            "https://www.larazon.es/",
            &[
                ("internacional/", Category::Internacional),
                ("espana/", Category::Politica),
                ("sociedad/", Category::Sociedad),
                ("deportes/", Category::Deportes),
                ("tecnologia/", Category::Tecnologia),
                ("economia/", Category::Economia),
            ][..],
        ),
    ] {
        let base_url = parse_url(base)?;
        for (path, category) in sections {
            sources.push(SourceSection::new(base_url.clone(), *path, "es", *category));
        }
    }
    Ok(sources)
}
