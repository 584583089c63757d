//! Pipeline orchestration.
//!
//! One run moves through `Reset → Ingest* → SelectTopics → Generate* →
//! Done`. Every stage except topic discovery degrades gracefully: a
//! failing section, article, embedding batch, or generation attempt is
//! logged and skipped, and the run continues with whatever succeeded.
//! Topic discovery is load-bearing — exhausting its retries aborts the
//! run, since no topics means no downstream work.

use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Limits;
use crate::discovery::discover_links;
use crate::embeddings::EmbeddingProvider;
use crate::extract::{extract_article_text, ExtractionStrategy};
use crate::fragment::split_into_fragments;
use crate::generation::{ArticleGenerator, TopicSource};
use crate::index::{IndexOutcome, VectorIndex};
use crate::retrieval::retrieve_context;
use crate::retry::{retry, RetryPolicy};
use crate::store::ArticleStore;
use crate::types::{
    Category, GeneratedArticle, PipelineError, RetrievalContext, SourceSection, TextFragment,
};

/// End-of-run accounting.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunReport {
    /// Sections that contributed at least one indexed fragment.
    pub sections_ingested: usize,
    pub fragments_indexed: usize,
    pub fragments_skipped: usize,
    pub articles_generated: usize,
    pub articles_persisted: usize,
    pub generation_failures: usize,
}

/// Orchestrates one ingestion-and-generation run.
///
/// All service handles are injected at construction so every stage can be
/// exercised against test doubles.
pub struct Pipeline {
    client: Client,
    provider: Arc<dyn EmbeddingProvider>,
    index: VectorIndex,
    topic_source: Arc<dyn TopicSource>,
    generator: Arc<dyn ArticleGenerator>,
    store: Arc<dyn ArticleStore>,
    sources: Vec<SourceSection>,
    languages: Vec<String>,
    limits: Limits,
    reset_index: bool,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: Client,
        provider: Arc<dyn EmbeddingProvider>,
        index: VectorIndex,
        topic_source: Arc<dyn TopicSource>,
        generator: Arc<dyn ArticleGenerator>,
        store: Arc<dyn ArticleStore>,
        sources: Vec<SourceSection>,
    ) -> Self {
        Self {
            client,
            provider,
            index,
            topic_source,
            generator,
            store,
            sources,
            languages: crate::config::TARGET_LANGUAGES
                .iter()
                .map(|l| l.to_string())
                .collect(),
            limits: Limits::default(),
            reset_index: true,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    /// Controls whether the run starts by clearing the index (full
    /// refresh). On by default.
    pub fn with_index_reset(mut self, reset: bool) -> Self {
        self.reset_index = reset;
        self
    }

    /// Executes one full run.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::default();

        if self.reset_index {
            if let Err(err) = self.index.delete_all().await {
                warn!(error = %err, "index reset failed; continuing with existing points");
            }
        }

        for section in &self.sources {
            let outcome = self.ingest_section(section).await;
            if outcome.indexed > 0 {
                report.sections_ingested += 1;
            }
            report.fragments_indexed += outcome.indexed;
            report.fragments_skipped += outcome.skipped;
        }

        let policy = RetryPolicy::new(self.limits.retry_attempts, self.limits.retry_backoff);
        let topics = retry(policy, "topic discovery", || async {
            let topics = self.topic_source.most_relevant_topics().await?;
            if topics.values().all(|queries| queries.is_empty()) {
                return Err(PipelineError::Malformed {
                    operation: "topic discovery",
                    detail: "no topics returned for any category".to_string(),
                });
            }
            Ok(topics)
        })
        .await?;

        for category in Category::ALL {
            let Some(queries) = topics.get(category) else {
                continue;
            };
            let mut batch = Vec::new();

            for query in queries {
                // One retrieval per topic query; the context is reused for
                // every target language.
                let context = match retrieve_context(
                    &self.index,
                    self.provider.as_ref(),
                    query,
                    self.limits.top_k,
                )
                .await
                {
                    Ok(context) => context,
                    Err(err) => {
                        warn!(
                            query = %query,
                            category = %category,
                            error = %err,
                            "context retrieval failed; skipping query"
                        );
                        report.generation_failures += self.languages.len();
                        continue;
                    }
                };

                for language in &self.languages {
                    match self.draft_article(&context, language, *category).await {
                        Ok(article) => batch.push(article),
                        Err(err) => {
                            warn!(
                                query = %query,
                                language = %language,
                                category = %category,
                                error = %err,
                                "article generation skipped"
                            );
                            report.generation_failures += 1;
                        }
                    }
                }
            }

            report.articles_generated += batch.len();
            if batch.is_empty() {
                continue;
            }
            match self.store.insert_articles(&batch).await {
                Ok(()) => {
                    report.articles_persisted += batch.len();
                    info!(category = %category, count = batch.len(), "persisted category batch");
                }
                Err(err) => {
                    warn!(category = %category, error = %err, "failed to persist category batch");
                }
            }
        }

        info!(?report, "run complete");
        Ok(report)
    }

    /// Ingests one source section: discover links, extract and fragment
    /// each article, then embed and upsert the fragments.
    async fn ingest_section(&self, section: &SourceSection) -> IndexOutcome {
        let page = match section.section_url() {
            Ok(page) => page,
            Err(err) => {
                warn!(base = %section.base_url, path = %section.path, error = %err,
                      "invalid section url; skipping");
                return IndexOutcome::default();
            }
        };
        info!(url = %page, category = %section.category, "ingesting section");

        let links = discover_links(&self.client, &page, self.limits.max_links).await;
        if links.is_empty() {
            info!(url = %page, "no article links found");
            return IndexOutcome::default();
        }

        let strategy = ExtractionStrategy::for_host(page.host_str().unwrap_or_default());
        let mut fragments = Vec::new();
        for url in &links {
            let text =
                extract_article_text(&self.client, url, strategy, self.limits.min_paragraph_len)
                    .await;
            if text.is_empty() {
                continue;
            }
            for fragment in
                split_into_fragments(&text, self.limits.max_words, self.limits.min_words)
            {
                fragments.push(TextFragment {
                    text: fragment,
                    url: url.to_string(),
                    language: section.language.clone(),
                    category: section.category,
                });
            }
        }

        if fragments.is_empty() {
            info!(url = %page, "no usable fragments extracted");
            return IndexOutcome::default();
        }

        info!(url = %page, count = fragments.len(), "embedding and indexing fragments");
        self.index
            .embed_and_upsert(self.provider.as_ref(), &fragments, self.limits.batch_size)
            .await
    }

    /// Drafts one article in one target language from already-retrieved
    /// context.
    async fn draft_article(
        &self,
        context: &RetrievalContext,
        language: &str,
        category: Category,
    ) -> Result<GeneratedArticle, PipelineError> {
        let policy = RetryPolicy::new(self.limits.retry_attempts, self.limits.retry_backoff);
        let draft = retry(policy, "article generation", || {
            self.generator.generate_article(&context.texts, language)
        })
        .await?;

        Ok(draft.into_article(category, context))
    }
}
