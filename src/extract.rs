//! Per-article readable-text extraction.
//!
//! Sources differ in how they wrap article bodies: most put the text under
//! an `<article>` element, some (larazon.es) under `<section>` containers.
//! When the chosen container is absent or yields nothing, extraction falls
//! back to every paragraph in the document. Short paragraphs (navigation,
//! captions, cookie banners) are filtered by a minimum character length.

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::warn;
use url::Url;

/// Which container to scan for paragraph text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    ArticleTag,
    SectionTag,
}

impl ExtractionStrategy {
    /// Selects the strategy for a source host.
    pub fn for_host(host: &str) -> Self {
        match host {
            "www.larazon.es" => ExtractionStrategy::SectionTag,
            _ => ExtractionStrategy::ArticleTag,
        }
    }

    fn container_selector(self) -> &'static str {
        match self {
            ExtractionStrategy::ArticleTag => "article p",
            ExtractionStrategy::SectionTag => "section p",
        }
    }
}

/// Fetches an article page and returns its readable text, possibly empty.
///
/// Transport failures are non-fatal: the article is skipped and an empty
/// string returned.
pub async fn extract_article_text(
    client: &Client,
    url: &Url,
    strategy: ExtractionStrategy,
    min_paragraph_len: usize,
) -> String {
    let body = match fetch_page(client, url).await {
        Ok(body) => body,
        Err(err) => {
            warn!(url = %url, error = %err, "article fetch failed; skipping");
            return String::new();
        }
    };
    readable_text(&body, strategy, min_paragraph_len)
}

async fn fetch_page(client: &Client, url: &Url) -> Result<String, reqwest::Error> {
    let response = client.get(url.clone()).send().await?.error_for_status()?;
    response.text().await
}

/// Extracts readable paragraphs from article markup.
///
/// Paragraphs inside the strategy's container are preferred; if none are
/// found, all paragraphs in the document are considered. Only paragraphs
/// whose trimmed length exceeds `min_paragraph_len` characters survive;
/// the result joins them with newlines.
pub fn readable_text(html: &str, strategy: ExtractionStrategy, min_paragraph_len: usize) -> String {
    let Ok(scoped) = Selector::parse(strategy.container_selector()) else {
        return String::new();
    };
    let Ok(all_paragraphs) = Selector::parse("p") else {
        return String::new();
    };

    let document = Html::parse_document(html);

    let mut paragraphs: Vec<String> = document
        .select(&scoped)
        .map(paragraph_text)
        .collect();
    if paragraphs.is_empty() {
        paragraphs = document.select(&all_paragraphs).map(paragraph_text).collect();
    }

    paragraphs
        .iter()
        .map(|p| p.trim())
        .filter(|p| p.chars().count() > min_paragraph_len)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn paragraph_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>()
}
