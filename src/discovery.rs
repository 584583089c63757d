//! Front-page link discovery.
//!
//! Collects candidate article URLs from a source's front page, keeping only
//! same-host links under the section's base path. URLs are normalized by
//! stripping query strings and fragments, deduplicated first-seen, and
//! capped at a configured maximum.

use std::collections::HashSet;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

/// Fetches a section front page and extracts its article links.
///
/// Transport failures are non-fatal: the section is skipped and an empty
/// list returned.
pub async fn discover_links(client: &Client, page: &Url, max_links: usize) -> Vec<Url> {
    let body = match fetch_page(client, page).await {
        Ok(body) => body,
        Err(err) => {
            warn!(url = %page, error = %err, "front page fetch failed; skipping section");
            return Vec::new();
        }
    };
    let links = collect_article_links(page, &body, max_links);
    debug!(url = %page, count = links.len(), "discovered article links");
    links
}

async fn fetch_page(client: &Client, page: &Url) -> Result<String, reqwest::Error> {
    let response = client.get(page.clone()).send().await?.error_for_status()?;
    response.text().await
}

/// Extracts article links from already-fetched front-page markup.
///
/// Anchors are only considered inside `<article>` containers. Candidate
/// hrefs are resolved against the page URL, filtered to the page's host and
/// section path, normalized, and deduplicated in first-seen order.
pub fn collect_article_links(page: &Url, html: &str, max_links: usize) -> Vec<Url> {
    let Ok(containers) = Selector::parse("article") else {
        return Vec::new();
    };
    let Ok(anchors) = Selector::parse("a") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let host = page.host_str();
    let base_path = page.path().trim_end_matches('/').to_string();

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for container in document.select(&containers) {
        for anchor in container.select(&anchors) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if href.is_empty() || href.starts_with("mailto:") || href.starts_with("tel:") {
                continue;
            }
            let Ok(mut resolved) = page.join(href) else {
                continue;
            };
            if resolved.host_str() != host {
                continue;
            }
            if !resolved.path().starts_with(&base_path) {
                continue;
            }
            resolved.set_query(None);
            resolved.set_fragment(None);

            if seen.insert(resolved.to_string()) {
                links.push(resolved);
            }
            if links.len() >= max_links {
                return links;
            }
        }
    }

    links
}
