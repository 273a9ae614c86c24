// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::error::SearchError;
use crate::models::search::SearchHit;
use crate::models::settings::ScraperSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

/// Web search collaborator: a query in, up to `max_results` hits out
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> std::result::Result<Vec<SearchHit>, SearchError>;
}

/// Search client for DuckDuckGo's JavaScript-free HTML endpoint
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(settings: &ScraperSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.search_timeout)
            .user_agent(&settings.user_agent)
            .build()
            .context("Failed to create search HTTP client")?;

        Ok(Self {
            client,
            endpoint: settings.search_endpoint.clone(),
        })
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> std::result::Result<Vec<SearchHit>, SearchError> {
        tracing::info!(query, max_results, "Searching the web");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        let hits = parse_results(&html, max_results)?;
        tracing::debug!(query, hits = hits.len(), "Search results parsed");
        Ok(hits)
    }
}

/// Parse DuckDuckGo HTML results, skipping ads and hits without a usable URL
pub fn parse_results(
    html: &str,
    max_results: usize,
) -> std::result::Result<Vec<SearchHit>, SearchError> {
    let selector = |css: &str| {
        Selector::parse(css).map_err(|e| SearchError::Parse(format!("selector {}: {}", css, e)))
    };
    let result_selector = selector(".result")?;
    let title_selector = selector(".result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let document = Html::parse_document(html);
    let mut hits = Vec::new();

    for element in document.select(&result_selector) {
        if hits.len() >= max_results {
            break;
        }
        if element
            .value()
            .classes()
            .any(|class| class == "result--ad")
        {
            continue;
        }

        let Some(title_node) = element.select(&title_selector).next() else {
            continue;
        };
        let Some(url) = title_node.value().attr("href").and_then(clean_result_url) else {
            continue;
        };

        let title = title_node.text().collect::<String>().trim().to_string();
        let snippet = element
            .select(&snippet_selector)
            .next()
            .map(|s| s.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        hits.push(SearchHit {
            url,
            title: if title.is_empty() {
                "No Title".to_string()
            } else {
                title
            },
            snippet,
        });
    }

    Ok(hits)
}

/// Resolve a result link to the target URL. DuckDuckGo wraps targets in a
/// `/l/?uddg=<encoded>` redirect; links may also be protocol-relative.
fn clean_result_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let absolute = if raw.starts_with("//") {
        format!("https:{}", raw)
    } else if raw.starts_with('/') {
        format!("https://duckduckgo.com{}", raw)
    } else {
        raw.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;
    let target = parsed
        .query_pairs()
        .find(|(k, _)| k == "uddg")
        .and_then(|(_, v)| Url::parse(&v).ok())
        .unwrap_or(parsed);

    matches!(target.scheme(), "http" | "https").then(|| target.to_string())
}
