// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Batch fan-out over the credential pool, and merging of the results.

use crate::error::ScrapeError;
use crate::models::crawler::{
    ContentBlock, SpiderCrawlRequest, SpiderCrawlResponse, BLOCK_SEPARATOR, SITE_SEPARATOR,
};
use crate::models::fetch::{FetchOptions, FetchResult};
use crate::models::search::{SearchHit, SearchScrapeRequest, SearchScrapeResponse, SourceRef};
use crate::models::settings::ScraperSettings;
use crate::services::aggregate::{
    finalize_content, join_parts, render_content, CRAWL_EMPTY_MESSAGE, NO_RESULTS_MESSAGE,
    SEARCH_EMPTY_MESSAGE, SEARCH_FAILED_MESSAGE,
};
use crate::services::crawler::SiteSpider;
use crate::services::credentials::{Credential, CredentialPool};
use crate::services::extractor::{ContentExtractor, ReadableTextExtractor};
use crate::services::fetcher::{PageFetcher, ScraperApiClient};
use crate::services::search::{DuckDuckGoSearch, WebSearch};
use anyhow::Result;
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

/// Upper bound on base URLs per crawl request
pub const MAX_BASE_URLS: usize = 10;

/// Upper bound on `num_results` per search request
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Runs one batch per request: assigns credentials round-robin, launches the
/// work concurrently, waits for every task, then merges in input order.
pub struct BatchOrchestrator {
    settings: ScraperSettings,
    pool: CredentialPool,
    fetcher: Arc<dyn PageFetcher>,
    search: Arc<dyn WebSearch>,
    spider: SiteSpider,
}

impl BatchOrchestrator {
    pub fn new(
        settings: ScraperSettings,
        pool: CredentialPool,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn ContentExtractor>,
        search: Arc<dyn WebSearch>,
    ) -> Self {
        let spider = SiteSpider::new(fetcher.clone(), extractor, &settings);
        Self {
            settings,
            pool,
            fetcher,
            search,
            spider,
        }
    }

    /// Wire the production collaborators from configuration
    pub fn from_settings(settings: ScraperSettings) -> Result<Self> {
        let pool = CredentialPool::from_candidates(settings.credential_candidates.clone());
        if pool.is_empty() {
            warn!("No valid ScraperAPI keys configured; scraping requests will be refused");
        } else {
            info!(credentials = pool.len(), "Credential pool loaded");
        }

        let fetcher = Arc::new(ScraperApiClient::new(&settings)?);
        let search = Arc::new(DuckDuckGoSearch::new(&settings)?);
        Ok(Self::new(
            settings,
            pool,
            fetcher,
            Arc::new(ReadableTextExtractor),
            search,
        ))
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    /// How many items of a batch run at all: bounded by pool size and the
    /// concurrency cap. Items beyond this are not processed.
    pub fn batch_width(&self, requested: usize) -> usize {
        requested
            .min(self.pool.len())
            .min(self.settings.max_concurrent_scrapes)
    }

    /// Pair the first `batch_width` items with credentials, round-robin from
    /// index 0. The cursor is local to this call.
    fn assign<'a, T>(&self, items: &'a [T]) -> Vec<(&'a T, Credential)> {
        let width = self.batch_width(items.len());
        let mut cursor = self.pool.round_robin();
        items
            .iter()
            .take(width)
            .filter_map(|item| cursor.next_credential().map(|c| (item, c)))
            .collect()
    }

    /// Crawl several sites concurrently and merge their readable text
    pub async fn spider_crawl_batch(
        &self,
        request: &SpiderCrawlRequest,
    ) -> std::result::Result<SpiderCrawlResponse, ScrapeError> {
        validate_crawl_request(request)?;
        if self.pool.is_empty() {
            return Err(ScrapeError::NoCredentials);
        }

        let max_depth = request
            .max_depth_internal
            .unwrap_or(self.settings.default_max_depth);
        let max_pages = request
            .max_links_per_url
            .unwrap_or(self.settings.max_links_per_page);

        let assignments = self.assign(&request.base_urls);
        let batch_id = Uuid::now_v7();
        info!(
            %batch_id,
            query = %request.query,
            requested = request.base_urls.len(),
            launched = assignments.len(),
            max_depth,
            max_pages,
            "Starting spider crawl batch"
        );

        let tasks = assignments.iter().map(|(base_url, credential)| {
            isolated(
                self.spider
                    .crawl_site(base_url, credential, &request.query, max_depth, max_pages),
            )
        });
        let outcomes = join_all(tasks)
            .instrument(info_span!("spider_batch", %batch_id))
            .await;

        let mut site_blocks = Vec::with_capacity(outcomes.len());
        let mut all_errors = Vec::new();

        for ((base_url, _), outcome) in assignments.iter().zip(outcomes) {
            match outcome {
                Ok(site) => {
                    all_errors.extend(site.errors);
                    site_blocks.push(site.blocks);
                }
                Err(panic_message) => {
                    let message = format!(
                        "Task for {} failed with unhandled exception: {}",
                        base_url, panic_message
                    );
                    error!(%batch_id, "{}", message);
                    all_errors.push(message);
                    site_blocks.push(vec![ContentBlock::task_failure(
                        base_url.as_str(),
                        panic_message,
                    )]);
                }
            }
        }

        let merged = join_parts(
            site_blocks
                .iter()
                .map(|blocks| render_content(blocks, BLOCK_SEPARATOR)),
            SITE_SEPARATOR,
        );
        let aggregated_content = finalize_content(
            &merged,
            self.settings.min_content_length,
            CRAWL_EMPTY_MESSAGE,
            all_errors.len(),
        );

        info!(
            %batch_id,
            merged_chars = merged.chars().count(),
            errors = all_errors.len(),
            "Spider crawl batch finished"
        );

        Ok(SpiderCrawlResponse {
            aggregated_content,
            all_errors,
        })
    }

    /// Search the web, fetch the top hits directly as markdown, and merge them
    pub async fn search_and_scrape(
        &self,
        request: &SearchScrapeRequest,
    ) -> std::result::Result<SearchScrapeResponse, ScrapeError> {
        validate_search_request(request)?;
        if self.pool.is_empty() {
            return Err(ScrapeError::NoCredentials);
        }

        let wanted = request
            .num_results
            .unwrap_or(self.settings.max_search_results);
        let batch_id = Uuid::now_v7();

        let hits = match self.search.search(&request.query, wanted).await {
            Ok(hits) => hits,
            Err(e) => {
                let message = format!("Web search failed: {}", e);
                error!(%batch_id, query = %request.query, "{}", message);
                return Ok(SearchScrapeResponse {
                    aggregated_search_content: SEARCH_FAILED_MESSAGE.to_string(),
                    sources: Vec::new(),
                    all_errors: vec![message],
                });
            }
        };

        if hits.is_empty() {
            info!(%batch_id, query = %request.query, "Search returned no results");
            return Ok(SearchScrapeResponse {
                aggregated_search_content: NO_RESULTS_MESSAGE.to_string(),
                sources: Vec::new(),
                all_errors: Vec::new(),
            });
        }

        let assignments = self.assign(&hits);
        info!(
            %batch_id,
            query = %request.query,
            hits = hits.len(),
            launched = assignments.len(),
            "Scraping search results"
        );

        let options = FetchOptions::markdown();
        let tasks = assignments.iter().map(|(hit, credential)| {
            isolated(self.fetcher.fetch_page(&hit.url, credential, &options))
        });
        let outcomes = join_all(tasks)
            .instrument(info_span!("search_batch", %batch_id))
            .await;

        let MergedSearch {
            blocks,
            sources,
            all_errors,
        } = merge_search_outcomes(
            &assignments,
            outcomes,
            self.settings.page_substance_threshold(),
        );

        let merged = render_content(&blocks, BLOCK_SEPARATOR);
        let aggregated_search_content = finalize_content(
            &merged,
            self.settings.min_content_length,
            SEARCH_EMPTY_MESSAGE,
            all_errors.len(),
        );

        info!(
            %batch_id,
            sources = sources.len(),
            errors = all_errors.len(),
            "Search scrape batch finished"
        );

        Ok(SearchScrapeResponse {
            aggregated_search_content,
            sources,
            all_errors,
        })
    }
}

/// Per-hit outcomes of a search batch, split into content, sources and errors
struct MergedSearch {
    blocks: Vec<ContentBlock>,
    sources: Vec<SourceRef>,
    all_errors: Vec<String>,
}

fn merge_search_outcomes(
    assignments: &[(&SearchHit, Credential)],
    outcomes: Vec<std::result::Result<FetchResult, String>>,
    threshold: usize,
) -> MergedSearch {
    let mut merged = MergedSearch {
        blocks: Vec::new(),
        sources: Vec::new(),
        all_errors: Vec::new(),
    };

    for ((hit, _), outcome) in assignments.iter().zip(outcomes) {
        let SearchHit { url, title, .. } = *hit;
        let fetch = match outcome {
            Ok(fetch) => fetch,
            Err(panic_message) => {
                merged
                    .all_errors
                    .push(format!("Task failed for {}: {}", url, panic_message));
                continue;
            }
        };

        let key = fetch.credential.masked();
        if let Some(error) = &fetch.error {
            merged.all_errors.push(format!(
                "Error fetching {} (Key {}, Status {}): {}",
                url, key, fetch.status, error
            ));
        } else if fetch.body_chars() > threshold {
            let body = fetch.body.unwrap_or_default();
            merged
                .blocks
                .push(ContentBlock::content(format!("{} ({})", title, url), body));
            merged.sources.push(SourceRef {
                title: title.clone(),
                url: url.clone(),
            });
        } else {
            merged.all_errors.push(format!(
                "Low/No content from {} (Key {}, Status {}). Markdown length: {}",
                url,
                key,
                fetch.status,
                fetch.body_chars()
            ));
        }
    }

    merged
}

/// Run a task so that a panic inside it becomes an `Err` with the panic
/// message instead of unwinding into the batch.
async fn isolated<F>(task: F) -> std::result::Result<F::Output, String>
where
    F: Future,
{
    AssertUnwindSafe(task)
        .catch_unwind()
        .await
        .map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}

pub fn validate_crawl_request(request: &SpiderCrawlRequest) -> std::result::Result<(), ScrapeError> {
    if request.base_urls.is_empty() || request.base_urls.len() > MAX_BASE_URLS {
        return Err(ScrapeError::InvalidRequest(format!(
            "base_urls must contain between 1 and {} URLs, got {}",
            MAX_BASE_URLS,
            request.base_urls.len()
        )));
    }
    for base_url in &request.base_urls {
        let parsed = Url::parse(base_url).map_err(|e| {
            ScrapeError::InvalidRequest(format!("Invalid URL {}: {}", base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ScrapeError::InvalidRequest(format!(
                "Invalid URL {}: only absolute http(s) URLs are accepted",
                base_url
            )));
        }
    }
    Ok(())
}

pub fn validate_search_request(
    request: &SearchScrapeRequest,
) -> std::result::Result<(), ScrapeError> {
    if let Some(n) = request.num_results {
        if !(1..=MAX_SEARCH_RESULTS).contains(&n) {
            return Err(ScrapeError::InvalidRequest(format!(
                "num_results must be between 1 and {}, got {}",
                MAX_SEARCH_RESULTS, n
            )));
        }
    }
    Ok(())
}
