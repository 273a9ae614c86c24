// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Bounded breadth-first spidering of a single site under one credential.

use crate::models::crawler::{BlockKind, ContentBlock, SiteCrawlResult};
use crate::models::fetch::FetchOptions;
use crate::models::settings::ScraperSettings;
use crate::services::credentials::Credential;
use crate::services::extractor::ContentExtractor;
use crate::services::fetcher::PageFetcher;
use crate::services::frontier::CrawlFrontier;
use crate::services::links::{extract_relevant_links, query_terms};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Crawls one base URL: fetch, extract, discover links, repeat within budget
pub struct SiteSpider {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn ContentExtractor>,
    substance_threshold: usize,
    links_per_page: usize,
    growth_factor: f64,
}

impl SiteSpider {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn ContentExtractor>,
        settings: &ScraperSettings,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            substance_threshold: settings.page_substance_threshold(),
            links_per_page: settings.max_links_per_page,
            growth_factor: settings.frontier_growth_factor,
        }
    }

    /// Crawl `base_url` breadth-first. Pages deeper than `max_depth` are never
    /// fetched and at most `max_pages` pages are processed. A critical fetch
    /// error ends the crawl of this site only.
    pub async fn crawl_site(
        &self,
        base_url: &str,
        credential: &Credential,
        query: &str,
        max_depth: usize,
        max_pages: usize,
    ) -> SiteCrawlResult {
        let mut result = SiteCrawlResult {
            base_url: base_url.to_string(),
            blocks: Vec::new(),
            errors: Vec::new(),
            credential: credential.clone(),
            pages_processed: 0,
        };

        if let Some(problem) = base_url_problem(base_url) {
            result.errors.push(problem);
            result.blocks.push(ContentBlock::no_content(base_url));
            return result;
        }

        let terms = query_terms(query);
        let key = credential.masked();
        let frontier_cap = max_pages as f64 * self.growth_factor;
        let mut frontier = CrawlFrontier::new(base_url);

        while result.pages_processed < max_pages {
            let Some((url, depth)) = frontier.pop() else {
                break;
            };
            if frontier.is_visited(&url) || depth > max_depth {
                continue;
            }
            frontier.mark_visited(&url);
            result.pages_processed += 1;

            info!(
                url = %url,
                depth,
                page = result.pages_processed,
                max_pages,
                key = %key,
                "Spidering page"
            );

            let fetch = self
                .fetcher
                .fetch_page(&url, credential, &FetchOptions::html())
                .await;

            if let Some(error) = &fetch.error {
                result.errors.push(format!(
                    "Fetch error for {} (Key {}, Status {}): {}",
                    url, key, fetch.status, error
                ));
                result.blocks.push(ContentBlock::fetch_error(&url, error));
                if fetch.is_critical {
                    warn!(url = %url, key = %key, "Critical fetch error, aborting crawl for this site");
                    break;
                }
                continue;
            }

            let Some(html) = fetch.body.filter(|body| !body.is_empty()) else {
                result.errors.push(format!(
                    "No HTML content received for {} (Key {})",
                    url, key
                ));
                continue;
            };

            result.blocks.push(self.page_block(&html, &url));

            if depth < max_depth {
                let links = extract_relevant_links(&html, &url, &terms, self.links_per_page);
                for link in links {
                    if (frontier.footprint() as f64) < frontier_cap {
                        frontier.push(&link, depth + 1);
                    }
                }
            }
        }

        let gathered_any = result
            .blocks
            .iter()
            .any(|b| matches!(b.kind, BlockKind::Content | BlockKind::LowContent));
        if !gathered_any {
            result.blocks.push(ContentBlock::no_content(base_url));
        }

        info!(
            base_url,
            pages = result.pages_processed,
            unvisited = frontier.pending(),
            errors = result.errors.len(),
            "Site crawl finished"
        );
        trace!(base_url, output = %result.rendered(), "Site crawl blocks");

        result
    }

    /// Extract a fetched page into a content block, or a low-content marker
    /// when the extraction is short or only describes the page
    fn page_block(&self, html: &str, url: &str) -> ContentBlock {
        let extraction = self.extractor.extract(html, url);
        let extracted_chars = extraction.chars();
        if !extraction.degraded && extracted_chars > self.substance_threshold {
            ContentBlock::content(url, extraction.text)
        } else {
            debug!(
                url,
                extracted_chars,
                degraded = extraction.degraded,
                "Page has little readable content"
            );
            ContentBlock::low_content(url, extracted_chars)
        }
    }
}

fn base_url_problem(base_url: &str) -> Option<String> {
    match url::Url::parse(base_url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => None,
        Ok(parsed) => Some(format!(
            "Invalid base URL {}: unsupported scheme '{}'",
            base_url,
            parsed.scheme()
        )),
        Err(e) => Some(format!("Invalid base URL {}: {}", base_url, e)),
    }
}
