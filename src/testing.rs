// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! In-memory collaborators for exercising the spider and orchestrator
//! without a proxy account or network access.

use crate::error::SearchError;
use crate::models::fetch::{FetchOptions, FetchResult, OutputFormat};
use crate::models::search::SearchHit;
use crate::services::credentials::Credential;
use crate::services::extractor::{ContentExtractor, Extraction};
use crate::services::fetcher::PageFetcher;
use crate::services::search::WebSearch;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Canned response for one URL
#[derive(Debug, Clone)]
pub enum StubPage {
    Body { status: u16, body: String },
    Failure {
        status: u16,
        critical: bool,
        message: String,
    },
    /// Panics inside the fetch, to exercise task isolation
    Panic(String),
}

impl StubPage {
    pub fn html(body: impl Into<String>) -> Self {
        StubPage::Body {
            status: 200,
            body: body.into(),
        }
    }

    pub fn failure(status: u16, critical: bool, message: impl Into<String>) -> Self {
        StubPage::Failure {
            status,
            critical,
            message: message.into(),
        }
    }
}

/// Record of one fetch made through the stub
#[derive(Debug, Clone)]
pub struct FetchCall {
    pub url: String,
    pub credential: Credential,
    pub format: OutputFormat,
}

/// Page fetcher answering from a URL map. Unknown URLs get a non-critical 404.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, StubPage>,
    delay: Duration,
    calls: RwLock<Vec<FetchCall>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, page: StubPage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    /// Hold every fetch open for `delay` so concurrent calls overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.url).collect()
    }

    /// Highest number of fetches that were in progress at the same time
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch_page(
        &self,
        url: &str,
        credential: &Credential,
        options: &FetchOptions,
    ) -> FetchResult {
        self.calls.write().unwrap().push(FetchCall {
            url: url.to_string(),
            credential: credential.clone(),
            format: options.format,
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.pages.get(url) {
            Some(StubPage::Body { status, body }) => {
                FetchResult::success(url, credential, *status, body.clone()).with_attempts(1)
            }
            Some(StubPage::Failure {
                status,
                critical,
                message,
            }) => FetchResult::failure(url, credential, *status, message.clone(), *critical)
                .with_attempts(1),
            Some(StubPage::Panic(message)) => panic!("{}", message),
            None => FetchResult::failure(
                url,
                credential,
                404,
                format!("no stub page for {}", url),
                false,
            )
            .with_attempts(1),
        }
    }
}

/// Extractor returning the text of every `<p>`, one per line. Keeps test
/// thresholds independent of the real readability heuristics.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedExtractor;

impl ContentExtractor for FixedExtractor {
    fn extract(&self, html: &str, _base_url: &str) -> Extraction {
        let document = Html::parse_document(html);
        let Ok(selector) = Selector::parse("p") else {
            return Extraction::degraded(String::new());
        };
        Extraction::readable(
            document
                .select(&selector)
                .map(|p| p.text().collect::<String>())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

/// Web search returning a fixed hit list, or a fixed failure
#[derive(Default)]
pub struct StubSearch {
    hits: Vec<SearchHit>,
    failure: Option<String>,
    queries: RwLock<Vec<(String, usize)>>,
}

impl StubSearch {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.read().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for StubSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.queries
            .write()
            .unwrap()
            .push((query.to_string(), max_results));
        if let Some(message) = &self.failure {
            return Err(SearchError::Parse(message.clone()));
        }
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }
}

/// Convenience constructor for search hits in tests
pub fn hit(url: &str, title: &str) -> SearchHit {
    SearchHit {
        url: url.to_string(),
        title: title.to_string(),
        snippet: String::new(),
    }
}
