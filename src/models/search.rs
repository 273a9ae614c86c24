// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One organic web search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Request to search the web and scrape the top results
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchScrapeRequest {
    pub query: String,
    /// Number of results to scrape, 1 to 10 (default from configuration)
    #[serde(default)]
    pub num_results: Option<usize>,
}

/// A source that yielded substantial content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
}

/// Merged search-then-scrape output
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchScrapeResponse {
    pub aggregated_search_content: String,
    pub sources: Vec<SourceRef>,
    pub all_errors: Vec<String>,
}
