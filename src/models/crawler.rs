// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::services::credentials::Credential;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Separator between blocks of one site (and between search results)
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Separator between the merged output of different sites
pub const SITE_SEPARATOR: &str = "\n\n";

/// Request to crawl several sites and merge their readable text
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SpiderCrawlRequest {
    /// Query used to rank internal links
    pub query: String,
    /// Base URLs to crawl, 1 to 10 entries
    pub base_urls: Vec<String>,
    /// Link depth to follow inside each site (default from configuration)
    #[serde(default)]
    pub max_depth_internal: Option<usize>,
    /// Page budget per site (default from configuration)
    #[serde(default)]
    pub max_links_per_url: Option<usize>,
}

/// Merged multi-site crawl output
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SpiderCrawlResponse {
    pub aggregated_content: String,
    pub all_errors: Vec<String>,
}

/// What a block holds. Only `Content` ever reaches the caller; the rest are
/// diagnostics kept for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Content,
    LowContent,
    NoContent,
    FetchError,
    TaskFailure,
}

/// One labeled chunk of site output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub kind: BlockKind,
    /// Label of the origin, usually the page URL
    pub source: String,
    pub text: String,
}

impl ContentBlock {
    pub fn content(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Content,
            source: source.into(),
            text: text.into(),
        }
    }

    pub fn low_content(source: impl Into<String>, extracted_chars: usize) -> Self {
        Self {
            kind: BlockKind::LowContent,
            source: source.into(),
            text: format!("Readability output length: {}", extracted_chars),
        }
    }

    pub fn no_content(source: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::NoContent,
            source: source.into(),
            text: String::new(),
        }
    }

    pub fn fetch_error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::FetchError,
            source: source.into(),
            text: message.into(),
        }
    }

    pub fn task_failure(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::TaskFailure,
            source: source.into(),
            text: message.into(),
        }
    }

    pub fn is_content(&self) -> bool {
        self.kind == BlockKind::Content
    }

    pub fn render(&self) -> String {
        match self.kind {
            BlockKind::Content => format!("### Content from: {}\n{}", self.source, self.text),
            BlockKind::LowContent => format!(
                "### Low/No substantial content from: {} ({})",
                self.source, self.text
            ),
            BlockKind::NoContent => {
                format!("No content gathered from {} or its subpages.", self.source)
            }
            BlockKind::FetchError => format!("### Fetch error for {}: {}", self.source, self.text),
            BlockKind::TaskFailure => {
                format!("### Major error processing {}\n{}", self.source, self.text)
            }
        }
    }
}

/// Output of crawling one base URL
#[derive(Debug, Clone)]
pub struct SiteCrawlResult {
    pub base_url: String,
    pub blocks: Vec<ContentBlock>,
    pub errors: Vec<String>,
    pub credential: Credential,
    /// Pages dequeued and processed, fetched or not
    pub pages_processed: usize,
}

impl SiteCrawlResult {
    /// Every block, diagnostics included, as a single string
    pub fn rendered(&self) -> String {
        self.blocks
            .iter()
            .map(ContentBlock::render)
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR)
    }

    pub fn content_blocks(&self) -> impl Iterator<Item = &ContentBlock> {
        self.blocks.iter().filter(|b| b.is_content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_block_render() {
        let block = ContentBlock::content("https://example.com/a", "# Title\n\nBody");
        assert_eq!(
            block.render(),
            "### Content from: https://example.com/a\n# Title\n\nBody"
        );
        assert!(block.is_content());
    }

    #[test]
    fn test_diagnostic_blocks_are_not_content() {
        let blocks = [
            ContentBlock::low_content("https://example.com", 12),
            ContentBlock::no_content("https://example.com"),
            ContentBlock::fetch_error("https://example.com", "boom"),
            ContentBlock::task_failure("https://example.com", "panic"),
        ];
        assert!(blocks.iter().all(|b| !b.is_content()));
        assert_eq!(
            blocks[0].render(),
            "### Low/No substantial content from: https://example.com (Readability output length: 12)"
        );
        assert_eq!(
            blocks[1].render(),
            "No content gathered from https://example.com or its subpages."
        );
    }

    #[test]
    fn test_request_optional_fields_default_to_none() {
        let request: SpiderCrawlRequest =
            serde_json::from_str(r#"{"query":"rust","base_urls":["https://example.com"]}"#)
                .unwrap();
        assert_eq!(request.base_urls.len(), 1);
        assert!(request.max_depth_internal.is_none());
        assert!(request.max_links_per_url.is_none());
    }
}
