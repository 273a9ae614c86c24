// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Merging of per-task output into the caller-facing content string.
//!
//! Only `BlockKind::Content` blocks are rendered. Diagnostic blocks carry
//! their kind from creation, so no rendered text is ever pattern-matched.

use crate::models::crawler::ContentBlock;

pub const CRAWL_EMPTY_MESSAGE: &str =
    "After attempting to scrape, no substantial content was found to summarize.";

pub const SEARCH_EMPTY_MESSAGE: &str =
    "After fetching search results, no substantial content was extracted to provide a meaningful summary.";

pub const NO_RESULTS_MESSAGE: &str = "No results found for your query.";

pub const SEARCH_FAILED_MESSAGE: &str =
    "The web search failed, so no pages could be scraped for your query.";

const ERROR_HINT: &str = " Encountered issues (see all_errors for details). Please ensure ScraperAPI keys are valid and sites are accessible.";

/// Render the content blocks among `blocks`, joined by `separator`
pub fn render_content<'a, I>(blocks: I, separator: &str) -> String
where
    I: IntoIterator<Item = &'a ContentBlock>,
{
    blocks
        .into_iter()
        .filter(|b| b.is_content())
        .map(ContentBlock::render)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Join non-empty parts with `separator`
pub fn join_parts<I>(parts: I, separator: &str) -> String
where
    I: IntoIterator<Item = String>,
{
    parts
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Trim the merged content, or replace it with `empty_message` when it is
/// shorter than `min_chars`. The hint about errors is appended only when
/// errors were recorded.
pub fn finalize_content(
    content: &str,
    min_chars: usize,
    empty_message: &str,
    error_count: usize,
) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() || trimmed.chars().count() < min_chars {
        let mut report = empty_message.to_string();
        if error_count > 0 {
            report.push_str(ERROR_HINT);
        }
        return report;
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_content_drops_diagnostics() {
        let blocks = vec![
            ContentBlock::content("https://a.test/", "alpha"),
            ContentBlock::low_content("https://a.test/x", 3),
            ContentBlock::fetch_error("https://a.test/y", "ScraperAPI key ...1234 FAILED"),
            ContentBlock::no_content("https://a.test/"),
            ContentBlock::content("https://a.test/z", "omega"),
        ];
        let rendered = render_content(&blocks, "\n---\n");
        assert_eq!(
            rendered,
            "### Content from: https://a.test/\nalpha\n---\n### Content from: https://a.test/z\nomega"
        );
        assert!(!rendered.contains("Low/No"));
        assert!(!rendered.contains("FAILED"));
    }

    #[test]
    fn test_join_parts_skips_empty() {
        let joined = join_parts(
            vec!["one".to_string(), "  ".to_string(), "two".to_string()],
            "\n\n",
        );
        assert_eq!(joined, "one\n\ntwo");
    }

    #[test]
    fn test_finalize_keeps_substantial_content() {
        let content = format!("  {}  ", "x".repeat(30));
        assert_eq!(finalize_content(&content, 30, CRAWL_EMPTY_MESSAGE, 2), "x".repeat(30));
    }

    #[test]
    fn test_finalize_replaces_short_content() {
        assert_eq!(
            finalize_content("short", 30, CRAWL_EMPTY_MESSAGE, 0),
            CRAWL_EMPTY_MESSAGE
        );
        let with_errors = finalize_content("", 30, CRAWL_EMPTY_MESSAGE, 1);
        assert!(with_errors.starts_with(CRAWL_EMPTY_MESSAGE));
        assert!(with_errors.contains("Encountered issues"));
    }
}
