// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Selection of same-origin links worth following from a fetched page.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static ASSET_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\.(jpeg|jpg|gif|png|css|js|pdf|zip|xml|svg|webp|mp3|mp4|woff|ttf|eot|ico|gz|tgz)(\?.*)?$",
    )
    .expect("asset pattern is valid")
});

static DATED_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\d{4,}[/-]\d{1,2}[/-]\d{1,2}/").expect("date pattern is valid"));

/// Path fragments typical of news and article pages
const ARTICLE_HINTS: [&str; 6] = ["/news", "/article", "story", "details", "breaking", "latest"];

const SKIPPED_PREFIXES: [&str; 4] = ["#", "javascript:", "mailto:", "tel:"];

/// Split a free-text query into lowercase terms
pub fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect()
}

/// Collect up to `max_links` distinct, same-origin links from `html` that look
/// relevant to `query_terms`. With no terms every eligible link is relevant.
/// Links come back in document order.
pub fn extract_relevant_links(
    html: &str,
    base_url: &str,
    query_terms: &[String],
    max_links: usize,
) -> Vec<String> {
    let mut links = Vec::new();
    if html.is_empty() || max_links == 0 {
        return links;
    }

    let Ok(base) = Url::parse(base_url) else {
        return links;
    };
    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    for anchor in document.select(&selector) {
        if links.len() >= max_links {
            break;
        }

        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() || SKIPPED_PREFIXES.iter().any(|p| href.starts_with(p)) {
            continue;
        }

        let Ok(absolute) = base.join(href) else {
            continue;
        };
        if !is_same_origin_page(&base, &absolute) {
            continue;
        }

        let anchor_text = anchor
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_lowercase();

        if is_relevant(&absolute, &anchor_text, query_terms) {
            let link = absolute.to_string();
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }

    links
}

/// http(s), same scheme/host/port as the base, and not a static asset
fn is_same_origin_page(base: &Url, candidate: &Url) -> bool {
    matches!(candidate.scheme(), "http" | "https")
        && candidate.origin() == base.origin()
        && !ASSET_PATH.is_match(candidate.path())
}

fn is_relevant(link: &Url, anchor_text: &str, query_terms: &[String]) -> bool {
    if query_terms.is_empty() {
        return true;
    }

    let path_and_query = format!("{}{}", link.path(), link.query().unwrap_or("")).to_lowercase();

    let matches_query = query_terms
        .iter()
        .any(|term| anchor_text.contains(term.as_str()) || path_and_query.contains(term.as_str()));

    matches_query
        || ARTICLE_HINTS.iter().any(|hint| path_and_query.contains(hint))
        || DATED_PATH.is_match(&path_and_query)
}
