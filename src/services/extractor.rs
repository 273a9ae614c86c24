// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Readable-text extraction from raw HTML.

use scraper::{ElementRef, Html, Node, Selector};

/// Readable text of one page. `degraded` marks output that only describes the
/// page (a title with no usable body), never counted as content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extraction {
    pub text: String,
    pub degraded: bool,
}

impl Extraction {
    pub fn readable(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            degraded: false,
        }
    }

    pub fn degraded(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            degraded: true,
        }
    }

    pub fn chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// Turns raw HTML into readable text. Never fails: unusable input comes back
/// as a degraded extraction.
pub trait ContentExtractor: Send + Sync {
    fn extract(&self, html: &str, base_url: &str) -> Extraction;
}

/// Text shorter than this is not returned on its own merits
const MIN_BODY_CHARS: usize = 100;

/// Titles longer than this are worth reporting even without a body
const MIN_TITLE_CHARS: usize = 10;

const SHORT_CONTENT_NOTE: &str =
    "(Content extracted was very short or primarily boilerplate after cleaning)";

/// Regions tried in order before falling back to `<body>`
const MAIN_REGIONS: [&str; 8] = [
    "main",
    "article",
    "[role='main']",
    "#content",
    "#main",
    ".content",
    ".post-content",
    ".entry-content",
];

const SKIPPED_TAGS: [&str; 12] = [
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "iframe", "svg",
    "figure", "template",
];

/// class/id fragments marking sidebars, comment threads and ads
const SKIPPED_MARKERS: [&str; 5] = ["sidebar", "comments", "related-posts", "advert", "gallery"];

const BLOCK_TAGS: [&str; 22] = [
    "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "td", "th", "article",
    "section", "main", "blockquote", "pre", "figcaption", "dt", "dd", "table",
];

/// Readability-style extractor built on `scraper`
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadableTextExtractor;

impl ContentExtractor for ReadableTextExtractor {
    fn extract(&self, html: &str, _base_url: &str) -> Extraction {
        if html.trim().is_empty() {
            return Extraction::degraded(String::new());
        }

        let document = Html::parse_document(html);
        let title = extract_title(&document);
        let text = main_region(&document)
            .map(|region| {
                let mut buf = String::new();
                collect_text(region, &mut buf);
                tidy_text(&buf)
            })
            .unwrap_or_default();

        if text.chars().count() > MIN_BODY_CHARS {
            return Extraction::readable(match title {
                Some(title) => format!("# {}\n\n{}", title, text),
                None => text,
            });
        }

        match title {
            Some(title) if title.chars().count() > MIN_TITLE_CHARS => {
                Extraction::degraded(format!("# {}\n\n{}", title, SHORT_CONTENT_NOTE))
            }
            _ => Extraction::readable(text),
        }
    }
}

/// `<title>`, falling back to the first `<h1>`
fn extract_title(document: &Html) -> Option<String> {
    ["title", "h1"].iter().find_map(|tag| {
        let selector = Selector::parse(tag).ok()?;
        document
            .select(&selector)
            .next()
            .map(|el| squash_spaces(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    })
}

fn main_region(document: &Html) -> Option<ElementRef<'_>> {
    MAIN_REGIONS
        .iter()
        .chain(std::iter::once(&"body"))
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| document.select(&selector).next())
}

fn is_boilerplate(element: &scraper::node::Element) -> bool {
    if SKIPPED_TAGS.contains(&element.name()) {
        return true;
    }
    let marked = |value: &str| {
        let value = value.to_lowercase();
        SKIPPED_MARKERS.iter().any(|m| value.contains(m))
    };
    let flagged = |value: &str| value.eq_ignore_ascii_case("ad") || marked(value);
    element.id().is_some_and(flagged) || element.classes().any(flagged)
}

fn collect_text(element: ElementRef<'_>, buf: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => buf.push_str(text),
            Node::Element(el) => {
                if is_boilerplate(el) {
                    continue;
                }
                let is_block = BLOCK_TAGS.contains(&el.name());
                if is_block {
                    buf.push('\n');
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(child_ref, buf);
                }
                if is_block {
                    buf.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn squash_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Squash spaces inside lines and collapse runs of blank lines to one
fn tidy_text(raw: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut blank_run = false;
    for line in raw.lines().map(squash_spaces) {
        if line.is_empty() {
            blank_run = !out.is_empty();
            continue;
        }
        if blank_run {
            out.push(String::new());
            blank_run = false;
        }
        out.push(line);
    }
    out.join("\n")
}
